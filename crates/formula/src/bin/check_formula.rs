//! Validate a canonical expression and print an annotated report.
//!
//! Usage: cargo run --features cli --bin check_formula -- "ROUND({f_rate})" [--functions functions.json]

use anyhow::Context;
use clap::Parser;
use pricing_logic_formula::{validate, ErrorReporter, FunctionRegistry};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(about = "Validate a canonical expression")]
struct Args {
    /// The canonical expression to validate
    expression: String,

    /// JSON file with a custom function table (defaults to the built-ins)
    #[arg(long)]
    functions: Option<PathBuf>,
}

fn load_registry(path: Option<&PathBuf>) -> anyhow::Result<FunctionRegistry> {
    let Some(path) = path else {
        return Ok(FunctionRegistry::builtin());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading function table {}", path.display()))?;
    FunctionRegistry::from_json(&json)
        .with_context(|| format!("loading function table {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let registry = load_registry(args.functions.as_ref())?;

    match validate(&args.expression, &registry) {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(err) => {
            ErrorReporter::new("expression", &args.expression)
                .report(&err)
                .context("writing report")?;
            process::exit(1);
        }
    }
}
