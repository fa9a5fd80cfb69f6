//! Check a rule payload the way the save button does.
//!
//! Usage: cargo run --features cli --bin check_rules -- rules.json --kind input [--fields fields.json] [--names names.json]
//!
//! Prints contradictions, formula errors and stale field references, and
//! exits non-zero if saving would be refused.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pricing_logic_formula::{FieldCatalog, FunctionRegistry};
use pricing_logic_rules::{
    DocumentAction, InputAction, RuleAction, RuleSet, RulesError, TargetId, TargetNames,
    TaskAction,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Input,
    Document,
    Task,
}

#[derive(Parser)]
#[command(about = "Check a rule payload for contradictions and stale references")]
struct Args {
    /// Rule payload: `{ scopeId?, rules }` or a bare array of rules
    payload: PathBuf,

    /// Which kind of target the actions address
    #[arg(long, value_enum)]
    kind: Kind,

    /// Field catalog JSON, used for labels and stale-reference checks
    #[arg(long)]
    fields: Option<PathBuf>,

    /// JSON object mapping document/task ids to names
    #[arg(long)]
    names: Option<PathBuf>,
}

/// Field labels first, then the explicit name table.
struct Names {
    catalog: FieldCatalog,
    table: HashMap<String, String>,
}

impl TargetNames for Names {
    fn target_name(&self, id: &TargetId) -> Option<String> {
        self.catalog
            .target_name(id)
            .or_else(|| self.table.target_name(id))
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Returns whether the rule set may be saved.
fn check<A>(json: &str, catalog: &FieldCatalog, names: &Names) -> anyhow::Result<bool>
where
    A: RuleAction + DeserializeOwned + Clone,
{
    let set: RuleSet<A> = RuleSet::from_json(json)?;
    println!(
        "{} rule(s){}",
        set.len(),
        set.scope_id
            .as_ref()
            .map(|id| format!(" scoped to {}", id))
            .unwrap_or_default()
    );

    for diag in set.formula_diagnostics(&FunctionRegistry::builtin()) {
        println!(
            "rule {}: formula {:?}: {}",
            diag.rule_index, diag.expression, diag.diagnostic.message
        );
    }

    if !catalog.is_empty() {
        for id in set.unresolved_fields(catalog) {
            println!("stale field reference: {}", id);
        }
    }

    match set.prepare_save(names) {
        Ok(_) => {
            println!("ok to save");
            Ok(true)
        }
        Err(RulesError::SaveBlocked { warnings }) => {
            for rule in &warnings {
                for warning in &rule.warnings {
                    println!("rule {}: {}", rule.rule_index, warning);
                }
            }
            println!("save blocked");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let json = read(&args.payload)?;
    let catalog = match &args.fields {
        Some(path) => FieldCatalog::from_json(&read(path)?)
            .with_context(|| format!("loading field catalog {}", path.display()))?,
        None => FieldCatalog::default(),
    };
    let table: HashMap<String, String> = match &args.names {
        Some(path) => serde_json::from_str(&read(path)?)
            .with_context(|| format!("loading names {}", path.display()))?,
        None => HashMap::new(),
    };
    let names = Names {
        catalog: catalog.clone(),
        table,
    };

    let ok = match args.kind {
        Kind::Input => check::<InputAction>(&json, &catalog, &names)?,
        Kind::Document => check::<DocumentAction>(&json, &catalog, &names)?,
        Kind::Task => check::<TaskAction>(&json, &catalog, &names)?,
    };
    if !ok {
        process::exit(1);
    }
    Ok(())
}
