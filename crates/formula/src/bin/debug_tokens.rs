//! Print the token stream of a canonical expression.
//!
//! Usage: cargo run --features cli --bin debug_tokens -- "{f_rate} * ROUND(2.5, 0)"

use clap::Parser;
use pricing_logic_formula::lexer::{is_call, tokenize};

#[derive(Parser)]
#[command(about = "Print the token stream of a canonical expression")]
struct Args {
    /// The canonical expression, e.g. "{f_rate} * 2"
    expression: String,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let tokens = tokenize(&args.expression);
    for (i, (tok, span)) in tokens.iter().enumerate() {
        let call = if is_call(&tokens, i) { " (call)" } else { "" };
        println!("{:3}: {:<8} {:?} @ {:?}{}", i, tok.to_string(), tok, span, call);
    }
}
