//! # pricing-logic
//!
//! Formula editing and conditional-logic rules for deal pricing.
//!
//! ## Features
//!
//! | Feature | Crate | Description |
//! |---------|-------|-------------|
//! | `formula` | [`pricing-logic-formula`] | Segment buffer, validator, autocomplete, editor |
//! | `rules`   | [`pricing-logic-rules`]   | Operator catalog, rule model, contradiction detection |
//!
//! `default = ["formula", "rules"]` enables both.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! pricing-logic = "0.3"
//! ```
//!
//! ```rust
//! use pricing_logic::{validate, Buffer, FunctionRegistry};
//!
//! let buffer = Buffer::parse("{f_loan_amount} * 0.01 + ROUND({f_rate}, 2)");
//! assert!(validate(&buffer.serialize(), &FunctionRegistry::builtin()).is_ok());
//! ```

#[cfg(feature = "formula")]
pub use pricing_logic_formula as formula;

#[cfg(feature = "formula")]
pub use pricing_logic_formula::{
    validate, Buffer, Caret, ExpressionEditor, FieldCatalog, FormulaError, FunctionRegistry,
    Overlay, Segment,
};

#[cfg(feature = "rules")]
pub use pricing_logic_rules as rules;

#[cfg(feature = "rules")]
pub use pricing_logic_rules::{LogicRule, RuleSet, RulesError};
