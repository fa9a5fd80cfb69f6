//! # pricing-logic-rules
//!
//! Declarative "if conditions then actions" rules over deal fields,
//! documents and tasks.
//!
//! ## Features
//!
//! - **Operator catalog**: legal comparison operators per field type
//! - **Rule model**: conditions and actions with a tagged value mode, in the
//!   JSON shape the persistence layer stores
//! - **Contradiction detection**: opposite effects on one target in one rule
//! - **Save gate**: refuses a rule set while any rule is contradictory
//! - **Reference analysis**: stale field ids and per-slot formula errors
//!
//! ## Example
//!
//! ```rust
//! use pricing_logic_rules::{
//!     Condition, Effect, InputAction, LogicRule, Operator, RuleSet, RulesError,
//! };
//! use std::collections::HashMap;
//!
//! let rule = LogicRule::default()
//!     .with_condition(Condition::new("f_vip", Operator::IsTrue))
//!     .with_action(InputAction::new("f_fee", Effect::Visible))
//!     .with_action(InputAction::new("f_fee", Effect::NotVisible));
//!
//! let names: HashMap<String, String> =
//!     [("f_fee".to_string(), "Fee".to_string())].into_iter().collect();
//! let set = RuleSet::scoped("f_fee", vec![rule]);
//!
//! match set.prepare_save(&names) {
//!     Err(RulesError::SaveBlocked { warnings }) => {
//!         assert_eq!(warnings[0].warnings[0], "\"Fee\" is set to both Visible and Not Visible.");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod contradictions;
pub mod dependencies;
mod error;
pub mod model;
pub mod operators;
pub mod ruleset;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use contradictions::{
    contradiction_warnings, detect_contradictions, Contradiction, ContradictionKind, TargetNames,
};
pub use dependencies::{extract_field_references, unresolved_fields, FieldReference, ReferenceSite};
pub use error::RulesError;
pub use model::{
    Combinator, Condition, DocumentAction, Effect, InputAction, LogicRule, RuleAction, TargetId,
    TaskAction, ToggleEffect, ValueMode, ValueSlot,
};
pub use operators::{operators_for, operators_for_field, Operator};
pub use ruleset::{ExpressionSite, FormulaDiagnostic, RuleSet, RuleWarnings, SavePayload};
