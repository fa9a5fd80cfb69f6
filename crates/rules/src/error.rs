//! Error types for rule sets.

use crate::ruleset::RuleWarnings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Invalid rule payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot save: {} rule(s) contain contradictory actions", .warnings.len())]
    SaveBlocked { warnings: Vec<RuleWarnings> },
}
