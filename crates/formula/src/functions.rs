//! Function registry.
//!
//! A fixed table of named functions available inside formulas. Each entry
//! carries a display signature, a description and its parameter names. A
//! parameter list ending in [`VARIADIC_MARKER`] means the last role repeats:
//! one or more extra trailing arguments are accepted.
//!
//! Arity is `params.len()`, marker included, and only *too few* arguments are
//! rejected by the validator.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Trailing parameter name marking a variadic function.
pub const VARIADIC_MARKER: &str = "...";

/// A single registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub name: String,
    pub display_signature: String,
    pub description: String,
    pub params: Vec<String>,
}

impl FunctionDescriptor {
    fn builtin(name: &str, params: &[&str], description: &str) -> Self {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        Self {
            name: name.to_string(),
            display_signature: format!("{}({})", name, params.join(", ")),
            description: description.to_string(),
            params,
        }
    }

    /// Minimum number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().map(String::as_str) == Some(VARIADIC_MARKER)
    }

    /// Functions without declared params never produce a signature hint.
    pub fn takes_arguments(&self) -> bool {
        !self.params.is_empty()
    }
}

/// The set of functions a formula may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FunctionRegistry {
    functions: Vec<FunctionDescriptor>,
}

impl FunctionRegistry {
    /// The built-in function table.
    pub fn builtin() -> Self {
        use FunctionDescriptor as F;
        Self {
            functions: vec![
                F::builtin("SUM", &["number1", VARIADIC_MARKER], "Adds all of its arguments."),
                F::builtin("AVERAGE", &["number1", VARIADIC_MARKER], "Returns the arithmetic mean of its arguments."),
                F::builtin("MIN", &["number1", VARIADIC_MARKER], "Returns the smallest of its arguments."),
                F::builtin("MAX", &["number1", VARIADIC_MARKER], "Returns the largest of its arguments."),
                F::builtin("ROUND", &["number", "decimals"], "Rounds a number to the given number of decimal places."),
                F::builtin("ROUNDUP", &["number", "decimals"], "Rounds a number away from zero."),
                F::builtin("ROUNDDOWN", &["number", "decimals"], "Rounds a number towards zero."),
                F::builtin("ABS", &["number"], "Returns the absolute value of a number."),
                F::builtin("CEILING", &["number"], "Rounds a number up to the nearest integer."),
                F::builtin("FLOOR", &["number"], "Rounds a number down to the nearest integer."),
                F::builtin("POWER", &["base", "exponent"], "Raises a number to a power."),
                F::builtin("SQRT", &["number"], "Returns the positive square root of a number."),
                F::builtin("MOD", &["number", "divisor"], "Returns the remainder after division."),
                F::builtin(
                    "IF",
                    &["condition", "value_if_true", "value_if_false"],
                    "Returns one value when the condition holds and another when it does not.",
                ),
                F::builtin("TODAY", &[], "Returns the current date."),
                F::builtin("DATEDIFF", &["start_date", "end_date"], "Returns the number of days between two dates."),
            ],
        }
    }

    /// Build a registry from host-supplied descriptors.
    pub fn new(functions: Vec<FunctionDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for f in &functions {
            if !is_function_name(&f.name) {
                return Err(CatalogError::InvalidFunctionName {
                    name: f.name.clone(),
                });
            }
            if !seen.insert(f.name.as_str()) {
                return Err(CatalogError::DuplicateFunction {
                    name: f.name.clone(),
                });
            }
            let last = f.params.len().saturating_sub(1);
            if f.params.iter().enumerate().any(|(i, p)| p == VARIADIC_MARKER && i != last) {
                return Err(CatalogError::MisplacedVariadicMarker {
                    name: f.name.clone(),
                });
            }
        }
        Ok(Self { functions })
    }

    /// Load a registry from JSON (`[{ name, displaySignature, description, params }]`).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let functions: Vec<FunctionDescriptor> = serde_json::from_str(json)?;
        Self::new(functions)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        let upper = name.to_ascii_uppercase();
        self.functions.iter().find(|f| f.name == upper)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Functions whose name starts with `prefix` (case-insensitive), in table order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&FunctionDescriptor> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let upper = prefix.to_ascii_uppercase();
        self.functions
            .iter()
            .filter(|f| f.name.starts_with(&upper))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
