//! WebAssembly bindings for rule authoring.
//!
//! The start hook and `version` come from the formula crate's bindings,
//! which this feature enables.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! const ops = operators_for_type("currency");
//! // ["exists", "does_not_exist", ..., "less_than_or_equal"]
//!
//! const warnings = detect_rule_contradictions(rule, "document", { "5": "Bank Statement" });
//! ```

use crate::contradictions::contradiction_warnings;
use crate::model::{DocumentAction, InputAction, LogicRule, TaskAction};
use crate::operators::operators_for;
use pricing_logic_formula::FieldType;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to deserialize {}: {}", what, e)))
}

/// Operator codes legal for a field type name; unknown names get the common set.
#[wasm_bindgen]
pub fn operators_for_type(field_type: &str) -> Vec<String> {
    operators_for(FieldType::from_name(field_type))
        .into_iter()
        .map(|op| op.as_str().to_string())
        .collect()
}

/// Contradiction warnings for one rule.
///
/// # Arguments
/// * `rule` - The rule object `{ combinator, conditions, actions }`
/// * `kind` - `"input"`, `"document"` or `"task"`
/// * `names` - Object mapping target ids to display names (may be empty)
#[wasm_bindgen]
pub fn detect_rule_contradictions(
    rule: JsValue,
    kind: &str,
    names: JsValue,
) -> Result<Vec<String>, JsValue> {
    let names: HashMap<String, String> = if names.is_undefined() || names.is_null() {
        HashMap::new()
    } else {
        from_js(names, "names")?
    };

    let warnings = match kind {
        "input" => {
            let rule: LogicRule<InputAction> = from_js(rule, "rule")?;
            contradiction_warnings(&rule.actions, &names)
        }
        "document" => {
            let rule: LogicRule<DocumentAction> = from_js(rule, "rule")?;
            contradiction_warnings(&rule.actions, &names)
        }
        "task" => {
            let rule: LogicRule<TaskAction> = from_js(rule, "rule")?;
            contradiction_warnings(&rule.actions, &names)
        }
        other => return Err(JsValue::from_str(&format!("Unknown rule kind: {}", other))),
    };
    Ok(warnings)
}
