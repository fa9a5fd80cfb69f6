//! Field references made by rules.
//!
//! Rules refer to catalog fields by id in three places: the field a condition
//! tests, a compared or assigned field, and `{fieldId}` placeholders inside
//! expressions. Input actions also target a field directly.

use crate::model::{LogicRule, RuleAction};
use pricing_logic_formula::FieldCatalog;
use serde::Serialize;

/// Where in a rule a field id was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceSite {
    Condition { index: usize },
    Action { index: usize },
}

/// One field id used by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub rule_index: usize,
    pub site: ReferenceSite,
    pub field_id: String,
}

/// Every field reference in `rules`, in rule, condition, action order.
pub fn extract_field_references<A: RuleAction>(rules: &[LogicRule<A>]) -> Vec<FieldReference> {
    let mut refs = Vec::new();
    for (rule_index, rule) in rules.iter().enumerate() {
        for (index, condition) in rule.conditions.iter().enumerate() {
            for field_id in condition.field_references() {
                refs.push(FieldReference {
                    rule_index,
                    site: ReferenceSite::Condition { index },
                    field_id,
                });
            }
        }
        for (index, action) in rule.actions.iter().enumerate() {
            for field_id in action.field_references() {
                refs.push(FieldReference {
                    rule_index,
                    site: ReferenceSite::Action { index },
                    field_id,
                });
            }
        }
    }
    refs
}

/// Distinct field ids referenced by `rules` that `catalog` no longer has.
///
/// Stale ids only degrade display, so this is informational.
pub fn unresolved_fields<A: RuleAction>(
    rules: &[LogicRule<A>],
    catalog: &FieldCatalog,
) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for reference in extract_field_references(rules) {
        if !catalog.contains(&reference.field_id) && !missing.contains(&reference.field_id) {
            log::warn!(
                "rule {} references field {:?} missing from the catalog",
                reference.rule_index,
                reference.field_id
            );
            missing.push(reference.field_id);
        }
    }
    missing
}
