//! A screen's rule set and the save gate.
//!
//! Rules for one input, document or task are saved as a whole: the payload
//! replaces every rule currently scoped to that target. Saving is refused
//! while any rule contains contradictory actions; formula errors and stale
//! field references are reported but never block.

use crate::contradictions::{contradiction_warnings, TargetNames};
use crate::dependencies::{self, FieldReference};
use crate::error::RulesError;
use crate::model::{LogicRule, RuleAction, TargetId, ValueSlot};
use pricing_logic_formula::{diagnose, Diagnostic, FieldCatalog, FunctionRegistry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Contradiction warnings for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWarnings {
    pub rule_index: usize,
    pub warnings: Vec<String>,
}

/// Where a formula lives inside a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpressionSite {
    Condition { index: usize },
    Action { index: usize },
}

/// A validator error attached to one expression slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaDiagnostic {
    pub rule_index: usize,
    pub site: ExpressionSite,
    pub expression: String,
    pub diagnostic: Diagnostic,
}

/// Rules for one screen, optionally scoped to a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet<A> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<TargetId>,
    pub rules: Vec<LogicRule<A>>,
}

/// The delete-then-reinsert payload handed to persistence.
pub type SavePayload<A> = RuleSet<A>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<A> {
    Scoped(RuleSet<A>),
    Bare(Vec<LogicRule<A>>),
}

impl<A> Default for RuleSet<A> {
    fn default() -> Self {
        Self {
            scope_id: None,
            rules: Vec::new(),
        }
    }
}

impl<A> RuleSet<A> {
    pub fn new(rules: Vec<LogicRule<A>>) -> Self {
        Self {
            scope_id: None,
            rules,
        }
    }

    pub fn scoped(scope_id: impl Into<TargetId>, rules: Vec<LogicRule<A>>) -> Self {
        Self {
            scope_id: Some(scope_id.into()),
            rules,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<A: DeserializeOwned> RuleSet<A> {
    /// Decode either `{ scopeId?, rules }` or a bare array of rules.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        Ok(match serde_json::from_str::<Payload<A>>(json)? {
            Payload::Scoped(set) => set,
            Payload::Bare(rules) => Self::new(rules),
        })
    }
}

impl<A: RuleAction> RuleSet<A> {
    /// Warnings for every rule that has any, keeping all of them.
    pub fn contradictions<N: TargetNames + ?Sized>(&self, names: &N) -> Vec<RuleWarnings> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(rule_index, rule)| {
                let warnings = contradiction_warnings(&rule.actions, names);
                (!warnings.is_empty()).then_some(RuleWarnings {
                    rule_index,
                    warnings,
                })
            })
            .collect()
    }

    /// Validator errors for every expression slot in force.
    pub fn formula_diagnostics(&self, registry: &FunctionRegistry) -> Vec<FormulaDiagnostic> {
        let mut found = Vec::new();
        for (rule_index, rule) in self.rules.iter().enumerate() {
            let conditions = rule.conditions.iter().enumerate().filter_map(|(index, c)| {
                match c.active_value() {
                    ValueSlot::Expression(Some(expr)) => {
                        Some((ExpressionSite::Condition { index }, expr))
                    }
                    _ => None,
                }
            });
            let actions = rule
                .actions
                .iter()
                .enumerate()
                .filter_map(|(index, a)| Some((ExpressionSite::Action { index }, a.expression()?)));

            for (site, expression) in conditions.chain(actions) {
                if let Some(diagnostic) = diagnose(expression, registry) {
                    found.push(FormulaDiagnostic {
                        rule_index,
                        site,
                        expression: expression.to_string(),
                        diagnostic,
                    });
                }
            }
        }
        found
    }

    /// Every field reference made by the rules.
    pub fn field_references(&self) -> Vec<FieldReference> {
        dependencies::extract_field_references(&self.rules)
    }

    /// Field ids the catalog no longer has.
    pub fn unresolved_fields(&self, catalog: &FieldCatalog) -> Vec<String> {
        dependencies::unresolved_fields(&self.rules, catalog)
    }

    /// Check the save gate and produce the persistence payload.
    pub fn prepare_save<N: TargetNames + ?Sized>(
        &self,
        names: &N,
    ) -> Result<SavePayload<A>, RulesError>
    where
        A: Clone,
    {
        let warnings = self.contradictions(names);
        if !warnings.is_empty() {
            log::debug!(
                "save blocked for scope {:?}: {} rule(s) with contradictions",
                self.scope_id,
                warnings.len()
            );
            return Err(RulesError::SaveBlocked { warnings });
        }
        Ok(self.clone())
    }
}
