//! Contradiction detection within one rule's actions.
//!
//! Actions are grouped by target. A target that is made both visible and not
//! visible, or both required and not required, by the same rule is reported.
//! Conditions, the combinator and other rules are not considered.

use crate::model::{Effect, RuleAction, TargetId};
use indexmap::IndexMap;
use pricing_logic_formula::FieldCatalog;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Resolves a target id to the name shown in warnings.
pub trait TargetNames {
    fn target_name(&self, id: &TargetId) -> Option<String>;
}

impl TargetNames for FieldCatalog {
    fn target_name(&self, id: &TargetId) -> Option<String> {
        self.get(&id.key()).map(|field| field.label.clone())
    }
}

impl TargetNames for HashMap<String, String> {
    fn target_name(&self, id: &TargetId) -> Option<String> {
        self.get(&id.key()).cloned()
    }
}

impl TargetNames for IndexMap<String, String> {
    fn target_name(&self, id: &TargetId) -> Option<String> {
        self.get(&id.key()).cloned()
    }
}

/// Which pair of opposite effects collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    Visibility,
    Requirement,
}

/// Two actions in one rule applying opposite effects to the same target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contradiction {
    pub target: TargetId,
    pub target_name: String,
    pub kind: ContradictionKind,
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ContradictionKind::Visibility => write!(
                f,
                "\"{}\" is set to both Visible and Not Visible.",
                self.target_name
            ),
            ContradictionKind::Requirement => write!(
                f,
                "\"{}\" is set to both Required and Not Required.",
                self.target_name
            ),
        }
    }
}

/// Find contradictions among `actions`, in order of each target's first action.
///
/// Unknown targets are named by their raw id.
pub fn detect_contradictions<A, N>(actions: &[A], names: &N) -> Vec<Contradiction>
where
    A: RuleAction,
    N: TargetNames + ?Sized,
{
    let mut by_target: IndexMap<&TargetId, HashSet<Effect>> = IndexMap::new();
    for action in actions {
        by_target
            .entry(action.target())
            .or_default()
            .insert(action.effect());
    }

    let mut found = Vec::new();
    for (target, effects) in by_target {
        let pairs = [
            (Effect::Visible, Effect::NotVisible, ContradictionKind::Visibility),
            (Effect::Required, Effect::NotRequired, ContradictionKind::Requirement),
        ];
        for (on, off, kind) in pairs {
            if effects.contains(&on) && effects.contains(&off) {
                found.push(Contradiction {
                    target: target.clone(),
                    target_name: names.target_name(target).unwrap_or_else(|| target.key()),
                    kind,
                });
            }
        }
    }
    found
}

/// Warning strings for `actions`; empty when the rule may be saved.
pub fn contradiction_warnings<A, N>(actions: &[A], names: &N) -> Vec<String>
where
    A: RuleAction,
    N: TargetNames + ?Sized,
{
    detect_contradictions(actions, names)
        .iter()
        .map(Contradiction::to_string)
        .collect()
}
