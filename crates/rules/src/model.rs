//! Rule model: conditions, actions and rules.
//!
//! All types (de)serialize to the rule payload consumed by the persistence
//! layer, with camelCase keys and snake_case operator/effect codes.

use crate::operators::{operators_for_field, Operator};
use pricing_logic_formula::{referenced_fields, FieldCatalog};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An id of a field, document or task; the host decides which form it uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetId {
    Int(i64),
    Str(String),
}

impl TargetId {
    /// String key used to look the id up in catalogs and name tables.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Int(id) => write!(f, "{}", id),
            TargetId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for TargetId {
    fn from(id: i64) -> Self {
        TargetId::Int(id)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        TargetId::Str(id.to_string())
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        TargetId::Str(id)
    }
}

/// How conditions are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Which value slot of a condition is in force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    #[default]
    Value,
    Field,
    Expression,
}

/// The value a condition or action compares against or assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSlot<'a> {
    /// The operator takes no value.
    None,
    Literal(&'a str),
    Field(Option<&'a TargetId>),
    Expression(Option<&'a str>),
}

/// One comparison on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: TargetId,
    pub operator: Operator,
    #[serde(default)]
    pub value_mode: ValueMode,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<TargetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<String>,
}

impl Condition {
    pub fn new(field: impl Into<TargetId>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value_mode: ValueMode::Value,
            value: String::new(),
            value_field: None,
            value_expression: None,
        }
    }

    /// Builder: literal comparison value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value_mode(ValueMode::Value);
        self.value = value.into();
        self
    }

    /// Builder: compare against another field.
    pub fn with_value_field(mut self, field: impl Into<TargetId>) -> Self {
        self.set_value_mode(ValueMode::Field);
        self.value_field = Some(field.into());
        self
    }

    /// Builder: compare against a canonical expression.
    pub fn with_value_expression(mut self, expression: impl Into<String>) -> Self {
        self.set_value_mode(ValueMode::Expression);
        self.value_expression = Some(expression.into());
        self
    }

    fn clear_values(&mut self) {
        self.value.clear();
        self.value_field = None;
        self.value_expression = None;
    }

    /// Point the condition at another field.
    ///
    /// When the current operator is not legal for the new field's type it is
    /// reset to the first legal operator and all values are cleared.
    pub fn set_field(&mut self, field: impl Into<TargetId>, catalog: &FieldCatalog) {
        self.field = field.into();
        let legal = operators_for_field(&self.field.key(), catalog);
        if !legal.contains(&self.operator) {
            self.operator = legal[0];
            self.clear_values();
        }
    }

    /// Change the operator; valueless operators clear every value slot.
    pub fn set_operator(&mut self, operator: Operator) {
        self.operator = operator;
        if operator.is_valueless() {
            self.clear_values();
        }
    }

    /// Change the value mode, clearing the slots that become inactive.
    pub fn set_value_mode(&mut self, mode: ValueMode) {
        self.value_mode = mode;
        if mode != ValueMode::Value {
            self.value.clear();
        }
        if mode != ValueMode::Field {
            self.value_field = None;
        }
        if mode != ValueMode::Expression {
            self.value_expression = None;
        }
    }

    /// The value slot currently in force.
    pub fn active_value(&self) -> ValueSlot<'_> {
        if self.operator.is_valueless() {
            return ValueSlot::None;
        }
        match self.value_mode {
            ValueMode::Value => ValueSlot::Literal(&self.value),
            ValueMode::Field => ValueSlot::Field(self.value_field.as_ref()),
            ValueMode::Expression => ValueSlot::Expression(self.value_expression.as_deref()),
        }
    }

    /// Field ids this condition reads, including those inside its expression.
    pub fn field_references(&self) -> Vec<String> {
        let mut refs = vec![self.field.key()];
        match self.active_value() {
            ValueSlot::Field(Some(field)) => refs.push(field.key()),
            ValueSlot::Expression(Some(expression)) => refs.extend(referenced_fields(expression)),
            _ => {}
        }
        refs
    }
}

/// Effect an action applies to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Visible,
    NotVisible,
    Required,
    NotRequired,
    Value,
    Field,
    Expression,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Visible => "visible",
            Effect::NotVisible => "not_visible",
            Effect::Required => "required",
            Effect::NotRequired => "not_required",
            Effect::Value => "value",
            Effect::Field => "field",
            Effect::Expression => "expression",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effects available to documents and tasks, which are toggled, never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleEffect {
    Visible,
    NotVisible,
    Required,
    NotRequired,
}

impl From<ToggleEffect> for Effect {
    fn from(effect: ToggleEffect) -> Self {
        match effect {
            ToggleEffect::Visible => Effect::Visible,
            ToggleEffect::NotVisible => Effect::NotVisible,
            ToggleEffect::Required => Effect::Required,
            ToggleEffect::NotRequired => Effect::NotRequired,
        }
    }
}

/// Behaviour shared by every action kind.
pub trait RuleAction {
    fn target(&self) -> &TargetId;

    fn effect(&self) -> Effect;

    /// Canonical expression assigned by this action, if any.
    fn expression(&self) -> Option<&str> {
        None
    }

    /// Catalog field ids this action touches.
    fn field_references(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Action on a deal input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputAction {
    pub target: TargetId,
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<TargetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<String>,
}

impl InputAction {
    pub fn new(target: impl Into<TargetId>, effect: Effect) -> Self {
        Self {
            target: target.into(),
            effect,
            value: String::new(),
            value_field: None,
            value_expression: None,
        }
    }

    /// Change the effect, clearing the slots the new effect does not use.
    pub fn set_effect(&mut self, effect: Effect) {
        self.effect = effect;
        if effect != Effect::Value {
            self.value.clear();
        }
        if effect != Effect::Field {
            self.value_field = None;
        }
        if effect != Effect::Expression {
            self.value_expression = None;
        }
    }

    pub fn active_value(&self) -> ValueSlot<'_> {
        match self.effect {
            Effect::Value => ValueSlot::Literal(&self.value),
            Effect::Field => ValueSlot::Field(self.value_field.as_ref()),
            Effect::Expression => ValueSlot::Expression(self.value_expression.as_deref()),
            _ => ValueSlot::None,
        }
    }
}

impl RuleAction for InputAction {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn effect(&self) -> Effect {
        self.effect
    }

    fn expression(&self) -> Option<&str> {
        match self.active_value() {
            ValueSlot::Expression(expression) => expression,
            _ => None,
        }
    }

    fn field_references(&self) -> Vec<String> {
        let mut refs = vec![self.target.key()];
        match self.active_value() {
            ValueSlot::Field(Some(field)) => refs.push(field.key()),
            ValueSlot::Expression(Some(expression)) => refs.extend(referenced_fields(expression)),
            _ => {}
        }
        refs
    }
}

/// Action on a required document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAction {
    pub target: TargetId,
    pub effect: ToggleEffect,
}

impl DocumentAction {
    pub fn new(target: impl Into<TargetId>, effect: ToggleEffect) -> Self {
        Self {
            target: target.into(),
            effect,
        }
    }
}

impl RuleAction for DocumentAction {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn effect(&self) -> Effect {
        self.effect.into()
    }
}

/// Action on a task template.
///
/// A required task may name the status it must reach and the stage it
/// blocks; both are dropped for any other effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAction {
    pub target: TargetId,
    pub effect: ToggleEffect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_id: Option<TargetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_for_stage_id: Option<TargetId>,
}

impl TaskAction {
    pub fn new(target: impl Into<TargetId>, effect: ToggleEffect) -> Self {
        Self {
            target: target.into(),
            effect,
            required_status_id: None,
            required_for_stage_id: None,
        }
    }

    pub fn set_effect(&mut self, effect: ToggleEffect) {
        self.effect = effect;
        if effect != ToggleEffect::Required {
            self.required_status_id = None;
            self.required_for_stage_id = None;
        }
    }
}

impl RuleAction for TaskAction {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn effect(&self) -> Effect {
        self.effect.into()
    }
}

/// "If conditions then actions".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
pub struct LogicRule<A> {
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<A>,
}

impl<A> Default for LogicRule<A> {
    fn default() -> Self {
        Self {
            combinator: Combinator::And,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }
}

impl<A> LogicRule<A> {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            ..Self::default()
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn remove_action(&mut self, index: usize) -> Option<A> {
        (index < self.actions.len()).then(|| self.actions.remove(index))
    }
}
