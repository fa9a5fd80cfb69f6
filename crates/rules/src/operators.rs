//! Operator catalog for rule conditions.
//!
//! The operators legal for a field are layered by type: every field gets the
//! common set, and text, numeric, date and boolean fields each add their own
//! comparisons on top. A field whose type is unknown, or which is missing from
//! the catalog, gets the common set only.

use pricing_logic_formula::{FieldCatalog, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A comparison operator, serialized as its snake_case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // Common
    Exists,
    DoesNotExist,
    IsEmpty,
    IsNotEmpty,
    Equals,
    NotEquals,

    // Text and dropdown
    Contains,
    DoesNotContain,
    StartsWith,
    DoesNotStartWith,
    EndsWith,
    DoesNotEndWith,

    // Number, currency and percentage
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,

    // Date
    IsAfter,
    IsBefore,
    IsAfterOrEqual,
    IsBeforeOrEqual,

    // Boolean
    IsTrue,
    IsFalse,
}

const COMMON: &[Operator] = &[
    Operator::Exists,
    Operator::DoesNotExist,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
    Operator::Equals,
    Operator::NotEquals,
];

const TEXT: &[Operator] = &[
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::StartsWith,
    Operator::DoesNotStartWith,
    Operator::EndsWith,
    Operator::DoesNotEndWith,
];

const NUMERIC: &[Operator] = &[
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterThanOrEqual,
    Operator::LessThanOrEqual,
];

const DATE: &[Operator] = &[
    Operator::IsAfter,
    Operator::IsBefore,
    Operator::IsAfterOrEqual,
    Operator::IsBeforeOrEqual,
];

const BOOLEAN: &[Operator] = &[Operator::IsTrue, Operator::IsFalse];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Exists => "exists",
            Operator::DoesNotExist => "does_not_exist",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::StartsWith => "starts_with",
            Operator::DoesNotStartWith => "does_not_start_with",
            Operator::EndsWith => "ends_with",
            Operator::DoesNotEndWith => "does_not_end_with",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::LessThanOrEqual => "less_than_or_equal",
            Operator::IsAfter => "is_after",
            Operator::IsBefore => "is_before",
            Operator::IsAfterOrEqual => "is_after_or_equal",
            Operator::IsBeforeOrEqual => "is_before_or_equal",
            Operator::IsTrue => "is_true",
            Operator::IsFalse => "is_false",
        }
    }

    /// Operators that take no comparison value.
    pub fn is_valueless(&self) -> bool {
        matches!(
            self,
            Operator::Exists
                | Operator::DoesNotExist
                | Operator::IsEmpty
                | Operator::IsNotEmpty
                | Operator::IsTrue
                | Operator::IsFalse
        )
    }

    /// Whether this operator may be used on a field of type `field_type`.
    pub fn is_legal_for(&self, field_type: FieldType) -> bool {
        type_layer(field_type)
            .iter()
            .chain(COMMON)
            .any(|op| op == self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn type_layer(field_type: FieldType) -> &'static [Operator] {
    match field_type {
        FieldType::Text | FieldType::Dropdown => TEXT,
        numeric if numeric.is_numeric() => NUMERIC,
        FieldType::Date => DATE,
        FieldType::Boolean => BOOLEAN,
        _ => &[],
    }
}

/// Ordered operator list for a field type: the common set, then the type's own.
pub fn operators_for(field_type: FieldType) -> Vec<Operator> {
    COMMON
        .iter()
        .chain(type_layer(field_type))
        .copied()
        .collect()
}

/// Operators for the field `field_id`; the common set if it is not in `catalog`.
pub fn operators_for_field(field_id: &str, catalog: &FieldCatalog) -> Vec<Operator> {
    operators_for(catalog.type_of(field_id).unwrap_or(FieldType::Unknown))
}
