//! Field catalog supplied by the host.
//!
//! The catalog is read-only to this crate. Fields are identified by their
//! opaque `id`; the `label` is display-only and may change upstream without
//! invalidating stored expressions.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The type tag of a field.
///
/// Unrecognised tags deserialize to [`FieldType::Unknown`] so that a catalog
/// produced by a newer host still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Dropdown,
    Number,
    Currency,
    Percentage,
    Date,
    Boolean,
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// The wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Dropdown => "dropdown",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Percentage => "percentage",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Unknown => "unknown",
        }
    }

    /// Parse a wire name, falling back to [`FieldType::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "text" => FieldType::Text,
            "dropdown" => FieldType::Dropdown,
            "number" => FieldType::Number,
            "currency" => FieldType::Currency,
            "percentage" => FieldType::Percentage,
            "date" => FieldType::Date,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Unknown,
        }
    }

    /// Whether values of this type take part in arithmetic.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency | FieldType::Percentage)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed deal attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Field {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            options: None,
        }
    }

    /// Attach dropdown options.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Case-insensitive match of `query` against the id or the label.
    ///
    /// An empty query matches every field.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.id.to_lowercase().contains(&needle) || self.label.to_lowercase().contains(&needle)
    }
}

/// Ordered set of fields available to expressions and rule conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<Field>,
}

impl FieldCatalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn new(fields: Vec<Field>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.id.as_str()) {
                return Err(CatalogError::DuplicateField {
                    id: field.id.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// Load the host's field list from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let fields: Vec<Field> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    pub fn get(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Display label for `id`, degrading to the raw id when the field is gone.
    pub fn label_or_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|f| f.label.as_str()).unwrap_or(id)
    }

    /// Type of the field `id`, if it is still in the catalog.
    pub fn type_of(&self, id: &str) -> Option<FieldType> {
        self.get(id).map(|f| f.field_type)
    }

    /// Fields matching a mention query, in catalog order.
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.matches_query(query))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldCatalog {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            Field::new("f_loan_amount", "Loan Amount", FieldType::Currency),
            Field::new("f_rate", "Rate", FieldType::Percentage),
            Field::new("f_product", "Product", FieldType::Dropdown).with_options(["Bridge", "Term"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_search_matches_id_and_label_case_insensitively() {
        let cat = catalog();
        let ids: Vec<_> = cat.search("LOAN").map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f_loan_amount"]);

        let ids: Vec<_> = cat.search("f_r").map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f_rate"]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert_eq!(catalog().search("").count(), 3);
    }

    #[test]
    fn test_label_falls_back_to_raw_id() {
        let cat = catalog();
        assert_eq!(cat.label_or_id("f_rate"), "Rate");
        assert_eq!(cat.label_or_id("f_deleted"), "f_deleted");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = FieldCatalog::new(vec![
            Field::new("a", "A", FieldType::Text),
            Field::new("a", "Again", FieldType::Number),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateField { id } if id == "a"));
    }

    #[test]
    fn test_unknown_type_tag_loads() {
        let cat = FieldCatalog::from_json(
            r#"[{"id": "x", "label": "X", "type": "signature"},
                {"id": "p", "label": "P", "type": "dropdown", "options": ["a", "b"]}]"#,
        )
        .unwrap();
        assert_eq!(cat.type_of("x"), Some(FieldType::Unknown));
        assert_eq!(cat.get("p").and_then(|f| f.options.clone()).map(|o| o.len()), Some(2));
    }
}
