//! # pricing-logic-formula
//!
//! Editing, validation and autocomplete for deal-pricing formulas.
//!
//! A formula is stored as a *canonical expression string* in which every
//! field reference is written as `{fieldId}`:
//!
//! ```text
//! {f_loan_amount} * 0.01 + ROUND({f_rate}, 2)
//! ```
//!
//! While editing, the same formula lives in a [`Buffer`] of text and
//! reference segments so that a reference can be shown as a labelled chip and
//! deleted as one unit. This crate provides:
//!
//! - **Segment buffer** with a lossless round trip to the canonical string
//! - **Tokenizing validator** with the exact user-facing messages
//! - **Autocomplete** for `@` mentions, function names and signature hints
//! - **Editor model** with caret navigation over atomic references
//! - **WASM bindings** for browser hosts
//!
//! ## Quick Start
//!
//! ```rust
//! use pricing_logic_formula::{validate, Buffer, FunctionRegistry};
//!
//! let registry = FunctionRegistry::builtin();
//! let buffer = Buffer::parse("{f_loan_amount} * 0.01 + ROUND({f_rate}, 2)");
//!
//! assert!(validate(&buffer.serialize(), &registry).is_ok());
//!
//! let err = validate("ROUND({f_rate})", &registry).unwrap_err();
//! assert_eq!(err.to_string(), "ROUND() requires 2 arguments, got 1");
//! ```
//!
//! ## Autocomplete
//!
//! ```rust
//! use pricing_logic_formula::{
//!     ExpressionEditor, Field, FieldCatalog, FieldType, FunctionRegistry, Overlay,
//! };
//!
//! let catalog = FieldCatalog::new(vec![
//!     Field::new("f_rate", "Rate", FieldType::Percentage),
//! ]).unwrap();
//! let registry = FunctionRegistry::builtin();
//!
//! let mut editor = ExpressionEditor::new();
//! editor.insert_text("1 + @ra");
//! assert!(matches!(editor.overlay(&catalog, &registry), Overlay::MentionMenu { .. }));
//!
//! editor.accept_mention("f_rate");
//! assert_eq!(editor.expression(), "1 + {f_rate}");
//! ```
//!
//! ## Module Overview
//!
//! - [`segment`] - Segment buffer, normalization and the canonical string codec
//! - [`lexer`] - Token stream over canonical strings using chumsky combinators
//! - [`validation`] - Syntax validator
//! - [`completion`] - Overlay resolution and signature hints
//! - [`editor`] - Caret-aware editing session
//! - [`functions`] / [`catalog`] - Host-supplied configuration
//! - [`error`] - Error types with pretty printing via ariadne
//!
//! ## Feature Flags
//!
//! - `wasm` - Enable WebAssembly bindings for browser use

pub mod catalog;
pub mod completion;
pub mod editor;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod segment;
pub mod validation;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use catalog::{Field, FieldCatalog, FieldType};
pub use completion::{detect_active_function, resolve_overlay, Overlay, SignatureHint};
pub use editor::ExpressionEditor;
pub use error::{CatalogError, ErrorReporter, FormulaError};
pub use functions::{FunctionDescriptor, FunctionRegistry, VARIADIC_MARKER};
pub use segment::{normalize, referenced_fields, render_with_labels, Buffer, Caret, Segment};
pub use validation::{diagnose, validate, validate_builtin, Diagnostic};
