//! WebAssembly bindings for the formula editor.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { validate_expression, parse_expression, resolve_overlay } from './pricing_logic_formula.js';
//!
//! await init();
//!
//! const diagnostic = validate_expression("ROUND({f_rate})");
//! // { code: "too_few_arguments", message: "ROUND() requires 2 arguments, got 1", start: 0, end: 15 }
//!
//! const segments = parse_expression("{f_rate} * 2");
//! const overlay = resolve_overlay("1 + @ra", 7, fields);
//! ```
//!
//! Offsets crossing this boundary are UTF-16 code units, the unit of
//! JavaScript string indices and `selectionStart`.

use crate::catalog::{Field, FieldCatalog};
use crate::completion::caret_for_offset;
use crate::functions::FunctionRegistry;
use crate::segment::{utf16_to_char, Buffer, Segment};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Validate a canonical expression against the built-in functions.
///
/// # Returns
/// * `null` when the expression is valid
/// * A diagnostic object `{ code, message, start, end }` otherwise, with
///   `start`/`end` in UTF-16 code units
#[wasm_bindgen]
pub fn validate_expression(expression: &str) -> Result<JsValue, JsValue> {
    match crate::diagnose(expression, &FunctionRegistry::builtin()) {
        Some(diagnostic) => to_js(&diagnostic.to_utf16(expression)),
        None => Ok(JsValue::NULL),
    }
}

/// Parse a canonical expression into its normalized segment list.
#[wasm_bindgen]
pub fn parse_expression(expression: &str) -> Result<JsValue, JsValue> {
    to_js(&Buffer::parse(expression))
}

/// Serialize a segment list (as returned by `parse_expression`) to the canonical string.
#[wasm_bindgen]
pub fn serialize_expression(segments: JsValue) -> Result<String, JsValue> {
    let segments: Vec<Segment> = serde_wasm_bindgen::from_value(segments)
        .map_err(|e| JsValue::from_str(&format!("Failed to deserialize segments: {}", e)))?;
    Ok(Buffer::from_segments(segments).serialize())
}

/// Resolve the autocomplete overlay for a caret `caret` UTF-16 code units into `expression`.
///
/// # Arguments
/// * `expression` - The canonical expression being edited
/// * `caret` - UTF-16 offset of the caret in `expression`
/// * `fields` - Array of `{ id, label, type, options? }`
#[wasm_bindgen]
pub fn resolve_overlay(expression: &str, caret: usize, fields: JsValue) -> Result<JsValue, JsValue> {
    let fields: Vec<Field> = serde_wasm_bindgen::from_value(fields)
        .map_err(|e| JsValue::from_str(&format!("Failed to deserialize fields: {}", e)))?;
    let catalog = FieldCatalog::new(fields).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let buffer = Buffer::parse(expression);
    let overlay = crate::resolve_overlay(
        &buffer,
        caret_for_offset(expression, utf16_to_char(expression, caret)),
        &catalog,
        &FunctionRegistry::builtin(),
    );
    to_js(&overlay)
}

/// Get the version of the formula crate.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
