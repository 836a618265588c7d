//! # Common Foundation Crate
//!
//! Shared error type and JSON prop helpers for the style engine crates.

#![forbid(unsafe_code)]

use serde_json::{Map, Value};

/// Props handed to style definitions: a JSON object keyed by prop name.
pub type Props = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// StyleError: top-level error type
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level error type that every style subsystem maps into.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// A definition was built from something that is neither a function nor an object.
    #[error("invalid style definition: expected an object, got {0}")]
    InvalidDefinition(&'static str),
    /// A named configuration factory was requested but never exposed.
    #[error("no configuration named `{0}` is exposed")]
    UnknownExposure(String),
    /// A configuration factory produced props that are not an object.
    #[error("configuration `{name}` produced {found} instead of an object")]
    InvalidProps { name: String, found: &'static str },
    /// Global configuration could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = StyleError> = std::result::Result<T, E>;

// ─────────────────────────────────────────────────────────────────────────────
// JSON helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Short name of a JSON value's kind, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recursively merge `source` into `target`.
///
/// Objects are merged key by key; any other value in `source` replaces the
/// one in `target`. `null` in `source` never overwrites an existing value.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_props(target, source),
        (_, Value::Null) => {}
        (target, source) => *target = source.clone(),
    }
}

/// [`deep_merge`] for two prop maps.
pub fn merge_props(target: &mut Props, source: &Props) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Render a scalar the way a declaration value is written into CSS text.
///
/// Whole floating point numbers drop their fraction (`12.0` becomes `12`),
/// arrays are joined with commas.
pub fn value_to_css(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
        }
        Value::Array(items) => items.iter().map(value_to_css).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
