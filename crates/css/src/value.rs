//! Declaration values and property maps.

use common::{Result, StyleError, kind_of, value_to_css};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;

/// The value of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// A single value, e.g. `red`.
    Single(String),
    /// An ordered fallback chain; each entry becomes its own declaration line.
    Fallbacks(Vec<String>),
}

impl StyleValue {
    /// The declaration values in emission order.
    pub fn values(&self) -> &[String] {
        match self {
            StyleValue::Single(v) => std::slice::from_ref(v),
            StyleValue::Fallbacks(vs) => vs,
        }
    }

    /// Convert a JSON scalar or array into a value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => StyleValue::Fallbacks(items.iter().map(value_to_css).collect()),
            other => StyleValue::Single(value_to_css(other)),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(v: &str) -> Self {
        StyleValue::Single(v.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(v: String) -> Self {
        StyleValue::Single(v)
    }
}

impl From<i32> for StyleValue {
    fn from(v: i32) -> Self {
        StyleValue::Single(v.to_string())
    }
}

impl From<f64> for StyleValue {
    fn from(v: f64) -> Self {
        StyleValue::from_json(&Value::from(v))
    }
}

impl From<Vec<&str>> for StyleValue {
    fn from(vs: Vec<&str>) -> Self {
        StyleValue::Fallbacks(vs.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StyleValue {
    fn from(vs: [&str; N]) -> Self {
        StyleValue::Fallbacks(vs.into_iter().map(String::from).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sheet
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered map from camelCase property name to value.
///
/// Setting an existing property replaces its value in place, so the
/// declaration order is the order in which properties first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    entries: Vec<(String, StyleValue)>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Sheet::set`].
    pub fn with(mut self, property: &str, value: impl Into<StyleValue>) -> Self {
        self.set(property, value);
        self
    }

    pub fn set(&mut self, property: &str, value: impl Into<StyleValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == property) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((property.to_string(), value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&StyleValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a sheet from a JSON object, keeping key order.
    ///
    /// `null` properties are skipped, and so are nested objects: a plain map
    /// cannot declare child rules. Anything but an object is an invalid
    /// definition.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(StyleError::InvalidDefinition(kind_of(value)));
        };
        Ok(map
            .iter()
            .filter(|(name, v)| match v {
                Value::Null => false,
                Value::Object(_) => {
                    tracing::warn!(property = %name, "nested object in plain sheet ignored");
                    false
                }
                _ => true,
            })
            .map(|(k, v)| (k.clone(), StyleValue::from_json(v)))
            .collect())
    }
}

impl<K: Into<String>> FromIterator<(K, StyleValue)> for Sheet {
    fn from_iter<I: IntoIterator<Item = (K, StyleValue)>>(iter: I) -> Self {
        let mut sheet = Sheet::new();
        for (k, v) in iter {
            let name: String = k.into();
            sheet.set(&name, v);
        }
        sheet
    }
}

impl Serialize for Sheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// `fontSize` -> `font-size`, `WebkitTransform` -> `-webkit-transform`.
///
/// Custom properties (`--name`) are emitted verbatim.
pub fn kebab_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kebab() {
        assert_eq!(kebab_case("color"), "color");
        assert_eq!(kebab_case("fontSize"), "font-size");
        assert_eq!(kebab_case("WebkitTransform"), "-webkit-transform");
        assert_eq!(kebab_case("MsFlexAlign"), "-ms-flex-align");
        assert_eq!(kebab_case("--mainColor"), "--mainColor");
    }

    #[test]
    fn set_replaces_in_place() {
        let mut sheet = Sheet::new().with("color", "red").with("margin", 0);
        sheet.set("color", "blue");
        let names: Vec<_> = sheet.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["color", "margin"]);
        assert_eq!(sheet.get("color"), Some(&StyleValue::from("blue")));
    }

    #[test]
    fn from_json_keeps_order_and_expands_arrays() {
        let sheet = Sheet::from_json(&json!({
            "zIndex": 2,
            "background": ["red", "linear-gradient(red, blue)"],
            "color": null,
            "opacity": 0.5
        }))
        .unwrap();
        let entries: Vec<_> = sheet.iter().map(|(n, v)| (n, v.values().to_vec())).collect();
        assert_eq!(
            entries,
            vec![
                ("zIndex", vec!["2".to_string()]),
                (
                    "background",
                    vec!["red".to_string(), "linear-gradient(red, blue)".to_string()]
                ),
                ("opacity", vec!["0.5".to_string()]),
            ]
        );
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(matches!(
            Sheet::from_json(&json!("color: red")),
            Err(StyleError::InvalidDefinition("a string"))
        ));
        assert!(Sheet::from_json(&Value::Null).is_err());
    }

    #[test]
    fn from_json_skips_nested_objects() {
        let sheet = Sheet::from_json(&json!({"color": "red", ":hover": {"color": "blue"}})).unwrap();
        assert_eq!(sheet.len(), 1);
        assert!(sheet.get(":hover").is_none());
    }

    #[test]
    fn serializes_as_ordered_map() {
        let sheet = Sheet::new().with("width", "1px").with("font", ["a", "b"]);
        assert_eq!(
            serde_json::to_string(&sheet).unwrap(),
            r#"{"width":"1px","font":["a","b"]}"#
        );
    }
}
