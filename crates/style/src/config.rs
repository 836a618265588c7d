//! Global configuration shared by every definition invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use common::{Props, Result, merge_props};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Strip all separator whitespace from rendered CSS.
    pub minify: bool,
    /// Precede each scoped class with its `_<token>` marker form.
    pub keep_original_class_names: bool,
}

impl Config {
    /// Decode from camelCase JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// A derived prop computed from the merged props before a definition runs.
///
/// A `Group` evaluates to an object with one entry per member.
#[derive(Clone)]
pub enum Extension {
    Function(Rc<dyn Fn(&Props) -> Value>),
    Group(BTreeMap<String, Extension>),
}

impl Extension {
    pub fn function(f: impl Fn(&Props) -> Value + 'static) -> Self {
        Extension::Function(Rc::new(f))
    }

    pub fn evaluate(&self, props: &Props) -> Value {
        match self {
            Extension::Function(f) => f(props),
            Extension::Group(members) => Value::Object(
                members
                    .iter()
                    .map(|(name, ext)| (name.clone(), ext.evaluate(props)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extension::Function(_) => f.write_str("Extension::Function(..)"),
            Extension::Group(members) => f.debug_map().entries(members.iter()).finish(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Globals
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a manager hands down to its styles and sessions.
///
/// Sessions and styles keep their own `Rc<Globals>` snapshot; changing the
/// manager's globals later does not affect them.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub config: Config,
    pub dependencies: Props,
    pub extensions: BTreeMap<String, Extension>,
}

impl Globals {
    /// Deep-merge `dependencies` into the current ones.
    pub fn merge_dependencies(&mut self, dependencies: &Props) {
        merge_props(&mut self.dependencies, dependencies);
    }

    /// Add `extensions`, replacing same-named ones.
    pub fn merge_extensions(&mut self, extensions: BTreeMap<String, Extension>) {
        self.extensions.extend(extensions);
    }

    /// The ambient `theme` dependency, if any.
    pub fn theme(&self) -> Option<&Value> {
        self.dependencies.get("theme")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_from_camel_case() {
        let config = Config::from_json(r#"{"keepOriginalClassNames": true}"#).unwrap();
        assert_eq!(
            config,
            Config {
                minify: false,
                keep_original_class_names: true
            }
        );
    }

    #[test]
    fn config_rejects_bad_json() {
        let err = Config::from_json(r#"{"minify": "yes"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn extension_groups_nest() {
        let mut members = BTreeMap::new();
        members.insert(
            "double".to_string(),
            Extension::function(|p| json!(p["n"].as_i64().unwrap_or(0) * 2)),
        );
        members.insert("fixed".to_string(), Extension::function(|_| json!("x")));
        let group = Extension::Group(members);

        let mut props = Props::new();
        props.insert("n".into(), json!(21));
        assert_eq!(group.evaluate(&props), json!({"double": 42, "fixed": "x"}));
    }

    #[test]
    fn dependencies_deep_merge() {
        let mut globals = Globals::default();
        let Value::Object(first) = json!({"theme": {"primary": "red", "spacing": 4}}) else {
            unreachable!()
        };
        let Value::Object(second) = json!({"theme": {"primary": "blue"}, "rtl": false}) else {
            unreachable!()
        };
        globals.merge_dependencies(&first);
        globals.merge_dependencies(&second);
        assert_eq!(globals.theme(), Some(&json!({"primary": "blue", "spacing": 4})));
        assert_eq!(globals.dependencies.get("rtl"), Some(&json!(false)));
    }
}
