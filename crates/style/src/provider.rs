//! Rule tree nodes.
//!
//! A [`Provider`] is one selector plus the property map its definition
//! returned, with the nested providers the definition registered. Providers
//! are immutable once built: reconfiguring a style always builds a new tree.

use std::cell::RefCell;
use std::rc::Rc;

use common::{Props, deep_merge};
use css::{Sheet, class_tokens, hash_selector};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

use crate::config::Globals;
use crate::definition::{Definition, Exposure, RuleContext};
use crate::descriptor::{CompositeId, Descriptor};

/// Named configuration factories installed on one owner.
pub(crate) type Exposures = FxHashMap<String, Exposure>;

// ─────────────────────────────────────────────────────────────────────────────
// BuildScope: what every provider of one tree shares while it is built
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct BuildScope {
    globals: Rc<Globals>,
    owner: CompositeId,
    exposures: RefCell<Exposures>,
}

impl BuildScope {
    pub(crate) fn new(globals: Rc<Globals>, owner: CompositeId) -> Rc<Self> {
        Rc::new(Self {
            globals,
            owner,
            exposures: RefCell::new(Exposures::default()),
        })
    }

    pub(crate) fn expose(&self, name: &str, exposure: Exposure) {
        self.exposures.borrow_mut().insert(name.to_string(), exposure);
    }

    /// Factories exposed by the definitions evaluated in this scope.
    pub(crate) fn take_exposures(&self) -> Exposures {
        self.exposures.take()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

pub struct Provider {
    id: CompositeId,
    selector: Option<String>,
    definition: Definition,
    stylesheet: Sheet,
    children: Vec<Rc<Provider>>,
    class_tokens: Vec<String>,
}

impl Provider {
    /// Evaluate `definition` once and record the nested rules it registers.
    pub(crate) fn build(
        scope: &Rc<BuildScope>,
        selector: Option<&str>,
        definition: &Definition,
        props: &Props,
    ) -> Rc<Provider> {
        let props = merged_props(&scope.globals, props);
        let mut ctx = RuleContext::new(props, scope.clone());
        let stylesheet = definition.evaluate(&mut ctx);
        tracing::trace!(owner = %scope.owner, selector, "built provider");

        Rc::new(Provider {
            id: scope.owner,
            selector: selector.map(str::to_string),
            definition: definition.clone(),
            stylesheet,
            children: ctx.into_children(),
            class_tokens: selector.map(class_tokens).unwrap_or_default(),
        })
    }

    pub fn id(&self) -> CompositeId {
        self.id
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn stylesheet(&self) -> &Sheet {
        &self.stylesheet
    }

    pub fn children(&self) -> &[Rc<Provider>] {
        &self.children
    }

    pub fn class_tokens(&self) -> &[String] {
        &self.class_tokens
    }

    pub fn hashed_selector(&self) -> Option<String> {
        self.selector.as_deref().map(|s| hash_selector(s, &self.id))
    }

    /// Snapshot this tree.
    ///
    /// `candidates` are the root providers of configurations waiting for a
    /// place to render. Those built from this provider's exact definition
    /// become its siblings; the rest are handed down to the siblings and
    /// children.
    pub fn descriptor(&self, candidates: &[Rc<Provider>]) -> Descriptor {
        let (used, unused): (Vec<_>, Vec<_>) = candidates
            .iter()
            .cloned()
            .partition(|candidate| candidate.definition.ptr_eq(&self.definition));

        Descriptor {
            id: self.id,
            selector: self.hashed_selector(),
            stylesheet: (!self.stylesheet.is_empty()).then(|| self.stylesheet.clone()),
            siblings: used.iter().map(|s| s.descriptor(&unused)).collect(),
            children: self.children.iter().map(|c| c.descriptor(&unused)).collect(),
        }
    }

    /// Collect the scoped forms of requested classes declared in this tree.
    ///
    /// Pre-order; a definition contributes at most once per lookup.
    pub(crate) fn collect_classes(&self, lookup: &mut ClassLookup<'_>) {
        if !self.class_tokens.is_empty() && !lookup.used_definitions.contains(&self.definition.key()) {
            let matched: Vec<&String> = self
                .class_tokens
                .iter()
                .filter(|token| lookup.requested.contains(&token.as_str()))
                .collect();
            if !matched.is_empty() {
                lookup.used_definitions.insert(self.definition.key());
                for token in matched {
                    lookup.used.push(token.clone());
                    lookup.result.push(if lookup.keep_original {
                        format!("_{token} {token}_{}", self.id)
                    } else {
                        format!("{token}_{}", self.id)
                    });
                }
            }
        }
        for child in &self.children {
            child.collect_classes(lookup);
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("selector", &self.selector)
            .field("stylesheet", &self.stylesheet)
            .field("children", &self.children)
            .finish()
    }
}

/// Dependencies, then explicit props, then the theme deep-merged over the
/// ambient one, then one entry per extension.
fn merged_props(globals: &Globals, explicit: &Props) -> Props {
    let mut props = globals.dependencies.clone();
    for (name, value) in explicit {
        if name != "theme" {
            props.insert(name.clone(), value.clone());
        }
    }

    if let Some(theme) = explicit.get("theme").filter(|t| !t.is_null()) {
        let mut merged = globals
            .theme()
            .cloned()
            .unwrap_or_else(|| Value::Object(Props::new()));
        deep_merge(&mut merged, theme);
        props.insert("theme".to_string(), merged);
    }

    if !globals.extensions.is_empty() {
        let derived: Vec<(String, Value)> = globals
            .extensions
            .iter()
            .map(|(name, extension)| (name.clone(), extension.evaluate(&props)))
            .collect();
        props.extend(derived);
    }
    props
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassLookup
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulator for one class-name resolution.
pub(crate) struct ClassLookup<'a> {
    requested: Vec<&'a str>,
    keep_original: bool,
    used_definitions: FxHashSet<usize>,
    used: Vec<String>,
    result: Vec<String>,
}

impl<'a> ClassLookup<'a> {
    pub(crate) fn new(requested: Vec<&'a str>, keep_original: bool) -> Self {
        Self {
            requested,
            keep_original,
            used_definitions: FxHashSet::default(),
            used: Vec::new(),
            result: Vec::new(),
        }
    }

    /// Scoped classes first, then unmatched requests as given, without duplicates.
    pub(crate) fn finish(self) -> String {
        let extras = self
            .requested
            .iter()
            .filter(|r| !self.used.iter().any(|u| u == *r))
            .map(|r| r.to_string());
        let mut out: Vec<String> = Vec::new();
        for class in self.result.into_iter().chain(extras) {
            if !out.contains(&class) {
                out.push(class);
            }
        }
        out.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scope(owner: CompositeId) -> Rc<BuildScope> {
        BuildScope::new(Rc::new(Globals::default()), owner)
    }

    fn props(value: Value) -> Props {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn records_nested_rules() {
        let definition = Definition::new(|ctx| {
            ctx.css(".btn", Sheet::new().with("color", "red"));
            ctx.css(".btn:hover", Sheet::new().with("color", "blue"));
            Sheet::new()
        });
        let root = Provider::build(&scope(CompositeId::style(0)), None, &definition, &Props::new());
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[1].selector(), Some(".btn:hover"));
        assert_eq!(root.children()[1].class_tokens(), ["btn"]);
        assert!(root.class_tokens().is_empty());
    }

    #[test]
    fn definition_runs_once_per_build() {
        let calls = Rc::new(std::cell::Cell::new(0));
        let counter = calls.clone();
        let definition = Definition::new(move |_| {
            counter.set(counter.get() + 1);
            Sheet::new()
        });
        Provider::build(&scope(CompositeId::style(0)), None, &definition, &Props::new());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn theme_deep_merges_over_dependencies() {
        let mut globals = Globals::default();
        globals.merge_dependencies(&props(json!({
            "theme": {"color": "red", "font": {"size": 12, "family": "serif"}},
            "unit": "px"
        })));
        let scope = BuildScope::new(Rc::new(globals), CompositeId::style(0));

        let seen = Rc::new(RefCell::new(Props::new()));
        let sink = seen.clone();
        let definition = Definition::new(move |ctx| {
            *sink.borrow_mut() = ctx.props().clone();
            Sheet::new()
        });
        Provider::build(
            &scope,
            None,
            &definition,
            &props(json!({"theme": {"font": {"size": 14}}, "unit": "em"})),
        );

        let seen = seen.borrow();
        assert_eq!(
            seen.get("theme"),
            Some(&json!({"color": "red", "font": {"size": 14, "family": "serif"}}))
        );
        assert_eq!(seen.get("unit"), Some(&json!("em")));
    }

    #[test]
    fn extensions_see_merged_props() {
        let mut globals = Globals::default();
        globals.extensions.insert(
            "px".to_string(),
            crate::config::Extension::function(|p| {
                json!(format!("{}px", p.get("size").and_then(Value::as_i64).unwrap_or(0)))
            }),
        );
        let scope = BuildScope::new(Rc::new(globals), CompositeId::style(0));
        let definition = Definition::new(|ctx| {
            Sheet::new().with("width", ctx.str("px").unwrap_or_default().to_string())
        });
        let root = Provider::build(&scope, None, &definition, &props(json!({"size": 8})));
        assert_eq!(root.stylesheet().get("width").unwrap().values(), ["8px"]);
    }

    // -- descriptor ----------------------------------------------------------

    #[test]
    fn descriptor_hashes_and_omits_empty_fields() {
        let definition = Definition::new(|ctx| {
            ctx.css(".a {.dark} .b", Sheet::new().with("margin", 0));
            Sheet::new()
        });
        let root = Provider::build(&scope(CompositeId::instance(2, 1)), None, &definition, &Props::new());
        let descriptor = root.descriptor(&[]);
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "id": "2_1",
                "children": [{"id": "2_1", "selector": ".a_2_1 .dark .b_2_1", "stylesheet": {"margin": "0"}}]
            })
        );
    }

    #[test]
    fn candidates_with_same_definition_become_siblings() {
        let hover = Definition::from(Sheet::new().with("color", "blue"));
        let inner = hover.clone();
        let definition = Definition::new(move |ctx| {
            ctx.css(".btn:hover", inner.clone());
            Sheet::new()
        });
        let root = Provider::build(&scope(CompositeId::style(0)), None, &definition, &Props::new());

        let configured = Provider::build(
            &scope(CompositeId::configuration(0, 0, 0)),
            Some(".btn:hover"),
            &hover,
            &Props::new(),
        );
        let unrelated = Provider::build(
            &scope(CompositeId::configuration(0, 0, 1)),
            Some(".other"),
            &Definition::from(Sheet::new()),
            &Props::new(),
        );

        let descriptor = root.descriptor(&[configured, unrelated]);
        assert!(descriptor.siblings.is_empty());
        let child = &descriptor.children[0];
        assert_eq!(child.siblings.len(), 1);
        assert_eq!(child.siblings[0].selector.as_deref(), Some(".btn_0_0_0:hover"));
    }

    // -- class lookup --------------------------------------------------------

    #[test]
    fn lookup_scopes_matches_and_passes_extras() {
        let definition = Definition::new(|ctx| {
            ctx.css(".a", Sheet::new());
            ctx.css(".a:hover", Sheet::new());
            Sheet::new()
        });
        let root = Provider::build(&scope(CompositeId::style(4)), None, &definition, &Props::new());
        let mut lookup = ClassLookup::new(vec!["a", "b", "a"], false);
        root.collect_classes(&mut lookup);
        assert_eq!(lookup.finish(), "a_4 b");
    }

    #[test]
    fn lookup_keeps_original_names() {
        let definition = Definition::new(|ctx| {
            ctx.css(".title", Sheet::new());
            Sheet::new()
        });
        let root = Provider::build(&scope(CompositeId::style(1)), None, &definition, &Props::new());
        let mut lookup = ClassLookup::new(vec!["title"], true);
        root.collect_classes(&mut lookup);
        assert_eq!(lookup.finish(), "_title title_1");
    }
}
