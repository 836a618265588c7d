//! Styles and what spawns from them.
//!
//! A [`Style`] is the pooled, compiled form of one definition. Sessions
//! activate it as [`Instance`]s; named factories fork any of the three into a
//! [`Configuration`]. Forks point back at what they came from through an
//! [`Owner`] link, and identifiers, exposures and class resolution all walk
//! that chain.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use common::{Props, Result, StyleError, kind_of, merge_props};
use serde_json::{Value, json};

use crate::config::Globals;
use crate::definition::{Definition, Exposure, Parser, parser};
use crate::descriptor::CompositeId;
use crate::provider::{BuildScope, ClassLookup, Exposures, Provider};
use crate::session::{Session, SessionCore};

// ─────────────────────────────────────────────────────────────────────────────
// Style
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct StyleCore {
    index: usize,
    definition: Definition,
    globals: Rc<Globals>,
    provider: Rc<Provider>,
    exposures: RefCell<Exposures>,
}

/// The pooled identity of one definition.
///
/// Cloning is cheap and every clone is the same style. A handle produced by
/// [`Style::with`] also carries default props for the next instance.
#[derive(Clone)]
pub struct Style {
    core: Rc<StyleCore>,
    deferred: Option<Rc<Props>>,
}

impl Style {
    pub(crate) fn new(definition: Definition, index: usize, globals: Rc<Globals>) -> Self {
        let scope = BuildScope::new(globals.clone(), CompositeId::style(index));
        let provider = Provider::build(&scope, None, &definition, &Props::new());
        let style = Self {
            core: Rc::new(StyleCore {
                index,
                definition,
                globals,
                provider: provider.clone(),
                exposures: RefCell::new(scope.take_exposures()),
            }),
            deferred: None,
        };
        style.expose(
            "theme",
            provider,
            Some(parser(|args| {
                json!({ "theme": args.first().cloned().unwrap_or(Value::Null) })
            })),
        );
        style
    }

    pub fn index(&self) -> usize {
        self.core.index
    }

    pub fn definition(&self) -> &Definition {
        &self.core.definition
    }

    /// Install a named configuration factory for `provider`.
    ///
    /// Without a parser the first call argument must be the props object.
    pub fn expose(&self, name: &str, provider: Rc<Provider>, parser: Option<Parser>) {
        self.core
            .exposures
            .borrow_mut()
            .insert(name.to_string(), Exposure { provider, parser });
    }

    /// A handle that supplies `props` as defaults to the next instance
    /// created from it. Nothing is evaluated now.
    pub fn with(&self, props: Props) -> Style {
        if props.is_empty() {
            return self.clone();
        }
        let mut merged = self.deferred.as_deref().cloned().unwrap_or_default();
        merge_props(&mut merged, &props);
        Style {
            core: self.core.clone(),
            deferred: Some(Rc::new(merged)),
        }
    }

    /// Defaults recorded by [`Style::with`].
    pub fn deferred_props(&self) -> Option<&Props> {
        self.deferred.as_deref()
    }

    pub fn ptr_eq(&self, other: &Style) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    /// Materialize an instance for `session`.
    ///
    /// With props, explicit or deferred, the provider tree is rebuilt for the
    /// instance alone; explicit keys win over deferred ones. Without props the
    /// instance shares the style's tree.
    pub(crate) fn instantiate(
        &self,
        session: Weak<SessionCore>,
        globals: Rc<Globals>,
        index: usize,
        props: Option<Props>,
    ) -> Instance {
        let props = match (self.deferred.as_deref(), props) {
            (None, None) => None,
            (Some(deferred), None) => Some(deferred.clone()),
            (None, Some(explicit)) => Some(explicit),
            (Some(deferred), Some(explicit)) => {
                let mut merged = deferred.clone();
                merged.extend(explicit);
                Some(merged)
            }
        };

        let id = CompositeId::instance(self.index(), index);
        let (provider, exposures) = match props {
            Some(props) => {
                let scope = BuildScope::new(globals.clone(), id);
                let provider = Provider::build(&scope, None, &self.core.definition, &props);
                (Some(provider), scope.take_exposures())
            }
            None => (None, Exposures::default()),
        };

        Instance(Rc::new(InstanceCore {
            style: Style {
                core: self.core.clone(),
                deferred: None,
            },
            session,
            globals,
            index,
            provider,
            exposures: RefCell::new(exposures),
            configurations: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        }))
    }
}

impl std::fmt::Debug for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Style")
            .field("index", &self.core.index)
            .field("deferred", &self.deferred)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct InstanceCore {
    style: Style,
    session: Weak<SessionCore>,
    globals: Rc<Globals>,
    index: usize,
    /// Present only for instance-scoped instances.
    provider: Option<Rc<Provider>>,
    exposures: RefCell<Exposures>,
    configurations: RefCell<Vec<Configuration>>,
    disposed: Cell<bool>,
}

/// One live activation of a style inside one session.
#[derive(Clone)]
pub struct Instance(Rc<InstanceCore>);

impl Instance {
    pub fn style(&self) -> &Style {
        &self.0.style
    }

    pub fn style_index(&self) -> usize {
        self.0.style.index()
    }

    /// Sequential within its style and session.
    pub fn index(&self) -> usize {
        self.0.index
    }

    /// Shares the style's provider tree: no per-instance props.
    pub fn is_generic(&self) -> bool {
        self.0.provider.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The session this instance belongs to, while it is alive.
    pub fn session(&self) -> Option<Session> {
        self.0.session.upgrade().map(Session::from_core)
    }

    /// The instance's own provider tree, or `None` for a generic instance.
    pub fn own_provider(&self) -> Option<&Rc<Provider>> {
        self.0.provider.as_ref()
    }

    /// Active configurations in creation order.
    pub fn configurations(&self) -> Vec<Configuration> {
        self.0.configurations.borrow().clone()
    }

    /// Reset the configuration list; called before each render.
    pub fn clear_configuration(&self) {
        self.0.configurations.borrow_mut().clear();
    }

    /// Re-render the owning style into the session's document.
    pub fn apply_configuration(&self) {
        if self.is_disposed() {
            return;
        }
        if let Some(session) = self.session() {
            session.render_into_dom(self);
        }
    }

    /// Remove the instance from its session now.
    pub fn dispose(&self) {
        if let Some(session) = self.session() {
            session.dispose(self);
        }
    }

    /// Mark the instance for removal at the session's next `settle`.
    pub fn schedule_dispose(&self) {
        if let Some(session) = self.session() {
            session.schedule_dispose(self);
        }
    }

    pub(crate) fn mark_disposed(&self) {
        self.0.disposed.set(true);
        self.clear_configuration();
    }

    fn push_configuration(&self, configuration: Configuration) {
        self.0.configurations.borrow_mut().push(configuration);
    }

    fn next_configuration_index(&self) -> usize {
        self.0.configurations.borrow().len()
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("style", &self.style_index())
            .field("index", &self.0.index)
            .field("generic", &self.is_generic())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Parent link of a configuration. Instances are held weakly: they own their
/// configuration lists.
#[derive(Clone)]
enum Parent {
    Style(Style),
    Instance(Weak<InstanceCore>),
    Configuration(Configuration),
}

impl Parent {
    fn from_owner(owner: &Owner) -> Self {
        match owner {
            Owner::Style(style) => Parent::Style(style.clone()),
            Owner::Instance(instance) => Parent::Instance(Rc::downgrade(&instance.0)),
            Owner::Configuration(configuration) => Parent::Configuration(configuration.clone()),
        }
    }

    fn upgrade(&self) -> Option<Owner> {
        match self {
            Parent::Style(style) => Some(Owner::Style(style.clone())),
            Parent::Instance(weak) => weak.upgrade().map(|core| Owner::Instance(Instance(core))),
            Parent::Configuration(configuration) => Some(Owner::Configuration(configuration.clone())),
        }
    }
}

pub(crate) struct ConfigurationCore {
    id: CompositeId,
    parent: Parent,
    globals: Rc<Globals>,
    provider: Rc<Provider>,
    exposures: RefCell<Exposures>,
}

/// A transient fork of a style, instance or configuration with a freshly
/// evaluated provider tree.
#[derive(Clone)]
pub struct Configuration(Rc<ConfigurationCore>);

impl Configuration {
    pub fn provider(&self) -> &Rc<Provider> {
        &self.0.provider
    }

    pub fn ptr_eq(&self, other: &Configuration) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("id", &self.0.id)
            .field("selector", &self.0.provider.selector())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Owner: the fork chain
// ─────────────────────────────────────────────────────────────────────────────

/// Anything a provider tree can belong to.
#[derive(Clone, Debug)]
pub enum Owner {
    Style(Style),
    Instance(Instance),
    Configuration(Configuration),
}

impl Owner {
    pub fn id(&self) -> CompositeId {
        match self {
            Owner::Style(style) => CompositeId::style(style.index()),
            Owner::Instance(instance) => CompositeId::instance(instance.style_index(), instance.index()),
            Owner::Configuration(configuration) => configuration.0.id,
        }
    }

    /// The owner's provider tree; generic instances answer with the style's.
    pub fn provider(&self) -> Rc<Provider> {
        match self {
            Owner::Style(style) => style.core.provider.clone(),
            Owner::Instance(instance) => instance
                .0
                .provider
                .clone()
                .unwrap_or_else(|| instance.0.style.core.provider.clone()),
            Owner::Configuration(configuration) => configuration.0.provider.clone(),
        }
    }

    pub fn parent(&self) -> Option<Owner> {
        match self {
            Owner::Style(_) => None,
            Owner::Instance(instance) => Some(Owner::Style(instance.0.style.clone())),
            Owner::Configuration(configuration) => configuration.0.parent.upgrade(),
        }
    }

    /// The instance at or above this owner, if any.
    pub fn instance(&self) -> Option<Instance> {
        match self {
            Owner::Style(_) => None,
            Owner::Instance(instance) => Some(instance.clone()),
            Owner::Configuration(configuration) => configuration.0.parent.upgrade()?.instance(),
        }
    }

    fn globals(&self) -> Rc<Globals> {
        match self {
            Owner::Style(style) => style.core.globals.clone(),
            Owner::Instance(instance) => instance.0.globals.clone(),
            Owner::Configuration(configuration) => configuration.0.globals.clone(),
        }
    }

    fn own_exposure(&self, name: &str) -> Option<Exposure> {
        let exposures = match self {
            Owner::Style(style) => &style.core.exposures,
            Owner::Instance(instance) => &instance.0.exposures,
            Owner::Configuration(configuration) => &configuration.0.exposures,
        };
        exposures.borrow().get(name).cloned()
    }

    /// Nearest factory named `name`, searching up the chain.
    pub fn exposure(&self, name: &str) -> Option<Exposure> {
        let mut current = Some(self.clone());
        while let Some(owner) = current {
            if let Some(exposure) = owner.own_exposure(name) {
                return Some(exposure);
            }
            current = owner.parent();
        }
        None
    }

    /// Fork into a configuration rebuilt from `provider` with `props`.
    ///
    /// If the chain reaches an instance, the configuration joins that
    /// instance's list and its index is its position there.
    pub fn configured(&self, provider: &Provider, props: &Props) -> Configuration {
        let instance = self.instance();
        let id = match &instance {
            Some(instance) => CompositeId::configuration(
                instance.style_index(),
                instance.index(),
                instance.next_configuration_index(),
            ),
            None => self.id(),
        };

        let globals = self.globals();
        let scope = BuildScope::new(globals.clone(), id);
        let rebuilt = Provider::build(&scope, provider.selector(), provider.definition(), props);
        let configuration = Configuration(Rc::new(ConfigurationCore {
            id,
            parent: Parent::from_owner(self),
            globals,
            provider: rebuilt,
            exposures: RefCell::new(scope.take_exposures()),
        }));

        if let Some(instance) = instance {
            instance.push_configuration(configuration.clone());
        }
        configuration
    }

    /// Call the factory named `name` with `args`.
    pub fn configure(&self, name: &str, args: &[Value]) -> Result<Configuration> {
        let exposure = self
            .exposure(name)
            .ok_or_else(|| StyleError::UnknownExposure(name.to_string()))?;
        let value = match &exposure.parser {
            Some(parse) => parse(args),
            None => args.first().cloned().unwrap_or(Value::Null),
        };
        let props = match value {
            Value::Object(props) => props,
            Value::Null => Props::new(),
            other => {
                return Err(StyleError::InvalidProps {
                    name: name.to_string(),
                    found: kind_of(&other),
                });
            }
        };
        Ok(self.configured(&exposure.provider, &props))
    }

    /// Resolve raw class names against this owner's trees, nearest first.
    pub fn css<'a, I>(&self, classes: I) -> String
    where
        I: IntoIterator,
        I::Item: Into<Option<&'a str>>,
    {
        let requested: Vec<&str> = classes.into_iter().filter_map(Into::into).collect();
        let keep_original = self.globals().config.keep_original_class_names;
        let mut lookup = ClassLookup::new(requested, keep_original);

        let mut previous: Option<Rc<Provider>> = None;
        let mut current = Some(self.clone());
        while let Some(owner) = current {
            let provider = owner.provider();
            if !previous.as_ref().is_some_and(|p| Rc::ptr_eq(p, &provider)) {
                provider.collect_classes(&mut lookup);
            }
            previous = Some(provider);
            current = owner.parent();
        }
        lookup.finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StyleScope: what styles, instances and configurations share
// ─────────────────────────────────────────────────────────────────────────────

pub trait StyleScope {
    fn owner(&self) -> Owner;

    fn id(&self) -> CompositeId {
        self.owner().id()
    }

    fn provider(&self) -> Rc<Provider> {
        self.owner().provider()
    }

    /// Scoped class string for `classes`; `None` entries are skipped.
    fn css<'a, I>(&self, classes: I) -> String
    where
        I: IntoIterator,
        I::Item: Into<Option<&'a str>>,
        Self: Sized,
    {
        self.owner().css(classes)
    }

    /// Call a named configuration factory.
    fn configure(&self, name: &str, args: &[Value]) -> Result<Configuration> {
        self.owner().configure(name, args)
    }

    /// Fork with a theme override; deep-merged over the ambient theme.
    fn theme(&self, theme: Value) -> Result<Configuration> {
        self.configure("theme", &[theme])
    }

    /// Fork `provider` with explicit props.
    fn configured(&self, provider: &Provider, props: &Props) -> Configuration {
        self.owner().configured(provider, props)
    }
}

impl StyleScope for Style {
    fn owner(&self) -> Owner {
        Owner::Style(self.clone())
    }
}

impl StyleScope for Instance {
    fn owner(&self) -> Owner {
        Owner::Instance(self.clone())
    }
}

impl StyleScope for Configuration {
    fn owner(&self) -> Owner {
        Owner::Configuration(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::RuleContext;
    use css::Sheet;
    use pretty_assertions::assert_eq;

    fn props(value: Value) -> Props {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn button() -> Definition {
        let hover = Definition::new(|ctx: &mut RuleContext| {
            Sheet::new().with("color", ctx.str("hover").unwrap_or("blue").to_string())
        });
        Definition::new(move |ctx| {
            ctx.css(".btn", Sheet::new().with("padding", 4));
            ctx.css(".btn:hover", hover.clone()).expose("hover", None);
            Sheet::new()
        })
    }

    fn style(definition: Definition, index: usize) -> Style {
        Style::new(definition, index, Rc::new(Globals::default()))
    }

    fn detached_instance(style: &Style, index: usize, props: Option<Props>) -> Instance {
        style.instantiate(Weak::new(), Rc::new(Globals::default()), index, props)
    }

    // -- ids -----------------------------------------------------------------

    #[test]
    fn ids_follow_the_fork_chain() {
        let style = style(button(), 3);
        let instance = detached_instance(&style, 1, None);
        assert_eq!(style.id().to_string(), "3");
        assert_eq!(instance.id().to_string(), "3_1");

        let first = instance.configure("hover", &[json!({"hover": "red"})]).unwrap();
        let second = instance.configure("hover", &[json!({})]).unwrap();
        assert_eq!(first.id().to_string(), "3_1_0");
        assert_eq!(second.id().to_string(), "3_1_1");
        assert_eq!(instance.configurations().len(), 2);
    }

    #[test]
    fn configuring_a_style_records_nothing() {
        let style = style(button(), 0);
        let configuration = style.configure("hover", &[json!({"hover": "red"})]).unwrap();
        assert_eq!(configuration.id().to_string(), "0");
        let hover = configuration.provider();
        assert_eq!(hover.stylesheet().get("color").unwrap().values(), ["red"]);
    }

    #[test]
    fn nested_configuration_joins_the_instance() {
        let style = style(button(), 0);
        let instance = detached_instance(&style, 0, None);
        let outer = instance.theme(json!({"primary": "red"})).unwrap();
        let inner = outer.configure("hover", &[json!({"hover": "green"})]).unwrap();
        assert_eq!(inner.id().to_string(), "0_0_1");
        assert_eq!(instance.configurations().len(), 2);
        assert!(instance.configurations()[1].ptr_eq(&inner));
    }

    #[test]
    fn clear_configuration_resets_indices() {
        let style = style(button(), 0);
        let instance = detached_instance(&style, 0, None);
        instance.configure("hover", &[]).unwrap();
        instance.clear_configuration();
        let again = instance.configure("hover", &[]).unwrap();
        assert_eq!(again.id().to_string(), "0_0_0");
    }

    // -- exposures -----------------------------------------------------------

    #[test]
    fn unknown_exposure_is_an_error() {
        let style = style(button(), 0);
        assert!(matches!(
            style.configure("focus", &[]),
            Err(StyleError::UnknownExposure(name)) if name == "focus"
        ));
    }

    #[test]
    fn non_object_props_are_rejected() {
        let style = style(button(), 0);
        let err = style.configure("hover", &[json!("red")]).unwrap_err();
        assert_eq!(err.to_string(), "configuration `hover` produced a string instead of an object");
    }

    #[test]
    fn theme_is_exposed_by_default() {
        let definition = Definition::new(|ctx| {
            let color = ctx
                .theme()
                .and_then(|t| t.get("primary"))
                .and_then(Value::as_str)
                .unwrap_or("black")
                .to_string();
            ctx.css(".title", Sheet::new().with("color", color));
            Sheet::new()
        });
        let style = style(definition, 0);
        let themed = style.theme(json!({"primary": "teal"})).unwrap();
        let title = &themed.provider().children()[0];
        assert_eq!(title.stylesheet().get("color").unwrap().values(), ["teal"]);
    }

    #[test]
    fn explicit_expose_on_style() {
        let style = style(button(), 0);
        let btn = style.provider().children()[0].clone();
        style.expose(
            "padded",
            btn,
            Some(parser(|args| json!({"padding": args.first().cloned()}))),
        );
        let configuration = style.configure("padded", &[json!(8)]).unwrap();
        assert_eq!(configuration.provider().selector(), Some(".btn"));
    }

    // -- with / instantiate --------------------------------------------------

    #[test]
    fn instances_without_props_are_generic() {
        let style = style(button(), 0);
        let instance = detached_instance(&style, 0, None);
        assert!(instance.is_generic());
        assert!(Rc::ptr_eq(&instance.provider(), &style.provider()));
    }

    #[test]
    fn with_defaults_yield_to_explicit_props() {
        let definition = Definition::new(|ctx| {
            Sheet::new()
                .with("color", ctx.str("color").unwrap_or("none").to_string())
                .with("margin", ctx.str("margin").unwrap_or("0").to_string())
        });
        let style = style(definition, 0).with(props(json!({"color": "red", "margin": "4px"})));
        let instance = detached_instance(&style, 0, Some(props(json!({"color": "blue"}))));
        assert!(!instance.is_generic());
        let sheet = instance.provider().stylesheet().clone();
        assert_eq!(sheet.get("color").unwrap().values(), ["blue"]);
        assert_eq!(sheet.get("margin").unwrap().values(), ["4px"]);
        assert_eq!(instance.provider().id().to_string(), "0_0");
    }

    #[test]
    fn with_keeps_style_identity() {
        let base = style(button(), 2);
        let variant = base.with(props(json!({"a": 1})));
        assert!(variant.ptr_eq(&base));
        assert_eq!(variant.index(), 2);
        assert!(base.deferred_props().is_none());
        assert!(base.with(Props::new()).deferred_props().is_none());
    }

    // -- css -----------------------------------------------------------------

    #[test]
    fn css_scopes_known_classes_only() {
        let definition = Definition::new(|ctx| {
            ctx.css(".a", Sheet::new().with("color", "red"));
            Sheet::new()
        });
        let style = style(definition, 5);
        assert_eq!(style.css(["a", "b"]), "a_5 b");
        assert_eq!(style.css([Some("b"), None, Some("a")]), "a_5 b");
    }

    #[test]
    fn css_prefers_nearest_tree() {
        let style = style(button(), 0);
        let instance = detached_instance(&style, 0, None);
        let configuration = instance.configure("hover", &[json!({"hover": "red"})]).unwrap();
        // The hover definition matches in the configuration and is skipped
        // further up; the plain `.btn` rule still contributes from the style.
        assert_eq!(configuration.css(["btn"]), "btn_0_0_0 btn_0");
        assert_eq!(instance.css(["btn"]), "btn_0");
    }
}
