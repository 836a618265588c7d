//! Style definitions and the context they are evaluated in.

use std::fmt;
use std::rc::Rc;

use common::{Props, Result};
use css::Sheet;
use serde_json::Value;

use crate::provider::{BuildScope, Provider};

/// Turns the arguments of a named configuration call into props.
pub type Parser = Rc<dyn Fn(&[Value]) -> Value>;

/// Wrap a closure as a [`Parser`].
pub fn parser(f: impl Fn(&[Value]) -> Value + 'static) -> Parser {
    Rc::new(f)
}

/// A named configuration factory: re-evaluate `provider` with parsed props.
#[derive(Clone)]
pub struct Exposure {
    pub provider: Rc<Provider>,
    pub parser: Option<Parser>,
}

impl fmt::Debug for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exposure")
            .field("selector", &self.provider.selector())
            .field("parsed", &self.parser.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Definition
// ─────────────────────────────────────────────────────────────────────────────

type RuleFn = dyn Fn(&mut RuleContext) -> Sheet;

/// A function from rule context to property map.
///
/// Identity is the allocation: clones are the same definition, two
/// separately constructed definitions never are, whatever they return.
#[derive(Clone)]
pub struct Definition(Rc<RuleFn>);

impl Definition {
    pub fn new(rule: impl Fn(&mut RuleContext) -> Sheet + 'static) -> Self {
        Self(Rc::new(rule))
    }

    /// A definition that always returns `sheet`.
    pub fn constant(sheet: Sheet) -> Self {
        Self::new(move |_| sheet.clone())
    }

    /// A constant definition from a JSON object. Any other JSON value is rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        Sheet::from_json(value).map(Self::constant)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    /// Address of the shared closure, stable while any clone is alive.
    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn evaluate(&self, ctx: &mut RuleContext) -> Sheet {
        (self.0)(ctx)
    }
}

impl From<Sheet> for Definition {
    fn from(sheet: Sheet) -> Self {
        Self::constant(sheet)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Definition({:#x})", self.key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RuleContext
// ─────────────────────────────────────────────────────────────────────────────

/// What a definition sees while it runs: the merged props and a way to
/// register nested rules.
pub struct RuleContext {
    props: Props,
    scope: Rc<BuildScope>,
    children: Vec<Rc<Provider>>,
}

impl RuleContext {
    pub(crate) fn new(props: Props, scope: Rc<BuildScope>) -> Self {
        Self {
            props,
            scope,
            children: Vec::new(),
        }
    }

    /// Dependencies, explicit props, theme and extension results, merged.
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// A string prop, or `None` if missing or not a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(Value::as_str)
    }

    pub fn theme(&self) -> Option<&Value> {
        self.props.get("theme")
    }

    /// Register a nested rule under `selector` and evaluate it now.
    pub fn css(&mut self, selector: &str, definition: impl Into<Definition>) -> RuleHandle {
        self.nest(Some(selector), definition.into(), &Props::new())
    }

    /// [`RuleContext::css`] with explicit props for the nested definition.
    pub fn css_with(
        &mut self,
        selector: &str,
        definition: impl Into<Definition>,
        props: &Props,
    ) -> RuleHandle {
        self.nest(Some(selector), definition.into(), props)
    }

    /// Register a selector-less rule: its children are spliced into the
    /// parent and its declarations are emitted bare.
    pub fn group(&mut self, definition: impl Into<Definition>) -> RuleHandle {
        self.nest(None, definition.into(), &Props::new())
    }

    fn nest(&mut self, selector: Option<&str>, definition: Definition, props: &Props) -> RuleHandle {
        let provider = Provider::build(&self.scope, selector, &definition, props);
        self.children.push(provider.clone());
        RuleHandle {
            provider,
            scope: self.scope.clone(),
        }
    }

    pub(crate) fn into_children(self) -> Vec<Rc<Provider>> {
        self.children
    }
}

/// A nested rule just registered through [`RuleContext::css`].
pub struct RuleHandle {
    provider: Rc<Provider>,
    scope: Rc<BuildScope>,
}

impl RuleHandle {
    pub fn provider(&self) -> &Rc<Provider> {
        &self.provider
    }

    /// Install a configuration factory named `name` for this rule on the
    /// style, instance or configuration being built.
    pub fn expose(&self, name: &str, parser: Option<Parser>) -> &Self {
        self.scope.expose(
            name,
            Exposure {
                provider: self.provider.clone(),
                parser,
            },
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_identity() {
        let a = Definition::new(|_| Sheet::new());
        let b = a.clone();
        let c = Definition::new(|_| Sheet::new());
        assert!(a.ptr_eq(&b));
        assert_eq!(a.key(), b.key());
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn equal_sheets_are_different_definitions() {
        let sheet = Sheet::new().with("color", "red");
        let a = Definition::from(sheet.clone());
        let b = Definition::from(sheet);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn from_json_requires_object() {
        assert!(Definition::from_json(&json!({"color": "red"})).is_ok());
        assert!(Definition::from_json(&json!(["color"])).is_err());
        assert!(Definition::from_json(&json!(null)).is_err());
    }
}
