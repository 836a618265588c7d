//! The style pool.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use common::{Props, Result};
use dom::SharedDocument;
use pool::Pool;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::config::{Config, Extension, Globals};
use crate::definition::Definition;
use crate::session::Session;
use crate::style::Style;

/// Pools styles by definition identity and forks sessions.
#[derive(Default)]
pub struct Manager {
    globals: RefCell<Rc<Globals>>,
    /// Definition address to pool index.
    definitions: RefCell<FxHashMap<usize, usize>>,
    styles: RefCell<Pool<Style>>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_globals(globals: Globals) -> Self {
        Self {
            globals: RefCell::new(Rc::new(globals)),
            ..Self::default()
        }
    }

    /// Snapshot of the current globals.
    pub fn globals(&self) -> Rc<Globals> {
        self.globals.borrow().clone()
    }

    pub fn config(&self) -> Config {
        self.globals.borrow().config
    }

    pub fn set_config(&self, config: Config) {
        Rc::make_mut(&mut self.globals.borrow_mut()).config = config;
    }

    pub fn set_dependencies(&self, dependencies: &Props) {
        Rc::make_mut(&mut self.globals.borrow_mut()).merge_dependencies(dependencies);
    }

    pub fn set_extensions(&self, extensions: BTreeMap<String, Extension>) {
        Rc::make_mut(&mut self.globals.borrow_mut()).merge_extensions(extensions);
    }

    /// The style for `definition`, built on first sight.
    ///
    /// Later calls with the same definition return the same style and do not
    /// grow the pool.
    pub fn create_style(&self, definition: impl Into<Definition>) -> Style {
        let definition = definition.into();
        let key = definition.key();
        if let Some(style) = self.lookup(key) {
            return style;
        }

        let index = self.styles.borrow_mut().reserve();
        let style = Style::new(definition, index, self.globals());
        self.styles.borrow_mut().insert(index, style.clone());
        self.definitions.borrow_mut().insert(key, index);
        tracing::debug!(index, "style registered");
        style
    }

    /// [`Manager::create_style`] for a plain JSON property map.
    pub fn create_style_from_json(&self, definition: &Value) -> Result<Style> {
        Ok(self.create_style(Definition::from_json(definition)?))
    }

    fn lookup(&self, key: usize) -> Option<Style> {
        let index = *self.definitions.borrow().get(&key)?;
        self.styles.borrow().get(index).cloned()
    }

    pub fn style(&self, index: usize) -> Option<Style> {
        self.styles.borrow().get(index).cloned()
    }

    pub fn style_count(&self) -> usize {
        self.styles.borrow().len()
    }

    /// Forget every pooled style. Handles already given out stay usable.
    pub fn reset(&self) {
        self.definitions.borrow_mut().clear();
        self.styles.borrow_mut().clear();
        tracing::debug!("style pool reset");
    }

    /// A session rendering for `user_agent`, with no document attached.
    pub fn get_session(&self, user_agent: Option<&str>) -> Session {
        tracing::debug!(user_agent, "session created");
        Session::new(self.globals(), user_agent, None)
    }

    /// A session that synchronizes into `document`.
    pub fn get_session_with_document(
        &self,
        user_agent: Option<&str>,
        document: SharedDocument,
    ) -> Session {
        tracing::debug!(user_agent, "session created with document");
        Session::new(self.globals(), user_agent, Some(document))
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config())
            .field("styles", &self.style_count())
            .finish()
    }
}
