//! Sessions: isolated instance registries.
//!
//! A session is one rendering context (a server request, a browser tab). It
//! owns its vendor prefixer, its per-style instance lists and optionally a
//! live document; the style pool stays shared in the manager.

use std::cell::RefCell;
use std::rc::Rc;

use common::Props;
use css::Prefixer;
use dom::{ANCHOR_ID, SharedDocument};
use pool::Pool;
use rustc_hash::FxHashMap;

use crate::config::Globals;
use crate::descriptor::{DocumentDescriptor, StyleDescriptor};
use crate::provider::Provider;
use crate::render::{Renderer, element_id};
use crate::style::{Instance, Style, StyleScope};

pub(crate) struct SessionCore {
    globals: Rc<Globals>,
    prefixer: Prefixer,
    registry: RefCell<Pool<Vec<Instance>>>,
    counters: RefCell<FxHashMap<usize, usize>>,
    pending: RefCell<Vec<Instance>>,
    document: Option<SharedDocument>,
}

#[derive(Clone)]
pub struct Session {
    core: Rc<SessionCore>,
}

impl Session {
    pub(crate) fn new(
        globals: Rc<Globals>,
        user_agent: Option<&str>,
        document: Option<SharedDocument>,
    ) -> Self {
        Self {
            core: Rc::new(SessionCore {
                globals,
                prefixer: Prefixer::new(user_agent),
                registry: RefCell::new(Pool::new()),
                counters: RefCell::new(FxHashMap::default()),
                pending: RefCell::new(Vec::new()),
                document,
            }),
        }
    }

    pub(crate) fn from_core(core: Rc<SessionCore>) -> Self {
        Self { core }
    }

    pub fn globals(&self) -> &Globals {
        &self.core.globals
    }

    pub fn prefixer(&self) -> &Prefixer {
        &self.core.prefixer
    }

    pub fn has_document(&self) -> bool {
        self.core.document.is_some()
    }

    /// Whether a document is attached and has a head to write into.
    pub fn is_live(&self) -> bool {
        self.core
            .document
            .as_ref()
            .is_some_and(|doc| doc.borrow().is_available())
    }

    pub fn ptr_eq(&self, other: &Session) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Instances
    // ─────────────────────────────────────────────────────────────────────

    /// Activate `style` for one consumer.
    pub fn get_instance(&self, style: &Style, props: Option<Props>) -> Instance {
        let index = {
            let mut counters = self.core.counters.borrow_mut();
            let counter = counters.entry(style.index()).or_insert(0);
            let index = *counter;
            *counter += 1;
            index
        };
        let instance = style.instantiate(
            Rc::downgrade(&self.core),
            self.core.globals.clone(),
            index,
            props,
        );
        self.core
            .registry
            .borrow_mut()
            .get_or_insert_with(style.index(), Vec::new)
            .push(instance.clone());
        tracing::debug!(style = style.index(), instance = index, generic = instance.is_generic(), "instance created");
        instance
    }

    /// Live instances of `style`, in creation order.
    pub fn instances(&self, style: &Style) -> Vec<Instance> {
        self.core
            .registry
            .borrow()
            .get(style.index())
            .cloned()
            .unwrap_or_default()
    }

    /// Indices of the styles with at least one live instance, ascending.
    pub fn active_styles(&self) -> Vec<usize> {
        self.core.registry.borrow().iter().map(|(i, _)| i).collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Descriptors & rendering
    // ─────────────────────────────────────────────────────────────────────

    /// Snapshot one style.
    ///
    /// Generic instances share the style's tree, so all their configurations
    /// render against one block. Each instance-scoped instance renders its
    /// own tree with its own configurations.
    pub fn get_style_descriptor(&self, style: &Style) -> StyleDescriptor {
        let instances = self.instances(style);
        let (generic, scoped): (Vec<_>, Vec<_>) = instances.iter().partition(|i| i.is_generic());

        let shared: Vec<Rc<Provider>> = generic
            .iter()
            .flat_map(|i| i.configurations())
            .map(|c| c.provider().clone())
            .collect();

        let mut descriptors = vec![style.provider().descriptor(&shared)];
        for instance in scoped {
            let own: Vec<Rc<Provider>> = instance
                .configurations()
                .iter()
                .map(|c| c.provider().clone())
                .collect();
            descriptors.push(instance.provider().descriptor(&own));
        }
        tracing::trace!(style = style.index(), blocks = descriptors.len(), "style descriptor");

        StyleDescriptor {
            id: style.index(),
            instances: descriptors,
        }
    }

    /// Snapshot every style with a live instance.
    pub fn get_descriptor(&self) -> DocumentDescriptor {
        let styles: Vec<Style> = self
            .core
            .registry
            .borrow()
            .iter()
            .filter_map(|(_, instances)| instances.first().map(|i| i.style().clone()))
            .collect();
        DocumentDescriptor {
            styles: styles.iter().map(|s| self.get_style_descriptor(s)).collect(),
        }
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(self.core.globals.config, &self.core.prefixer)
    }

    /// CSS text for one style, without the element wrapper.
    pub fn render_style(&self, style: &Style) -> String {
        self.renderer().render_style(&self.get_style_descriptor(style))
    }

    /// The whole session as `<style>` blocks, for initial markup.
    pub fn render_to_string(&self) -> String {
        self.renderer().render_document(&self.get_descriptor())
    }

    /// Re-render the style `instance` belongs to into the document.
    ///
    /// An existing `sidx_<n>` element is replaced in place. A new one goes
    /// before the element of the next higher active style, else before the
    /// `sidx` anchor, else at the end of the head.
    pub fn render_into_dom(&self, instance: &Instance) {
        let Some(document) = &self.core.document else {
            return;
        };
        if !document.borrow().is_available() {
            return;
        }

        let index = instance.style_index();
        let css = self.render_style(instance.style());
        let id = element_id(index);

        let mut doc = document.borrow_mut();
        let element = doc.create_style_element(&id, &css);
        if let Some(old) = doc.get_element_by_id(&id) {
            tracing::debug!(style = index, "replacing style element");
            doc.replace_style_element(element, old);
            return;
        }

        let before = self
            .core
            .registry
            .borrow()
            .iter_after(index)
            .find_map(|(i, _)| doc.get_element_by_id(&element_id(i)))
            .or_else(|| doc.get_element_by_id(ANCHOR_ID));
        tracing::debug!(style = index, ?before, "inserting style element");
        doc.insert_style_element(element, before);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Disposal
    // ─────────────────────────────────────────────────────────────────────

    /// Remove `instance` from its style's list.
    ///
    /// When the list empties, the style element is removed and the slot is
    /// retired. Disposing twice is a no-op.
    pub fn dispose(&self, instance: &Instance) {
        let index = instance.style_index();
        let emptied = {
            let mut registry = self.core.registry.borrow_mut();
            let Some(list) = registry.get_mut(index) else {
                return;
            };
            let Some(position) = list.iter().position(|i| i.ptr_eq(instance)) else {
                return;
            };
            list.remove(position);
            let emptied = list.is_empty();
            if emptied {
                registry.retire(index);
            }
            emptied
        };
        instance.mark_disposed();
        tracing::debug!(style = index, instance = instance.index(), emptied, "instance disposed");

        if !emptied {
            return;
        }
        let Some(document) = &self.core.document else {
            return;
        };
        let mut doc = document.borrow_mut();
        if !doc.is_available() {
            return;
        }
        if let Some(element) = doc.get_element_by_id(&element_id(index)) {
            doc.remove_style_element(element);
        }
    }

    /// Mark `instance` for disposal at the next [`Session::settle`].
    pub fn schedule_dispose(&self, instance: &Instance) {
        let mut pending = self.core.pending.borrow_mut();
        if !pending.iter().any(|i| i.ptr_eq(instance)) {
            pending.push(instance.clone());
        }
    }

    /// Dispose every marked instance in marking order; returns how many.
    pub fn settle(&self) -> usize {
        let pending = self.core.pending.take();
        for instance in &pending {
            self.dispose(instance);
        }
        pending.len()
    }

    pub fn pending_disposals(&self) -> usize {
        self.core.pending.borrow().len()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.core.prefixer.engine())
            .field("active_styles", &self.active_styles())
            .field("document", &self.has_document())
            .finish()
    }
}
