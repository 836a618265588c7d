//! The live-document contract the style engine synchronizes into.

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::{Attr, NodeId};
use crate::tree::Dom;

/// A document handle shared between a session and its owner.
pub type SharedDocument = Rc<RefCell<dyn Document>>;

/// Operations needed to keep `<style>` elements in a document head.
///
/// Every mutation is a no-op when the document is not available.
pub trait Document {
    /// Whether there is a live head to synchronize into.
    fn is_available(&self) -> bool;

    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Create a detached `<style id=".." type="text/css">` holding `css`.
    fn create_style_element(&mut self, id: &str, css: &str) -> NodeId;

    /// Insert `element` into the head before `before`, or at the end.
    fn insert_style_element(&mut self, element: NodeId, before: Option<NodeId>);

    /// Swap `old` for `new` in place.
    fn replace_style_element(&mut self, new: NodeId, old: NodeId);

    fn remove_style_element(&mut self, element: NodeId);
}

impl Document for Dom {
    fn is_available(&self) -> bool {
        self.head().is_some()
    }

    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        Dom::get_element_by_id(self, id)
    }

    fn create_style_element(&mut self, id: &str, css: &str) -> NodeId {
        let element = self.create_element(
            "style",
            vec![Attr::new("id", id), Attr::new("type", "text/css")],
        );
        let text = self.create_text(css);
        self.append_child(element, text);
        element
    }

    fn insert_style_element(&mut self, element: NodeId, before: Option<NodeId>) {
        let Some(head) = self.head() else {
            return;
        };
        tracing::trace!(?element, ?before, "insert style element");
        self.insert_before(head, element, before);
    }

    fn replace_style_element(&mut self, new: NodeId, old: NodeId) {
        let Some(parent) = self.node(old).and_then(|n| n.parent) else {
            return;
        };
        tracing::trace!(?new, ?old, "replace style element");
        self.replace_child(parent, new, old);
    }

    fn remove_style_element(&mut self, element: NodeId) {
        let Some(parent) = self.node(element).and_then(|n| n.parent) else {
            return;
        };
        tracing::trace!(?element, "remove style element");
        self.remove_child(parent, element);
    }
}
