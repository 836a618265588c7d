//! In-memory document tree.
//!
//! The [`Dom`] struct owns an `Arena<Node>` and provides tree-manipulation
//! methods that keep parent and child links consistent. It models just
//! enough of a document for style synchronization: a head container holding
//! elements with text children.

use pool::Arena;

use crate::node::{Attr, ElementData, Node, NodeData, NodeId};

/// Id of the sentinel element marking the end of the managed style region.
pub const ANCHOR_ID: &str = "sidx";

// ---------------------------------------------------------------------------
// Dom
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Dom {
    nodes: Arena<Node>,
    head: Option<NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// A document with an empty head.
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let head = NodeId(nodes.insert(Node::new(NodeData::Head)));
        Self {
            nodes,
            head: Some(head),
        }
    }

    /// A document with no head container: nothing can be synchronized into it.
    pub fn detached() -> Self {
        Self {
            nodes: Arena::new(),
            head: None,
        }
    }

    /// A document whose head already holds the `sidx` sentinel element.
    pub fn with_anchor() -> Self {
        let mut dom = Self::new();
        let anchor = dom.create_element("style", vec![Attr::new("id", ANCHOR_ID)]);
        if let Some(head) = dom.head {
            dom.append_child(head, anchor);
        }
        dom
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =======================================================================
    // Node creation
    // =======================================================================

    /// Create a detached element; the `id` cache is extracted from `attrs`.
    pub fn create_element(&mut self, tag_name: &str, attrs: Vec<Attr>) -> NodeId {
        let id = attrs
            .iter()
            .find(|a| a.name == "id")
            .map(|a| a.value.clone());
        let node = Node::new(NodeData::Element(ElementData {
            tag_name: tag_name.to_string(),
            attrs,
            id,
        }));
        NodeId(self.nodes.insert(node))
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        NodeId(self.nodes.insert(Node::new(NodeData::Text {
            data: data.to_string(),
        })))
    }

    // =======================================================================
    // Tree mutation
    // =======================================================================

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` into `parent`'s child list immediately before `reference`.
    ///
    /// If `reference` is `None`, or is not a child of `parent`, this appends.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.nodes.contains(parent.0) || !self.nodes.contains(child.0) || parent == child {
            return;
        }
        self.detach(child);

        if let Some(node) = self.nodes.get_mut(child.0) {
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            let position = reference
                .and_then(|r| parent_node.children.iter().position(|c| *c == r))
                .unwrap_or(parent_node.children.len());
            parent_node.children.insert(position, child);
        }
    }

    /// Put `new` at the position of `old` and drop `old` with its subtree.
    ///
    /// Does nothing if `old` is not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) {
        if !self.is_child_of(old, parent) || new == old {
            return;
        }
        self.insert_before(parent, new, Some(old));
        self.remove_child(parent, old);
    }

    /// Remove `child` from `parent` and drop it with its subtree.
    ///
    /// Does nothing if `child` does not belong to `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_child_of(child, parent) {
            return;
        }
        self.detach(child);
        self.drop_subtree(child);
    }

    fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.nodes
            .get(child.0)
            .map(|n| n.parent == Some(parent))
            .unwrap_or(false)
    }

    /// Unlink a node from its parent without dropping it.
    fn detach(&mut self, node_id: NodeId) {
        let Some(parent_id) = self.nodes.get(node_id.0).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent_id.0) {
            parent.children.retain(|c| *c != node_id);
        }
        if let Some(node) = self.nodes.get_mut(node_id.0) {
            node.parent = None;
        }
    }

    fn drop_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(id.0) {
                stack.extend(node.children);
            }
        }
    }

    // =======================================================================
    // Traversal & queries
    // =======================================================================

    /// The immediate children of `parent` in document order.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(parent.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// All descendants of `node` in pre-order (not including `node` itself).
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// First element under the head with the given `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let head = self.head?;
        self.descendants(head).into_iter().find(|n| {
            self.nodes
                .get(n.0)
                .and_then(Node::as_element)
                .is_some_and(|e| e.id.as_deref() == Some(id))
        })
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| match self.nodes.get(n.0).map(|n| &n.data) {
                Some(NodeData::Text { data }) => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `id` attributes of the head's element children, in document order.
    pub fn head_ids(&self) -> Vec<String> {
        let Some(head) = self.head else {
            return Vec::new();
        };
        self.children(head)
            .into_iter()
            .filter_map(|n| self.nodes.get(n.0)?.as_element()?.id.clone())
            .collect()
    }

    /// Serialize the subtree at `node` as HTML.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        let tag = match &n.data {
            NodeData::Text { data } => {
                out.push_str(data);
                return;
            }
            NodeData::Head => {
                out.push_str("<head>");
                "head"
            }
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.tag_name);
                for attr in &e.attrs {
                    out.push_str(&format!(" {}=\"{}\"", attr.name, attr.value));
                }
                out.push('>');
                e.tag_name.as_str()
            }
        };
        for child in &n.children {
            self.write_html(*child, out);
        }
        out.push_str(&format!("</{tag}>"));
    }
}

// ===========================================================================
// Tests
// ===========================================================================
