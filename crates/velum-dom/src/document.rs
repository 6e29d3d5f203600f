#![forbid(unsafe_code)]

//! The document: node arena, tree structure, focus pointer, and key
//! dispatch.
//!
//! A `Document` is the single ambient mutable resource of the toolkit. All
//! interaction is single-threaded and synchronous; every mutation happens
//! inside a discrete call from the UI event loop.
//!
//! # Invariants
//!
//! - The root and body exist for the document's lifetime and cannot be
//!   removed or re-parented.
//! - Exactly one element holds focus at any time; removing the subtree that
//!   contains it moves focus back to the body.
//! - `element_by_id` only resolves nodes that are currently attached.
//! - Listener dispatch runs against a snapshot, so handlers may freely
//!   mutate the document (move focus, add or remove listeners) without
//!   aliasing the listener table.
//!
//! # Failure Modes
//!
//! - `append_child` refuses cycles and re-parenting the root; it returns
//!   `false` rather than panicking.
//! - `remove` of the root or body is a no-op returning `false`.
//! - `focus` on a detached node is a no-op returning `false`.
//! - Dispatching to a detached node runs only the listeners in that
//!   detached subtree's ancestor chain; there is nothing to crash.

use std::collections::HashMap;
use std::rc::Rc;

use crate::event::{EventFlow, KeyEvent};
use crate::node::{ElementKind, Node, NodeId};

/// A key listener callback.
///
/// Handlers receive the document itself so they can move focus or mutate the
/// tree; the dispatch loop works off a snapshot, so this is safe.
pub type KeyHandler = dyn Fn(&mut Document, &KeyEvent, &mut EventFlow);

/// Handle to an installed key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct KeyListener {
    id: ListenerId,
    target: NodeId,
    handler: Rc<KeyHandler>,
}

/// A retained element tree with a focus pointer and key-event dispatch.
pub struct Document {
    nodes: Vec<Node>,
    ids: HashMap<String, NodeId, ahash::RandomState>,
    root: NodeId,
    body: NodeId,
    active: NodeId,
    listeners: Vec<KeyListener>,
    next_listener: u64,
    scroll_locks: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with a root and an empty body.
    ///
    /// Focus starts on the body, mirroring a freshly loaded page.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            ids: HashMap::default(),
            root: NodeId::from_index(0),
            body: NodeId::from_index(0),
            active: NodeId::from_index(0),
            listeners: Vec::new(),
            next_listener: 1,
            scroll_locks: 0,
        };
        let root = doc.alloc(ElementKind::Division);
        let body = doc.alloc(ElementKind::Division);
        doc.nodes[body.index()].parent = Some(root);
        doc.nodes[root.index()].children.push(body);
        doc.root = root;
        doc.body = body;
        doc.active = body;
        doc
    }

    fn alloc(&mut self, kind: ElementKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    // --- Structure ---

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The body element (direct child of the root).
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element of the given kind.
    pub fn create_element(&mut self, kind: ElementKind) -> NodeId {
        self.alloc(kind)
    }

    /// Create a detached text leaf.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(ElementKind::Text(content.into()))
    }

    /// The kind of a node.
    pub fn kind(&self, node: NodeId) -> &ElementKind {
        &self.nodes[node.index()].kind
    }

    /// Assign a string id to a node. A later assignment of the same id to
    /// another node wins the lookup (last write wins).
    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        let id = id.into();
        if let Some(old) = self.nodes[node.index()].id.take() {
            if self.ids.get(&old) == Some(&node) {
                self.ids.remove(&old);
            }
        }
        if self.ids.insert(id.clone(), node).is_some() {
            tracing::debug!(id = %id, "duplicate element id reassigned");
        }
        self.nodes[node.index()].id = Some(id);
    }

    /// The string id assigned to a node, if any.
    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.index()].id.as_deref()
    }

    /// Look up an attached element by string id.
    ///
    /// Detached nodes do not satisfy lookups even if their id is still
    /// registered.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let node = *self.ids.get(id)?;
        self.is_attached(node).then_some(node)
    }

    /// Set an explicit tab index. Text leaves never become focusable.
    pub fn set_tab_index(&mut self, node: NodeId, tab_index: i32) {
        self.nodes[node.index()].tab_index = Some(tab_index);
    }

    /// The explicit tab index of a node, if one was set.
    pub fn tab_index(&self, node: NodeId) -> Option<i32> {
        self.nodes[node.index()].tab_index
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    ///
    /// Returns `false` (and changes nothing) if the operation would create a
    /// cycle or re-parent the root.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child == self.root || parent == child || self.is_ancestor_of(child, parent) {
            tracing::warn!(?parent, ?child, "rejected append that would break the tree");
            return false;
        }
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        true
    }

    /// Detach a subtree from the document.
    ///
    /// The root and body cannot be removed. If the focused element was inside
    /// the removed subtree, focus falls back to the body. Returns `false` if
    /// the node was not attached to a parent.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || node == self.body {
            return false;
        }
        if self.nodes[node.index()].parent.is_none() {
            return false;
        }
        let focus_inside = self.active == node || self.is_ancestor_of(node, self.active);
        self.detach(node);
        if focus_inside {
            tracing::trace!(?node, "focused subtree removed; focus falls back to body");
            self.active = self.body;
        }
        true
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != node);
        }
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root {
                return true;
            }
            match self.nodes[cur.index()].parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.nodes[node.index()].parent;
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.nodes[n.index()].parent;
        }
        false
    }

    /// The parent of a node, if attached to one.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    /// The children of a node, in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    /// Number of immediate children.
    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node.index()].children.len()
    }

    /// All descendants of `node` in document (pre-)order, excluding `node`
    /// itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.index()]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.index()].children.iter().rev().copied());
        }
        out
    }

    // --- Focus ---

    /// Whether a node is reachable by keyboard Tab navigation: interactive
    /// kinds, or any non-text element with an explicit non-negative tab
    /// index.
    pub fn is_focusable(&self, node: NodeId) -> bool {
        let n = &self.nodes[node.index()];
        if n.kind.is_interactive() {
            return true;
        }
        !n.kind.is_text() && n.tab_index.is_some_and(|t| t >= 0)
    }

    /// Move document focus to `node`. No-op for detached nodes.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_attached(node) {
            return false;
        }
        if self.active != node {
            tracing::trace!(from = ?self.active, to = ?node, "focus moved");
            self.active = node;
        }
        true
    }

    /// Reset focus to the body.
    pub fn blur(&mut self) {
        self.active = self.body;
    }

    /// The element currently holding focus (the body when nothing else
    /// does).
    pub fn active_element(&self) -> NodeId {
        self.active
    }

    /// All focusable elements in the document, in document order.
    pub fn document_focusables(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| self.is_focusable(*n))
            .collect()
    }

    // --- Key listeners and dispatch ---

    /// Install a keydown listener on `target`.
    pub fn add_key_listener(
        &mut self,
        target: NodeId,
        handler: impl Fn(&mut Document, &KeyEvent, &mut EventFlow) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(KeyListener {
            id,
            target,
            handler: Rc::new(handler),
        });
        tracing::trace!(?id, ?target, "key listener installed");
        id
    }

    /// Remove a previously installed key listener. Idempotent.
    pub fn remove_key_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        let removed = self.listeners.len() != before;
        if removed {
            tracing::trace!(?id, "key listener removed");
        }
        removed
    }

    /// Number of key listeners installed on `target`.
    pub fn key_listener_count(&self, target: NodeId) -> usize {
        self.listeners.iter().filter(|l| l.target == target).count()
    }

    /// Dispatch a key event starting at `target` and bubbling to the root.
    ///
    /// Listeners run in installation order per node, innermost node first.
    /// After the listener pass, an unprevented Tab press triggers native
    /// traversal: focus moves to the next (or, with Shift, previous)
    /// focusable element in document order, wrapping at the ends.
    pub fn dispatch_key(&mut self, target: NodeId, event: &KeyEvent) -> EventFlow {
        let mut path = Vec::new();
        let mut cur = Some(target);
        while let Some(node) = cur {
            path.push(node);
            cur = self.nodes[node.index()].parent;
        }

        let mut flow = EventFlow::default();
        for node in path {
            let handlers: Vec<Rc<KeyHandler>> = self
                .listeners
                .iter()
                .filter(|l| l.target == node)
                .map(|l| Rc::clone(&l.handler))
                .collect();
            for handler in handlers {
                handler(self, event, &mut flow);
            }
            if flow.propagation_stopped() {
                break;
            }
        }

        if !flow.default_prevented() && event.is_tab_press() {
            self.native_tab_traversal(event.shifted());
        }
        flow
    }

    /// Dispatch a key event to the currently focused element.
    pub fn dispatch_key_to_active(&mut self, event: &KeyEvent) -> EventFlow {
        let target = self.active;
        self.dispatch_key(target, event)
    }

    fn native_tab_traversal(&mut self, backwards: bool) {
        let focusables = self.document_focusables();
        if focusables.is_empty() {
            return;
        }
        let next = match focusables.iter().position(|n| *n == self.active) {
            Some(i) if backwards => focusables[(i + focusables.len() - 1) % focusables.len()],
            Some(i) => focusables[(i + 1) % focusables.len()],
            None if backwards => *focusables.last().unwrap_or(&self.body),
            None => focusables[0],
        };
        self.focus(next);
    }

    // --- Scroll lock ---

    /// Acquire a background-scroll lock on the body. Counted; every call
    /// must be paired with [`Document::unlock_scroll`].
    pub fn lock_scroll(&mut self) {
        self.scroll_locks += 1;
    }

    /// Release one background-scroll lock.
    pub fn unlock_scroll(&mut self) {
        self.scroll_locks = self.scroll_locks.saturating_sub(1);
    }

    /// Whether background scrolling is currently locked.
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locks > 0
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("active", &self.active)
            .field("listeners", &self.listeners.len())
            .field("scroll_locks", &self.scroll_locks)
            .finish()
    }
}
