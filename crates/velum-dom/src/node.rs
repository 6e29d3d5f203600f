#![forbid(unsafe_code)]

//! Node handles and element kinds.

use smallvec::SmallVec;

/// Handle to a node in a [`Document`](crate::Document) arena.
///
/// Handles are cheap to copy and remain valid for the lifetime of the
/// document; removing a node detaches it from the tree but never invalidates
/// outstanding handles. A handle from one document must not be used with
/// another (the arenas are unrelated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize);
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw arena index, for diagnostics.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The kind of a document node.
///
/// The interactive kinds (button, anchor with a target, input, select,
/// textarea) are reachable by keyboard Tab navigation without an explicit
/// tab index; everything else needs `tab_index >= 0` to participate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Generic block container.
    Division,
    Button,
    /// Anchor; only focusable when it carries a target.
    Anchor { href: Option<String> },
    Input,
    Select,
    TextArea,
    /// Leaf text content. Never focusable.
    Text(String),
}

impl ElementKind {
    /// Whether this kind is interactive (focusable without a tab index).
    pub fn is_interactive(&self) -> bool {
        match self {
            Self::Button | Self::Input | Self::Select | Self::TextArea => true,
            Self::Anchor { href } => href.is_some(),
            Self::Division | Self::Text(_) => false,
        }
    }

    /// Whether this is a text leaf.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Arena storage for a single node.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: ElementKind,
    pub(crate) id: Option<String>,
    pub(crate) tab_index: Option<i32>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

impl Node {
    pub(crate) fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            tab_index: None,
            parent: None,
            children: SmallVec::new(),
        }
    }
}
