#![forbid(unsafe_code)]

//! Keyboard focus confinement for overlay surfaces.
//!
//! A [`FocusScope`] watches a `(container, active)` pair. While active
//! against a live container it discovers the focusable descendants, moves
//! focus to the first of them, and intercepts boundary Tab presses so
//! keyboard traversal wraps inside the container instead of escaping it.
//! Deactivating restores focus to the element that held it immediately
//! before activation.
//!
//! The scope is a reactive effect: call [`FocusScope::sync`] whenever the
//! activation flag or the container identity changes, exactly like the host
//! framework re-running an effect on dependency change. Teardown of one
//! activation cycle always completes before the next cycle's setup.
//!
//! # Invariants
//!
//! - At most one Tab listener is installed per container while active.
//! - Teardown runs exactly once per activation cycle, on deactivation,
//!   dependency change, or drop.
//! - A container with no focusable descendants produces an inert scope: no
//!   focus movement, no listener, nothing to tear down.
//!
//! # Failure Modes
//!
//! - Missing or detached container while active: skipped this cycle and
//!   re-attempted on the next `sync`, even with unchanged inputs.
//! - Restoration anchor detached by the time the scope deactivates: the
//!   restore is skipped, never an error.

use std::cell::RefCell;
use std::rc::Rc;

use velum_dom::{Document, NodeId};
use velum_runtime::{Effect, SetupResult};

/// The focusable descendants of `container`, in document order.
///
/// Focusability follows [`Document::is_focusable`]: interactive elements
/// (buttons, anchors with a target, inputs, selects, text areas) plus any
/// element with an explicit non-negative tab index.
pub fn focusable_descendants(doc: &Document, container: NodeId) -> Vec<NodeId> {
    doc.descendants(container)
        .into_iter()
        .filter(|n| doc.is_focusable(*n))
        .collect()
}

/// Confines keyboard focus within a container while active.
pub struct FocusScope {
    doc: Rc<RefCell<Document>>,
    effect: Effect<(Option<NodeId>, bool)>,
}

impl FocusScope {
    /// Create an inactive scope over the given document.
    pub fn new(doc: Rc<RefCell<Document>>) -> Self {
        Self {
            doc,
            effect: Effect::new(),
        }
    }

    /// Reconcile the scope with its inputs.
    ///
    /// Invoke whenever `active` or the container identity changes (repeat
    /// calls with unchanged inputs are cheap no-ops). On a false→true
    /// transition with a live container this captures the focusable
    /// sequence, records the restoration anchor, focuses the first
    /// focusable, and installs the boundary Tab listener. On a true→false
    /// transition (or any dependency change) the previous cycle is fully
    /// torn down first: listener removed, focus restored to the anchor if it
    /// is still attached.
    pub fn sync(&mut self, container: Option<NodeId>, active: bool) {
        let doc = Rc::clone(&self.doc);
        self.effect.run((container, active), move |&(container, active)| {
            if !active {
                return SetupResult::Empty;
            }
            let Some(container) = container else {
                return SetupResult::Deferred;
            };
            let mut d = doc.borrow_mut();
            if !d.is_attached(container) {
                tracing::trace!(?container, "focus scope container not live; deferring");
                return SetupResult::Deferred;
            }

            let sequence = focusable_descendants(&d, container);
            let (Some(&first), Some(&last)) = (sequence.first(), sequence.last()) else {
                tracing::debug!(?container, "focus scope has nothing focusable; inert");
                return SetupResult::Empty;
            };

            let origin = d.active_element();
            d.focus(first);
            let listener = d.add_key_listener(container, move |d, event, flow| {
                if !event.is_tab_press() {
                    return;
                }
                let focused = d.active_element();
                if event.shifted() && focused == first {
                    flow.prevent_default();
                    d.focus(last);
                } else if !event.shifted() && focused == last {
                    flow.prevent_default();
                    d.focus(first);
                }
                // Mid-sequence Tab presses fall through to native traversal.
            });
            drop(d);
            tracing::debug!(?container, focusables = sequence.len(), "focus scope engaged");

            let doc = Rc::clone(&doc);
            SetupResult::Installed(Box::new(move || {
                let mut d = doc.borrow_mut();
                d.remove_key_listener(listener);
                if d.is_attached(origin) {
                    d.focus(origin);
                }
            }))
        });
    }

    /// Deactivate and forget the inputs. Equivalent to `sync(None, false)`
    /// but also resets the dependency state; also runs on drop.
    pub fn dispose(&mut self) {
        self.effect.dispose();
    }

    /// Whether a trap is currently engaged (listener installed).
    pub fn is_trapping(&self) -> bool {
        self.effect.is_installed()
    }
}

impl std::fmt::Debug for FocusScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusScope")
            .field("trapping", &self.is_trapping())
            .finish()
    }
}
