#![forbid(unsafe_code)]

//! Render targets: detached DOM containers for overlay content.
//!
//! A [`RenderTarget`] renders content into a container identified by a
//! string id instead of the caller's natural tree position. The container is
//! created lazily on first use, shared freely between consumers using the
//! same id, and reclaimed by the consumer that created it once nothing is
//! left inside.
//!
//! Rendering goes through the host's render-into-node primitive: the caller
//! supplies a closure that builds content and returns its root, and the
//! target parents that root under the container. This crate only manages the
//! container's lifecycle, not what goes inside it.
//!
//! # Invariants
//!
//! - A target never removes a container it did not create.
//! - A target never removes a container that still has children; a sibling
//!   consumer sharing the id may still be using it.
//! - Before the host confirms an interactive document, every operation
//!   renders nothing.
//!
//! # Failure Modes
//!
//! - Target id absent with creation disabled: renders nothing; an explicit
//!   not-found outcome, not an error.
//! - Container removed externally between renders: the stale registration
//!   is discarded and the mount starts over.

use std::cell::RefCell;
use std::rc::Rc;

use velum_dom::{Document, ElementKind, NodeId};

/// Default container id used by [`RenderTarget::mount_default`].
pub const DEFAULT_TARGET_ID: &str = "portal-root";

/// Handle to the hosting environment.
///
/// Starts detached, the state of a render pass that has not yet confirmed
/// it is running against a live, interactive document (e.g. the first paint
/// of a server-rendered page). Once [`Host::confirm`] supplies a document,
/// every clone of the handle sees it.
#[derive(Clone)]
pub struct Host {
    inner: Rc<RefCell<Option<Rc<RefCell<Document>>>>>,
}

impl Host {
    /// A host with no interactive document yet.
    pub fn detached() -> Self {
        Self {
            inner: Rc::new(RefCell::new(None)),
        }
    }

    /// A host that is interactive from the start.
    pub fn interactive(doc: Rc<RefCell<Document>>) -> Self {
        let host = Self::detached();
        host.confirm(doc);
        host
    }

    /// Confirm the interactive document. Repeated confirmation replaces the
    /// document (and is logged; it usually indicates a host bug).
    pub fn confirm(&self, doc: Rc<RefCell<Document>>) {
        let mut slot = self.inner.borrow_mut();
        if slot.is_some() {
            tracing::debug!("host re-confirmed with a new document");
        }
        *slot = Some(doc);
    }

    /// Whether an interactive document is available.
    pub fn is_interactive(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// The confirmed document, if any.
    pub fn document(&self) -> Option<Rc<RefCell<Document>>> {
        self.inner.borrow().clone()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("interactive", &self.is_interactive())
            .finish()
    }
}

struct Mounted {
    target_id: String,
    create_if_missing: bool,
    container: NodeId,
    created_here: bool,
    content_root: Option<NodeId>,
}

/// Renders content into a shared, id-addressed container.
pub struct RenderTarget {
    host: Host,
    mounted: Option<Mounted>,
}

impl RenderTarget {
    /// Create an unmounted target over the given host.
    pub fn new(host: Host) -> Self {
        Self {
            host,
            mounted: None,
        }
    }

    /// The hosting environment handle.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Render content into the container identified by `target_id`.
    ///
    /// `render` is the host framework's render-into-node primitive: it
    /// receives the document and the container and returns the root of the
    /// content it built; the target parents that root under the container.
    ///
    /// If the container does not exist and `create_if_missing` is set, a
    /// division carrying the id is appended to the body and recorded as
    /// created by this instance. Re-mounting with the same id replaces the
    /// previous content; re-mounting with a different id (or creation flag)
    /// tears the previous registration down first.
    pub fn mount(
        &mut self,
        target_id: &str,
        create_if_missing: bool,
        render: impl FnOnce(&mut Document, NodeId) -> NodeId,
    ) {
        let Some(doc) = self.host.document() else {
            tracing::trace!(target_id, "host not interactive; rendering nothing");
            return;
        };

        if let Some(m) = &self.mounted {
            let stale = m.target_id != target_id
                || m.create_if_missing != create_if_missing
                || !doc.borrow().is_attached(m.container);
            if stale {
                self.unmount();
            }
        }

        let mut d = doc.borrow_mut();
        match self.mounted.as_mut() {
            Some(m) => {
                if let Some(old) = m.content_root.take() {
                    d.remove(old);
                }
                let root = render(&mut d, m.container);
                d.append_child(m.container, root);
                m.content_root = Some(root);
            }
            None => {
                let (container, created_here) = match d.element_by_id(target_id) {
                    Some(existing) => (existing, false),
                    None if create_if_missing => {
                        let container = d.create_element(ElementKind::Division);
                        d.set_id(container, target_id);
                        let body = d.body();
                        d.append_child(body, container);
                        tracing::debug!(target_id, "render target container created");
                        (container, true)
                    }
                    None => {
                        tracing::trace!(target_id, "render target missing and creation disabled");
                        return;
                    }
                };
                let root = render(&mut d, container);
                d.append_child(container, root);
                self.mounted = Some(Mounted {
                    target_id: target_id.to_string(),
                    create_if_missing,
                    container,
                    created_here,
                    content_root: Some(root),
                });
            }
        }
    }

    /// [`RenderTarget::mount`] against [`DEFAULT_TARGET_ID`] with creation
    /// enabled.
    pub fn mount_default(&mut self, render: impl FnOnce(&mut Document, NodeId) -> NodeId) {
        self.mount(DEFAULT_TARGET_ID, true, render);
    }

    /// Remove this instance's content and, when this instance created the
    /// container and nothing else remains inside, reclaim the container.
    /// Idempotent; also runs on drop.
    pub fn unmount(&mut self) {
        let Some(m) = self.mounted.take() else {
            return;
        };
        let Some(doc) = self.host.document() else {
            return;
        };
        let mut d = doc.borrow_mut();
        if let Some(root) = m.content_root {
            d.remove(root);
        }
        if m.created_here && d.child_count(m.container) == 0 {
            d.remove(m.container);
            tracing::debug!(target_id = %m.target_id, "render target container reclaimed");
        }
    }

    /// The container currently rendered into, if mounted.
    pub fn container(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.container)
    }

    /// The root of the content this instance rendered, if mounted.
    pub fn content_root(&self) -> Option<NodeId> {
        self.mounted.as_ref().and_then(|m| m.content_root)
    }

    /// Whether this instance created the container it renders into.
    pub fn created_container(&self) -> bool {
        self.mounted.as_ref().is_some_and(|m| m.created_here)
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("target_id", &self.mounted.as_ref().map(|m| &m.target_id))
            .field("created_here", &self.created_container())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactive_host() -> (Host, Rc<RefCell<Document>>) {
        let doc = Rc::new(RefCell::new(Document::new()));
        (Host::interactive(Rc::clone(&doc)), doc)
    }

    fn render_message(doc: &mut Document, _container: NodeId) -> NodeId {
        let panel = doc.create_element(ElementKind::Division);
        let text = doc.create_text("hello from the portal");
        doc.append_child(panel, text);
        panel
    }

    #[test]
    fn detached_host_renders_nothing() {
        let mut target = RenderTarget::new(Host::detached());
        target.mount_default(render_message);
        assert_eq!(target.container(), None);
    }

    #[test]
    fn mount_creates_container_under_body() {
        let (host, doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount_default(render_message);

        let d = doc.borrow();
        let container = d.element_by_id(DEFAULT_TARGET_ID).expect("container exists");
        assert_eq!(d.parent(container), Some(d.body()));
        assert_eq!(target.container(), Some(container));
        assert!(target.created_container());
        assert_eq!(d.child_count(container), 1, "content root parented inside");
    }

    #[test]
    fn missing_target_without_creation_renders_nothing() {
        let (host, doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount("announcements", false, render_message);

        assert_eq!(target.container(), None);
        assert_eq!(doc.borrow().element_by_id("announcements"), None);
    }

    #[test]
    fn preexisting_container_is_reused_not_owned() {
        let (host, doc) = interactive_host();
        let preexisting = {
            let mut d = doc.borrow_mut();
            let n = d.create_element(ElementKind::Division);
            d.set_id(n, "announcements");
            let body = d.body();
            d.append_child(body, n);
            n
        };

        let mut target = RenderTarget::new(host);
        target.mount("announcements", true, render_message);
        assert_eq!(target.container(), Some(preexisting));
        assert!(!target.created_container());

        target.unmount();
        assert!(
            doc.borrow().is_attached(preexisting),
            "a container this instance did not create is never removed"
        );
    }

    #[test]
    fn unmount_reclaims_created_empty_container() {
        let (host, doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount_default(render_message);

        target.unmount();
        assert_eq!(doc.borrow().element_by_id(DEFAULT_TARGET_ID), None);
    }

    #[test]
    fn drop_reclaims_like_unmount() {
        let (host, doc) = interactive_host();
        {
            let mut target = RenderTarget::new(host);
            target.mount_default(render_message);
        }
        assert_eq!(doc.borrow().element_by_id(DEFAULT_TARGET_ID), None);
    }

    #[test]
    fn unmount_twice_is_harmless() {
        let (host, _doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount_default(render_message);
        target.unmount();
        target.unmount();
    }

    #[test]
    fn shared_id_single_container() {
        let (host, doc) = interactive_host();
        let mut first = RenderTarget::new(host.clone());
        let mut second = RenderTarget::new(host);
        first.mount("shared-root", true, render_message);
        second.mount("shared-root", true, render_message);

        assert_eq!(first.container(), second.container());
        assert!(first.created_container());
        assert!(!second.created_container());
        let d = doc.borrow();
        let container = first.container().expect("mounted");
        assert_eq!(d.child_count(container), 2, "both consumers' content present");
    }

    #[test]
    fn creator_teardown_spares_occupied_container() {
        let (host, doc) = interactive_host();
        let mut first = RenderTarget::new(host.clone());
        let mut second = RenderTarget::new(host);
        first.mount("shared-root", true, render_message);
        second.mount("shared-root", true, render_message);
        let container = first.container().expect("mounted");

        // The creator leaves while a sibling still renders into the node.
        first.unmount();
        let d = doc.borrow();
        assert!(d.is_attached(container), "occupied container survives");
        assert_eq!(d.child_count(container), 1);
    }

    #[test]
    fn non_creator_teardown_never_removes() {
        let (host, doc) = interactive_host();
        let mut first = RenderTarget::new(host.clone());
        let mut second = RenderTarget::new(host);
        first.mount("shared-root", true, render_message);
        second.mount("shared-root", true, render_message);
        let container = first.container().expect("mounted");

        second.unmount();
        first.unmount();
        // First created it and found it empty: reclaimed.
        assert!(!doc.borrow().is_attached(container));
    }

    #[test]
    fn remount_same_id_replaces_content() {
        let (host, doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount_default(render_message);
        let first_root = target.content_root().expect("content");

        target.mount_default(|doc, _| doc.create_element(ElementKind::Division));
        let second_root = target.content_root().expect("content");

        let d = doc.borrow();
        assert_ne!(first_root, second_root);
        assert!(!d.is_attached(first_root), "old content removed");
        let container = target.container().expect("mounted");
        assert_eq!(d.child_count(container), 1);
    }

    #[test]
    fn changing_target_id_tears_down_first() {
        let (host, doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount("portal-a", true, render_message);
        target.mount("portal-b", true, render_message);

        let d = doc.borrow();
        assert_eq!(d.element_by_id("portal-a"), None, "abandoned container reclaimed");
        assert!(d.element_by_id("portal-b").is_some());
    }

    #[test]
    fn externally_removed_container_restarts_mount() {
        let (host, doc) = interactive_host();
        let mut target = RenderTarget::new(host);
        target.mount_default(render_message);
        let old = target.container().expect("mounted");
        doc.borrow_mut().remove(old);

        target.mount_default(render_message);
        let fresh = target.container().expect("remounted");
        assert_ne!(fresh, old);
        assert!(doc.borrow().is_attached(fresh));
    }

    #[test]
    fn host_confirmation_unblocks_rendering() {
        let host = Host::detached();
        let mut target = RenderTarget::new(host.clone());
        target.mount_default(render_message);
        assert_eq!(target.container(), None);

        let doc = Rc::new(RefCell::new(Document::new()));
        host.confirm(Rc::clone(&doc));
        target.mount_default(render_message);
        assert!(target.container().is_some());
        assert!(doc.borrow().element_by_id(DEFAULT_TARGET_ID).is_some());
    }
}
