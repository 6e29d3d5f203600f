#![forbid(unsafe_code)]

//! Dialog composition over the overlay primitives.
//!
//! A [`DialogController`] owns the full open/close lifecycle: it renders the
//! dialog markup through a [`RenderTarget`] so it lands at the document
//! root, activates a [`FocusScope`] against the rendered panel, installs an
//! Escape listener beside the scope's Tab listener (independent key checks
//! on the same container), and locks background scroll. Closing runs the
//! same steps in reverse.
//!
//! Pointer dismissal follows the host's hit-test flow: the host resolves the
//! click target and hands it to [`DialogController::handle_click`], which
//! dismisses only when the overlay itself (not the panel) was hit.
//!
//! # Invariants
//!
//! - Open and close are symmetric: the focus scope deactivates before the
//!   portal unmounts, mirroring the activation order.
//! - Escape and Tab handling are independent key checks; both listeners sit
//!   on the panel and neither consumes the other's key.
//! - Every scroll lock taken on open is released on close.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use velum_dom::{Document, ElementKind, KeyCode, KeyEventKind, ListenerId, NodeId};
use velum_overlay::{DEFAULT_TARGET_ID, FocusScope, Host, RenderTarget};
use velum_runtime::Observable;

/// Why a dialog wants to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    /// Escape was pressed inside the dialog.
    EscapePressed,
    /// The overlay behind the panel was clicked.
    OverlayClicked,
    /// The dialog's own dismiss button was activated.
    CloseRequested,
}

/// Dialog behavior configuration.
#[derive(Debug, Clone)]
pub struct DialogConfig {
    pub close_on_escape: bool,
    pub close_on_overlay: bool,
    pub lock_scroll: bool,
    pub target_id: String,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            close_on_escape: true,
            close_on_overlay: true,
            lock_scroll: true,
            target_id: DEFAULT_TARGET_ID.to_string(),
        }
    }
}

impl DialogConfig {
    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }

    pub fn close_on_overlay(mut self, close: bool) -> Self {
        self.close_on_overlay = close;
        self
    }

    pub fn lock_scroll(mut self, lock: bool) -> Self {
        self.lock_scroll = lock;
        self
    }

    pub fn target_id(mut self, id: impl Into<String>) -> Self {
        self.target_id = id.into();
        self
    }
}

/// Declarative description of a dialog's content.
#[derive(Debug, Clone)]
pub struct Dialog {
    title: String,
    body: String,
    confirm_label: String,
    cancel_label: String,
}

impl Dialog {
    /// A dialog with a title and body text, carrying the default
    /// Confirm/Cancel buttons.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }

    /// Override the confirm button label.
    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    /// Override the cancel button label.
    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = label.into();
        self
    }

    /// Build the dialog markup: a full-surface overlay with the panel as
    /// its child, so a click on the overlay itself is distinguishable from
    /// a click anywhere in the panel.
    fn build(&self, doc: &mut Document) -> BuiltDialog {
        let overlay = doc.create_element(ElementKind::Division);
        let panel = doc.create_element(ElementKind::Division);
        doc.append_child(overlay, panel);

        let title = doc.create_text(self.title.clone());
        doc.append_child(panel, title);
        let body = doc.create_text(self.body.clone());
        doc.append_child(panel, body);

        let confirm = Self::button(doc, self.confirm_label.clone());
        doc.append_child(panel, confirm);
        let cancel = Self::button(doc, self.cancel_label.clone());
        doc.append_child(panel, cancel);
        let close = Self::button(doc, "Dismiss");
        doc.append_child(panel, close);

        BuiltDialog {
            overlay,
            panel,
            close,
        }
    }

    fn button(doc: &mut Document, label: impl Into<String>) -> NodeId {
        let button = doc.create_element(ElementKind::Button);
        let text = doc.create_text(label);
        doc.append_child(button, text);
        button
    }
}

struct BuiltDialog {
    overlay: NodeId,
    panel: NodeId,
    close: NodeId,
}

struct MountedDialog {
    overlay: NodeId,
    panel: NodeId,
    close: NodeId,
    escape_listener: Option<ListenerId>,
}

/// Owns a dialog's open/close lifecycle against a document.
pub struct DialogController {
    doc: Rc<RefCell<Document>>,
    dialog: Dialog,
    config: DialogConfig,
    open: Observable<bool>,
    portal: RenderTarget,
    scope: FocusScope,
    mounted: Option<MountedDialog>,
    pending: Rc<Cell<Option<DialogAction>>>,
}

impl DialogController {
    /// Create a closed controller for `dialog` over `doc`.
    pub fn new(doc: Rc<RefCell<Document>>, dialog: Dialog, config: DialogConfig) -> Self {
        let portal = RenderTarget::new(Host::interactive(Rc::clone(&doc)));
        let scope = FocusScope::new(Rc::clone(&doc));
        Self {
            doc,
            dialog,
            config,
            open: Observable::new(false),
            portal,
            scope,
            mounted: None,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// The reactive open flag; hosts may subscribe for re-renders.
    pub fn open_flag(&self) -> &Observable<bool> {
        &self.open
    }

    /// Whether the dialog is currently open.
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// The rendered panel, while open.
    pub fn panel(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.panel)
    }

    /// The rendered overlay, while open.
    pub fn overlay(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.overlay)
    }

    /// Open the dialog: portal mount, focus scope activation, Escape
    /// listener, scroll lock.
    pub fn open(&mut self) {
        self.open.set(true);
        self.sync();
    }

    /// Close the dialog, running the open steps in reverse.
    pub fn close(&mut self) {
        self.open.set(false);
        self.sync();
    }

    /// Reconcile the mounted state with the open flag.
    pub fn sync(&mut self) {
        match (self.mounted.is_some(), self.open.get()) {
            (false, true) => self.mount(),
            (true, false) => self.unmount(),
            _ => {}
        }
    }

    fn mount(&mut self) {
        // A dismiss action left over from a previous session must not close
        // the fresh one.
        self.pending.take();

        let dialog = self.dialog.clone();
        let target_id = self.config.target_id.clone();
        let mut built: Option<BuiltDialog> = None;
        self.portal.mount(&target_id, true, |doc, _| {
            let b = dialog.build(doc);
            let overlay = b.overlay;
            built = Some(b);
            overlay
        });
        let Some(built) = built else {
            // Host not interactive; stay logically open and render nothing.
            return;
        };

        self.scope.sync(Some(built.panel), true);

        let escape_listener = if self.config.close_on_escape {
            let pending = Rc::clone(&self.pending);
            let id = self.doc.borrow_mut().add_key_listener(
                built.panel,
                move |_, event, flow| {
                    if event.code == KeyCode::Escape && event.kind == KeyEventKind::Press {
                        pending.set(Some(DialogAction::EscapePressed));
                        flow.prevent_default();
                    }
                },
            );
            Some(id)
        } else {
            None
        };

        if self.config.lock_scroll {
            self.doc.borrow_mut().lock_scroll();
        }

        tracing::debug!(panel = ?built.panel, "dialog opened");
        self.mounted = Some(MountedDialog {
            overlay: built.overlay,
            panel: built.panel,
            close: built.close,
            escape_listener,
        });
    }

    fn unmount(&mut self) {
        let Some(m) = self.mounted.take() else {
            return;
        };

        // Reverse of the open order: scope first, so focus restoration runs
        // while the panel is still in the document.
        self.scope.sync(Some(m.panel), false);

        {
            let mut d = self.doc.borrow_mut();
            if let Some(listener) = m.escape_listener {
                d.remove_key_listener(listener);
            }
            if self.config.lock_scroll {
                d.unlock_scroll();
            }
        }

        self.portal.unmount();
        tracing::debug!("dialog closed");
    }

    /// Feed a resolved click target (from the host's hit testing). A hit on
    /// the overlay itself dismisses when configured; a hit on the dialog's
    /// dismiss button requests close. Returns the action taken, if any.
    pub fn handle_click(&mut self, hit: NodeId) -> Option<DialogAction> {
        let m = self.mounted.as_ref()?;
        if hit == m.overlay && self.config.close_on_overlay {
            self.pending.set(Some(DialogAction::OverlayClicked));
        } else if hit == m.close {
            self.pending.set(Some(DialogAction::CloseRequested));
        }
        self.poll_action()
    }

    /// Drain the pending dismiss action, closing the dialog if one fired.
    ///
    /// Call after dispatching key events into the document: the Escape
    /// listener records its action here rather than tearing the dialog down
    /// mid-dispatch.
    pub fn poll_action(&mut self) -> Option<DialogAction> {
        let action = self.pending.take();
        if action.is_some() {
            self.close();
        }
        action
    }
}

impl Drop for DialogController {
    fn drop(&mut self) {
        // A controller dropped while open still unwinds its listener and
        // scroll lock; the portal and scope handle their own teardown.
        self.unmount();
    }
}

impl std::fmt::Debug for DialogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogController")
            .field("open", &self.is_open())
            .field("mounted", &self.mounted.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velum_dom::KeyEvent;

    fn controller() -> (DialogController, Rc<RefCell<Document>>, NodeId) {
        let doc = Rc::new(RefCell::new(Document::new()));
        let trigger = {
            let mut d = doc.borrow_mut();
            let body = d.body();
            let trigger = d.create_element(ElementKind::Button);
            d.append_child(body, trigger);
            d.focus(trigger);
            trigger
        };
        let dialog = Dialog::new("Delete workspace?", "This cannot be undone.");
        let ctl = DialogController::new(Rc::clone(&doc), dialog, DialogConfig::default());
        (ctl, doc, trigger)
    }

    fn press(doc: &Rc<RefCell<Document>>, code: KeyCode) {
        doc.borrow_mut().dispatch_key_to_active(&KeyEvent::press(code));
    }

    #[test]
    fn open_mounts_focuses_and_locks() {
        let (mut ctl, doc, trigger) = controller();
        ctl.open();

        assert!(ctl.is_open());
        let panel = ctl.panel().expect("mounted");
        let d = doc.borrow();
        assert!(d.is_attached(panel));
        assert!(d.scroll_locked());
        assert_ne!(d.active_element(), trigger, "focus moved into the dialog");
        assert!(d.is_focusable(d.active_element()));
    }

    #[test]
    fn close_unwinds_everything() {
        let (mut ctl, doc, trigger) = controller();
        ctl.open();
        let panel = ctl.panel().expect("mounted");
        ctl.close();

        let d = doc.borrow();
        assert!(!d.is_attached(panel));
        assert!(!d.scroll_locked());
        assert_eq!(d.active_element(), trigger, "focus restored to the trigger");
        assert_eq!(d.element_by_id(DEFAULT_TARGET_ID), None, "portal reclaimed");
    }

    #[test]
    fn escape_dismisses() {
        let (mut ctl, doc, trigger) = controller();
        ctl.open();

        press(&doc, KeyCode::Escape);
        let action = ctl.poll_action();

        assert_eq!(action, Some(DialogAction::EscapePressed));
        assert!(!ctl.is_open());
        assert_eq!(doc.borrow().active_element(), trigger);
    }

    #[test]
    fn escape_disabled_is_ignored() {
        let doc = Rc::new(RefCell::new(Document::new()));
        let dialog = Dialog::new("Working", "Please wait.");
        let config = DialogConfig::default().close_on_escape(false);
        let mut ctl = DialogController::new(Rc::clone(&doc), dialog, config);
        ctl.open();

        press(&doc, KeyCode::Escape);
        assert_eq!(ctl.poll_action(), None);
        assert!(ctl.is_open());
    }

    #[test]
    fn overlay_click_dismisses_panel_click_does_not() {
        let (mut ctl, _doc, _) = controller();
        ctl.open();
        let overlay = ctl.overlay().expect("mounted");
        let panel = ctl.panel().expect("mounted");

        assert_eq!(ctl.handle_click(panel), None);
        assert!(ctl.is_open());

        assert_eq!(ctl.handle_click(overlay), Some(DialogAction::OverlayClicked));
        assert!(!ctl.is_open());
    }

    #[test]
    fn overlay_dismiss_can_be_disabled() {
        let doc = Rc::new(RefCell::new(Document::new()));
        let dialog = Dialog::new("Pick a plan", "Monthly or yearly.");
        let config = DialogConfig::default().close_on_overlay(false);
        let mut ctl = DialogController::new(Rc::clone(&doc), dialog, config);
        ctl.open();

        let overlay = ctl.overlay().expect("mounted");
        assert_eq!(ctl.handle_click(overlay), None);
        assert!(ctl.is_open());
    }

    #[test]
    fn dismiss_button_requests_close() {
        let (mut ctl, _doc, _) = controller();
        ctl.open();
        let close = ctl.mounted.as_ref().map(|m| m.close).expect("mounted");

        assert_eq!(ctl.handle_click(close), Some(DialogAction::CloseRequested));
        assert!(!ctl.is_open());
    }

    #[test]
    fn tab_and_escape_listeners_coexist() {
        let (mut ctl, doc, _) = controller();
        ctl.open();
        let panel = ctl.panel().expect("mounted");
        assert_eq!(
            doc.borrow().key_listener_count(panel),
            2,
            "trap listener and escape listener share the panel"
        );

        // Tab cycles without dismissing; Escape then dismisses.
        press(&doc, KeyCode::Tab);
        assert_eq!(ctl.poll_action(), None);
        assert!(ctl.is_open());

        press(&doc, KeyCode::Escape);
        assert_eq!(ctl.poll_action(), Some(DialogAction::EscapePressed));
        assert_eq!(doc.borrow().key_listener_count(panel), 0);
    }

    #[test]
    fn focus_cycles_through_dialog_buttons() {
        let (mut ctl, doc, _) = controller();
        ctl.open();
        let panel = ctl.panel().expect("mounted");
        let buttons: Vec<NodeId> = {
            let d = doc.borrow();
            d.descendants(panel)
                .into_iter()
                .filter(|n| d.is_focusable(*n))
                .collect()
        };
        assert_eq!(buttons.len(), 3, "confirm, cancel, dismiss");
        assert_eq!(doc.borrow().active_element(), buttons[0]);

        press(&doc, KeyCode::Tab);
        press(&doc, KeyCode::Tab);
        assert_eq!(doc.borrow().active_element(), buttons[2]);
        press(&doc, KeyCode::Tab);
        assert_eq!(doc.borrow().active_element(), buttons[0], "wraps inside");
    }

    #[test]
    fn reopen_cycles_cleanly() {
        let (mut ctl, doc, trigger) = controller();
        for _ in 0..3 {
            ctl.open();
            assert!(ctl.panel().is_some());
            ctl.close();
            assert_eq!(doc.borrow().active_element(), trigger);
            assert!(!doc.borrow().scroll_locked());
        }
    }

    #[test]
    fn drop_while_open_unwinds() {
        let (mut ctl, doc, trigger) = controller();
        ctl.open();
        drop(ctl);

        let d = doc.borrow();
        assert!(!d.scroll_locked());
        assert_eq!(d.active_element(), trigger);
        assert_eq!(d.element_by_id(DEFAULT_TARGET_ID), None);
    }

    #[test]
    fn open_twice_is_idempotent() {
        let (mut ctl, doc, _) = controller();
        ctl.open();
        let panel = ctl.panel();
        ctl.open();
        assert_eq!(ctl.panel(), panel);
        assert_eq!(
            doc.borrow().key_listener_count(panel.expect("mounted")),
            2,
            "no duplicate listeners"
        );
    }

    #[test]
    fn custom_target_id_is_used() {
        let doc = Rc::new(RefCell::new(Document::new()));
        let dialog = Dialog::new("Hi", "There");
        let config = DialogConfig::default().target_id("dialog-layer");
        let mut ctl = DialogController::new(Rc::clone(&doc), dialog, config);
        ctl.open();
        assert!(doc.borrow().element_by_id("dialog-layer").is_some());
        ctl.close();
        assert_eq!(doc.borrow().element_by_id("dialog-layer"), None);
    }

    #[test]
    fn builder_labels_reach_markup() {
        let doc = Rc::new(RefCell::new(Document::new()));
        let dialog = Dialog::new("Upgrade", "Go pro today.")
            .confirm_label("Upgrade now")
            .cancel_label("Maybe later");
        let mut ctl = DialogController::new(Rc::clone(&doc), dialog, DialogConfig::default());
        ctl.open();

        let panel = ctl.panel().expect("mounted");
        let d = doc.borrow();
        let texts: Vec<String> = d
            .descendants(panel)
            .into_iter()
            .filter_map(|n| match d.kind(n) {
                ElementKind::Text(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert!(texts.iter().any(|t| t == "Upgrade now"));
        assert!(texts.iter().any(|t| t == "Maybe later"));
    }
}
