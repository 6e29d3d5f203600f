#![forbid(unsafe_code)]

//! Velum: accessible overlay primitives for retained UI trees.
//!
//! Velum provides the two building blocks every modal surface needs: a
//! [`FocusScope`](velum_overlay::FocusScope) that confines keyboard
//! navigation inside an open dialog and restores focus on close, and a
//! [`RenderTarget`](velum_overlay::RenderTarget) that renders content into a
//! shared container at the document root instead of the caller's natural
//! tree position. A [`DialogController`](velum_widgets::DialogController)
//! composes both with Escape/overlay dismissal and scroll locking.
//!
//! # Quick start
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use velum::prelude::*;
//!
//! let doc = Rc::new(RefCell::new(Document::new()));
//! let dialog = Dialog::new("Delete workspace?", "This cannot be undone.");
//! let mut controller =
//!     DialogController::new(Rc::clone(&doc), dialog, DialogConfig::default());
//!
//! controller.open();
//! assert!(doc.borrow().scroll_locked());
//!
//! controller.close();
//! assert!(!doc.borrow().scroll_locked());
//! ```

pub use velum_dom as dom;
pub use velum_overlay as overlay;
pub use velum_runtime as runtime;
pub use velum_widgets as widgets;

/// Common imports for Velum applications.
pub mod prelude {
    pub use velum_dom::{
        Document, ElementKind, EventFlow, KeyCode, KeyEvent, KeyEventKind, Modifiers, NodeId,
    };
    pub use velum_overlay::{DEFAULT_TARGET_ID, FocusScope, Host, RenderTarget};
    pub use velum_runtime::{Effect, Observable, SetupResult};
    pub use velum_widgets::{Dialog, DialogAction, DialogConfig, DialogController};
}
