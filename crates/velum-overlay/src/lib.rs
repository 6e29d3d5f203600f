#![forbid(unsafe_code)]

//! Overlay primitives for Velum: focus scopes and render targets.
//!
//! The two components are independent and composable. A dialog-style
//! consumer renders its markup through a [`RenderTarget`] so it lands at the
//! document root instead of its natural tree position, then activates a
//! [`FocusScope`] against the rendered panel so keyboard navigation stays
//! inside until the dialog closes. Neither component knows about the other;
//! the scope works on any container, and the target hosts any content.

pub mod focus_scope;
pub mod render_target;

pub use focus_scope::{FocusScope, focusable_descendants};
pub use render_target::{DEFAULT_TARGET_ID, Host, RenderTarget};
