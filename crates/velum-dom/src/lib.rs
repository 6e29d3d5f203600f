#![forbid(unsafe_code)]

//! Retained element tree for Velum.
//!
//! This crate models the ambient document a UI toolkit mutates: a node arena
//! with stable handles, element kinds and attributes, a single focus pointer,
//! and synchronous key-event dispatch with browser-style `prevent_default` /
//! `stop_propagation` semantics. Everything is single-threaded; the document
//! is only ever touched from the UI event loop.

pub mod document;
pub mod event;
pub mod node;

pub use document::{Document, KeyHandler, ListenerId};
pub use event::{EventFlow, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use node::{ElementKind, NodeId};
