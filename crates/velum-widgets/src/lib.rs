#![forbid(unsafe_code)]

//! Composed widgets for Velum.

pub mod dialog;

pub use dialog::{Dialog, DialogAction, DialogConfig, DialogController};
