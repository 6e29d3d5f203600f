#![forbid(unsafe_code)]

//! Reactive primitives for Velum.
//!
//! - [`Observable`]: a shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Effect`]: a dependency-keyed setup/cleanup cell guaranteeing
//!   teardown-before-setup ordering and idempotent disposal.
//!
//! Everything here is single-threaded (`Rc<RefCell<..>>` ownership); there
//! is no parallelism to guard against, only the discipline that a cycle's
//! teardown completes before the next cycle's setup.

pub mod effect;
pub mod observable;

pub use effect::{Cleanup, Effect, SetupResult};
pub use observable::{Observable, Subscription};
