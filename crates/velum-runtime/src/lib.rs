#![forbid(unsafe_code)]

//! Velum runtime: reactive state and effect lifecycle.

pub mod reactive;

pub use reactive::{Cleanup, Effect, Observable, SetupResult, Subscription};
