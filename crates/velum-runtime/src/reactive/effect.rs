#![forbid(unsafe_code)]

//! Dependency-keyed effect cells with explicit disposer handles.
//!
//! An [`Effect`] ties a setup routine and its cleanup to a dependency value.
//! Re-running with equal dependencies is a no-op; re-running with different
//! dependencies tears the previous cycle down *before* the new setup runs.
//! This makes the host framework's setup/cleanup ordering guarantee explicit:
//! teardown of cycle N completes before setup of cycle N+1 for the same
//! dependency identity, and a disposed effect never leaves a stale cleanup
//! behind.
//!
//! # Invariants
//!
//! 1. At most one cleanup is pending at any time.
//! 2. Every cleanup runs exactly once: on the next dependency change, on
//!    [`Effect::dispose`], or on drop, whichever comes first.
//! 3. A setup that returns [`SetupResult::Deferred`] does not latch its
//!    dependencies; the next [`Effect::run`] re-attempts even with equal
//!    dependencies.
//!
//! # Failure Modes
//!
//! - `dispose()` on an idle effect is a no-op.
//! - A panicking setup leaves the effect without a pending cleanup (the
//!   previous cycle was already torn down).

/// Teardown routine returned by an effect setup.
pub type Cleanup = Box<dyn FnOnce()>;

/// Outcome of an effect setup routine.
pub enum SetupResult {
    /// The cycle is established and owns resources; the cleanup runs on the
    /// next dependency change or disposal.
    Installed(Cleanup),
    /// The cycle is established but holds nothing to tear down.
    Empty,
    /// Preconditions were not met; re-attempt on the next cycle even if the
    /// dependencies have not changed.
    Deferred,
}

/// A setup/cleanup pair keyed on dependency identity.
pub struct Effect<D> {
    deps: Option<D>,
    cleanup: Option<Cleanup>,
    cycles: u64,
}

impl<D> Default for Effect<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Effect<D> {
    /// Create an idle effect.
    pub fn new() -> Self {
        Self {
            deps: None,
            cleanup: None,
            cycles: 0,
        }
    }

    /// Whether the current cycle installed a cleanup.
    pub fn is_installed(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Number of established setup cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn teardown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            tracing::trace!("effect cleanup runs");
            cleanup();
        }
    }

    /// Tear down the current cycle, if any, and forget the dependencies.
    /// Idempotent; also runs on drop.
    pub fn dispose(&mut self) {
        self.teardown();
        self.deps = None;
    }
}

impl<D: PartialEq> Effect<D> {
    /// Reconcile the effect with `deps`.
    ///
    /// Equal dependencies (from an established cycle) are a no-op. Otherwise
    /// the previous cleanup runs to completion first, then `setup` runs and
    /// its result decides whether the cycle is established.
    pub fn run(&mut self, deps: D, setup: impl FnOnce(&D) -> SetupResult) {
        if self.deps.as_ref() == Some(&deps) {
            return;
        }
        self.teardown();
        match setup(&deps) {
            SetupResult::Installed(cleanup) => {
                self.cleanup = Some(cleanup);
                self.deps = Some(deps);
                self.cycles += 1;
            }
            SetupResult::Empty => {
                self.deps = Some(deps);
                self.cycles += 1;
            }
            SetupResult::Deferred => {
                self.deps = None;
            }
        }
    }
}

impl<D> Drop for Effect<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for Effect<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("deps", &self.deps)
            .field("installed", &self.cleanup.is_some())
            .field("cycles", &self.cycles)
            .finish()
    }
}
