#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A shared, version-tracked value wrapper with subscriber callbacks.
///
/// `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
/// ownership; cloning shares the underlying value. Notification runs against
/// a snapshot of the subscriber list, so callbacks may read the observable or
/// manage subscriptions freely.
///
/// # Invariants
///
/// 1. The version increments exactly once per mutation that changes the
///    value.
/// 2. Subscribers are notified in registration order.
/// 3. Setting a value equal to the current value is a no-op (no version
///    bump, no notifications).
/// 4. Dropping a [`Subscription`] removes the callback before the next
///    notification cycle.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

struct Inner<T> {
    value: T,
    version: u64,
    next_subscriber: u64,
    subscribers: Vec<Subscriber<T>>,
}

struct Subscriber<T> {
    id: u64,
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                next_subscriber: 1,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value through a closure, without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Current version counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Set the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner
                .subscribers
                .iter()
                .map(|s| Rc::clone(&s.callback))
                .collect()
        };
        let current = self.get();
        for callback in snapshot {
            callback(&current);
        }
    }

    /// Subscribe to changes. The callback fires on every value change until
    /// the returned [`Subscription`] is dropped.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.push(Subscriber {
                id,
                callback: Rc::new(callback),
            });
            id
        };
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().subscribers.retain(|s| s.id != id);
                }
            })),
        }
    }
}

/// RAII guard for an [`Observable`] subscription; unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribe immediately instead of waiting for drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
