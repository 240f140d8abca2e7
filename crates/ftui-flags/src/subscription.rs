#![forbid(unsafe_code)]

//! Listener registry with RAII unsubscription.
//!
//! Listeners are owned by their [`Subscription`] guard; the registry only
//! keeps `Weak` references, so dropping the guard is enough to detach a
//! listener. Dead entries are pruned lazily when listeners are collected
//! for a notification.

use std::rc::{Rc, Weak};

type ListenerRc<T> = Rc<dyn Fn(&T)>;
type ListenerWeak<T> = Weak<dyn Fn(&T)>;

/// Ordered list of weakly held listeners.
pub(crate) struct Listeners<T> {
    entries: Vec<ListenerWeak<T>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Listeners<T> {
    /// Entries still registered, including dead ones not yet pruned.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: 'static> Listeners<T> {
    /// Register `listener` and return the guard that keeps it alive.
    pub(crate) fn register(&mut self, listener: impl Fn(&T) + 'static) -> Subscription {
        let strong: ListenerRc<T> = Rc::new(listener);
        self.entries.push(Rc::downgrade(&strong));
        // `Rc<dyn Fn(&T)>` is sized, so it can be boxed as `dyn Any`.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Prune dead entries and return the live listeners in registration
    /// order. Callers invoke them after releasing any borrow on the owner.
    pub(crate) fn live(&mut self) -> Vec<ListenerRc<T>> {
        self.entries.retain(|w| w.strong_count() > 0);
        self.entries.iter().filter_map(|w| w.upgrade()).collect()
    }
}

/// Guard for a registered listener.
///
/// Dropping it drops the listener; the store will not call it again.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
