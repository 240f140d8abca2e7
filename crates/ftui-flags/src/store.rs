#![forbid(unsafe_code)]

//! Boolean flag store with reset-aware bulk updates.
//!
//! # Design
//!
//! [`FlagStore<K>`] owns a [`FlagSet<K>`] whose key set is fixed by the
//! initial flags passed at construction. Two update paths exist:
//!
//! - [`FlagStore::set_flags`] / [`FlagStore::set_flags_with`]: bulk update.
//!   With `reset = true` the result is the *initial* flags with the updates
//!   on top; with `reset = false` it is the *current* flags with the updates
//!   on top. An empty update with reset restores every flag.
//! - [`FlagStore::set_flag`]: binds a [`FlagSetter`] to one key. The setter
//!   takes a literal value or an updater closure; the updater sees the value
//!   at the moment it runs. It never resets other flags.
//!
//! Handles share state through `Rc<RefCell<..>>`: cloning a store or a
//! setter gives another view of the same flags.
//!
//! # Invariants
//!
//! 1. `snapshot().same_keys(&initial())` always holds.
//! 2. `version` increments by exactly 1 per committed change; an update that
//!    yields identical flags is a no-op (no bump, no notification).
//! 3. Listeners are notified in registration order, after the internal
//!    borrow is released. If a listener commits a change, the remaining
//!    listeners of the outer round are skipped: the nested round already
//!    gave everyone the newer flags.
//! 4. Inside [`FlagStore::batch`], updates apply immediately but listeners
//!    are notified at most once, when the outermost batch closes.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown key, validation on | Key not in initial flags | `Err(FlagError::UnknownKey)`, store untouched |
//! | Unknown key, validation off | Key not in initial flags | Entry dropped; setter becomes a no-op |
//! | Mutation inside an updater or listener | Callback writes to the same store | Allowed: callbacks run with no borrow held |
//! | Mutation inside [`FlagStore::with`] | Closure writes to the same store | Panics (`RefCell` borrow rules) |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::FlagStoreConfig;
use crate::error::{FlagError, FlagResult};
use crate::flag_set::{FlagSet, FlagUpdates};
use crate::subscription::{Listeners, Subscription};

/// Shared interior for [`FlagStore<K>`].
struct StoreInner<K: Ord> {
    initial: FlagSet<K>,
    current: FlagSet<K>,
    config: FlagStoreConfig,
    version: u64,
    /// Open `batch` scopes. Notifications are held while non-zero.
    batch_depth: usize,
    /// Flags at the time the outermost batch opened.
    batch_start: Option<FlagSet<K>>,
    listeners: Listeners<FlagSet<K>>,
}

/// A fixed set of named boolean flags with change notification.
///
/// # Example
///
/// ```
/// use ftui_flags::{FlagStore, FlagUpdates};
///
/// let store = FlagStore::new([("open", false), ("loading", false)]);
///
/// store.set_flags([("loading", true)]).unwrap();
/// store.set_flag("open").unwrap().set(true);
/// assert_eq!(store.get(&"open"), Some(true));
/// assert_eq!(store.get(&"loading"), Some(true));
///
/// // Empty update with the default reset mode restores everything.
/// store.set_flags(FlagUpdates::new()).unwrap();
/// assert_eq!(store.snapshot(), store.initial());
/// ```
pub struct FlagStore<K: Ord> {
    inner: Rc<RefCell<StoreInner<K>>>,
}

impl<K: Ord> Clone for FlagStore<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for FlagStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FlagStore")
            .field("flags", &inner.current)
            .field("default_reset", &inner.config.default_reset)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.listeners.len())
            .finish()
    }
}

impl<K: Ord + Clone + fmt::Debug + 'static> FlagStore<K> {
    /// Create a store whose bulk updates reset to `initial` by default.
    #[must_use]
    pub fn new(initial: impl Into<FlagSet<K>>) -> Self {
        Self::with_config(initial, FlagStoreConfig::default())
    }

    /// Create a store with an explicit default merge mode.
    #[must_use]
    pub fn with_default_reset(initial: impl Into<FlagSet<K>>, default_reset: bool) -> Self {
        Self::with_config(
            initial,
            FlagStoreConfig::default().with_default_reset(default_reset),
        )
    }

    /// Create a store with full configuration.
    #[must_use]
    pub fn with_config(initial: impl Into<FlagSet<K>>, config: FlagStoreConfig) -> Self {
        let initial = initial.into();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            flags = initial.len(),
            default_reset = config.default_reset,
            validate_keys = config.validate_keys,
            "flag store created"
        );

        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                current: initial.clone(),
                initial,
                config,
                version: 0,
                batch_depth: 0,
                batch_start: None,
                listeners: Listeners::default(),
            })),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Clone of the current flags.
    #[must_use]
    pub fn snapshot(&self) -> FlagSet<K> {
        self.inner.borrow().current.clone()
    }

    /// Same as [`snapshot`](Self::snapshot).
    #[must_use]
    pub fn flags(&self) -> FlagSet<K> {
        self.snapshot()
    }

    /// Borrow the current flags without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` updates the store (through this handle, a clone, or a
    /// setter): the flags stay borrowed while `f` runs.
    pub fn with<R>(&self, f: impl FnOnce(&FlagSet<K>) -> R) -> R {
        f(&self.inner.borrow().current)
    }

    /// Current value of one flag, or `None` for a key outside the set.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<bool> {
        self.inner.borrow().current.get(key)
    }

    /// Flags as they were at construction.
    #[must_use]
    pub fn initial(&self) -> FlagSet<K> {
        self.inner.borrow().initial.clone()
    }

    /// Whether every flag currently holds its initial value.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        let inner = self.inner.borrow();
        inner.current == inner.initial
    }

    #[must_use]
    pub fn default_reset(&self) -> bool {
        self.inner.borrow().config.default_reset
    }

    #[must_use]
    pub fn config(&self) -> FlagStoreConfig {
        self.inner.borrow().config
    }

    /// Number of committed changes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered listeners, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Whether a [`batch`](Self::batch) scope is open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.inner.borrow().batch_depth > 0
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Bulk update using the store's default merge mode.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::UnknownKey`] if key validation is enabled and
    /// `updates` names a key outside the initial flags. Nothing is applied
    /// in that case.
    pub fn set_flags(&self, updates: impl IntoIterator<Item = (K, bool)>) -> FlagResult {
        let reset = self.default_reset();
        self.set_flags_with(updates, reset)
    }

    /// Bulk update with an explicit merge mode for this call only.
    ///
    /// With `reset`, flags missing from `updates` return to their initial
    /// values; without it they keep their current values.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::UnknownKey`] if key validation is enabled and
    /// `updates` names a key outside the initial flags. Nothing is applied
    /// in that case.
    pub fn set_flags_with(
        &self,
        updates: impl IntoIterator<Item = (K, bool)>,
        reset: bool,
    ) -> FlagResult {
        let updates: FlagUpdates<K> = updates.into_iter().collect();
        let next = {
            let inner = self.inner.borrow();
            if inner.config.validate_keys {
                if let Some(key) = updates.keys().find(|k| !inner.initial.contains_key(k)) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(key = ?key, "rejected bulk flag update with unknown key");
                    return Err(FlagError::unknown_key(key));
                }
            }
            let mut next = if reset {
                inner.initial.clone()
            } else {
                inner.current.clone()
            };
            let _skipped = next.apply(&updates);

            #[cfg(feature = "tracing")]
            if _skipped > 0 {
                tracing::debug!(skipped = _skipped, "dropped unknown keys from bulk update");
            }

            next
        };
        self.commit(next, if reset { "set_flags(reset)" } else { "set_flags(merge)" });
        Ok(())
    }

    /// Restore every flag to its initial value.
    ///
    /// Equivalent to a resetting bulk update with no entries.
    pub fn reset(&self) {
        let initial = self.initial();
        self.commit(initial, "reset");
    }

    /// Bind a setter to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::UnknownKey`] if key validation is enabled and
    /// `key` is not one of the initial flags.
    pub fn set_flag(&self, key: K) -> FlagResult<FlagSetter<K>> {
        {
            let inner = self.inner.borrow();
            if inner.config.validate_keys && !inner.initial.contains_key(&key) {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = ?key, "rejected setter for unknown flag key");
                return Err(FlagError::unknown_key(&key));
            }
        }
        Ok(FlagSetter {
            store: self.clone(),
            key,
        })
    }

    /// Run `f` with notifications held, then notify once if the flags
    /// changed over the whole scope.
    ///
    /// Updates made inside `f` apply immediately, so later calls (and
    /// updaters) observe earlier ones. Batches nest; only the outermost
    /// scope notifies.
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.batch_depth == 0 {
                inner.batch_start = Some(inner.current.clone());
            }
            inner.batch_depth += 1;
        }
        let _guard = BatchGuard { store: self };
        f(self)
    }

    /// Register `listener`, called with the new flags after each change.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(&self, listener: impl Fn(&FlagSet<K>) + 'static) -> Subscription {
        self.inner.borrow_mut().listeners.register(listener)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Replace the current flags with `next`, bumping the version and
    /// notifying listeners if anything changed.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn commit(&self, next: FlagSet<K>, op: &'static str) {
        let notify = {
            let mut inner = self.inner.borrow_mut();
            debug_assert!(next.same_keys(&inner.initial));
            if inner.current == next {
                #[cfg(feature = "tracing")]
                tracing::trace!(op, "flag update is a no-op");
                return;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                op,
                version = inner.version + 1,
                changed = inner.current.diff_count(&next),
                batched = inner.batch_depth > 0,
                "flags updated"
            );

            inner.current = next;
            inner.version += 1;
            inner.batch_depth == 0
        };
        if notify {
            self.notify();
        }
    }

    fn notify(&self) {
        let (listeners, flags) = {
            let mut inner = self.inner.borrow_mut();
            let listeners = inner.listeners.live();
            (listeners, inner.current.clone())
        };
        for listener in &listeners {
            // A listener committed newer flags and the nested round has
            // already delivered them.
            if self.inner.borrow().current != flags {
                break;
            }
            listener(&flags);
        }
    }
}

/// Closes a batch scope on drop, even if the batch body panics.
struct BatchGuard<'a, K: Ord + Clone + fmt::Debug + 'static> {
    store: &'a FlagStore<K>,
}

impl<K: Ord + Clone + fmt::Debug + 'static> Drop for BatchGuard<'_, K> {
    fn drop(&mut self) {
        let changed = {
            let mut inner = self.store.inner.borrow_mut();
            inner.batch_depth -= 1;
            if inner.batch_depth > 0 {
                return;
            }
            let start = inner.batch_start.take();
            start.is_some_and(|start| start != inner.current)
        };
        if changed && !std::thread::panicking() {
            self.store.notify();
        }
    }
}

/// Update applied by a [`FlagSetter`]: a literal value or a function of
/// the flag's value at the time the update runs.
pub enum FlagAction {
    Set(bool),
    Update(Box<dyn FnOnce(bool) -> bool>),
}

impl FlagAction {
    /// Wrap an updater closure.
    pub fn update(f: impl FnOnce(bool) -> bool + 'static) -> Self {
        Self::Update(Box::new(f))
    }

    fn resolve(self, prev: bool) -> bool {
        match self {
            Self::Set(value) => value,
            Self::Update(f) => f(prev),
        }
    }
}

impl From<bool> for FlagAction {
    fn from(value: bool) -> Self {
        Self::Set(value)
    }
}

impl fmt::Debug for FlagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(value) => f.debug_tuple("Set").field(value).finish(),
            Self::Update(_) => f.debug_tuple("Update").finish_non_exhaustive(),
        }
    }
}

/// Setter bound to a single flag of a [`FlagStore`].
///
/// Never applies the reset policy: only the bound flag changes.
pub struct FlagSetter<K: Ord> {
    store: FlagStore<K>,
    key: K,
}

impl<K: Ord + Clone> Clone for FlagSetter<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
        }
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for FlagSetter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSetter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<K: Ord + Clone + fmt::Debug + 'static> FlagSetter<K> {
    /// The bound key.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Current value of the bound flag.
    #[must_use]
    pub fn get(&self) -> Option<bool> {
        self.store.get(&self.key)
    }

    /// Set the flag to `value`.
    pub fn set(&self, value: bool) {
        self.apply(FlagAction::Set(value));
    }

    /// Set the flag to `f(current)`, reading `current` now.
    pub fn update(&self, f: impl FnOnce(bool) -> bool + 'static) {
        self.apply(FlagAction::update(f));
    }

    /// Invert the flag.
    pub fn toggle(&self) {
        self.apply(FlagAction::update(|value| !value));
    }

    /// Apply a literal value or updater.
    ///
    /// Does nothing if the key is outside the set (only possible with key
    /// validation disabled).
    pub fn apply(&self, action: impl Into<FlagAction>) {
        let Some(prev) = self.store.get(&self.key) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = ?self.key, "ignored update for unknown flag key");
            return;
        };
        // No borrow is held while the updater runs.
        let value = action.into().resolve(prev);
        let mut next = self.store.snapshot();
        next.set_existing(&self.key, value);
        self.store.commit(next, "set_flag");
    }
}
