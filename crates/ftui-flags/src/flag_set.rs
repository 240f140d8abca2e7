#![forbid(unsafe_code)]

//! Flag mappings: the full [`FlagSet`] and the partial [`FlagUpdates`].
//!
//! # Invariants
//!
//! 1. A `FlagSet` never gains or loses keys through [`FlagSet::apply`]:
//!    only entries that already exist are overwritten.
//! 2. Iteration is in key order (`BTreeMap`), so two equal sets always
//!    print and serialize identically.
//! 3. In a `FlagUpdates`, a later entry for the same key replaces the
//!    earlier one.

use std::collections::BTreeMap;
use std::fmt;

/// A complete mapping from flag key to boolean value.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FlagSet<K: Ord> {
    flags: BTreeMap<K, bool>,
}

impl<K: Ord> Default for FlagSet<K> {
    fn default() -> Self {
        Self {
            flags: BTreeMap::new(),
        }
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for FlagSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.flags.iter()).finish()
    }
}

impl<K: Ord> FlagSet<K> {
    /// Create an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, or `None` if the key is not part of this set.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<bool> {
        self.flags.get(key).copied()
    }

    /// Whether `key` is part of this set.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.flags.contains_key(key)
    }

    /// Number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.flags.keys()
    }

    /// `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, bool)> {
        self.flags.iter().map(|(k, v)| (k, *v))
    }

    /// Keys whose value is `true`.
    pub fn enabled(&self) -> impl Iterator<Item = &K> {
        self.flags.iter().filter(|(_, v)| **v).map(|(k, _)| k)
    }

    /// Whether both sets have exactly the same keys (values ignored).
    #[must_use]
    pub fn same_keys(&self, other: &Self) -> bool {
        self.flags.len() == other.flags.len() && self.flags.keys().eq(other.flags.keys())
    }

    /// Number of keys whose value differs between `self` and `other`.
    ///
    /// Keys present in only one of the sets are not counted.
    #[must_use]
    pub fn diff_count(&self, other: &Self) -> usize {
        self.flags
            .iter()
            .filter(|(k, v)| other.flags.get(*k).is_some_and(|o| o != *v))
            .count()
    }

    /// Overwrite existing entries with the values in `updates`.
    ///
    /// Keys in `updates` that are not already present are skipped, so the
    /// key set is unchanged. Returns the number of skipped entries.
    pub fn apply(&mut self, updates: &FlagUpdates<K>) -> usize {
        let mut skipped = 0;
        for (key, value) in updates.iter() {
            match self.flags.get_mut(key) {
                Some(slot) => *slot = value,
                None => skipped += 1,
            }
        }
        skipped
    }

    /// Set an existing flag. Returns `false` (and does nothing) if the key
    /// is not part of this set.
    pub(crate) fn set_existing(&mut self, key: &K, value: bool) -> bool {
        match self.flags.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl<K: Ord> FromIterator<(K, bool)> for FlagSet<K> {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord, const N: usize> From<[(K, bool); N]> for FlagSet<K> {
    fn from(entries: [(K, bool); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Ord> From<BTreeMap<K, bool>> for FlagSet<K> {
    fn from(flags: BTreeMap<K, bool>) -> Self {
        Self { flags }
    }
}

impl<K: Ord> From<FlagSet<K>> for BTreeMap<K, bool> {
    fn from(set: FlagSet<K>) -> Self {
        set.flags
    }
}

impl<K: Ord> IntoIterator for FlagSet<K> {
    type Item = (K, bool);
    type IntoIter = std::collections::btree_map::IntoIter<K, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.into_iter()
    }
}

/// A partial mapping of flag values to merge into a [`FlagSet`].
///
/// Built from arrays or iterators of `(key, bool)` pairs, or fluently via
/// [`FlagUpdates::with`]. An empty `FlagUpdates` passed to a resetting
/// bulk update restores every flag to its initial value.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FlagUpdates<K: Ord> {
    updates: BTreeMap<K, bool>,
}

impl<K: Ord> Default for FlagUpdates<K> {
    fn default() -> Self {
        Self {
            updates: BTreeMap::new(),
        }
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for FlagUpdates<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.updates.iter()).finish()
    }
}

impl<K: Ord> FlagUpdates<K> {
    /// No updates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the update for `key`.
    #[must_use]
    pub fn with(mut self, key: K, value: bool) -> Self {
        self.insert(key, value);
        self
    }

    /// Add (or replace) the update for `key`.
    pub fn insert(&mut self, key: K, value: bool) {
        self.updates.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<bool> {
        self.updates.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.updates.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, bool)> {
        self.updates.iter().map(|(k, v)| (k, *v))
    }
}

impl<K: Ord> FromIterator<(K, bool)> for FlagUpdates<K> {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            updates: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord, const N: usize> From<[(K, bool); N]> for FlagUpdates<K> {
    fn from(entries: [(K, bool); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Ord> From<FlagSet<K>> for FlagUpdates<K> {
    fn from(set: FlagSet<K>) -> Self {
        Self {
            updates: set.flags,
        }
    }
}

impl<K: Ord> IntoIterator for FlagUpdates<K> {
    type Item = (K, bool);
    type IntoIter = std::collections::btree_map::IntoIter<K, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlagSet<&'static str> {
        FlagSet::from([("open", false), ("loading", true), ("dirty", false)])
    }

    #[test]
    fn get_and_contains() {
        let set = sample();
        assert_eq!(set.get(&"loading"), Some(true));
        assert_eq!(set.get(&"open"), Some(false));
        assert_eq!(set.get(&"missing"), None);
        assert!(set.contains_key(&"dirty"));
        assert!(!set.contains_key(&"missing"));
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
        assert!(FlagSet::<&str>::new().is_empty());
    }

    #[test]
    fn iteration_is_key_ordered() {
        let set = sample();
        let keys: Vec<_> = set.keys().copied().collect();
        assert_eq!(keys, vec!["dirty", "loading", "open"]);
        let enabled: Vec<_> = set.enabled().copied().collect();
        assert_eq!(enabled, vec!["loading"]);
    }

    #[test]
    fn apply_overwrites_existing_only() {
        let mut set = sample();
        let skipped = set.apply(&FlagUpdates::new().with("open", true).with("bogus", true));
        assert_eq!(skipped, 1);
        assert_eq!(set.get(&"open"), Some(true));
        assert!(!set.contains_key(&"bogus"));
        assert!(set.same_keys(&sample()));
    }

    #[test]
    fn same_keys_ignores_values() {
        let a = sample();
        let mut b = sample();
        b.set_existing(&"open", true);
        assert!(a.same_keys(&b));
        assert_ne!(a, b);
        assert_eq!(a.diff_count(&b), 1);

        let c = FlagSet::from([("open", false)]);
        assert!(!a.same_keys(&c));
    }

    #[test]
    fn set_existing_rejects_unknown() {
        let mut set = sample();
        assert!(!set.set_existing(&"nope", true));
        assert_eq!(set, sample());
    }

    #[test]
    fn later_update_wins() {
        let updates: FlagUpdates<&str> = [("a", true), ("a", false)].into_iter().collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates.get(&"a"), Some(false));
    }

    #[test]
    fn debug_is_map_like() {
        let dbg = format!("{:?}", FlagSet::from([("a", true)]));
        assert_eq!(dbg, r#"{"a": true}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_transparent_map() {
        let set = FlagSet::from([("a".to_string(), true), ("b".to_string(), false)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"a":true,"b":false}"#);
        let back: FlagSet<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);

        let updates: FlagUpdates<String> = serde_json::from_str(r#"{"b":true}"#).unwrap();
        assert_eq!(updates.get(&"b".to_string()), Some(true));
    }
}
