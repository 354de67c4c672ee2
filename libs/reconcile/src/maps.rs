//! Key/value map comparison for labels, annotations and other metadata.
//!
//! An absent map is the same as an empty one. Both predicates look up keys
//! instead of comparing representations, so neither depends on iteration order.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A string-to-string mapping with unique keys.
pub trait KeyValues {
    /// Number of pairs.
    fn pair_count(&self) -> usize;

    /// Value stored under `key`.
    fn lookup(&self, key: &str) -> Option<&str>;

    /// All pairs, in no particular order.
    fn pairs(&self) -> impl Iterator<Item = (&str, &str)>;
}

impl<S: BuildHasher> KeyValues for HashMap<String, String, S> {
    fn pair_count(&self) -> usize {
        self.len()
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl KeyValues for BTreeMap<String, String> {
    fn pair_count(&self) -> usize {
        self.len()
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Returns true if `a` and `b` hold exactly the same pairs.
pub fn maps_equal<A, B>(a: Option<&A>, b: Option<&B>) -> bool
where
    A: KeyValues,
    B: KeyValues,
{
    let a_len = a.map_or(0, KeyValues::pair_count);
    let b_len = b.map_or(0, KeyValues::pair_count);
    if a_len != b_len {
        return false;
    }

    // Same size and unique keys: b ⊆ a implies a = b.
    is_subset(a, b)
}

/// Returns true if every pair of `b` is present in `a` with the same value.
///
/// `a` may hold extra keys. Use this when the observed object may carry keys
/// injected by other controllers that must not trigger an update.
pub fn is_subset<A, B>(a: Option<&A>, b: Option<&B>) -> bool
where
    A: KeyValues,
    B: KeyValues,
{
    let Some(b) = b else {
        return true;
    };

    b.pairs()
        .all(|(key, value)| a.and_then(|a| a.lookup(key)) == Some(value))
}
