use std::fmt;

use ahash::AHashMap;
use bytes::Bytes;
use faststr::FastStr;

/// The sidecar's transport-neutral metadata: each key maps to the ordered values
/// it was repeated with.
///
/// Keys keep the case they arrived with. A key is either absent or holds at
/// least one value; storing an empty list removes the key instead.
///
/// ```
/// # use sidecar_bridge::metadata::CanonicalMetadata;
/// let mut md = CanonicalMetadata::new();
/// md.append("Accept", "text/plain");
/// md.append("Accept", "application/json");
///
/// assert_eq!(md.get("Accept").unwrap().len(), 2);
/// assert!(md.get("accept").is_none());
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct CanonicalMetadata {
    entries: AHashMap<FastStr, Vec<Bytes>>,
}

impl CanonicalMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: AHashMap::with_capacity(capacity),
        }
    }

    /// Adds `value` after any values already stored under `key`.
    pub fn append(&mut self, key: impl Into<FastStr>, value: impl Into<Bytes>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces every value of `key`, returning the previous ones.
    ///
    /// An empty `values` removes the key.
    pub fn insert(&mut self, key: impl Into<FastStr>, values: Vec<Bytes>) -> Option<Vec<Bytes>> {
        let key = key.into();
        if values.is_empty() {
            return self.entries.remove(&key);
        }
        self.entries.insert(key, values)
    }

    pub fn get(&self, key: &str) -> Option<&[Bytes]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The first value of `key`.
    pub fn get_first(&self, key: &str) -> Option<&Bytes> {
        self.entries.get(key).and_then(|values| values.first())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Bytes>> {
        self.entries.remove(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FastStr> {
        self.entries.keys()
    }

    /// Iterates keys in unspecified order, each with its values in order.
    pub fn iter(&self) -> impl Iterator<Item = (&FastStr, &[Bytes])> {
        self.entries
            .iter()
            .map(|(key, values)| (key, values.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for CanonicalMetadata
where
    K: Into<FastStr>,
    V: Into<Bytes>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut md = Self::new();
        md.extend(iter);
        md
    }
}

impl<K, V> Extend<(K, V)> for CanonicalMetadata
where
    K: Into<FastStr>,
    V: Into<Bytes>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl IntoIterator for CanonicalMetadata {
    type Item = (FastStr, Vec<Bytes>);
    type IntoIter = std::collections::hash_map::IntoIter<FastStr, Vec<Bytes>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for CanonicalMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
