use std::fmt;

use ahash::AHashMap;
use bytes::Bytes;
use faststr::FastStr;
use http::header::{HeaderMap, HeaderName};
use tracing::warn;

use super::{
    encoding::{decode_value, encode_value},
    MetadataError,
};
use crate::consts::{
    GRPC_STATUS_DETAILS_HEADER, GRPC_STATUS_HEADER_CODE, GRPC_STATUS_MESSAGE_HEADER,
};

/// A set of gRPC custom metadata entries.
///
/// Keys are lower-cased on the way in. Values under `-bin` keys are the decoded
/// bytes, never base64 text, and are not required to be UTF-8.
///
/// ```
/// # use sidecar_bridge::metadata::GrpcMetadata;
/// let mut md = GrpcMetadata::new();
/// md.append("X-Host", "example.com");
/// md.append("trace-proto-bin", &b"\x00\xff"[..]);
///
/// assert_eq!(md.get("x-host").unwrap(), "example.com");
/// assert_eq!(md.get("trace-proto-bin").unwrap(), &b"\x00\xff"[..]);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct GrpcMetadata {
    entries: AHashMap<FastStr, Vec<Bytes>>,
}

fn normalize_key(key: &str) -> FastStr {
    if key.bytes().any(|b| b.is_ascii_uppercase()) {
        FastStr::new(key.to_ascii_lowercase())
    } else {
        FastStr::new(key)
    }
}

impl GrpcMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: AHashMap::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, key: impl AsRef<str>, value: impl Into<Bytes>) {
        self.entries
            .entry(normalize_key(key.as_ref()))
            .or_default()
            .push(value.into());
    }

    /// Appends every value in order after those already stored under `key`.
    pub fn append_all<I>(&mut self, key: impl AsRef<str>, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let mut values = values.into_iter().map(Into::into).peekable();
        if values.peek().is_none() {
            return;
        }
        self.entries
            .entry(normalize_key(key.as_ref()))
            .or_default()
            .extend(values);
    }

    /// Replaces every value of `key`. An empty `values` removes the key.
    pub fn insert(&mut self, key: impl AsRef<str>, values: Vec<Bytes>) -> Option<Vec<Bytes>> {
        let key = normalize_key(key.as_ref());
        if values.is_empty() {
            return self.entries.remove(&key);
        }
        self.entries.insert(key, values)
    }

    /// The first value of `key`.
    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.get_all(key).first()
    }

    /// All values of `key` in order, empty when absent.
    pub fn get_all(&self, key: &str) -> &[Bytes] {
        self.entries
            .get(normalize_key(key).as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(normalize_key(key).as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Bytes>> {
        self.entries.remove(normalize_key(key).as_str())
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

    pub fn iter(&self) -> impl Iterator<Item = (&FastStr, &[Bytes])> {
        self.entries
            .iter()
            .map(|(key, values)| (key, values.as_slice()))
    }

    /// Reads metadata from the headers of an HTTP/2 gRPC message.
    ///
    /// Binary values are base64-decoded; one that does not decode is kept as
    /// received.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut md = Self::with_capacity(headers.keys_len());
        for (name, value) in headers {
            let key = name.as_str();
            let decoded = decode_value(key, value).unwrap_or_else(|| {
                warn!("[BRIDGE] invalid base64 in binary metadata `{key}`, keeping raw value");
                Bytes::copy_from_slice(value.as_bytes())
            });
            md.append(key, decoded);
        }
        md
    }

    /// Writes the metadata as HTTP/2 headers, base64-encoding binary values.
    pub fn to_header_map(&self) -> Result<HeaderMap, MetadataError> {
        let mut headers = HeaderMap::with_capacity(self.len());
        for (key, values) in self.iter() {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| MetadataError::InvalidKey(key.clone()))?;
            for value in values {
                let value =
                    encode_value(key, value).ok_or_else(|| MetadataError::InvalidValue(key.clone()))?;
                headers.append(name.clone(), value);
            }
        }
        Ok(headers)
    }

    /// Like [`to_header_map`](Self::to_header_map), minus the names a status
    /// writes itself.
    pub(crate) fn to_sanitized_header_map(&self) -> Result<HeaderMap, MetadataError> {
        let mut headers = self.to_header_map()?;
        headers.remove(GRPC_STATUS_HEADER_CODE);
        headers.remove(GRPC_STATUS_MESSAGE_HEADER);
        headers.remove(GRPC_STATUS_DETAILS_HEADER);
        Ok(headers)
    }
}

impl<K, V> FromIterator<(K, V)> for GrpcMetadata
where
    K: AsRef<str>,
    V: Into<Bytes>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut md = Self::new();
        md.extend(iter);
        md
    }
}

impl<K, V> Extend<(K, V)> for GrpcMetadata
where
    K: AsRef<str>,
    V: Into<Bytes>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl IntoIterator for GrpcMetadata {
    type Item = (FastStr, Vec<Bytes>);
    type IntoIter = std::collections::hash_map::IntoIter<FastStr, Vec<Bytes>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for GrpcMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
