//! Conversion between canonical metadata and HTTP/1.1 headers.

use std::borrow::Cow;

use bytes::Bytes;
use faststr::FastStr;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, trace};

use crate::{
    consts::{CONTENT_TYPE_HEADER, DAPR_HEADER_PREFIX, HTTP_RESERVED_RENAMES},
    metadata::{is_binary_key, CanonicalMetadata},
};

/// Receives the headers produced by [`internal_metadata_to_http_header`], one
/// call per key and value.
///
/// Closures taking `(&str, &[u8])` are sinks, so callers never have to expose
/// their own header type.
pub trait HeaderSink {
    fn emit(&mut self, key: &str, value: &[u8]);
}

impl<F> HeaderSink for F
where
    F: FnMut(&str, &[u8]),
{
    fn emit(&mut self, key: &str, value: &[u8]) {
        self(key, value)
    }
}

impl HeaderSink for HeaderMap {
    fn emit(&mut self, key: &str, value: &[u8]) {
        let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
            debug!("[BRIDGE] skip invalid http header name `{key}`");
            return;
        };
        let Ok(value) = HeaderValue::from_bytes(value) else {
            debug!("[BRIDGE] skip invalid value for http header `{key}`");
            return;
        };
        self.append(name, value);
    }
}

impl HeaderSink for Vec<(String, Bytes)> {
    fn emit(&mut self, key: &str, value: &[u8]) {
        self.push((key.to_owned(), Bytes::copy_from_slice(value)));
    }
}

/// The HTTP header name canonical `key` is emitted under.
///
/// Pseudo-headers lose their `:` and reserved gRPC names gain the `dapr-`
/// prefix, so `:method` becomes `dapr-method` and `grpc-timeout` becomes
/// `dapr-grpc-timeout`.
pub fn http_header_name(key: &str) -> Cow<'_, str> {
    if let Some(pseudo) = key.strip_prefix(':') {
        return Cow::Owned(format!("{DAPR_HEADER_PREFIX}{pseudo}"));
    }
    HTTP_RESERVED_RENAMES
        .iter()
        .find(|(reserved, _)| key.eq_ignore_ascii_case(reserved))
        .map_or(Cow::Borrowed(key), |(_, renamed)| Cow::Borrowed(*renamed))
}

/// Emits canonical metadata as HTTP headers into `sink`.
///
/// `content-type` is left to content negotiation and binary metadata cannot be
/// carried in an HTTP header value, so neither is emitted. Every other key is
/// emitted once per value, in value order, under [`http_header_name`].
pub fn internal_metadata_to_http_header<S>(md: &CanonicalMetadata, sink: &mut S)
where
    S: HeaderSink + ?Sized,
{
    for (key, values) in md.iter() {
        if key.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
            continue;
        }
        if is_binary_key(key) {
            trace!("[BRIDGE] drop binary metadata `{key}` for http");
            continue;
        }

        let name = http_header_name(key);
        for value in values {
            sink.emit(&name, value);
        }
    }
}

/// Collects HTTP request or response headers into canonical metadata, keeping
/// repeated headers in arrival order.
pub fn http_header_to_internal_metadata(headers: &HeaderMap) -> CanonicalMetadata {
    let mut md = CanonicalMetadata::with_capacity(headers.keys_len());
    for (name, value) in headers {
        md.append(
            FastStr::new(name.as_str()),
            Bytes::copy_from_slice(value.as_bytes()),
        );
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_metadata(keys: &[&'static str]) -> CanonicalMetadata {
        keys.iter().map(|key| (*key, "fakeValue")).collect()
    }

    #[test]
    fn renames_reserved_and_skips_unsupported_keys() {
        let md = fake_metadata(&[
            "custom-header",
            ":method",
            ":scheme",
            ":path",
            ":authority",
            "grpc-timeout",
            "content-type",
            "grpc-trace-bin",
        ]);

        let mut saved = Vec::new();
        internal_metadata_to_http_header(&md, &mut |key: &str, _: &[u8]| {
            saved.push(key.to_owned())
        });
        saved.sort();

        let mut expected = vec![
            "custom-header",
            "dapr-method",
            "dapr-scheme",
            "dapr-path",
            "dapr-authority",
            "dapr-grpc-timeout",
        ];
        expected.sort();
        assert_eq!(saved, expected);
    }

    #[test]
    fn skips_keys_regardless_of_case() {
        let md = fake_metadata(&["Content-Type", "Trace-Context-BIN", "Grpc-Timeout"]);

        let mut saved = Vec::<(String, Bytes)>::new();
        internal_metadata_to_http_header(&md, &mut saved);

        assert_eq!(saved, [("dapr-grpc-timeout".to_owned(), Bytes::from_static(b"fakeValue"))]);
    }

    #[test]
    fn emits_every_value_in_order() {
        let md: CanonicalMetadata = [("accept", "text/plain"), ("accept", "application/json")]
            .into_iter()
            .collect();

        let mut headers = HeaderMap::new();
        internal_metadata_to_http_header(&md, &mut headers);

        let values: Vec<_> = headers.get_all("accept").iter().collect();
        assert_eq!(values, ["text/plain", "application/json"]);
    }

    #[test]
    fn header_map_sink_skips_invalid_pairs() {
        let mut md = CanonicalMetadata::new();
        md.append("bad header", "value");
        md.append("x-multiline", "a\nb");
        md.append("x-ok", "fine");

        let mut headers = HeaderMap::new();
        internal_metadata_to_http_header(&md, &mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["x-ok"], "fine");
    }

    #[test]
    fn other_pseudo_headers_are_prefixed() {
        assert_eq!(http_header_name(":status"), "dapr-status");
        assert_eq!(http_header_name("grpc-encoding"), "grpc-encoding");
        assert_eq!(http_header_name("x-custom"), "x-custom");
    }

    #[test]
    fn headers_become_canonical_metadata() {
        let mut headers = HeaderMap::new();
        headers.append("content-type", HeaderValue::from_static("application/json"));
        headers.append("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.append("x-forwarded-for", HeaderValue::from_static("10.0.0.2"));

        let md = http_header_to_internal_metadata(&headers);

        assert_eq!(md.len(), 2);
        assert_eq!(md.get_first("content-type").unwrap(), "application/json");
        assert_eq!(
            md.get("x-forwarded-for").unwrap(),
            &[
                Bytes::from_static(b"10.0.0.1"),
                Bytes::from_static(b"10.0.0.2"),
            ]
        );
    }
}
