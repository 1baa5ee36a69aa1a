//! Key classification and header value encoding for gRPC metadata.
//!
//! Keys ending in `-bin` carry arbitrary bytes, which travel base64 encoded inside
//! HTTP/2 headers. All other keys carry printable ASCII as-is.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use bytes::Bytes;
use http::header::HeaderValue;

use crate::consts::BINARY_METADATA_SUFFIX;

/// Standard alphabet, written without padding and read with or without it, the
/// way gRPC implementations disagree on.
const BINARY_VALUE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Whether `key` names binary metadata. The suffix is matched without regard to
/// ASCII case since HTTP header names are case-insensitive.
pub fn is_binary_key(key: &str) -> bool {
    let suffix = BINARY_METADATA_SUFFIX.len();
    key.len() >= suffix
        && key.is_char_boundary(key.len() - suffix)
        && key[key.len() - suffix..].eq_ignore_ascii_case(BINARY_METADATA_SUFFIX)
}

/// Encodes a metadata value for the header named `key`.
pub(crate) fn encode_value(key: &str, value: &[u8]) -> Option<HeaderValue> {
    if is_binary_key(key) {
        HeaderValue::from_maybe_shared(Bytes::from(BINARY_VALUE_ENGINE.encode(value))).ok()
    } else {
        HeaderValue::from_bytes(value).ok()
    }
}

/// Decodes a header value received under `key`, `None` if a binary value is not
/// valid base64.
pub(crate) fn decode_value(key: &str, value: &HeaderValue) -> Option<Bytes> {
    if is_binary_key(key) {
        BINARY_VALUE_ENGINE.decode(value.as_bytes()).ok().map(Bytes::from)
    } else {
        Some(Bytes::copy_from_slice(value.as_bytes()))
    }
}
