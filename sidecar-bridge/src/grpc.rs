//! Conversion between canonical metadata and gRPC metadata.

use tracing::trace;

use crate::{
    consts::{GRPC_RESERVED_RENAMES, TRACE_BINARY_KEYS},
    metadata::{CanonicalMetadata, GrpcMetadata},
};

/// Copies incoming gRPC metadata into canonical form.
///
/// Nothing is filtered or renamed here: reserved and pseudo keys are kept so
/// later policy sees the whole request, and binary values keep their exact bytes.
pub fn grpc_metadata_to_internal_metadata(md: &GrpcMetadata) -> CanonicalMetadata {
    let mut internal = CanonicalMetadata::with_capacity(md.len());
    for (key, values) in md.iter() {
        internal.insert(key.clone(), values.to_vec());
    }
    internal
}

impl From<GrpcMetadata> for CanonicalMetadata {
    fn from(md: GrpcMetadata) -> Self {
        let mut internal = CanonicalMetadata::with_capacity(md.len());
        for (key, values) in md {
            internal.insert(key, values);
        }
        internal
    }
}

/// The gRPC key an already lower-cased HTTP-origin key is sent under in http
/// header conversion mode.
fn grpc_metadata_name(key: &str) -> &str {
    GRPC_RESERVED_RENAMES
        .iter()
        .find(|(reserved, _)| *reserved == key)
        .map_or(key, |(_, renamed)| *renamed)
}

/// Emits canonical metadata as gRPC metadata.
///
/// Keys are lower-cased and every value is kept in order. With
/// `http_header_conversion`, the metadata is assumed to come from HTTP headers:
/// `host` and `content-type` move to `dapr-host` and `dapr-content-type` so the
/// gRPC stack does not act on them, and binary trace context is dropped.
pub fn internal_metadata_to_grpc_metadata(
    md: &CanonicalMetadata,
    http_header_conversion: bool,
) -> GrpcMetadata {
    let mut grpc = GrpcMetadata::with_capacity(md.len());
    for (key, values) in md.iter() {
        let key = key.to_ascii_lowercase();
        if !http_header_conversion {
            grpc.append_all(&key, values.iter().cloned());
            continue;
        }

        if TRACE_BINARY_KEYS.contains(&key.as_str()) {
            trace!("[BRIDGE] drop trace metadata `{key}` for grpc");
            continue;
        }
        grpc.append_all(grpc_metadata_name(&key), values.iter().cloned());
    }
    grpc
}
