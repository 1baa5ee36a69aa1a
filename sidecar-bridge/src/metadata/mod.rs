//! Metadata containers shared by the HTTP and gRPC bridges.

mod canonical;
mod encoding;
mod map;

use faststr::FastStr;

pub use self::{
    canonical::CanonicalMetadata,
    encoding::is_binary_key,
    map::GrpcMetadata,
};
pub(crate) use self::encoding::{decode_value, encode_value};

/// Metadata that cannot be written as HTTP/2 headers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("invalid metadata key `{0}`")]
    InvalidKey(FastStr),
    #[error("invalid value for metadata key `{0}`")]
    InvalidValue(FastStr),
}
