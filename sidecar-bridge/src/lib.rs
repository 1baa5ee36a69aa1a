#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]

pub mod consts;
pub mod content_type;
pub mod details;
pub mod grpc;
pub mod header;
pub mod mapper;
pub mod metadata;
pub mod status;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use content_type::is_json_content_type;
pub use grpc::{grpc_metadata_to_internal_metadata, internal_metadata_to_grpc_metadata};
pub use header::{
    http_header_to_internal_metadata, internal_metadata_to_http_header, HeaderSink,
};
pub use mapper::{error_from_http_response_code, error_from_internal_status};
pub use metadata::{CanonicalMetadata, GrpcMetadata};
pub use status::{Code, Status};
