//! Fixed names and bounds shared by every bridge.
//!
//! None of these are runtime configuration: changing one changes the wire
//! contract with the other hops of the sidecar.

/// Prefix given to metadata that was renamed to avoid clashing with a reserved
/// transport name.
pub const DAPR_HEADER_PREFIX: &str = "dapr-";

/// Suffix marking a gRPC metadata key whose values are arbitrary bytes.
pub const BINARY_METADATA_SUFFIX: &str = "-bin";

pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Media type recognized by [`is_json_content_type`](crate::content_type::is_json_content_type).
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Keys that are renamed with [`DAPR_HEADER_PREFIX`] when emitted as HTTP headers.
///
/// Pseudo-headers (`:method`, `:path`, ...) are handled separately since any key
/// starting with `:` is invalid in HTTP/1.1.
pub const HTTP_RESERVED_RENAMES: &[(&str, &str)] = &[(GRPC_TIMEOUT_HEADER, "dapr-grpc-timeout")];

/// HTTP-origin keys renamed when canonical metadata is emitted as gRPC metadata in
/// http header conversion mode.
pub const GRPC_RESERVED_RENAMES: &[(&str, &str)] = &[
    ("host", "dapr-host"),
    (CONTENT_TYPE_HEADER, "dapr-content-type"),
];

/// Binary trace propagation keys, never forwarded in http header conversion mode.
pub const TRACE_BINARY_KEYS: &[&str] = &["grpc-trace-bin"];

/// ErrorInfo metadata values are bounded to 63 bytes.
pub const MAX_ERROR_INFO_VALUE_LEN: usize = 63;

pub const ERROR_INFO_DOMAIN: &str = "dapr.io";
pub const ERROR_INFO_HTTP_CODE_METADATA: &str = "http.code";
pub const ERROR_INFO_HTTP_ERROR_METADATA: &str = "http.error_message";

/// Message used in place of the backend's text for HTTP 500 responses.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

pub(crate) const GRPC_STATUS_HEADER_CODE: &str = "grpc-status";
pub(crate) const GRPC_STATUS_MESSAGE_HEADER: &str = "grpc-message";
pub(crate) const GRPC_STATUS_DETAILS_HEADER: &str = "grpc-status-details-bin";
