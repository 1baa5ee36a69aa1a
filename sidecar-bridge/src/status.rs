//! The gRPC error value the bridges hand back to transport frameworks.
//!
//! Adapted from `tonic/src/status.rs`, with details kept as decoded
//! `google.rpc.Status` records instead of opaque bytes.

use std::{borrow::Cow, error::Error, fmt};

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue};
use percent_encoding::{percent_decode, percent_encode, AsciiSet, CONTROLS};
use prost::Message;
use tracing::{debug, trace, warn};

use crate::{
    consts::{GRPC_STATUS_DETAILS_HEADER, GRPC_STATUS_HEADER_CODE, GRPC_STATUS_MESSAGE_HEADER},
    details::{Any, ErrorInfo, InternalStatus},
    metadata::{decode_value, encode_value, GrpcMetadata, MetadataError},
    BoxError,
};

/// Bytes outside `0x20..=0x7E` are always escaped by `percent_encode`; `%`
/// must be too or a decoder reads it as the start of an escape.
const ENCODING_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}');

/// A gRPC status describing the result of an RPC call.
///
/// ```
/// # use sidecar_bridge::{Code, Status};
/// let status = Status::not_found("no such actor");
///
/// assert_eq!(status.code(), Code::NotFound);
/// assert_eq!(status.message(), "no such actor");
/// assert!(status.details().is_empty());
/// ```
pub struct Status {
    /// The gRPC status code, found in the `grpc-status` header.
    code: Code,
    /// A relevant error message, found in the `grpc-message` header.
    message: String,
    /// Structured details, found in the `grpc-status-details-bin` header.
    details: Vec<Any>,
    /// Custom metadata sent along with the status. Names reserved by the
    /// fields above are never written from here.
    metadata: GrpcMetadata,
    /// Optional underlying error.
    source: Option<BoxError>,
}

impl Clone for Status {
    fn clone(&self) -> Self {
        Self {
            code: self.code,
            message: self.message.clone(),
            details: self.details.clone(),
            metadata: self.metadata.clone(),
            source: None,
        }
    }
}

/// gRPC status codes used by [`Status`].
///
/// These variants match the [gRPC status codes].
///
/// [gRPC status codes]: https://github.com/grpc/grpc/blob/master/doc/statuscodes.md#status-codes-and-their-use-in-grpc
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    /// Human readable description of this `Code`, also used by its `Display`.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ok => "The operation completed successfully",
            Self::Cancelled => "The operation was cancelled",
            Self::Unknown => "Unknown error",
            Self::InvalidArgument => "Client specified an invalid argument",
            Self::DeadlineExceeded => "Deadline expired before operation could complete",
            Self::NotFound => "Some requested entity was not found",
            Self::AlreadyExists => "Some entity that we attempted to create already exists",
            Self::PermissionDenied => {
                "The caller does not have permission to execute the specified operation"
            }
            Self::ResourceExhausted => "Some resource has been exhausted",
            Self::FailedPrecondition => {
                "The system is not in a state required for the operation's execution"
            }
            Self::Aborted => "The operation was aborted",
            Self::OutOfRange => "Operation was attempted past the valid range",
            Self::Unimplemented => "Operation is not implemented or not supported",
            Self::Internal => "Internal error",
            Self::Unavailable => "The service is currently unavailable",
            Self::DataLoss => "Unrecoverable data loss or corruption",
            Self::Unauthenticated => "The request does not have valid authentication credentials",
        }
    }

    /// Parses the decimal form found in a `grpc-status` header.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        std::str::from_utf8(bytes)
            .ok()
            .filter(|s| !s.starts_with('+'))
            .and_then(|s| s.parse::<i32>().ok())
            .map_or_else(Self::parse_err, Self::from)
    }

    fn to_header_value(self) -> HeaderValue {
        HeaderValue::from(self as i32)
    }

    fn parse_err() -> Self {
        trace!("[BRIDGE] error parsing grpc-status");
        Self::Unknown
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.description(), f)
    }
}

impl From<i32> for Code {
    fn from(i: i32) -> Self {
        match i {
            0 => Self::Ok,
            1 => Self::Cancelled,
            2 => Self::Unknown,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,

            _ => Self::Unknown,
        }
    }
}

impl From<Code> for i32 {
    #[inline]
    fn from(code: Code) -> i32 {
        code as i32
    }
}

impl Status {
    /// Create a new [`Status`] with the associated code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self::with_details_and_metadata(code, message, Vec::new(), GrpcMetadata::new())
    }

    /// Create a new [`Status`] with the associated code, message and details.
    pub fn with_details(code: Code, message: impl Into<String>, details: Vec<Any>) -> Self {
        Self::with_details_and_metadata(code, message, details, GrpcMetadata::new())
    }

    pub fn with_details_and_metadata(
        code: Code,
        message: impl Into<String>,
        details: Vec<Any>,
        metadata: GrpcMetadata,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            metadata,
            source: None,
        }
    }

    /// Some requested entity was not found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// Unknown error, also used for errors raised by APIs that do not return
    /// enough information to classify them.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Code::Unknown, message)
    }

    /// Internal errors. Means some invariants expected by underlying system has
    /// been broken.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// Appends a detail record.
    pub fn push_detail(&mut self, detail: Any) {
        self.details.push(detail);
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The detail records, in the order they were attached.
    pub fn details(&self) -> &[Any] {
        &self.details
    }

    /// The first [`ErrorInfo`] among the details.
    pub fn error_info(&self) -> Option<ErrorInfo> {
        self.details
            .iter()
            .find_map(|detail| detail.to_msg::<ErrorInfo>().ok())
    }

    pub fn metadata(&self) -> &GrpcMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut GrpcMetadata {
        &mut self.metadata
    }

    // ==== transform between Status and InternalStatus ====

    /// Rebuilds a status computed by another hop, keeping its code, message and
    /// details as they are. A numeric code outside `0..=16` becomes
    /// [`Code::Unknown`].
    pub fn from_internal(status: InternalStatus) -> Self {
        Self::with_details(Code::from(status.code), status.message, status.details)
    }

    pub fn to_internal(&self) -> InternalStatus {
        InternalStatus {
            code: self.code.into(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }

    // ==== transform between Error and Status ====

    pub fn from_error(err: BoxError) -> Self {
        Self::try_from_error(err).unwrap_or_else(|err| Self::new(Code::Unknown, err.to_string()))
    }

    pub fn try_from_error(err: BoxError) -> Result<Self, BoxError> {
        let err = match err.downcast::<Self>() {
            Ok(status) => return Ok(*status),
            Err(err) => err,
        };

        if let Some(status) = find_status_in_source_chain(&*err) {
            return Ok(status);
        }

        Err(err)
    }

    // ==== transform between Status and HeaderMap ====

    /// Extract a `Status` from the trailers of a gRPC response.
    pub fn from_header_map(header_map: &HeaderMap) -> Option<Self> {
        let code = header_map.get(GRPC_STATUS_HEADER_CODE)?;
        let code = Code::from_bytes(code.as_bytes());

        let message = header_map
            .get(GRPC_STATUS_MESSAGE_HEADER)
            .map(|header| {
                percent_decode(header.as_bytes())
                    .decode_utf8()
                    .map(|cow| cow.into_owned())
            })
            .unwrap_or_else(|| Ok(String::new()));

        let details = header_map
            .get(GRPC_STATUS_DETAILS_HEADER)
            .map(|header| {
                decode_value(GRPC_STATUS_DETAILS_HEADER, header)
                    .and_then(|bytes| InternalStatus::decode(bytes).ok())
                    .map(|status| status.details)
                    .unwrap_or_else(|| {
                        warn!("[BRIDGE] invalid grpc-status-details-bin, details dropped");
                        Vec::new()
                    })
            })
            .unwrap_or_default();

        let mut other_headers = header_map.clone();
        other_headers.remove(GRPC_STATUS_HEADER_CODE);
        other_headers.remove(GRPC_STATUS_MESSAGE_HEADER);
        other_headers.remove(GRPC_STATUS_DETAILS_HEADER);
        let metadata = GrpcMetadata::from_header_map(&other_headers);

        let status = match message {
            Ok(message) => Self::with_details_and_metadata(code, message, details, metadata),
            Err(err) => {
                warn!("[BRIDGE] Error deserializing status message header: {}", err);
                Self::with_details_and_metadata(
                    Code::Unknown,
                    format!("Error deserializing status message header: {}", err),
                    details,
                    metadata,
                )
            }
        };
        Some(status)
    }

    /// Convert to the trailers of a gRPC response.
    pub fn to_header_map(&self) -> Result<HeaderMap, Self> {
        let mut header_map = HeaderMap::with_capacity(3 + self.metadata.len());
        self.add_header(&mut header_map)?;
        Ok(header_map)
    }

    /// Insert the code, message, details and custom metadata into `header_map`.
    pub fn add_header(&self, header_map: &mut HeaderMap) -> Result<(), Self> {
        header_map.extend(
            self.metadata
                .to_sanitized_header_map()
                .map_err(invalid_header)?,
        );

        header_map.insert(GRPC_STATUS_HEADER_CODE, self.code.to_header_value());

        if !self.message.is_empty() {
            let to_write = Bytes::copy_from_slice(
                Cow::from(percent_encode(self.message.as_bytes(), ENCODING_SET)).as_bytes(),
            );
            header_map.insert(
                GRPC_STATUS_MESSAGE_HEADER,
                HeaderValue::from_maybe_shared(to_write).map_err(invalid_header)?,
            );
        }

        if !self.details.is_empty() {
            let encoded = self.to_internal().encode_to_vec();
            let details = encode_value(GRPC_STATUS_DETAILS_HEADER, &encoded).ok_or_else(|| {
                invalid_header(MetadataError::InvalidValue(GRPC_STATUS_DETAILS_HEADER.into()))
            })?;
            header_map.insert(GRPC_STATUS_DETAILS_HEADER, details);
        }

        Ok(())
    }
}

fn find_status_in_source_chain(err: &(dyn Error + 'static)) -> Option<Status> {
    let mut source = Some(err);

    while let Some(err) = source {
        if let Some(status) = err.downcast_ref::<Status>() {
            return Some(status.clone());
        }
        source = err.source();
    }

    None
}

fn invalid_header<E: fmt::Display>(err: E) -> Status {
    debug!("[BRIDGE] Invalid header: {}", err);
    Status::internal("Couldn't serialize non-text grpc status header")
}

impl From<InternalStatus> for Status {
    fn from(status: InternalStatus) -> Self {
        Self::from_internal(status)
    }
}

impl From<Status> for InternalStatus {
    fn from(status: Status) -> Self {
        InternalStatus {
            code: status.code.into(),
            message: status.message,
            details: status.details,
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A manual impl to reduce the noise of frequently empty fields.
        let mut builder = f.debug_struct("Status");

        builder.field("code", &self.code);

        if !self.message.is_empty() {
            builder.field("message", &self.message);
        }

        if !self.details.is_empty() {
            builder.field("details", &self.details);
        }

        if !self.metadata.is_empty() {
            builder.field("metadata", &self.metadata);
        }

        builder.field("source", &self.source);

        builder.finish()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status: {:?}, message: {:?}, details: {}, metadata: {:?}",
            self.code(),
            self.message(),
            self.details.len(),
            self.metadata(),
        )
    }
}

impl Error for Status {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|err| (&**err) as _)
    }
}
