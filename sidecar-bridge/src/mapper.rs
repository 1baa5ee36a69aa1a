//! Maps callee errors to the gRPC status returned to the original caller.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    consts::{
        ERROR_INFO_DOMAIN, ERROR_INFO_HTTP_CODE_METADATA, ERROR_INFO_HTTP_ERROR_METADATA,
        INTERNAL_SERVER_ERROR_MESSAGE, MAX_ERROR_INFO_VALUE_LEN,
    },
    details::{Any, ErrorInfo, InternalStatus},
    status::{Code, Status},
};

/// Maps the HTTP response of an app to a gRPC status.
///
/// `200` is success. `404` becomes `NotFound` and anything else `Unknown`,
/// with `message` as the status message except for `500`, whose backend text is
/// replaced by a generic one. Every error carries an [`ErrorInfo`] detail
/// holding the HTTP code and the original message cut to 63 bytes.
pub fn error_from_http_response_code(code: u16, message: &str) -> Result<(), Status> {
    let mut status = match code {
        200 => return Ok(()),
        404 => Status::not_found(message),
        500 => Status::unknown(INTERNAL_SERVER_ERROR_MESSAGE),
        _ => Status::unknown(message),
    };

    let mut code_buf = itoa::Buffer::new();
    let info = ErrorInfo {
        reason: String::new(),
        domain: ERROR_INFO_DOMAIN.to_owned(),
        metadata: HashMap::from([
            (
                ERROR_INFO_HTTP_CODE_METADATA.to_owned(),
                code_buf.format(code).to_owned(),
            ),
            (
                ERROR_INFO_HTTP_ERROR_METADATA.to_owned(),
                truncate(message, MAX_ERROR_INFO_VALUE_LEN).to_owned(),
            ),
        ]),
    };
    match Any::from_msg(&info) {
        Ok(detail) => status.push_detail(detail),
        Err(err) => warn!("[BRIDGE] failed to encode error info: {}", err),
    }

    debug!(
        "[BRIDGE] http response {} mapped to grpc {:?}",
        code,
        status.code()
    );
    Err(status)
}

/// Passes a status computed by an upstream hop through unchanged.
///
/// Only an `OK` code counts as success; the message and every detail record are
/// kept as they are. A numeric code outside `0..=16` has no [`Code`] variant
/// and comes back as [`Code::Unknown`], so a non-standard code does not survive
/// the hop.
pub fn error_from_internal_status(status: InternalStatus) -> Result<(), Status> {
    if status.code == Code::Ok as i32 {
        return Ok(());
    }
    Err(Status::from_internal(status))
}

/// Cuts `value` to at most `max` bytes without splitting a character.
fn truncate(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::DebugInfo;

    fn error_info(status: &Status) -> ErrorInfo {
        status.details()[0].to_msg::<ErrorInfo>().unwrap()
    }

    fn http_code(info: &ErrorInfo) -> &str {
        &info.metadata[ERROR_INFO_HTTP_CODE_METADATA]
    }

    fn http_error(info: &ErrorInfo) -> &str {
        &info.metadata[ERROR_INFO_HTTP_ERROR_METADATA]
    }

    #[test]
    fn ok() {
        assert!(error_from_http_response_code(200, "OK").is_ok());
    }

    #[test]
    fn not_found() {
        let status = error_from_http_response_code(404, "Not Found").unwrap_err();

        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "Not Found");
        let info = error_info(&status);
        assert_eq!(http_code(&info), "404");
        assert_eq!(http_error(&info), "Not Found");
        assert_eq!(info.domain, ERROR_INFO_DOMAIN);
        assert_eq!(info.metadata.len(), 2);
    }

    #[test]
    fn unknown() {
        let status = error_from_http_response_code(201, "Created").unwrap_err();

        assert_eq!(status.code(), Code::Unknown);
        assert_eq!(status.message(), "Created");
        let info = error_info(&status);
        assert_eq!(http_code(&info), "201");
        assert_eq!(http_error(&info), "Created");
    }

    #[test]
    fn internal_server_error() {
        let status = error_from_http_response_code(500, "HTTPExtensions is not given").unwrap_err();

        assert_eq!(status.code(), Code::Unknown);
        assert_eq!(status.message(), "Internal Server Error");
        let info = error_info(&status);
        assert_eq!(http_code(&info), "500");
        assert_eq!(http_error(&info), "HTTPExtensions is not given");
    }

    #[test]
    fn truncate_error_message() {
        let long_message = "test".repeat(30);

        let status = error_from_http_response_code(500, &long_message).unwrap_err();

        let info = error_info(&status);
        assert_eq!(http_error(&info).len(), 63);
        assert!(long_message.starts_with(http_error(&info)));
        assert_eq!(status.error_info(), Some(info));
    }

    #[test]
    fn truncate_keeps_utf8_valid() {
        let message = format!("{}é", "a".repeat(62));
        assert_eq!(truncate(&message, 63), "a".repeat(62));
        assert_eq!(truncate("short", 63), "short");
    }

    #[test]
    fn internal_status_passthrough() {
        let debug_info = Any::from_msg(&DebugInfo {
            stack_entries: vec!["first stack".to_owned(), "second stack".to_owned()],
            detail: String::new(),
        })
        .unwrap();
        let internal = InternalStatus {
            code: Code::Internal as i32,
            message: "Internal Service Error".to_owned(),
            details: vec![debug_info.clone()],
        };

        let status = error_from_internal_status(internal.clone()).unwrap_err();

        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "Internal Service Error");
        assert_eq!(status.details(), [debug_info]);
        assert_eq!(status.to_internal(), internal);
    }

    #[test]
    fn internal_status_unknown_code() {
        let internal = InternalStatus {
            code: 42,
            message: "teapot".to_owned(),
            details: Vec::new(),
        };

        let status = error_from_internal_status(internal).unwrap_err();

        assert_eq!(status.code(), Code::Unknown);
        assert_eq!(status.message(), "teapot");
        assert_eq!(status.to_internal().code, Code::Unknown as i32);
    }

    #[test]
    fn internal_status_ok() {
        let internal = InternalStatus {
            code: 0,
            message: String::new(),
            details: Vec::new(),
        };
        assert!(error_from_internal_status(internal).is_ok());
    }
}
