//! Relays a call across both bridges the way the sidecar does.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue};
use sidecar_bridge::{
    error_from_http_response_code, error_from_internal_status, grpc_metadata_to_internal_metadata,
    http_header_to_internal_metadata, internal_metadata_to_grpc_metadata,
    internal_metadata_to_http_header, Code, GrpcMetadata, Status,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[test]
fn grpc_caller_to_http_app() {
    init_tracing();

    let mut incoming = HeaderMap::new();
    incoming.insert("content-type", HeaderValue::from_static("application/grpc"));
    incoming.insert("grpc-timeout", HeaderValue::from_static("1S"));
    incoming.insert("grpc-trace-bin", HeaderValue::from_static("Ch4yPA"));
    incoming.append("x-tenant", HeaderValue::from_static("a"));
    incoming.append("x-tenant", HeaderValue::from_static("b"));

    let md = GrpcMetadata::from_header_map(&incoming);
    let mut canonical = grpc_metadata_to_internal_metadata(&md);
    canonical.append(":method", "POST");

    assert_eq!(
        canonical.get("grpc-trace-bin").unwrap(),
        [Bytes::from_static(&[10, 30, 50, 60])]
    );

    let mut outgoing = HeaderMap::new();
    internal_metadata_to_http_header(&canonical, &mut outgoing);

    assert_eq!(outgoing.len(), 4);
    assert_eq!(outgoing["dapr-grpc-timeout"], "1S");
    assert_eq!(outgoing["dapr-method"], "POST");
    let tenants: Vec<_> = outgoing.get_all("x-tenant").iter().collect();
    assert_eq!(tenants, ["a", "b"]);
    assert!(!outgoing.contains_key("content-type"));
    assert!(!outgoing.contains_key("grpc-trace-bin"));
}

#[test]
fn http_caller_to_grpc_app() {
    init_tracing();

    let mut incoming = HeaderMap::new();
    incoming.insert("host", HeaderValue::from_static("localhost:3500"));
    incoming.insert("content-type", HeaderValue::from_static("application/json"));
    incoming.insert("user-agent", HeaderValue::from_static("curl/8.0"));

    let canonical = http_header_to_internal_metadata(&incoming);
    let md = internal_metadata_to_grpc_metadata(&canonical, true);
    let outgoing = md.to_header_map().unwrap();

    assert_eq!(outgoing["dapr-host"], "localhost:3500");
    assert_eq!(outgoing["dapr-content-type"], "application/json");
    assert_eq!(outgoing["user-agent"], "curl/8.0");
    assert!(!outgoing.contains_key("host"));
}

#[test]
fn http_app_error_reaches_grpc_caller() {
    init_tracing();

    let status = error_from_http_response_code(500, "db password is hunter2").unwrap_err();
    let trailers = status.to_header_map().unwrap();

    assert_eq!(trailers["grpc-status"], "2");
    assert_eq!(trailers["grpc-message"], "Internal%20Server%20Error");

    let received = Status::from_header_map(&trailers).unwrap();
    let info = received.error_info().unwrap();
    assert_eq!(received.code(), Code::Unknown);
    assert_eq!(info.metadata["http.code"], "500");
    assert_eq!(info.metadata["http.error_message"], "db password is hunter2");
}

#[test]
fn upstream_status_passes_through_hops() {
    init_tracing();

    let first_hop = error_from_http_response_code(404, "no such method").unwrap_err();
    let relayed = error_from_internal_status(first_hop.to_internal()).unwrap_err();

    assert_eq!(relayed.code(), Code::NotFound);
    assert_eq!(relayed.message(), "no such method");
    assert_eq!(relayed.details(), first_hop.details());
}
