//! Protobuf messages carried as status details.
//!
//! Field numbers follow `google/rpc/status.proto` and
//! `google/rpc/error_details.proto`, so details produced here decode with any
//! gRPC implementation's rich error model.

use std::collections::HashMap;

use prost::{Message, Name};
pub use prost_types::Any;

const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// The transport-neutral status one sidecar hop hands to the next.
///
/// Wire-compatible with `google.rpc.Status`, which is also what
/// `grpc-status-details-bin` carries.
#[derive(Clone, PartialEq, Message)]
pub struct InternalStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<Any>,
}

/// `google.rpc.ErrorInfo`
#[derive(Clone, PartialEq, Message)]
pub struct ErrorInfo {
    #[prost(string, tag = "1")]
    pub reason: String,
    #[prost(string, tag = "2")]
    pub domain: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

/// `google.rpc.DebugInfo`
#[derive(Clone, PartialEq, Message)]
pub struct DebugInfo {
    #[prost(string, repeated, tag = "1")]
    pub stack_entries: Vec<String>,
    #[prost(string, tag = "2")]
    pub detail: String,
}

macro_rules! google_rpc_name {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Name for $ty {
                const NAME: &'static str = stringify!($ty);
                const PACKAGE: &'static str = "google.rpc";

                fn type_url() -> String {
                    format!("{TYPE_URL_PREFIX}{}", Self::full_name())
                }
            }
        )*
    };
}

google_rpc_name!(ErrorInfo, DebugInfo);
