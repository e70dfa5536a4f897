//! # JSON-RPC 2.0 Service Responder
//!
//! Exposes a registered service (a tree of callables, static values and
//! nested namespaces) as a JSON-RPC 2.0 endpoint. This crate holds the
//! registry and dispatch logic only; transports decode requests, call a
//! [`Responder`] and encode whatever it replies.
//!
//! ## Features
//! - Explicit service registration with positional and named parameters
//! - Parameter names read from declarations such as `"fn add(a, b)"`
//! - Static value leaves served without invoking anything
//! - A reserved introspection method returning the whole definition tree
//! - Uniform error envelopes for protocol errors, method errors and panics
//!
//! ```rust
//! use rpc_responder::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), BuildError> {
//! let service = Service::builder()
//!     .method("add", ["a", "b"], |args: Arguments| async move {
//!         let a: i64 = args.required(0)?;
//!         let b: i64 = args.required(1)?;
//!         Ok::<_, MethodError>(a + b)
//!     })
//!     .value("version", "1.0.0")
//!     .build()?;
//!
//! let responder = Responder::new(service);
//! let reply = responder
//!     .respond_value(json!({"jsonrpc": "2.0", "id": 1, "method": "add", "params": {"a": 2, "b": 3}}))
//!     .await;
//! assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 1, "result": 5}));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod method;
pub mod params;
pub mod prelude;
pub mod request;
pub mod responder;
pub mod response;
pub mod types;
pub mod validate;

// Re-export main types
pub use builder::{NamespaceBuilder, RpcService, Service, ServiceBuilder};
pub use config::{ResponderConfig, DEFAULT_INTROSPECTION_METHOD};
pub use definition::{
    CallableLeaf, LeafValue, MethodDefinition, Namespace, FUNCTION_TYPE, VALUE_TYPE,
};
pub use error::{
    BuildError, ConfigError, ExtractionError, JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject,
    MethodError, ProtocolError, ToJsonRpcError,
};
pub use extract::extract_parameter_names;
pub use method::{Arguments, Completion, MethodResult, RpcMethod};
pub use params::map_parameters;
pub use request::{JsonRpcRequest, RequestParams};
pub use responder::Responder;
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};
pub use validate::{validate, Target};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}
