//! # Responder Prelude
//!
//! Convenient re-exports of the types most services need.
//!
//! ```rust
//! use rpc_responder::prelude::*;
//! ```

pub use crate::builder::{NamespaceBuilder, RpcService, Service, ServiceBuilder};
pub use crate::config::ResponderConfig;
pub use crate::error::{BuildError, ConfigError, JsonRpcErrorObject, MethodError, ToJsonRpcError};
pub use crate::method::{Arguments, Completion, RpcMethod};
pub use crate::request::JsonRpcRequest;
pub use crate::responder::Responder;
pub use crate::response::JsonRpcMessage;
pub use crate::types::RequestId;

// Standard error codes
pub use crate::error_codes::*;
