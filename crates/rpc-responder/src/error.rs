use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::types::RequestId;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError, None, data)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, Some(message.into()), None)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::MethodNotFound, Some(message.into()), None)
    }

    pub fn invalid_params(message: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::InvalidParams,
            Some(message.to_string()),
            None,
        )
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, None)
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorObject {}

/// JSON-RPC Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcError {
    pub fn new(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            version: crate::JSONRPC_VERSION.to_string(),
            id,
            error,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorObject::parse_error(None))
    }

    pub fn invalid_request(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_request(message))
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}

/// Trait for errors that can be converted to JSON-RPC error objects
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this error to a JSON-RPC error object
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

impl ToJsonRpcError for JsonRpcErrorObject {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        self.clone()
    }
}

/// Envelope-level failures detected before any registered method runs.
///
/// The messages are part of the wire contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("The JSONRPC version doesn't match 2.0")]
    VersionMismatch,

    #[error("The id member is missing")]
    MissingId,

    #[error("The method was not found")]
    MethodNotFound,

    #[error("The method is not a leaf object")]
    NotALeaf,

    #[error("The params member must be an array or an object")]
    InvalidParams,
}

impl ToJsonRpcError for ProtocolError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            ProtocolError::MethodNotFound => JsonRpcErrorObject::method_not_found(self.to_string()),
            _ => JsonRpcErrorObject::invalid_request(self.to_string()),
        }
    }
}

/// Errors reported by registered methods through their result
#[derive(Debug, Error)]
pub enum MethodError {
    #[error("{0}")]
    InvalidParams(String),

    #[error("{message}")]
    Application {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("{0}")]
    Internal(String),

    #[error("Result serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MethodError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        MethodError::InvalidParams(message.into())
    }

    /// Application error with a caller-chosen code
    pub fn application(code: i64, message: impl Into<String>) -> Self {
        MethodError::Application {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        MethodError::Internal(message.into())
    }
}

impl ToJsonRpcError for MethodError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            MethodError::InvalidParams(msg) => JsonRpcErrorObject::invalid_params(msg),
            MethodError::Application {
                code,
                message,
                data,
            } => JsonRpcErrorObject {
                code: *code,
                message: message.clone(),
                data: data.clone(),
            },
            MethodError::Internal(msg) => JsonRpcErrorObject::internal_error(Some(msg.clone())),
            MethodError::Serialization(_) => {
                JsonRpcErrorObject::internal_error(Some(self.to_string()))
            }
        }
    }
}

/// A declaration string without a recognizable parameter list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("No parameter list found in declaration: {0}")]
    NoParameterList(String),
}

/// Errors raised while registering a service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Member name must not be empty (in '{0}')")]
    EmptyName(String),

    #[error("Member name '{0}' must not contain '.'")]
    DottedName(String),

    #[error("Member name '{0}' uses the reserved '@' prefix")]
    ReservedName(String),

    #[error("Member '{0}' is registered more than once")]
    Duplicate(String),

    #[error("The root of a service must be an object")]
    RootNotNamespace,
}

/// Transport-level errors for JSON-RPC processing (no domain logic)
#[derive(Debug, Error)]
pub enum JsonRpcTransportError {
    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

/// Rejected responder configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Introspection method '{0}' must start with the reserved '@' prefix")]
    UnreservedIntrospectionName(String),
}
