use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{JsonRpcError, JsonRpcErrorObject, ToJsonRpcError};
use crate::request::JsonRpcRequest;
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result,
        }
    }

    pub fn null(id: RequestId) -> Self {
        Self::new(id, Value::Null)
    }
}

impl<T> From<(RequestId, T)> for JsonRpcResponse
where
    T: Into<Value>,
{
    fn from((id, result): (RequestId, T)) -> Self {
        Self::new(id, result.into())
    }
}

/// Union type that represents either a successful response or an error response
/// This ensures JSON-RPC 2.0 compliance by keeping success and error responses separate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Successful response with result field
    Response(JsonRpcResponse),
    /// Error response with error field
    Error(JsonRpcError),
}

impl JsonRpcMessage {
    /// Create a success message
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(JsonRpcResponse::new(id, result))
    }

    /// Create an error message
    pub fn error(error: JsonRpcError) -> Self {
        Self::Error(error)
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    /// The echoed request id
    pub fn id(&self) -> &RequestId {
        match self {
            JsonRpcMessage::Response(resp) => &resp.id,
            JsonRpcMessage::Error(err) => &err.id,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            JsonRpcMessage::Response(resp) => Some(&resp.result),
            JsonRpcMessage::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcErrorObject> {
        match self {
            JsonRpcMessage::Response(_) => None,
            JsonRpcMessage::Error(err) => Some(&err.error),
        }
    }

    /// Encode the envelope as plain JSON
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            error!("Failed to serialize reply for id {}: {}", self.id(), e);
            Value::Null
        })
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// Wrap a result into a success envelope for `request`
pub fn success(request: &JsonRpcRequest, result: Value) -> JsonRpcMessage {
    JsonRpcMessage::success(request.request_id(), result)
}

/// Wrap an error into a failure envelope for `request`
pub fn failure<E>(request: &JsonRpcRequest, error: &E) -> JsonRpcMessage
where
    E: ToJsonRpcError + ?Sized,
{
    JsonRpcMessage::error(JsonRpcError::new(
        request.request_id(),
        error.to_error_object(),
    ))
}
