//! Wire decoding and encoding for transports that sit in front of a
//! [`crate::Responder`].

use serde_json::Value;

use crate::error::{JsonRpcError, JsonRpcTransportError};
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcMessage;
use crate::types::RequestId;

/// Parse a JSON string into a request envelope
pub fn parse_request(json_str: &str) -> Result<JsonRpcRequest, JsonRpcError> {
    let value: Value = serde_json::from_str(json_str).map_err(|_| JsonRpcError::parse_error())?;
    request_from_value(value)
}

/// Decode an already-parsed value into a request envelope.
///
/// Only the outer shape is checked here; the members are validated later
/// against the definition tree. Batches are not supported.
pub fn request_from_value(value: Value) -> Result<JsonRpcRequest, JsonRpcError> {
    if !value.is_object() {
        return Err(JsonRpcError::invalid_request(
            RequestId::Null,
            "The request must be a JSON object",
        ));
    }

    JsonRpcRequest::from_value(value)
        .map_err(|e| JsonRpcError::invalid_request(RequestId::Null, e.to_string()))
}

/// Encode a reply for the wire
pub fn encode_message(message: &JsonRpcMessage) -> Result<String, JsonRpcTransportError> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_request() {
        let request = parse_request(r#"{"jsonrpc": "2.0", "method": "test", "id": 1}"#).unwrap();

        assert_eq!(request.method_str(), Some("test"));
        assert_eq!(request.request_id(), RequestId::from(1));
    }

    #[test]
    fn test_parse_keeps_invalid_members_for_validation() {
        let request = parse_request(r#"{"jsonrpc": "1.0", "method": "test"}"#).unwrap();

        assert!(!request.is_version_2());
        assert!(!request.has_id());
    }

    #[test]
    fn test_parse_invalid_json() {
        let error = parse_request(r#"{"jsonrpc": "2.0", "method": "test""#).unwrap_err();
        assert_eq!(error.error.code, -32700);
        assert_eq!(error.id, RequestId::Null);
    }

    #[test]
    fn test_non_object_is_invalid_request() {
        for raw in ["[]", "[1, 2]", "42", "\"add\""] {
            let error = parse_request(raw).unwrap_err();
            assert_eq!(error.error.code, -32600, "input: {}", raw);
        }
    }

    #[test]
    fn test_encode_message() {
        let message = JsonRpcMessage::success(RequestId::from(1), json!({"ok": true}));
        let json_str = encode_message(&message).unwrap();

        assert!(json_str.contains("\"result\""));
        assert!(json_str.contains("\"jsonrpc\":\"2.0\""));
    }
}
