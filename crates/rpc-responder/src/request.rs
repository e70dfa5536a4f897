use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::RequestId;

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Convert to a serde_json::Value for serialization
    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// Keeps an explicit `null` distinct from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A JSON-RPC request envelope as received from a transport.
///
/// Nothing about the envelope is trusted: every member is kept as raw JSON
/// and checked by [`crate::validate::validate`] before any method runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub method: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Option<RequestParams>,
    ) -> Self {
        let id: RequestId = id.into();
        Self {
            jsonrpc: Some(Value::String(crate::JSONRPC_VERSION.to_string())),
            id: serde_json::to_value(id).ok(),
            method: Some(Value::String(method.into())),
            params: params.map(|p| p.to_value()),
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self::new(id, method, None)
    }

    /// Create a new request with object parameters
    pub fn new_with_object_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Object(params)))
    }

    /// Create a new request with array parameters
    pub fn new_with_array_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Array(params)))
    }

    /// Decode an envelope from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The method path, if the member is a string
    pub fn method_str(&self) -> Option<&str> {
        self.method.as_ref().and_then(Value::as_str)
    }

    /// Whether the `id` member is present at all (`null` counts as present)
    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// The id to echo in the reply; a missing id is echoed as `null`
    pub fn request_id(&self) -> RequestId {
        self.id
            .clone()
            .map(RequestId::from)
            .unwrap_or(RequestId::Null)
    }

    /// Whether `jsonrpc` is exactly the `"2.0"` literal
    pub fn is_version_2(&self) -> bool {
        self.jsonrpc.as_ref().and_then(Value::as_str) == Some(crate::JSONRPC_VERSION)
    }

    /// Get a parameter by name (if params are an object)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.as_object()?.get(name)
    }

    /// Get a parameter by index (if params are an array)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.as_array()?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_string};

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest::new_no_params(1, "test_method");

        let json = to_string(&request).unwrap();
        let parsed: JsonRpcRequest = from_str(&json).unwrap();

        assert_eq!(parsed.request_id(), RequestId::from(1));
        assert_eq!(parsed.method_str(), Some("test_method"));
        assert!(parsed.params.is_none());
        assert!(parsed.is_version_2());
    }

    #[test]
    fn test_null_id_is_present() {
        let with_null: JsonRpcRequest =
            from_str(r#"{"jsonrpc": "2.0", "id": null, "method": "x"}"#).unwrap();
        assert!(with_null.has_id());
        assert_eq!(with_null.request_id(), RequestId::Null);

        let without: JsonRpcRequest = from_str(r#"{"jsonrpc": "2.0", "method": "x"}"#).unwrap();
        assert!(!without.has_id());
    }

    #[test]
    fn test_untrusted_members_are_kept_raw() {
        let request: JsonRpcRequest =
            from_str(r#"{"jsonrpc": 2, "id": [1], "method": 7, "params": "scalar"}"#).unwrap();

        assert!(!request.is_version_2());
        assert_eq!(request.method_str(), None);
        assert_eq!(request.params, Some(json!("scalar")));
        assert_eq!(request.request_id(), RequestId::Other(json!([1])));
    }

    #[test]
    fn test_request_with_object_params() {
        let mut params = Map::new();
        params.insert("name".to_string(), json!("test"));
        params.insert("value".to_string(), json!(42));

        let request = JsonRpcRequest::new_with_object_params("req1", "set_value", params);

        assert_eq!(request.get_param("name"), Some(&json!("test")));
        assert_eq!(request.get_param("value"), Some(&json!(42)));
        assert_eq!(request.get_param("missing"), None);
    }

    #[test]
    fn test_params_conversions() {
        let positional = JsonRpcRequest::new(1, "sum", Some(vec![json!(1), json!(2)].into()));
        assert_eq!(positional.params, Some(json!([1, 2])));

        let mut named = Map::new();
        named.insert("a".to_string(), json!(1));
        let named = JsonRpcRequest::new(2, "sum", Some(named.into()));
        assert_eq!(named.params, Some(json!({"a": 1})));
    }

    #[test]
    fn test_request_with_array_params() {
        let request = JsonRpcRequest::new_with_array_params(
            2,
            "process",
            vec![json!("test"), json!(42), json!(true)],
        );

        assert_eq!(request.get_param_index(0), Some(&json!("test")));
        assert_eq!(request.get_param_index(2), Some(&json!(true)));
        assert_eq!(request.get_param_index(3), None);
    }
}
