use tracing::debug;

use crate::definition::{CallableLeaf, LeafValue, MethodDefinition, Namespace};
use crate::error::ProtocolError;
use crate::request::JsonRpcRequest;

/// What a valid request addresses
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The reserved method returning the whole definition tree
    Introspection,
    Callable(&'a CallableLeaf),
    Value(&'a LeafValue),
}

/// Check an envelope against the definition tree.
///
/// Checks run in a fixed order and the first failure wins: version, id,
/// then method resolution. `introspection` is the reserved method name, or
/// `None` when introspection is disabled; it never touches the tree.
pub fn validate<'a>(
    definition: &'a Namespace,
    request: &JsonRpcRequest,
    introspection: Option<&str>,
) -> Result<Target<'a>, ProtocolError> {
    if !request.is_version_2() {
        debug!("Rejecting request with jsonrpc {:?}", request.jsonrpc);
        return Err(ProtocolError::VersionMismatch);
    }

    if !request.has_id() {
        debug!("Rejecting request without id");
        return Err(ProtocolError::MissingId);
    }

    let method = request.method_str();
    if method.is_some() && method == introspection {
        return Ok(Target::Introspection);
    }

    match method.and_then(|path| definition.resolve(path)) {
        None => {
            debug!("Method not found: {:?}", request.method);
            Err(ProtocolError::MethodNotFound)
        }
        Some(MethodDefinition::Namespace(_)) => {
            debug!("Method {:?} is a namespace, not a leaf", request.method);
            Err(ProtocolError::NotALeaf)
        }
        Some(MethodDefinition::Callable(leaf)) => Ok(Target::Callable(leaf)),
        Some(MethodDefinition::Value(value)) => Ok(Target::Value(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Service;
    use crate::error::MethodError;
    use crate::method::Arguments;
    use serde_json::{from_value, json};

    const INTROSPECTION: Option<&str> = Some("@definition");

    fn service() -> Service {
        Service::builder()
            .method("add", ["a", "b"], |_args: Arguments| async {
                Ok::<_, MethodError>(0)
            })
            .value("num", 7)
            .namespace("one", |ns| ns.value("two", 1))
            .build()
            .unwrap()
    }

    fn check(request: serde_json::Value) -> Result<&'static str, ProtocolError> {
        let service = service();
        let request: JsonRpcRequest = from_value(request).unwrap();
        validate(service.definition(), &request, INTROSPECTION).map(|target| match target {
            Target::Introspection => "introspection",
            Target::Callable(_) => "callable",
            Target::Value(_) => "value",
        })
    }

    #[test]
    fn test_valid_targets() {
        assert_eq!(check(json!({"jsonrpc": "2.0", "id": 1, "method": "add"})), Ok("callable"));
        assert_eq!(check(json!({"jsonrpc": "2.0", "id": 1, "method": "num"})), Ok("value"));
        assert_eq!(check(json!({"jsonrpc": "2.0", "id": 1, "method": "one.two"})), Ok("value"));
        assert_eq!(
            check(json!({"jsonrpc": "2.0", "id": 1, "method": "@definition"})),
            Ok("introspection")
        );
    }

    #[test]
    fn test_version_mismatch() {
        assert_eq!(
            check(json!({"jsonrpc": "1.0", "id": 1, "method": "add"})),
            Err(ProtocolError::VersionMismatch)
        );
        assert_eq!(check(json!({})), Err(ProtocolError::VersionMismatch));
    }

    #[test]
    fn test_version_is_checked_before_id() {
        assert_eq!(
            check(json!({"jsonrpc": "1.0", "method": "add"})),
            Err(ProtocolError::VersionMismatch)
        );
    }

    #[test]
    fn test_missing_id() {
        assert_eq!(
            check(json!({"jsonrpc": "2.0", "method": "add"})),
            Err(ProtocolError::MissingId)
        );
        assert_eq!(check(json!({"jsonrpc": "2.0", "id": null, "method": "add"})), Ok("callable"));
    }

    #[test]
    fn test_method_resolution_errors() {
        assert_eq!(
            check(json!({"jsonrpc": "2.0", "id": 1, "method": "missing"})),
            Err(ProtocolError::MethodNotFound)
        );
        assert_eq!(
            check(json!({"jsonrpc": "2.0", "id": 1})),
            Err(ProtocolError::MethodNotFound)
        );
        assert_eq!(
            check(json!({"jsonrpc": "2.0", "id": 1, "method": 5})),
            Err(ProtocolError::MethodNotFound)
        );
        assert_eq!(
            check(json!({"jsonrpc": "2.0", "id": 1, "method": "one"})),
            Err(ProtocolError::NotALeaf)
        );
    }

    #[test]
    fn test_disabled_introspection_is_looked_up_like_any_method() {
        let service = service();
        let request = JsonRpcRequest::new_no_params(1, "@definition");
        assert!(matches!(
            validate(service.definition(), &request, None),
            Err(ProtocolError::MethodNotFound)
        ));
    }
}
