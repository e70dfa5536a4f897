use serde_json::Value;

use crate::error::ProtocolError;

/// Turn request `params` into positional arguments for a callable.
///
/// - absent or `null`: no arguments
/// - array: used verbatim, declared names are ignored
/// - object: looked up by declared name, in declared order; names missing
///   from the object are dropped, not padded
/// - anything else is rejected
pub fn map_parameters(
    params: Option<&Value>,
    declared: &[String],
) -> Result<Vec<Value>, ProtocolError> {
    match params {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => Ok(values.clone()),
        Some(Value::Object(named)) => Ok(declared
            .iter()
            .filter_map(|name| named.get(name).cloned())
            .collect()),
        Some(_) => Err(ProtocolError::InvalidParams),
    }
}
