//! Callables stored in the definition tree.
//!
//! Every registered method is an [`RpcMethod`]: either an async closure
//! wrapped in [`FunctionMethod`] or a continuation-style closure wrapped in
//! [`CallbackMethod`] that replies through a [`Completion`].

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{JsonRpcErrorObject, MethodError, ToJsonRpcError};

/// Outcome of a method call, already reduced to plain JSON
pub type MethodResult = Result<Value, JsonRpcErrorObject>;

/// Trait for callables registered in a service
#[async_trait]
pub trait RpcMethod: Send + Sync {
    /// Run the method with positional arguments in declared order.
    ///
    /// Named parameters missing from a request shorten the argument list
    /// rather than padding it, so implementations must tolerate fewer
    /// arguments than they declare.
    async fn call(&self, args: Arguments) -> MethodResult;
}

/// Positional arguments handed to a method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserialize the argument at `index`, failing if it is absent
    pub fn required<T: DeserializeOwned>(&self, index: usize) -> Result<T, MethodError> {
        let value = self.0.get(index).ok_or_else(|| {
            MethodError::invalid_params(format!("Missing argument at position {}", index))
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            MethodError::invalid_params(format!("Invalid argument at position {}: {}", index, e))
        })
    }

    /// Deserialize the argument at `index`; absent and `null` give `None`
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, MethodError> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.required(index).map(Some),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

fn into_method_result<T, E>(result: Result<T, E>) -> MethodResult
where
    T: Serialize,
    E: ToJsonRpcError,
{
    match result {
        Ok(value) => serde_json::to_value(value)
            .map_err(|e| MethodError::Serialization(e).to_error_object()),
        Err(error) => Err(error.to_error_object()),
    }
}

/// An async closure registered as a method
pub struct FunctionMethod<F> {
    handler: F,
}

impl<F> FunctionMethod<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F, Fut, T, E> RpcMethod for FunctionMethod<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Serialize + Send + 'static,
    E: ToJsonRpcError,
{
    async fn call(&self, args: Arguments) -> MethodResult {
        into_method_result((self.handler)(args).await)
    }
}

/// Single-shot completion handle for continuation-style methods.
///
/// Completing consumes the handle, so a method can reply at most once.
/// Dropping it without completing turns the request into an internal error.
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<MethodResult>,
}

impl Completion {
    pub fn complete<T, E>(self, result: Result<T, E>)
    where
        T: Serialize,
        E: ToJsonRpcError,
    {
        if self.sender.send(into_method_result(result)).is_err() {
            debug!("Completion delivered after the request was abandoned");
        }
    }

    pub fn ok<T: Serialize>(self, value: T) {
        self.complete::<T, MethodError>(Ok(value));
    }

    pub fn err<E: ToJsonRpcError>(self, error: E) {
        self.complete::<Value, E>(Err(error));
    }
}

/// A continuation-style method: receives its arguments followed by a
/// [`Completion`] it must eventually complete.
pub struct CallbackMethod<F> {
    handler: F,
}

impl<F> CallbackMethod<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> RpcMethod for CallbackMethod<F>
where
    F: Fn(Arguments, Completion) + Send + Sync + 'static,
{
    async fn call(&self, args: Arguments) -> MethodResult {
        let (sender, receiver) = oneshot::channel();
        (self.handler)(args, Completion { sender });
        receiver.await.unwrap_or_else(|_| {
            Err(JsonRpcErrorObject::internal_error(Some(
                "The method dropped its completion without replying".to_string(),
            )))
        })
    }
}
