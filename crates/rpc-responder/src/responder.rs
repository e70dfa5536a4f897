use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::builder::Service;
use crate::config::ResponderConfig;
use crate::definition::CallableLeaf;
use crate::dispatch::{encode_message, parse_request, request_from_value};
use crate::error::{ConfigError, JsonRpcErrorObject};
use crate::method::Arguments;
use crate::params::map_parameters;
use crate::request::JsonRpcRequest;
use crate::response::{failure, success, JsonRpcMessage};
use crate::validate::{validate, Target};

/// JSON-RPC entry point for one registered service.
///
/// Cloning is cheap: the definition tree and configuration are shared, and
/// any number of requests may be in flight at once.
#[derive(Debug, Clone)]
pub struct Responder {
    service: Service,
    config: Arc<ResponderConfig>,
}

impl Responder {
    pub fn new(service: Service) -> Self {
        Self::ready(service, ResponderConfig::default())
    }

    /// Fails if the introspection method is enabled under a name outside the
    /// reserved `@` prefix, where it could hide a registered method.
    pub fn with_config(service: Service, config: ResponderConfig) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            warn!("Refusing responder configuration: {}", e);
            return Err(e);
        }
        Ok(Self::ready(service, config))
    }

    fn ready(service: Service, config: ResponderConfig) -> Self {
        debug!(
            "Responder ready with {} leaves, introspection: {:?}",
            service.definition().leaf_paths().len(),
            config.introspection()
        );
        Self {
            service,
            config: Arc::new(config),
        }
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Answer one request.
    ///
    /// Never fails: protocol errors, method errors and panics inside a
    /// method all come back as error envelopes.
    pub async fn respond(&self, request: JsonRpcRequest) -> JsonRpcMessage {
        let target = match validate(
            self.service.definition(),
            &request,
            self.config.introspection(),
        ) {
            Ok(target) => target,
            Err(e) => return failure(&request, &e),
        };

        match target {
            Target::Introspection => success(&request, self.service.definition().to_value()),
            Target::Value(value) => success(&request, value.to_value()),
            Target::Callable(leaf) => self.invoke(&request, leaf).await,
        }
    }

    /// Answer one request in the background and hand the reply to `on_reply`.
    ///
    /// Returns immediately. `on_reply` runs exactly once, on the tokio
    /// runtime, whenever the method completes. Called outside a tokio
    /// runtime, nothing is invoked and `on_reply` gets an internal error
    /// right away.
    pub fn respond_with<F>(&self, request: JsonRpcRequest, on_reply: F)
    where
        F: FnOnce(JsonRpcMessage) + Send + 'static,
    {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot answer {:?} outside a tokio runtime: {}", request.method, e);
                let error = JsonRpcErrorObject::internal_error(Some(
                    "No async runtime available to run the method".to_string(),
                ));
                on_reply(failure(&request, &error));
                return;
            }
        };

        let responder = self.clone();
        runtime.spawn(async move {
            let reply = responder.respond(request).await;
            on_reply(reply);
        });
    }

    /// Answer a request given as raw JSON, replying with raw JSON
    pub async fn respond_value(&self, value: Value) -> Value {
        let reply = match request_from_value(value) {
            Ok(request) => self.respond(request).await,
            Err(e) => JsonRpcMessage::error(e),
        };
        reply.to_value()
    }

    /// Answer a request given as JSON text, replying with JSON text
    pub async fn respond_str(&self, text: &str) -> String {
        let reply = match parse_request(text) {
            Ok(request) => self.respond(request).await,
            Err(e) => JsonRpcMessage::error(e),
        };
        encode_message(&reply).unwrap_or_else(|e| {
            error!("Failed to encode reply: {}", e);
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                .to_string()
        })
    }

    async fn invoke(&self, request: &JsonRpcRequest, leaf: &CallableLeaf) -> JsonRpcMessage {
        let path = request.method_str().unwrap_or_default();

        let args = match map_parameters(request.params.as_ref(), leaf.params()) {
            Ok(args) => Arguments::from(args),
            Err(e) => {
                debug!("Rejecting params for '{}': {:?}", path, request.params);
                return failure(request, &e);
            }
        };

        debug!("Invoking '{}' with {} arguments", path, args.len());
        let call = AssertUnwindSafe(async { leaf.method().call(args).await }).catch_unwind();

        match call.await {
            Ok(Ok(result)) => success(request, result),
            Ok(Err(e)) => {
                debug!("Method '{}' failed: {}", path, e);
                failure(request, &e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Method '{}' panicked: {}", path, message);
                failure(
                    request,
                    &JsonRpcErrorObject::internal_error(Some(format!(
                        "Method '{}' panicked: {}",
                        path, message
                    ))),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MethodError;
    use crate::method::Completion;
    use crate::types::RequestId;
    use serde_json::json;
    use tokio::sync::oneshot;
    use tracing_test::traced_test;

    fn responder() -> Responder {
        let service = Service::builder()
            .method("add", ["a", "b"], |args: Arguments| async move {
                let a: i64 = args.required(0)?;
                let b: i64 = args.required(1)?;
                Ok::<_, MethodError>(a + b)
            })
            .method("count", ["a", "b", "c"], |args: Arguments| async move {
                Ok::<_, MethodError>(args.len())
            })
            .method("fail", Vec::<String>::new(), |_args: Arguments| async {
                Err::<Value, _>(MethodError::application(-32050, "nope"))
            })
            .method("explode", Vec::<String>::new(), |_args: Arguments| async {
                if true {
                    panic!("kaboom");
                }
                Ok::<Value, MethodError>(Value::Null)
            })
            .callback("later", ["x"], |args: Arguments, done: Completion| {
                tokio::spawn(async move {
                    done.complete(args.required::<String>(0));
                });
            })
            .value("num", 7)
            .build()
            .unwrap();
        Responder::new(service)
    }

    #[tokio::test]
    async fn test_positional_and_named_calls_agree() {
        let responder = responder();

        let positional = responder
            .respond(JsonRpcRequest::new_with_array_params(1, "add", vec![json!(2), json!(3)]))
            .await;
        let named = responder
            .respond_value(json!({"jsonrpc": "2.0", "id": 1, "method": "add", "params": {"b": 3, "a": 2}}))
            .await;

        assert_eq!(positional.result(), Some(&json!(5)));
        assert_eq!(named, json!({"jsonrpc": "2.0", "id": 1, "result": 5}));
    }

    #[tokio::test]
    async fn test_missing_named_params_shorten_arguments() {
        let reply = responder()
            .respond_value(json!({"jsonrpc": "2.0", "id": 2, "method": "count", "params": {"c": 1}}))
            .await;
        assert_eq!(reply["result"], json!(1));
    }

    #[tokio::test]
    async fn test_scalar_params_are_invalid_request() {
        let reply = responder()
            .respond_value(json!({"jsonrpc": "2.0", "id": 3, "method": "add", "params": 5}))
            .await;
        assert_eq!(reply["error"]["code"], json!(-32600));
        assert_eq!(reply["id"], json!(3));
    }

    #[tokio::test]
    async fn test_application_error_is_serialized() {
        let reply = responder()
            .respond(JsonRpcRequest::new_no_params("f", "fail"))
            .await;
        let error = reply.error_object().unwrap();
        assert_eq!(error.code, -32050);
        assert_eq!(error.message, "nope");
        assert_eq!(reply.id(), &RequestId::from("f"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_panicking_method_becomes_internal_error() {
        let reply = responder()
            .respond(JsonRpcRequest::new_no_params(9, "explode"))
            .await;

        let error = reply.error_object().unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("kaboom"));
        assert!(logs_contain("Method 'explode' panicked"));
    }

    #[tokio::test]
    async fn test_callback_method_reply() {
        let reply = responder()
            .respond_value(json!({"jsonrpc": "2.0", "id": 4, "method": "later", "params": ["d"]}))
            .await;
        assert_eq!(reply["result"], json!("d"));
    }

    #[tokio::test]
    async fn test_respond_with_delivers_once() {
        let (sender, receiver) = oneshot::channel();
        responder().respond_with(
            JsonRpcRequest::new_with_array_params(5, "add", vec![json!(1), json!(1)]),
            move |reply| {
                let _ = sender.send(reply);
            },
        );

        let reply = receiver.await.unwrap();
        assert_eq!(reply.result(), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_introspection_can_be_renamed_or_disabled() {
        let service = responder().service().clone();

        let renamed = Responder::with_config(
            service.clone(),
            ResponderConfig::default().with_introspection_method("@describe"),
        )
        .unwrap();
        let reply = renamed
            .respond(JsonRpcRequest::new_no_params(1, "@describe"))
            .await;
        assert_eq!(reply.result().unwrap()["num"], json!({"type": "value", "value": 7}));

        let disabled =
            Responder::with_config(service, ResponderConfig::default().with_introspection(false))
                .unwrap();
        let reply = disabled
            .respond(JsonRpcRequest::new_no_params(1, "@definition"))
            .await;
        assert_eq!(reply.error_object().unwrap().code, -32601);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unreserved_introspection_name_cannot_hide_a_method() {
        let service = Service::builder()
            .method("describe", Vec::<String>::new(), |_args: Arguments| async {
                Ok::<_, MethodError>("the real describe")
            })
            .build()
            .unwrap();

        let refused = Responder::with_config(
            service.clone(),
            ResponderConfig::default().with_introspection_method("describe"),
        );
        assert!(matches!(refused, Err(ConfigError::UnreservedIntrospectionName(_))));
        assert!(logs_contain("Refusing responder configuration"));

        let reply = Responder::new(service)
            .respond(JsonRpcRequest::new_no_params(1, "describe"))
            .await;
        assert_eq!(reply.result(), Some(&json!("the real describe")));
    }

    #[tokio::test]
    async fn test_declared_tuple_parameter_keeps_following_names() {
        let service = Service::builder()
            .declare("f", "fn f(p: (u8, u8), q: u8)", |args: Arguments| async move {
                Ok::<_, MethodError>(Value::Array(args.into_vec()))
            })
            .build()
            .unwrap();

        let reply = Responder::new(service)
            .respond_value(json!({"jsonrpc": "2.0", "id": 1, "method": "f", "params": {"p": [1, 2], "q": 9}}))
            .await;
        assert_eq!(reply["result"], json!([[1, 2], 9]));
    }

    #[test]
    #[traced_test]
    fn test_respond_with_outside_runtime_replies_internal_error() {
        let (sender, receiver) = std::sync::mpsc::channel();
        responder().respond_with(JsonRpcRequest::new_no_params(6, "num"), move |reply| {
            let _ = sender.send(reply);
        });

        let reply = receiver.try_recv().unwrap();
        assert_eq!(reply.error_object().unwrap().code, -32603);
        assert_eq!(reply.id(), &RequestId::from(6));
        assert!(logs_contain("outside a tokio runtime"));
    }

    #[tokio::test]
    async fn test_respond_str() {
        let responder = responder();

        let ok = responder
            .respond_str(r#"{"jsonrpc":"2.0","id":1,"method":"num"}"#)
            .await;
        assert_eq!(ok, r#"{"jsonrpc":"2.0","id":1,"result":7}"#);

        let parse_error: Value =
            serde_json::from_str(&responder.respond_str("{not json").await).unwrap();
        assert_eq!(parse_error["error"]["code"], json!(-32700));
        assert_eq!(parse_error["id"], Value::Null);
    }
}
