//! Service registration
//!
//! A service is described up front through a builder instead of being
//! discovered by reflection. Each registration call classifies one member as
//! a callable, a static value or a nested namespace; [`NamespaceBuilder::build`]
//! freezes the result into an immutable [`Service`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::definition::{CallableLeaf, LeafValue, MethodDefinition, Namespace};
use crate::error::{BuildError, ToJsonRpcError};
use crate::extract::extract_parameter_names;
use crate::method::{Arguments, CallbackMethod, Completion, FunctionMethod, RpcMethod};

/// Member names starting with this prefix are reserved for introspection
pub const RESERVED_PREFIX: char = '@';

/// Stateful objects that describe their own members.
///
/// Methods registered from `describe` close over the `Arc<Self>` they are
/// given, so every call runs against the object that contains it.
pub trait RpcService: Send + Sync + 'static {
    fn describe(self: Arc<Self>, namespace: NamespaceBuilder) -> NamespaceBuilder;
}

/// An immutable, registered service
#[derive(Debug, Clone, Default)]
pub struct Service {
    definition: Arc<Namespace>,
}

impl Service {
    pub fn builder() -> ServiceBuilder {
        NamespaceBuilder::new()
    }

    /// Build a static service from plain data.
    ///
    /// Leaf shapes become values and nested objects become namespaces.
    pub fn from_value(value: Value) -> Result<Self, BuildError> {
        match definition_from_value(value, "")? {
            MethodDefinition::Namespace(namespace) => Ok(Self {
                definition: Arc::new(namespace),
            }),
            _ => Err(BuildError::RootNotNamespace),
        }
    }

    /// The root of the definition tree
    pub fn definition(&self) -> &Namespace {
        &self.definition
    }
}

/// Builder for the root namespace of a service
pub type ServiceBuilder = NamespaceBuilder;

/// Builder for one namespace of a service
pub struct NamespaceBuilder {
    path: String,
    members: BTreeMap<String, MethodDefinition>,
    error: Option<BuildError>,
}

impl Default for NamespaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceBuilder {
    pub fn new() -> Self {
        Self::at(String::new())
    }

    fn at(path: String) -> Self {
        Self {
            path,
            members: BTreeMap::new(),
            error: None,
        }
    }

    /// Register an async method with explicit parameter names
    pub fn method<F, Fut, T, E, P>(self, name: impl Into<String>, params: P, handler: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: ToJsonRpcError,
    {
        let params = params.into_iter().map(Into::into).collect();
        self.handler(name, params, FunctionMethod::new(handler))
    }

    /// Register an async method whose parameter names are read from a
    /// declaration such as `"fn add(a: f64, b: f64)"`.
    ///
    /// A declaration that cannot be parsed registers the method with no
    /// parameter names; named requests then map to an empty argument list.
    pub fn declare<F, Fut, T, E>(self, name: impl Into<String>, declaration: &str, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: ToJsonRpcError,
    {
        let name = name.into();
        let params = extract_parameter_names(declaration).unwrap_or_else(|e| {
            warn!("Registering '{}' without parameter names: {}", self.qualified(&name), e);
            Vec::new()
        });
        self.handler(name, params, FunctionMethod::new(handler))
    }

    /// Register a continuation-style method that receives a [`Completion`]
    /// after its arguments
    pub fn callback<F, P>(self, name: impl Into<String>, params: P, handler: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(Arguments, Completion) + Send + Sync + 'static,
    {
        let params = params.into_iter().map(Into::into).collect();
        self.handler(name, params, CallbackMethod::new(handler))
    }

    /// Register any [`RpcMethod`] implementation
    pub fn handler<M>(self, name: impl Into<String>, params: Vec<String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        let leaf = CallableLeaf::new(params, Arc::new(method));
        self.insert(name.into(), MethodDefinition::Callable(leaf))
    }

    /// Register a static value. Objects are expanded into namespaces.
    pub fn value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let path = self.qualified(&name);
        match definition_from_value(value.into(), &path) {
            Ok(definition) => self.insert(name, definition),
            Err(e) => self.fail(e),
        }
    }

    /// Register a static date, served as an ISO-8601 string
    pub fn date(self, name: impl Into<String>, date: DateTime<Utc>) -> Self {
        self.insert(name.into(), MethodDefinition::Value(LeafValue::Date(date)))
    }

    /// Register a nested namespace
    pub fn namespace<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(NamespaceBuilder) -> NamespaceBuilder,
    {
        let name = name.into();
        let child = build(NamespaceBuilder::at(self.qualified(&name)));
        match child.finish() {
            Ok(namespace) => self.insert(name, MethodDefinition::Namespace(namespace)),
            Err(e) => self.fail(e),
        }
    }

    /// Mount a stateful object as a namespace
    pub fn service<S: RpcService>(self, name: impl Into<String>, service: Arc<S>) -> Self {
        self.namespace(name, |namespace| service.describe(namespace))
    }

    /// Freeze the registered members into a [`Service`]
    pub fn build(self) -> Result<Service, BuildError> {
        let namespace = self.finish()?;
        debug!("Built service with leaves: {:?}", namespace.leaf_paths());
        Ok(Service {
            definition: Arc::new(namespace),
        })
    }

    fn finish(self) -> Result<Namespace, BuildError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(Namespace::from_members(self.members)),
        }
    }

    fn qualified(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    fn fail(mut self, error: BuildError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    fn insert(mut self, name: String, definition: MethodDefinition) -> Self {
        if self.error.is_some() {
            return self;
        }
        let path = self.qualified(&name);
        if let Err(e) = check_member_name(&name, &path) {
            return self.fail(e);
        }
        if self.members.contains_key(&name) {
            return self.fail(BuildError::Duplicate(path));
        }
        debug!("Registered {} member: {}", definition.kind(), path);
        self.members.insert(name, definition);
        self
    }
}

fn check_member_name(name: &str, path: &str) -> Result<(), BuildError> {
    if name.is_empty() {
        return Err(BuildError::EmptyName(path.to_string()));
    }
    if name.contains('.') {
        return Err(BuildError::DottedName(path.to_string()));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(BuildError::ReservedName(path.to_string()));
    }
    Ok(())
}

/// Classify plain data: leaf shapes are values, everything else a namespace
fn definition_from_value(value: Value, path: &str) -> Result<MethodDefinition, BuildError> {
    let object = match LeafValue::classify(value) {
        Ok(leaf) => return Ok(MethodDefinition::Value(leaf)),
        Err(Value::Object(object)) => object,
        Err(_) => serde_json::Map::new(),
    };

    let mut members = BTreeMap::new();
    for (name, member) in object {
        let member_path = if path.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", path, name)
        };
        check_member_name(&name, &member_path)?;
        members.insert(name, definition_from_value(member, &member_path)?);
    }
    Ok(MethodDefinition::Namespace(Namespace::from_members(members)))
}
