//! Field resolvers shared by the REST routes and the GraphQL endpoint.
//!
//! A resolver is keyed by `(type name, field name)` and receives the value
//! resolved for its parent (absent at the query root) together with the
//! field's arguments. The same [`ResolverTable`] backs both surfaces.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use restql_api::ResolverError;
use serde_json::Value;

/// Result of invoking a resolver.
pub type ResolverResult = Result<Value, ResolverError>;

/// Inputs of a single resolver invocation.
#[derive(Debug, Clone, Copy)]
pub struct ResolveParams<'a> {
    /// Value produced by the parent resolver, `None` at the query root.
    pub source: Option<&'a Value>,
    pub args: &'a ResolverArgs,
}

impl<'a> ResolveParams<'a> {
    /// Reads a string property of the source value.
    pub fn source_str(&self, key: &str) -> Option<&'a str> {
        self.source?.get(key)?.as_str()
    }
}

/// Arguments passed to a resolver, in declaration order.
///
/// REST routes bind every argument as a string; the GraphQL endpoint passes
/// the typed input values through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs(IndexMap<String, Value>);

impl ResolverArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the argument as a string slice if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for ResolverArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

type ResolverFn = dyn Fn(ResolveParams<'_>) -> ResolverResult + Send + Sync;

/// A shareable, synchronous field resolver.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);

impl Resolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ResolveParams<'_>) -> ResolverResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A resolver returning the property `key` of the source value, or null.
    pub fn source_field(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(move |params| {
            Ok(params
                .source
                .and_then(|source| source.get(&key))
                .cloned()
                .unwrap_or(Value::Null))
        })
    }

    pub fn call(&self, params: ResolveParams<'_>) -> ResolverResult {
        (self.0)(params)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Immutable mapping from `(type name, field name)` to a resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolverTable {
    resolvers: HashMap<String, HashMap<String, Resolver>>,
}

impl ResolverTable {
    pub fn builder() -> ResolverTableBuilder {
        ResolverTableBuilder::default()
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&Resolver> {
        self.resolvers.get(type_name)?.get(field_name)
    }

    /// Total number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for [`ResolverTable`].
#[derive(Debug, Default)]
pub struct ResolverTableBuilder {
    resolvers: HashMap<String, HashMap<String, Resolver>>,
}

impl ResolverTableBuilder {
    /// Registers a resolver closure, replacing any earlier registration.
    pub fn field<F>(self, type_name: impl Into<String>, field_name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ResolveParams<'_>) -> ResolverResult + Send + Sync + 'static,
    {
        self.resolver(type_name, field_name, Resolver::new(f))
    }

    pub fn resolver(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: Resolver,
    ) -> Self {
        self.resolvers
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), resolver);
        self
    }

    /// Registers a resolver that copies the property `key` of the source value.
    pub fn source_field(
        self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.resolver(type_name, field_name, Resolver::source_field(key))
    }

    pub fn build(self) -> ResolverTable {
        ResolverTable {
            resolvers: self.resolvers,
        }
    }
}
