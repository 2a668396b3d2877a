//! Conversion of the [`TypeGraph`] into an executable GraphQL schema.
//!
//! Resolved values travel between fields as owned `serde_json::Value`s
//! (`FieldValue::owned_any`), so a child resolver sees exactly the value its
//! parent resolver returned, just like a REST chain does. Leaf values are
//! converted to GraphQL values at the end.

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, Scalar,
    Schema, TypeRef as DynTypeRef,
};
use async_graphql::{ErrorExtensions, Name, Value as GqlValue};
use restql_api::ResolverError;
use serde_json::Value;
use tracing::debug;

use super::type_graph::{GraphField, GraphType, TypeGraph, TypeRef};
use crate::error::ConfigurationError;
use crate::resolvers::{ResolveParams, Resolver, ResolverArgs};

/// Limits applied to the executable schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableSchemaConfig {
    pub max_depth: usize,
    pub max_complexity: usize,
    pub introspection_enabled: bool,
}

impl Default for ExecutableSchemaConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// How a field's resolved JSON value is handed to the GraphQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    /// Object values stay JSON and become the source of nested fields.
    Object,
    Enum,
    Scalar,
}

impl TypeGraph {
    /// Builds an executable schema serving the graph's types and resolvers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingQueryRoot`] when the schema
    /// declares no query root, or [`ConfigurationError::ExecutableSchema`]
    /// when the engine rejects the generated schema.
    pub fn executable_schema(
        &self,
        config: &ExecutableSchemaConfig,
    ) -> Result<Schema, ConfigurationError> {
        let query = self
            .query_type
            .as_deref()
            .ok_or(ConfigurationError::MissingQueryRoot)?;

        let mut builder = Schema::build(query, self.mutation_type.as_deref(), None);

        for ty in self.types() {
            builder = match ty {
                GraphType::Object(object) => {
                    let mut dyn_object = Object::new(&object.name);
                    if let Some(description) = &object.description {
                        dyn_object = dyn_object.description(description);
                    }
                    for field in object.fields.values() {
                        dyn_object = dyn_object.field(self.dynamic_field(field));
                    }
                    builder.register(dyn_object)
                }
                GraphType::Scalar(scalar) => {
                    let mut dyn_scalar = Scalar::new(&scalar.name);
                    if let Some(description) = &scalar.description {
                        dyn_scalar = dyn_scalar.description(description);
                    }
                    builder.register(dyn_scalar)
                }
                GraphType::Enum(enum_type) => {
                    let mut dyn_enum = Enum::new(&enum_type.name)
                        .items(enum_type.values.iter().map(EnumItem::new));
                    if let Some(description) = &enum_type.description {
                        dyn_enum = dyn_enum.description(description);
                    }
                    builder.register(dyn_enum)
                }
            };
        }

        builder = builder
            .limit_depth(config.max_depth)
            .limit_complexity(config.max_complexity);
        if !config.introspection_enabled {
            builder = builder.disable_introspection();
        }

        let schema = builder
            .finish()
            .map_err(|e| ConfigurationError::ExecutableSchema(e.to_string()))?;

        debug!(query, mutation = ?self.mutation_type, "Executable schema built");
        Ok(schema)
    }

    fn output_kind(&self, ty: &TypeRef) -> OutputKind {
        match self.get(ty.named_type()) {
            Some(GraphType::Object(_)) => OutputKind::Object,
            Some(GraphType::Enum(_)) => OutputKind::Enum,
            _ => OutputKind::Scalar,
        }
    }

    fn dynamic_field(&self, field: &GraphField) -> Field {
        let resolver = field.resolver.clone();
        let kind = self.output_kind(&field.ty);

        let mut dyn_field = Field::new(&field.name, dynamic_type_ref(&field.ty), move |ctx| {
            let resolver = resolver.clone();
            FieldFuture::new(async move { resolve_field(&resolver, &ctx, kind) })
        });
        if let Some(description) = &field.description {
            dyn_field = dyn_field.description(description);
        }

        for argument in &field.arguments {
            let mut input = InputValue::new(&argument.name, dynamic_type_ref(&argument.ty));
            if let Some(description) = &argument.description {
                input = input.description(description);
            }
            if let Some(default) = &argument.default_value {
                input = input.default_value(default.clone());
            }
            dyn_field = dyn_field.argument(input);
        }

        dyn_field
    }
}

fn resolve_field<'a>(
    resolver: &Resolver,
    ctx: &ResolverContext<'a>,
    kind: OutputKind,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    // The query root has no source value.
    let source = ctx
        .parent_value
        .downcast_ref::<Value>()
        .filter(|value| !value.is_null());

    let mut args = ResolverArgs::new();
    for (name, value) in ctx.args.iter() {
        args.insert(name.as_str(), value.as_value().clone().into_json()?);
    }

    let value = resolver
        .call(ResolveParams {
            source,
            args: &args,
        })
        .map_err(to_graphql_error)?;

    Ok(to_field_value(value, kind))
}

/// Maps a resolver failure onto a GraphQL error with a `status` extension.
fn to_graphql_error(err: ResolverError) -> async_graphql::Error {
    let status = err.status().as_u16();
    async_graphql::Error::new(err.message()).extend_with(|_, ext| ext.set("status", status))
}

fn to_field_value<'a>(value: Value, kind: OutputKind) -> Option<FieldValue<'a>> {
    match (value, kind) {
        (Value::Null, _) => None,
        (Value::Array(items), _) => Some(FieldValue::list(
            items
                .into_iter()
                .map(|item| to_field_value(item, kind).unwrap_or(FieldValue::NULL)),
        )),
        (value, OutputKind::Object) => Some(FieldValue::owned_any(value)),
        (value, kind) => Some(FieldValue::value(json_to_graphql_value(
            value,
            kind == OutputKind::Enum,
        ))),
    }
}

/// Converts JSON into a GraphQL value. With `as_enum`, strings become enum values.
fn json_to_graphql_value(json: Value, as_enum: bool) -> GqlValue {
    match json {
        Value::Null => GqlValue::Null,
        Value::Bool(b) => GqlValue::Boolean(b),
        Value::Number(n) => GqlValue::Number(n),
        Value::String(s) if as_enum => GqlValue::Enum(Name::new(s)),
        Value::String(s) => GqlValue::String(s),
        Value::Array(arr) => GqlValue::List(
            arr.into_iter()
                .map(|item| json_to_graphql_value(item, as_enum))
                .collect(),
        ),
        Value::Object(obj) => GqlValue::Object(
            obj.into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v, false)))
                .collect(),
        ),
    }
}

fn dynamic_type_ref(ty: &TypeRef) -> DynTypeRef {
    match ty {
        TypeRef::Builtin(scalar) => DynTypeRef::Named(scalar.name().into()),
        TypeRef::Named(name) => DynTypeRef::Named(name.clone().into()),
        TypeRef::List(inner) => DynTypeRef::List(Box::new(dynamic_type_ref(inner))),
        TypeRef::NonNull(inner) => DynTypeRef::NonNull(Box::new(dynamic_type_ref(inner))),
    }
}
