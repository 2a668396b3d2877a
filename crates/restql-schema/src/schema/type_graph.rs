//! Type graph construction.
//!
//! The graph is built in two passes over the [`SchemaModel`]:
//! 1. every object, scalar and enum gets an empty named placeholder, so that
//!    any type name can be referenced regardless of declaration order;
//! 2. every object receives its fields, with argument types resolved against
//!    the graph and the field's resolver bound from the [`ResolverTable`].

use std::fmt;

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::ConfigurationError;
use crate::model::{FieldDecl, SchemaModel};
use crate::resolvers::{Resolver, ResolverTable};

/// Scalars every schema knows about without declaring them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinScalar {
    Int,
    Float,
    String,
    Boolean,
    Id,
}

impl BuiltinScalar {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "String" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "ID" => Some(Self::Id),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
        }
    }
}

/// A resolved reference to a type, possibly wrapped in list / non-null modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Builtin(BuiltinScalar),
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Name of the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Builtin(scalar) => scalar.name(),
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(scalar) => f.write_str(scalar.name()),
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphArgument {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

#[derive(Debug, Clone)]
pub struct GraphField {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: Vec<GraphArgument>,
    pub resolver: Resolver,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, GraphField>,
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum GraphType {
    Object(ObjectType),
    Scalar(ScalarType),
    Enum(EnumType),
}

impl GraphType {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(object) => &object.name,
            Self::Scalar(scalar) => &scalar.name,
            Self::Enum(enum_type) => &enum_type.name,
        }
    }
}

/// The complete, resolver-bound type graph of a schema.
#[derive(Debug, Clone)]
pub struct TypeGraph {
    pub(crate) types: IndexMap<String, GraphType>,
    pub(crate) query_type: Option<String>,
    pub(crate) mutation_type: Option<String>,
}

impl TypeGraph {
    /// Builds the graph and binds every field to its resolver.
    ///
    /// # Errors
    ///
    /// Fails when a field has no resolver, when a type reference names an
    /// undeclared type, or when a root type is not a declared object.
    pub fn build(model: &SchemaModel, resolvers: &ResolverTable) -> Result<Self, ConfigurationError> {
        let mut types = IndexMap::new();

        // Pass 1: placeholders.
        for object in model.objects.values() {
            types.insert(
                object.name.clone(),
                GraphType::Object(ObjectType {
                    name: object.name.clone(),
                    description: object.description.clone(),
                    fields: IndexMap::new(),
                }),
            );
        }
        for scalar in model.scalars.values() {
            types.insert(
                scalar.name.clone(),
                GraphType::Scalar(ScalarType {
                    name: scalar.name.clone(),
                    description: scalar.description.clone(),
                }),
            );
        }
        for enum_decl in model.enums.values() {
            types.insert(
                enum_decl.name.clone(),
                GraphType::Enum(EnumType {
                    name: enum_decl.name.clone(),
                    description: enum_decl.description.clone(),
                    values: enum_decl.values.clone(),
                }),
            );
        }

        // Pass 2: fields, arguments and resolvers.
        for object in model.objects.values() {
            let mut fields = IndexMap::with_capacity(object.fields.len());
            for field in object.fields.values() {
                let graph_field = build_field(&object.name, field, &types, resolvers)?;
                trace!(type_name = %object.name, field = %field.name, ty = %graph_field.ty, "Attached field");
                fields.insert(field.name.clone(), graph_field);
            }
            if let Some(GraphType::Object(placeholder)) = types.get_mut(&object.name) {
                placeholder.fields = fields;
            }
        }

        let query_type = root_object(&types, model.root.query.as_deref(), "query")?;
        let mutation_type = root_object(&types, model.root.mutation.as_deref(), "mutation")?;

        debug!(
            types = types.len(),
            query = ?query_type,
            mutation = ?mutation_type,
            "Type graph built"
        );

        Ok(Self {
            types,
            query_type,
            mutation_type,
        })
    }

    pub fn get(&self, name: &str) -> Option<&GraphType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name)? {
            GraphType::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&GraphField> {
        self.object(type_name)?.fields.get(field_name)
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.object(self.query_type.as_deref()?)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.object(self.mutation_type.as_deref()?)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        matches!(self.types.get(name), Some(GraphType::Enum(_)))
    }

    /// All types in declaration order (objects, then scalars, then enums).
    pub fn types(&self) -> impl Iterator<Item = &GraphType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn build_field(
    type_name: &str,
    field: &FieldDecl,
    types: &IndexMap<String, GraphType>,
    resolvers: &ResolverTable,
) -> Result<GraphField, ConfigurationError> {
    let arguments = field
        .arguments
        .iter()
        .map(|argument| {
            Ok(GraphArgument {
                name: argument.name.clone(),
                description: argument.description.clone(),
                ty: resolve_type(&argument.ty, types, &|| {
                    format!("argument '{}' of {type_name}.{}", argument.name, field.name)
                })?,
                default_value: argument.default_value.clone(),
            })
        })
        .collect::<Result<Vec<_>, ConfigurationError>>()?;

    let resolver = resolvers
        .get(type_name, &field.name)
        .cloned()
        .ok_or_else(|| ConfigurationError::MissingResolver {
            type_name: type_name.to_string(),
            field_name: field.name.clone(),
        })?;

    Ok(GraphField {
        name: field.name.clone(),
        description: field.description.clone(),
        ty: resolve_type(&field.ty, types, &|| format!("field {type_name}.{}", field.name))?,
        arguments,
        resolver,
    })
}

/// Resolves a parsed type reference against the graph.
fn resolve_type(
    ty: &Type,
    types: &IndexMap<String, GraphType>,
    referenced_by: &dyn Fn() -> String,
) -> Result<TypeRef, ConfigurationError> {
    let base = match &ty.base {
        BaseType::Named(name) => {
            let name = name.as_str();
            if let Some(scalar) = BuiltinScalar::from_name(name) {
                TypeRef::Builtin(scalar)
            } else if types.contains_key(name) {
                TypeRef::Named(name.to_string())
            } else {
                return Err(ConfigurationError::UnknownType {
                    type_name: name.to_string(),
                    referenced_by: referenced_by(),
                });
            }
        }
        BaseType::List(inner) => TypeRef::List(Box::new(resolve_type(inner, types, referenced_by)?)),
    };

    Ok(if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    })
}

fn root_object(
    types: &IndexMap<String, GraphType>,
    name: Option<&str>,
    operation: &str,
) -> Result<Option<String>, ConfigurationError> {
    let Some(name) = name else {
        return Ok(None);
    };
    match types.get(name) {
        Some(GraphType::Object(_)) => Ok(Some(name.to_string())),
        _ => Err(ConfigurationError::UnknownType {
            type_name: name.to_string(),
            referenced_by: format!("the schema {operation} root"),
        }),
    }
}
