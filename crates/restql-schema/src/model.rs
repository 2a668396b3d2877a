//! Schema model extraction.
//!
//! [`SchemaModel`] is a single pass over a parsed SDL document that keeps
//! the declarations the rest of the compiler cares about: object types with
//! their fields and arguments, scalars, enums and the schema's root type
//! names. All tables keep declaration order.

use async_graphql_parser::types::{
    ConstDirective, EnumType, FieldDefinition, InputValueDefinition, ObjectType, SchemaDefinition,
    ServiceDocument, Type, TypeKind, TypeSystemDefinition,
};
use async_graphql_parser::{Positioned, parse_schema};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::directives::Directives;

/// Root operation type names declared by `schema { ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRoot {
    pub query: Option<String>,
    /// Carried for the executable schema; routes are only compiled for queries.
    pub mutation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectTypeDecl {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDecl>,
    pub directives: Vec<ConstDirective>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub arguments: Vec<ArgumentDecl>,
    pub directives: Vec<ConstDirective>,
}

#[derive(Debug, Clone)]
pub struct ArgumentDecl {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
    pub directives: Vec<ConstDirective>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarTypeDecl {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTypeDecl {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

impl Directives for ObjectTypeDecl {
    fn directives(&self) -> &[ConstDirective] {
        &self.directives
    }
}

impl Directives for FieldDecl {
    fn directives(&self) -> &[ConstDirective] {
        &self.directives
    }
}

impl Directives for ArgumentDecl {
    fn directives(&self) -> &[ConstDirective] {
        &self.directives
    }
}

/// Lookup tables extracted from a schema document.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    pub root: SchemaRoot,
    pub objects: IndexMap<String, ObjectTypeDecl>,
    pub scalars: IndexMap<String, ScalarTypeDecl>,
    pub enums: IndexMap<String, EnumTypeDecl>,
}

impl SchemaModel {
    /// Parses SDL text and extracts the model from it.
    pub fn parse(sdl: &str) -> Result<Self, async_graphql_parser::Error> {
        Ok(Self::from_document(parse_schema(sdl)?))
    }

    /// Extracts the model from an already parsed document.
    ///
    /// Interfaces, unions, input objects, directive definitions and type
    /// extensions are skipped. A repeated type name replaces the earlier
    /// declaration.
    pub fn from_document(document: ServiceDocument) -> Self {
        let mut model = Self::default();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => model.add_schema(schema.node),
                TypeSystemDefinition::Type(ty) => {
                    let ty = ty.node;
                    if ty.extend {
                        continue;
                    }
                    let name = ty.name.node.to_string();
                    let description = ty.description.map(|d| d.node);

                    match ty.kind {
                        TypeKind::Object(object) => {
                            let decl = object_decl(name.clone(), description, ty.directives, object);
                            model.objects.insert(name, decl);
                        }
                        TypeKind::Scalar => {
                            model.scalars.insert(
                                name.clone(),
                                ScalarTypeDecl { name, description },
                            );
                        }
                        TypeKind::Enum(enum_type) => {
                            let decl = enum_decl(name.clone(), description, enum_type);
                            model.enums.insert(name, decl);
                        }
                        TypeKind::Interface(_) | TypeKind::Union(_) | TypeKind::InputObject(_) => {}
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        model
    }

    fn add_schema(&mut self, schema: SchemaDefinition) {
        if let Some(query) = schema.query {
            self.root.query = Some(query.node.to_string());
        }
        if let Some(mutation) = schema.mutation {
            self.root.mutation = Some(mutation.node.to_string());
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectTypeDecl> {
        self.objects.get(name)
    }

    /// Looks up a field declaration by owning type and field name.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDecl> {
        self.objects.get(type_name)?.fields.get(field_name)
    }

    /// The declared query root type, if the schema names one and it is an object.
    pub fn query_type(&self) -> Option<&ObjectTypeDecl> {
        self.objects.get(self.root.query.as_deref()?)
    }

    /// Whether `name` is declared as an object, scalar or enum.
    pub fn declares(&self, name: &str) -> bool {
        self.objects.contains_key(name)
            || self.scalars.contains_key(name)
            || self.enums.contains_key(name)
    }
}

fn strip_directives(directives: Vec<Positioned<ConstDirective>>) -> Vec<ConstDirective> {
    directives.into_iter().map(|d| d.node).collect()
}

fn object_decl(
    name: String,
    description: Option<String>,
    directives: Vec<Positioned<ConstDirective>>,
    object: ObjectType,
) -> ObjectTypeDecl {
    let fields = object
        .fields
        .into_iter()
        .map(|field| {
            let field = field_decl(field.node);
            (field.name.clone(), field)
        })
        .collect();

    ObjectTypeDecl {
        name,
        description,
        fields,
        directives: strip_directives(directives),
    }
}

fn field_decl(field: FieldDefinition) -> FieldDecl {
    FieldDecl {
        name: field.name.node.to_string(),
        description: field.description.map(|d| d.node),
        ty: field.ty.node,
        arguments: field
            .arguments
            .into_iter()
            .map(|argument| argument_decl(argument.node))
            .collect(),
        directives: strip_directives(field.directives),
    }
}

fn argument_decl(argument: InputValueDefinition) -> ArgumentDecl {
    ArgumentDecl {
        name: argument.name.node.to_string(),
        description: argument.description.map(|d| d.node),
        ty: argument.ty.node,
        default_value: argument.default_value.map(|v| v.node),
        directives: strip_directives(argument.directives),
    }
}

fn enum_decl(name: String, description: Option<String>, enum_type: EnumType) -> EnumTypeDecl {
    EnumTypeDecl {
        name,
        description,
        values: enum_type
            .values
            .into_iter()
            .map(|value| value.node.value.node.to_string())
            .collect(),
    }
}
