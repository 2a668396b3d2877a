//! Type graph building and its executable GraphQL form.
//!
//! - [`TypeGraph`] - the resolver-bound graph of object, scalar and enum types
//! - [`ExecutableSchemaConfig`] - limits for the executable schema built from it

mod executable;
mod type_graph;

pub use executable::ExecutableSchemaConfig;
pub use type_graph::{
    BuiltinScalar, EnumType, GraphArgument, GraphField, GraphType, ObjectType, ScalarType,
    TypeGraph, TypeRef,
};
