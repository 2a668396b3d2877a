//! # restql-schema
//!
//! Compiles a GraphQL SDL document annotated with RestQL directives into a
//! resolver-bound type graph and a set of REST routes.
//!
//! ## Overview
//!
//! A single schema and a single [`ResolverTable`] describe two surfaces:
//!
//! - a GraphQL endpoint, served from the executable schema built by
//!   [`TypeGraph::executable_schema`]
//! - a tree of GET routes, one per field marked `@rest`, nested according to
//!   the `@restBase` links of the owning types
//!
//! ```graphql
//! schema { query: Query }
//!
//! type Query {
//!     person(id: ID! @path): Person @rest
//! }
//!
//! type Person @restBase(type: "Query", query: "person") {
//!     id: ID!
//!     users: [User!]! @rest
//! }
//! ```
//!
//! compiles into `/person/:id` and `/person/:id/users`. A request to the
//! second route resolves `Query.person` with `id` taken from the path, then
//! resolves `Person.users` with the person as its source.
//!
//! ## Compilation
//!
//! [`compile`] runs every step once, at startup:
//! 1. parse the SDL and extract the [`SchemaModel`]
//! 2. build the [`TypeGraph`], binding every field to its resolver
//! 3. build the [`RestTree`] from the `@rest` / `@restBase` directives
//! 4. compile the tree into [`RestRoute`]s
//!
//! Any [`ConfigurationError`] is fatal; nothing is served from a partially
//! compiled schema.
//!
//! ## Modules
//!
//! - [`config`] - GraphQL endpoint configuration
//! - [`directives`] - Directive names and accessors
//! - [`model`] - Schema model extraction
//! - [`resolvers`] - Resolver table
//! - [`schema`] - Type graph and executable schema
//! - [`rest`] - REST tree and route compilation
//! - [`error`] - Error types

pub mod config;
pub mod directives;
pub mod error;
pub mod model;
pub mod resolvers;
pub mod rest;
pub mod schema;

pub use config::GraphQLConfig;
pub use error::{ConfigurationError, SchemaError};
pub use model::SchemaModel;
pub use resolvers::{ResolveParams, Resolver, ResolverArgs, ResolverResult, ResolverTable};
pub use rest::{RequestParams, RestRoute, RestTree, RouteHandler, compile_routes};
pub use schema::{ExecutableSchemaConfig, TypeGraph};

use tracing::info;

/// Result type for schema compilation.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Everything compiled from one schema document.
#[derive(Debug, Clone)]
pub struct CompiledApi {
    pub graph: TypeGraph,
    pub tree: RestTree,
    pub routes: Vec<RestRoute>,
}

impl CompiledApi {
    /// Finds a compiled route by its `/segment/:param` path.
    pub fn route(&self, path: &str) -> Option<&RestRoute> {
        self.routes.iter().find(|route| route.path == path)
    }
}

/// Compiles `schema_text` against `resolvers`.
///
/// # Errors
///
/// Returns [`SchemaError::Parse`] for invalid SDL and
/// [`SchemaError::Configuration`] for any misuse of the schema.
pub fn compile(schema_text: &str, resolvers: &ResolverTable) -> Result<CompiledApi> {
    let model = SchemaModel::parse(schema_text)?;
    let graph = TypeGraph::build(&model, resolvers)?;
    let tree = RestTree::build(&model, &graph)?;
    let routes = compile_routes(&tree);

    info!(
        types = graph.len(),
        rest_fields = tree.len(),
        routes = routes.len(),
        "Schema compiled"
    );

    Ok(CompiledApi {
        graph,
        tree,
        routes,
    })
}
