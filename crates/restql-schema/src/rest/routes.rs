//! Route compilation.
//!
//! Each reachable [`RestNode`](super::RestNode) yields one GET route whose
//! handler runs the resolvers of the node's chain in root-to-leaf order,
//! feeding every resolver the value returned by the one before it.

use std::collections::HashMap;
use std::sync::Arc;

use restql_api::ResolverError;
use serde_json::Value;
use tracing::{debug, warn};

use super::tree::{ArgumentSource, NodeId, NodeKey, RestArgument, RestTree};
use crate::resolvers::{ResolveParams, Resolver, ResolverArgs};

/// One resolver step of a route's chain.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub key: NodeKey,
    pub arguments: Vec<RestArgument>,
    pub resolver: Resolver,
}

/// Raw request parameters as extracted by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub path: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl RequestParams {
    pub fn new(path: HashMap<String, String>, query: HashMap<String, String>) -> Self {
        Self { path, query }
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Value bound to `argument`; missing parameters bind the empty string.
    pub fn get(&self, argument: &RestArgument) -> &str {
        let source = match argument.source {
            ArgumentSource::Path => &self.path,
            ArgumentSource::Query => &self.query,
        };
        source.get(&argument.name).map(String::as_str).unwrap_or("")
    }
}

/// Runs a resolver chain for one request.
#[derive(Debug, Clone)]
pub struct RouteHandler {
    chain: Arc<[ChainLink]>,
}

impl RouteHandler {
    pub fn new(chain: impl Into<Arc<[ChainLink]>>) -> Self {
        Self {
            chain: chain.into(),
        }
    }

    pub fn chain(&self) -> &[ChainLink] {
        &self.chain
    }

    /// Invokes the chain in order and returns the last resolved value.
    ///
    /// The first failing resolver aborts the chain; its error is returned
    /// unchanged and no later resolver runs.
    pub fn handle(&self, params: &RequestParams) -> Result<Value, ResolverError> {
        let mut resolved: Option<Value> = None;

        for link in self.chain.iter() {
            let args: ResolverArgs = link
                .arguments
                .iter()
                .map(|argument| {
                    (
                        argument.name.clone(),
                        Value::String(params.get(argument).to_string()),
                    )
                })
                .collect();

            debug!(field = %link.key, args = args.len(), "Invoking resolver");
            let source = resolved.as_ref().filter(|value| !value.is_null());
            match link.resolver.call(ResolveParams {
                source,
                args: &args,
            }) {
                Ok(value) => resolved = Some(value),
                Err(err) => {
                    warn!(
                        field = %link.key,
                        status = err.status().as_u16(),
                        error = err.message(),
                        "Resolver chain aborted"
                    );
                    return Err(err);
                }
            }
        }

        Ok(resolved.unwrap_or(Value::Null))
    }
}

/// A compiled GET route.
#[derive(Debug, Clone)]
pub struct RestRoute {
    /// Route path in `/segment/:param` form.
    pub path: String,
    pub handler: RouteHandler,
}

impl RestRoute {
    /// The field this route serves (the last link of its chain).
    pub fn key(&self) -> Option<&NodeKey> {
        self.handler.chain().last().map(|link| &link.key)
    }

    /// The path in axum's `/segment/{param}` syntax.
    pub fn axum_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => format!("{{{name}}}"),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Compiles every reachable node of `tree` into a route, in pre-order.
pub fn compile_routes(tree: &RestTree) -> Vec<RestRoute> {
    let mut routes = Vec::with_capacity(tree.len());
    for &child in tree.root_children() {
        compile_node(tree, child, "", &[], &mut routes);
    }

    debug!(routes = routes.len(), "REST routes compiled");
    for route in &routes {
        debug!(path = %route.path, chain = route.handler.chain().len(), "Compiled route");
    }
    routes
}

fn compile_node(
    tree: &RestTree,
    id: NodeId,
    parent_path: &str,
    parent_chain: &[ChainLink],
    routes: &mut Vec<RestRoute>,
) {
    let node = tree.node(id);
    let (Some(key), Some(resolver)) = (&node.key, &node.resolver) else {
        return;
    };

    let mut path = format!("{parent_path}/{}", key.field_name);
    for argument in node.path_arguments() {
        path.push_str("/:");
        path.push_str(&argument.name);
    }

    let mut chain = parent_chain.to_vec();
    chain.push(ChainLink {
        key: key.clone(),
        arguments: node.arguments.clone(),
        resolver: resolver.clone(),
    });

    routes.push(RestRoute {
        path: path.clone(),
        handler: RouteHandler::new(chain.clone()),
    });

    for &child in &node.children {
        compile_node(tree, child, &path, &chain, routes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaModel;
    use crate::resolvers::ResolverTable;
    use crate::schema::TypeGraph;
    use restql_api::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SDL: &str = r#"
        schema { query: Query }

        type Query {
            account(id: ID! @path): Account @rest
        }

        type Account @restBase(type: "Query", query: "account") {
            id: ID
            usersByType(type: String, org: ID! @path, team: ID! @path): [String] @rest
        }
    "#;

    fn compile(resolvers: ResolverTable) -> Vec<RestRoute> {
        let model = SchemaModel::parse(SDL).unwrap();
        let graph = TypeGraph::build(&model, &resolvers).unwrap();
        compile_routes(&RestTree::build(&model, &graph).unwrap())
    }

    fn echo_resolvers() -> ResolverTable {
        ResolverTable::builder()
            .field("Query", "account", |params| {
                Ok(json!({"id": params.args.get_str("id")}))
            })
            .source_field("Account", "id", "id")
            .field("Account", "usersByType", |params| {
                Ok(json!({
                    "account": params.source_str("id"),
                    "type": params.args.get_str("type"),
                    "org": params.args.get_str("org"),
                    "team": params.args.get_str("team"),
                }))
            })
            .build()
    }

    #[test]
    fn test_paths_append_path_arguments_in_order() {
        let routes = compile(echo_resolvers());
        let paths: Vec<_> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/account/:id", "/account/:id/usersByType/:org/:team"]);
        assert_eq!(routes[1].axum_path(), "/account/{id}/usersByType/{org}/{team}");
        assert_eq!(routes[1].key(), Some(&NodeKey::new("Account", "usersByType")));
    }

    #[test]
    fn test_chain_passes_values_and_binds_strings() {
        let routes = compile(echo_resolvers());
        let params = RequestParams::default()
            .with_path("id", "a1")
            .with_path("org", "o")
            .with_path("team", "t")
            .with_query("type", "ADMIN");

        let value = routes[1].handler.handle(&params).unwrap();
        assert_eq!(
            value,
            json!({"account": "a1", "type": "ADMIN", "org": "o", "team": "t"})
        );
    }

    #[test]
    fn test_missing_parameters_bind_empty_string() {
        let routes = compile(echo_resolvers());
        let value = routes[0].handler.handle(&RequestParams::default()).unwrap();
        assert_eq!(value, json!({"id": ""}));
    }

    #[test]
    fn test_failure_aborts_remaining_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resolvers = ResolverTable::builder()
            .field("Query", "account", |_| {
                Err(ResolverError::with_status(StatusCode::FORBIDDEN, "not yours"))
            })
            .source_field("Account", "id", "id")
            .field("Account", "usersByType", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!([]))
            })
            .build();

        let routes = compile(resolvers);
        let err = routes[1]
            .handler
            .handle(&RequestParams::default())
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 403);
        assert_eq!(err.message(), "not yours");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_plain_errors_map_to_server_failure() {
        let resolvers = ResolverTable::builder()
            .field("Query", "account", |_| Err(ResolverError::new("database down")))
            .source_field("Account", "id", "id")
            .field("Account", "usersByType", |_| Ok(json!([])))
            .build();
        let routes = compile(resolvers);
        let err = routes[0]
            .handler
            .handle(&RequestParams::default())
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 500);
        assert_eq!(err.message(), "database down");
    }
}
