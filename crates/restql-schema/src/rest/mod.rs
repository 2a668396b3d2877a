//! REST exposure: the tree of `@rest` fields and the routes compiled from it.

mod routes;
mod tree;

pub use routes::{ChainLink, RequestParams, RestRoute, RouteHandler, compile_routes};
pub use tree::{ArgumentSource, NodeId, NodeKey, RestArgument, RestNode, RestTree};
