pub mod config;
pub mod demo;
pub mod graphql;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, SchemaConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{RestqlServer, ServerBuilder, build_app};
