use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, options},
};
use restql_schema::{CompiledApi, ResolverTable, compile};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::graphql::{GraphQLState, graphql_handler, graphql_handler_get};
use crate::{demo, handlers};

pub struct RestqlServer {
    addr: SocketAddr,
    app: Router,
}

const HEALTHZ_PATH: &str = "/healthz";

/// Builds the router serving every compiled REST route and, when enabled,
/// the GraphQL endpoint.
///
/// Fails when a REST route lands on `/healthz` or on the GraphQL path.
pub fn build_app(cfg: &AppConfig, api: &CompiledApi) -> anyhow::Result<Router> {
    let mut reserved = vec![HEALTHZ_PATH];
    if cfg.graphql.enabled {
        reserved.push(cfg.graphql.path.as_str());
    }

    let mut router = Router::new().route(HEALTHZ_PATH, get(handlers::healthz));

    for route in &api.routes {
        let path = route.axum_path();
        if reserved.contains(&path.as_str()) {
            let field = route
                .key()
                .map(|key| key.to_string())
                .unwrap_or_else(|| route.path.clone());
            anyhow::bail!("REST field {field} maps to reserved path '{path}'");
        }

        let handler = route.handler.clone();
        router = router.route(
            &path,
            get(move |path, query| handlers::rest_route(handler.clone(), path, query)),
        );
        tracing::debug!(path = %route.path, "Mounted REST route");
    }

    if cfg.graphql.enabled {
        let schema = api
            .graph
            .executable_schema(&cfg.graphql.to_executable_config())
            .context("failed to build GraphQL schema")?;
        router = router.merge(
            Router::new()
                .route(
                    &cfg.graphql.path,
                    get(graphql_handler_get).post(graphql_handler),
                )
                .with_state(GraphQLState { schema }),
        );
        tracing::debug!(path = %cfg.graphql.path, "Mounted GraphQL endpoint");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("w-token"),
            HeaderName::from_static("w-userid"),
        ]);

    let router = router.fallback(handlers::not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(CompressionLayer::new())
            .layer(axum::extract::DefaultBodyLimit::max(
                cfg.server.body_limit_bytes,
            )),
    );

    // Mounted after the CORS layer, which answers every OPTIONS request
    // as a preflight.
    Ok(router.route("/", options(handlers::hello)))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    schema_text: Option<String>,
    resolvers: ResolverTable,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            schema_text: None,
            resolvers: demo::resolvers(),
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_schema(mut self, schema_text: impl Into<String>) -> Self {
        self.schema_text = Some(schema_text.into());
        self
    }

    pub fn with_resolvers(mut self, resolvers: ResolverTable) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Compiles the schema and builds the router.
    ///
    /// Without an explicit schema the file at `schema.path` is read.
    pub fn build(self) -> anyhow::Result<RestqlServer> {
        let schema_text = match self.schema_text {
            Some(text) => text,
            None => std::fs::read_to_string(&self.config.schema.path).with_context(|| {
                format!("failed to read schema file '{}'", self.config.schema.path)
            })?,
        };

        let api = compile(&schema_text, &self.resolvers).context("failed to compile schema")?;
        let app = build_app(&self.config, &api)?;

        Ok(RestqlServer {
            addr: self.addr,
            app,
        })
    }
}

impl RestqlServer {
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(cfg: &AppConfig) -> Router {
        let api = compile(demo::SCHEMA, &demo::resolvers()).unwrap();
        build_app(cfg, &api).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_options_root_says_hello() {
        let request = Request::options("/").body(Body::empty()).unwrap();
        let (status, body) = send(app(&AppConfig::default()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Hello!");
    }

    #[tokio::test]
    async fn test_nested_rest_route() {
        let request = Request::get("/account/123/plan").body(Body::empty()).unwrap();
        let (status, body) = send(app(&AppConfig::default()), request).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"data": {"id": "1", "name": "Basic (20 Employees)"}}));
    }

    #[tokio::test]
    async fn test_graphql_can_be_disabled() {
        let mut cfg = AppConfig::default();
        cfg.graphql.enabled = false;
        let request = Request::get("/graphql?query=%7B__typename%7D")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(&cfg), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_graphql_path_is_configurable() {
        let mut cfg = AppConfig::default();
        cfg.graphql.path = "/gql".into();
        let request = Request::post("/gql")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query": "{ plan: account(id: \"234\") { plan { name } } }"}"#))
            .unwrap();
        let (status, body) = send(app(&cfg), request).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"]["plan"]["plan"]["name"], "Standard (30 Employees)");
    }

    #[tokio::test]
    async fn test_cors_preflight_still_answered_on_rest_routes() {
        let request = Request::options("/person/1/users")
            .header("origin", "http://example.com")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = app(&AppConfig::default()).oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    fn compile_only(sdl: &str) -> CompiledApi {
        let resolvers = ResolverTable::builder()
            .field("Query", "healthz", |_| Ok(json!("up")))
            .field("Query", "graphql", |_| Ok(json!("gql")))
            .build();
        compile(sdl, &resolvers).unwrap()
    }

    #[test]
    fn test_rest_field_on_healthz_path_is_rejected() {
        let api = compile_only("schema { query: Query } type Query { healthz: String @rest }");
        let err = build_app(&AppConfig::default(), &api).err().unwrap();
        assert_eq!(
            err.to_string(),
            "REST field Query.healthz maps to reserved path '/healthz'"
        );
    }

    #[test]
    fn test_rest_field_on_graphql_path_is_rejected_only_when_enabled() {
        let sdl = "schema { query: Query } type Query { graphql: String @rest }";
        let err = build_app(&AppConfig::default(), &compile_only(sdl))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Query.graphql"));

        let mut cfg = AppConfig::default();
        cfg.graphql.enabled = false;
        assert!(build_app(&cfg, &compile_only(sdl)).is_ok());
    }

    #[test]
    fn test_builder_reports_missing_schema_file() {
        let mut cfg = AppConfig::default();
        cfg.schema.path = "/nonexistent/schema.graphql".into();
        let err = ServerBuilder::new().with_config(cfg).build().err().unwrap();
        assert!(err.to_string().contains("failed to read schema file"));
    }
}
