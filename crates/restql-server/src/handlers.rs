use axum::{
    Json,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use restql_api::{ApiResponse, ResolverError};
use restql_schema::{RequestParams, RouteHandler};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

/// `OPTIONS /` probe.
pub async fn hello() -> impl IntoResponse {
    (StatusCode::OK, "Hello!")
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Serves one compiled REST route.
///
/// The resolver chain is synchronous and may block, so it runs on the
/// blocking pool.
pub async fn rest_route(
    handler: RouteHandler,
    path: Option<Path<HashMap<String, String>>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = path.map(|Path(path)| path).unwrap_or_default();
    let params = RequestParams::new(path, query);

    match tokio::task::spawn_blocking(move || handler.handle(&params)).await {
        Ok(Ok(value)) => ApiResponse::new(value).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(join_err) => {
            tracing::error!(error = %join_err, "Resolver chain did not complete");
            ResolverError::new("resolver chain did not complete").into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    ResolverError::not_found("no route matches the request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use restql_schema::{ResolverTable, compile};
    use serde_json::{Value, json};

    const SDL: &str = r#"
        schema { query: Query }
        type Query { echo(id: ID! @path, tag: String): String @rest }
    "#;

    fn echo_handler() -> RouteHandler {
        let resolvers = ResolverTable::builder()
            .field("Query", "echo", |p| {
                let id = p.args.get_str("id").unwrap_or_default();
                if id == "teapot" {
                    return Err(ResolverError::with_status(
                        StatusCode::IM_A_TEAPOT,
                        "short and stout",
                    ));
                }
                Ok(json!({"id": id, "tag": p.args.get_str("tag")}))
            })
            .build();
        let api = compile(SDL, &resolvers).unwrap();
        api.routes[0].handler.clone()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rest_route_wraps_data() {
        let path = HashMap::from([("id".to_string(), "7".to_string())]);
        let query = HashMap::from([("tag".to_string(), "x".to_string())]);
        let response = rest_route(echo_handler(), Some(Path(path)), Query(query)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"data": {"id": "7", "tag": "x"}}));
    }

    #[tokio::test]
    async fn test_rest_route_reports_resolver_status() {
        let path = HashMap::from([("id".to_string(), "teapot".to_string())]);
        let response = rest_route(echo_handler(), Some(Path(path)), Query(HashMap::new())).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_json(response).await, json!({"message": "short and stout"}));
    }

    #[tokio::test]
    async fn test_missing_path_binds_empty_string() {
        let response = rest_route(echo_handler(), None, Query(HashMap::new())).await;
        assert_eq!(body_json(response).await, json!({"data": {"id": "", "tag": ""}}));
    }
}
