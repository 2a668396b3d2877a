//! Axum handlers for the GraphQL endpoint.
//!
//! - `POST <path>` - JSON body `{query, operationName, variables}`
//! - `GET <path>` - the same fields as URL query parameters, with
//!   `variables` as a JSON string
//!
//! GraphQL responses are always `200 OK`; resolver failures show up in
//! `errors[].extensions.status`.

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, Variables};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    pub schema: Schema,
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string.
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// Query parameters for GET requests.
#[derive(Debug, Deserialize)]
pub struct GraphQLQueryParams {
    pub query: Option<String>,

    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables (JSON string).
    pub variables: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
}

impl From<Response> for GraphQLResponse {
    fn from(resp: Response) -> Self {
        let data_json = serde_json::to_value(&resp.data).unwrap_or(serde_json::Value::Null);
        let data = if data_json.is_null() {
            None
        } else {
            Some(data_json)
        };

        // Server errors serialize with message, locations, path and extensions.
        let errors = resp
            .errors
            .iter()
            .map(|e| {
                serde_json::to_value(e)
                    .unwrap_or_else(|_| serde_json::json!({ "message": e.message }))
            })
            .collect();

        Self { data, errors }
    }
}

pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    Json(request): Json<GraphQLRequest>,
) -> axum::response::Response {
    debug!("Processing GraphQL request");
    execute_graphql(&state, request).await
}

pub async fn graphql_handler_get(
    State(state): State<GraphQLState>,
    Query(params): Query<GraphQLQueryParams>,
) -> axum::response::Response {
    let request = match params_to_request(params) {
        Ok(req) => req,
        Err(e) => return error_response(format!("invalid variables: {e}")).into_response(),
    };

    debug!("Processing GraphQL GET request");
    execute_graphql(&state, request).await
}

async fn execute_graphql(state: &GraphQLState, request: GraphQLRequest) -> axum::response::Response {
    let mut gql_request = Request::new(&request.query);
    if let Some(op_name) = request.operation_name {
        gql_request = gql_request.operation_name(op_name);
    }
    if let Some(vars) = request.variables {
        gql_request = gql_request.variables(Variables::from_json(vars));
    }

    debug!(query = %request.query, "Executing GraphQL query");
    let response = state.schema.execute(gql_request).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(GraphQLResponse::from(response)),
    )
        .into_response()
}

/// Converts GET query params to a GraphQL request.
fn params_to_request(params: GraphQLQueryParams) -> Result<GraphQLRequest, serde_json::Error> {
    let variables = match params.variables.as_deref() {
        Some(vars) if !vars.trim().is_empty() => Some(serde_json::from_str(vars)?),
        _ => None,
    };

    Ok(GraphQLRequest {
        query: params.query.unwrap_or_default(),
        operation_name: params.operation_name,
        variables,
    })
}

fn error_response(message: String) -> impl IntoResponse {
    let body = serde_json::json!({
        "errors": [{ "message": message }]
    });
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
}
