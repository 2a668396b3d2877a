use restql_schema::compile;
use restql_server::{AppConfig, build_app, demo};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

async fn start_server() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let api = compile(demo::SCHEMA, &demo::resolvers()).expect("compile schema");
    let app = build_app(&AppConfig::default(), &api).expect("build app");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn server_endpoints_work() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // GET /healthz
    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // OPTIONS /
    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{base}/"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "Hello!");

    // GET /person/1/users runs Query.person, then Person.users
    let resp = client
        .get(format!("{base}/person/1/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"data": [
            {"id": "1", "person": "1", "account": "123", "type": "ACCOUNT_HOLDER"},
            {"id": "2", "person": "1", "account": "234", "type": null}
        ]})
    );

    // Query-sourced arguments
    let resp = client
        .get(format!("{base}/account/123/usersByType?type=EMPLOYEE"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["id"], "3");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Unknown person: explicit 404 from the resolver, chain aborted
    let resp = client
        .get(format!("{base}/person/42/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "no person found with ID '42'"}));

    // GraphQL over POST
    let resp = client
        .post(format!("{base}/graphql"))
        .json(&json!({
            "query": "query($id: ID!) { user(id: $id) { type person { id } account { plan { name } } } }",
            "variables": {"id": "3"}
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!({"user": {
            "type": "EMPLOYEE",
            "person": {"id": "2"},
            "account": {"plan": {"name": "Basic (20 Employees)"}}
        }})
    );

    // GraphQL over GET; resolver status travels in the error extensions
    let resp = client
        .get(format!("{base}/graphql"))
        .query(&[("query", r#"{ account(id: "999") { id } }"#)])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "no account found with ID '999'");
    assert_eq!(body["errors"][0]["extensions"]["status"], 404);

    // CORS pre-flight
    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{base}/graphql"))
        .header("origin", "http://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "w-token")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "*"
    );

    // shutdown
    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
