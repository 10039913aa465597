#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use masterplan::config::AppConfig;
use masterplan::db;
use masterplan::hosted::{HostedClient, InMemoryHosted};
use masterplan::routes::router;
use masterplan::session::SessionService;
use masterplan::state::AppState;

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub app: Router,
    pub hosted: Arc<InMemoryHosted>,
    pub session: Arc<SessionService>,
    pub pool: SqlitePool,
}

/// App over fresh in-memory stores. The session check is left pending.
pub async fn spawn_app() -> TestApp {
    let pool = db::connect("sqlite::memory:").await.unwrap();
    let hosted = Arc::new(InMemoryHosted::new());
    hosted.add_account(EMAIL, PASSWORD, "Ada Lovelace");
    with_stores(hosted, pool)
}

pub fn with_stores(hosted: Arc<InMemoryHosted>, pool: SqlitePool) -> TestApp {
    let client: Arc<dyn HostedClient> = hosted.clone();
    let session = Arc::new(SessionService::new(
        client.clone(),
        pool.clone(),
        &AppConfig::default(),
    ));
    let app = router(AppState::new(client, session.clone()));
    TestApp {
        app,
        hosted,
        session,
        pool,
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

pub async fn signed_in() -> TestApp {
    let test = spawn_app().await;
    test.session.init().await.unwrap();
    let (status, _, _) = send(
        &test.app,
        Method::POST,
        "/auth/sign-in",
        Some(serde_json::json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    test
}
