//! Shared harness: an in-process router over a throwaway SQLite database.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use db::{DBService, test_utils::create_test_pool};
use serde_json::{Value, json};
use server::{AppState, config::ServerConfig, routes};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub config: ServerConfig,
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub text: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let (pool, dir) = create_test_pool().await;
    let mut config = ServerConfig::for_database(format!(
        "sqlite://{}",
        dir.path().join("test.db").display()
    ));
    configure(&mut config);

    let state = AppState::new(DBService::from_pool(pool.clone()), config.clone());
    TestApp {
        router: routes::router(state),
        pool,
        config,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    /// Register a fresh account and return its bearer token.
    pub async fn sign_up(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/sign-up/email",
                None,
                Some(json!({
                    "name": "Test User",
                    "email": email,
                    "password": "correct-horse-battery",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_task(&self, token: &str, name: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/tasks",
                Some(token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body
    }
}
