//! Shared helpers for the router-level test suites.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use gatehouse_api::{create_app, AppState, Config, InMemoryUserStore, UserStore};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_jwt_secret_for_tests_only";

/// Test configuration built from explicit variables, never the process env
pub struct TestConfig {
    pub vars: HashMap<String, String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        let mut vars = HashMap::new();
        vars.insert("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string());
        Self { vars }
    }
}

impl TestConfig {
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(&self) -> Config {
        Config::from_lookup(|key| self.vars.get(key).cloned()).unwrap()
    }
}

/// A router wired to a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    memory: Option<Arc<InMemoryUserStore>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default().build())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(store.clone(), config);
        Self {
            router: create_app(state.clone()),
            state,
            memory: Some(store),
        }
    }

    /// Router over an arbitrary store, e.g. one that fails on purpose.
    pub fn with_store(store: Arc<dyn UserStore>) -> Self {
        let state = AppState::new(store, TestConfig::default().build());
        Self {
            router: create_app(state.clone()),
            state,
            memory: None,
        }
    }

    pub fn store(&self) -> &InMemoryUserStore {
        self.memory.as_deref().expect("app was built over a custom store")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.send(json_request(
            Method::POST,
            "/api/signup",
            json!({ "name": name, "email": email, "password": password }),
        ))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(json_request(
            Method::POST,
            "/api/login",
            json!({ "email": email, "password": password }),
        ))
        .await
    }

    pub async fn me(&self, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri("/api/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Assert the standard failure body shape.
    pub fn assert_failure(&self, status: StatusCode, error_code: &str, message: &str) {
        assert_eq!(self.status, status, "unexpected status, body: {}", self.body);
        assert_eq!(self.body["errorCode"], error_code);
        assert_eq!(self.body["message"], message);
        assert!(self.body.get("errors").is_some(), "errors key must be present");
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
