#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use chrono::Duration;
use pollbox::{
    AppState,
    auth::Claims,
    cache::{MemoryCache, PageCache},
    config::Config,
    create_app,
    store::{MemoryPollStore, PollStore},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";
pub const AUDIENCE: &str = "authenticated";
pub const COOKIE: &str = "access_token";

pub struct TestApp {
    pub store: Arc<MemoryPollStore>,
    pub cache: Arc<MemoryCache>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(|store| store as Arc<dyn PollStore>)
    }

    /// Serve through `wrap(store)` instead of the bare memory store.
    pub fn with_store(wrap: impl FnOnce(Arc<MemoryPollStore>) -> Arc<dyn PollStore>) -> Self {
        let store = Arc::new(MemoryPollStore::new());
        let cache = Arc::new(MemoryCache::new());
        let config = Config {
            database_url: "postgres://unused".to_string(),
            redis_url: None,
            jwt_secret: SECRET.to_string(),
            jwt_audience: AUDIENCE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            session_cookie: COOKIE.to_string(),
            cache_ttl_seconds: 60,
        };

        let state = AppState {
            store: wrap(store.clone()),
            cache: cache.clone() as Arc<dyn PageCache>,
            config: Arc::new(config),
        };

        Self {
            store,
            cache,
            router: create_app(state),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Create a poll straight in the store and return its id and option ids.
    pub async fn seed_poll(&self, owner: Uuid, options: &[&str]) -> (Uuid, Vec<Uuid>) {
        let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        let poll_id = self
            .store
            .create_poll_with_options("Favourite colour?", &options, owner)
            .await
            .expect("seed poll");
        let option_ids = self
            .store
            .get_options(poll_id)
            .await
            .expect("seed options")
            .into_iter()
            .map(|option| option.id)
            .collect();
        (poll_id, option_ids)
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let (token, _) = Claims::issue(user_id, None, SECRET, AUDIENCE, Duration::hours(1))
        .expect("issue token");
    token
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// A browser-style form post; the session rides in the cookie.
pub fn form_request(uri: &str, token: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(fields).expect("form body");

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{}={}", COOKIE, token));
    }
    builder.body(Body::from(body)).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("redirect location")
}
