pub mod fixtures;
pub mod recording;

use anyhow::Context as _;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use medora::{api::create_router, db::MemoryStore, services::ActorContext, AppState, Config};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tower::ServiceExt as _;

pub use fixtures::*;
pub use recording::*;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
}

impl TestApp {
    /// App over a seeded in-memory store with authentication disabled.
    pub async fn new() -> anyhow::Result<Self> {
        Self::new_with_config(|_| {}).await
    }

    /// App over a seeded in-memory store that requires bearer tokens.
    pub async fn with_auth() -> anyhow::Result<Self> {
        Self::new_with_config(|config| {
            config.auth.enabled = true;
            config.auth.jwt_secret = Some(TEST_SECRET.to_string());
            config.auth.issuer = Some("medora-tests".to_string());
        })
        .await
    }

    pub async fn new_with_config(configure: impl FnOnce(&mut Config)) -> anyhow::Result<Self> {
        init_tracing();

        let mut config = Config::default();
        configure(&mut config);

        let store = MemoryStore::new();
        seed_network(&store).await;

        let state =
            AppState::with_store(config, Arc::new(store.clone())).context("initialize AppState")?;
        let router = create_router(state.clone());

        Ok(Self {
            router,
            state,
            store,
        })
    }

    pub fn token(&self, actor: &ActorContext) -> anyhow::Result<String> {
        self.state
            .auth
            .issue(actor, Duration::from_secs(600))
            .context("issue token")
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        self.request_with_headers(method, path_and_query, body, &[])
            .await
    }

    pub async fn request_as(
        &self,
        actor: &ActorContext,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        let authorization = format!("Bearer {}", self.token(actor)?);
        self.request_with_headers(
            method,
            path_and_query,
            body,
            &[("authorization", authorization.as_str())],
        )
        .await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header("content-type", "application/json");
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(match body {
                Some(value) => Body::from(serde_json::to_vec(&value)?),
                None => Body::empty(),
            })
            .context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("parse response body")?
        };

        Ok((status, headers, body))
    }
}

/// Ids of the items in a listing response.
pub fn item_ids(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {context}");
}

fn init_tracing() {
    use std::sync::OnceLock;
    use tracing_subscriber::prelude::*;
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "medora=warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
