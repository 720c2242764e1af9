use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, response::Response, Router};
use image_gateway::{
    admission::{ApiSecret, AuthPolicy, AuthenticatedQuota, RoutePolicies},
    media_storage::{InMemoryBlobStore, MediaStorage},
    server,
    types::GatewayConfig,
};
use tower::ServiceExt;

use super::MultipartForm;

/// Secret configured on every test router
pub const TEST_SECRET: &str = "test-secret";

/// Base that the in-memory store builds public URLs on
pub const PUBLIC_BASE: &str = "https://storage.test/v0/b/test-bucket";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// `Authorization` header carrying the configured secret
pub fn bearer() -> (&'static str, String) {
    ("authorization", format!("Bearer {TEST_SECRET}"))
}

/// `X-Forwarded-For` header for the given address
pub fn from_ip(ip: &str) -> (&'static str, String) {
    ("x-forwarded-for", ip.to_string())
}

/// Router wired to an in-memory store and a fresh quota ledger
pub struct TestSetup {
    pub router: Router,
    pub store: Arc<InMemoryBlobStore>,
}

impl TestSetup {
    pub fn new(policies: RoutePolicies, authenticated_quota: AuthenticatedQuota) -> Self {
        Self::with_config(GatewayConfig {
            api_secret: ApiSecret::Configured(TEST_SECRET.to_string()),
            policies,
            authenticated_quota,
            request_timeout: Duration::from_secs(30),
            port: 0,
        })
    }

    /// Strict policy on every endpoint, authenticated callers quota exempt
    pub fn strict() -> Self {
        Self::new(
            RoutePolicies::uniform(AuthPolicy::Strict),
            AuthenticatedQuota::Exempt,
        )
    }

    /// Tiered policy on every endpoint, authenticated callers quota exempt
    pub fn tiered() -> Self {
        Self::new(
            RoutePolicies::uniform(AuthPolicy::Tiered),
            AuthenticatedQuota::Exempt,
        )
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        setup_test_env();

        let store = Arc::new(InMemoryBlobStore::new(PUBLIC_BASE));
        let media_storage = Arc::new(MediaStorage::new(store.clone()));
        let router = server::router(&config, media_storage);

        Self { router, store }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn post_multipart(
        &self,
        route: &str,
        form: MultipartForm,
        headers: &[(&str, String)],
    ) -> Response {
        let content_type = form.content_type();
        let mut builder = Request::builder()
            .uri(route)
            .method("POST")
            .header("content-type", content_type);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        self.send(builder.body(Body::from(form.finish())).unwrap())
            .await
    }

    pub async fn send_delete(
        &self,
        payload: serde_json::Value,
        headers: &[(&str, String)],
    ) -> Response {
        let mut builder = Request::builder()
            .uri("/images")
            .method("DELETE")
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        self.send(builder.body(Body::from(payload.to_string())).unwrap())
            .await
    }

    pub async fn send_get(&self, route: &str, headers: &[(&str, String)]) -> Response {
        let mut builder = Request::builder().uri(route).method("GET");
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Uploads one small image and returns its public URL
    pub async fn upload_one(&self, file_name: &str, headers: &[(&str, String)]) -> String {
        let form = MultipartForm::new().file("file", file_name, "image/png", &[1, 2, 3]);
        let response = self.post_multipart("/images", form, headers).await;
        assert_eq!(response.status(), http::StatusCode::CREATED);

        let body = super::parse_response_body(response).await;
        body["url"].as_str().unwrap().to_string()
    }
}
