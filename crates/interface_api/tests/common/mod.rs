//! Shared harness for the API tests
//!
//! Runs the real router against the in-memory ports from `test_utils`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use core_kernel::HealthCheckable;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState, Ports};
use test_utils::{MockPorts, TEST_OTP_CODE};

pub const JWT_SECRET: &str = "api-test-secret";
pub const FRONTEND_URL: &str = "http://app.test";
pub const PUBLIC_BASE_URL: &str = "http://api.test";

pub struct TestApp {
    pub server: TestServer,
    pub mock: MockPorts,
    _uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let mock = MockPorts::new();
        let uploads = tempfile::tempdir().unwrap();
        let config = ApiConfig {
            jwt_secret: JWT_SECRET.to_string(),
            frontend_url: FRONTEND_URL.to_string(),
            public_base_url: PUBLIC_BASE_URL.to_string(),
            upload_dir: uploads.path().to_string_lossy().into_owned(),
            max_upload_bytes: 1024,
            ..ApiConfig::default()
        };

        let state = AppState::new(config, in_memory_ports(&mock));
        let server = TestServer::new(create_router(state)).unwrap();
        Self {
            server,
            mock,
            _uploads: uploads,
        }
    }

    /// Requests a code and signs in; returns the session token
    pub async fn sign_in(&self, role: &str, phone: &str) -> String {
        self.request_code(role, phone).await;
        let response = self
            .server
            .post(&format!("/api/v1/auth/{}/login", role))
            .json(&json!({ "phone": phone, "code": TEST_OTP_CODE }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn request_code(&self, role: &str, phone: &str) {
        self.server
            .post(&format!("/api/v1/auth/{}/otp", role))
            .json(&json!({ "phone": phone }))
            .await
            .assert_status(axum::http::StatusCode::ACCEPTED);
    }
}

/// Attaches a Bearer session token
pub fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

pub fn in_memory_ports(mock: &MockPorts) -> Ports {
    let accounts = Arc::new(mock.accounts.clone());
    let billing = Arc::new(mock.billing.clone());
    let platform = Arc::new(mock.platform.clone());

    Ports {
        providers: accounts.clone(),
        consumers: accounts.clone(),
        moderators: accounts.clone(),
        members: accounts.clone(),
        memberships: accounts.clone(),
        fee_plans: billing.clone(),
        orders: billing.clone(),
        transactions: billing.clone(),
        settlement: billing.clone(),
        policies: platform.clone(),
        queries: platform.clone(),
        otp: mock.otp.clone(),
        gateway: Arc::new(mock.gateway.clone()),
        stores: vec![
            accounts as Arc<dyn HealthCheckable>,
            billing as Arc<dyn HealthCheckable>,
            platform as Arc<dyn HealthCheckable>,
        ],
    }
}
