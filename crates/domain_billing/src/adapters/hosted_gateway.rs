//! Hosted payment gateway adapter
//!
//! Speaks a Razorpay-style REST API with JSON bodies and HTTP basic auth
//! (`key_id:key_secret`):
//!
//! - `POST /v1/orders` creates an order
//! - `GET /v1/orders/{id}` fetches it
//! - `GET /v1/orders/{id}/payments` lists payment attempts
//!
//! # Error Handling
//!
//! Non-success statuses go through `PortError::from_http_status` with the
//! gateway's error description as the message; timeouts become
//! `PortError::Timeout`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::gateway::{
    CreateGatewayOrder, GatewayOrder, GatewayOrderStatus, GatewayPayment, GatewayPaymentStatus,
    PaymentGatewayPort,
};

const SERVICE: &str = "payment-gateway";

#[derive(Debug, Clone)]
pub struct HostedGatewayConfig {
    /// API root, e.g. `https://api.razorpay.com`
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub timeout_secs: u64,
}

impl Default for HostedGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.razorpay.com".to_string(),
            key_id: String::new(),
            key_secret: String::new(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    status: String,
    #[serde(default)]
    attempts: u32,
}

impl From<OrderResponse> for GatewayOrder {
    fn from(resp: OrderResponse) -> Self {
        Self {
            id: resp.id,
            amount_minor: resp.amount,
            currency: resp.currency,
            receipt: resp.receipt,
            status: GatewayOrderStatus::from_gateway(&resp.status),
            attempts: resp.attempts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: String,
    #[serde(default)]
    order_id: Option<String>,
    amount: i64,
    status: String,
    #[serde(default)]
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: Option<String>,
}

/// Payment gateway port backed by the hosted gateway's REST API
#[derive(Debug, Clone)]
pub struct HostedGatewayAdapter {
    config: HostedGatewayConfig,
    client: reqwest::Client,
}

impl HostedGatewayAdapter {
    pub fn new(config: HostedGatewayConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn read<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PortError> {
        let response = request
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
            .map_err(|e| self.map_transport_error(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.description)
                .unwrap_or(body);
            warn!(operation, status = status.as_u16(), %message, "Gateway request failed");
            return Err(PortError::from_http_status(status.as_u16(), SERVICE, message));
        }

        response.json::<T>().await.map_err(|e| PortError::Transformation {
            message: format!("Unexpected gateway response for {}: {}", operation, e),
        })
    }

    fn map_transport_error(&self, operation: &str, err: reqwest::Error) -> PortError {
        if err.is_timeout() {
            PortError::Timeout {
                operation: operation.to_string(),
                duration_ms: self.config.timeout_secs * 1000,
            }
        } else {
            PortError::Connection {
                message: format!("{} request failed: {}", SERVICE, err),
                source: Some(Box::new(err)),
            }
        }
    }
}

impl DomainPort for HostedGatewayAdapter {}

#[async_trait]
impl HealthCheckable for HostedGatewayAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .client
            .get(self.url("/v1/orders?count=1"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await;
        let (status, message) = match result {
            Ok(resp) if resp.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(resp) => (
                AdapterHealth::Degraded,
                Some(format!("Gateway responded with {}", resp.status())),
            ),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };
        HealthCheckResult::timed("hosted-gateway", start, status, message)
    }
}

#[async_trait]
impl PaymentGatewayPort for HostedGatewayAdapter {
    fn public_key(&self) -> String {
        self.config.key_id.clone()
    }

    #[instrument(skip(self, request), fields(receipt = %request.receipt, amount = request.amount_minor))]
    async fn create_order(&self, request: CreateGatewayOrder) -> Result<GatewayOrder, PortError> {
        let body = OrderRequest {
            amount: request.amount_minor,
            currency: &request.currency,
            receipt: &request.receipt,
            notes: &request.notes,
        };
        let order: OrderResponse = self
            .read("create_order", self.client.post(self.url("/v1/orders")).json(&body))
            .await?;

        info!(gateway_order_id = %order.id, "Gateway order created");
        Ok(order.into())
    }

    #[instrument(skip(self))]
    async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder, PortError> {
        let order: OrderResponse = self
            .read(
                "fetch_order",
                self.client.get(self.url(&format!("/v1/orders/{}", gateway_order_id))),
            )
            .await?;
        debug!(status = %order.status, attempts = order.attempts, "Fetched gateway order");
        Ok(order.into())
    }

    #[instrument(skip(self))]
    async fn fetch_payments(
        &self,
        gateway_order_id: &str,
    ) -> Result<Vec<GatewayPayment>, PortError> {
        let payments: Collection<PaymentResponse> = self
            .read(
                "fetch_payments",
                self.client
                    .get(self.url(&format!("/v1/orders/{}/payments", gateway_order_id))),
            )
            .await?;

        Ok(payments
            .items
            .into_iter()
            .map(|p| GatewayPayment {
                id: p.id,
                order_id: p.order_id.unwrap_or_else(|| gateway_order_id.to_string()),
                amount_minor: p.amount,
                status: GatewayPaymentStatus::from_gateway(&p.status),
                method: p.method,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn adapter(server: &MockServer) -> HostedGatewayAdapter {
        HostedGatewayAdapter::new(HostedGatewayConfig {
            base_url: server.base_url(),
            key_id: "rzp_test_key".to_string(),
            key_secret: "secret".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_order() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/orders")
                .header_exists("authorization")
                .json_body_partial(r#"{"amount": 150050, "currency": "INR", "receipt": "FEE-1"}"#);
            then.status(200).json_body(json!({
                "id": "order_Abc123",
                "entity": "order",
                "amount": 150050,
                "currency": "INR",
                "receipt": "FEE-1",
                "status": "created",
                "attempts": 0
            }));
        });

        let order = adapter(&server)
            .create_order(CreateGatewayOrder {
                amount_minor: 150050,
                currency: "INR".to_string(),
                receipt: "FEE-1".to_string(),
                notes: HashMap::new(),
            })
            .await
            .unwrap();

        mock.assert();
        assert_eq!(order.id, "order_Abc123");
        assert_eq!(order.amount_minor, 150050);
        assert_eq!(order.status, GatewayOrderStatus::Created);
    }

    #[tokio::test]
    async fn test_fetch_paid_order_and_payments() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/orders/order_1");
            then.status(200).json_body(json!({
                "id": "order_1", "amount": 5000, "currency": "INR",
                "status": "paid", "attempts": 2
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/orders/order_1/payments");
            then.status(200).json_body(json!({
                "entity": "collection",
                "count": 2,
                "items": [
                    {"id": "pay_1", "order_id": "order_1", "amount": 5000, "status": "failed", "method": "card"},
                    {"id": "pay_2", "order_id": "order_1", "amount": 5000, "status": "captured", "method": "upi"}
                ]
            }));
        });

        let gateway = adapter(&server);
        let order = gateway.fetch_order("order_1").await.unwrap();
        assert_eq!(order.status, GatewayOrderStatus::Paid);
        assert_eq!(order.attempts, 2);

        let payments = gateway.fetch_payments("order_1").await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[1].status, GatewayPaymentStatus::Captured);
        assert_eq!(payments[1].method.as_deref(), Some("upi"));
    }

    #[tokio::test]
    async fn test_error_description_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/orders");
            then.status(400).json_body(json!({
                "error": {"code": "BAD_REQUEST_ERROR", "description": "Order amount less than minimum amount allowed"}
            }));
        });

        let err = adapter(&server)
            .create_order(CreateGatewayOrder {
                amount_minor: 10,
                currency: "INR".to_string(),
                receipt: "FEE-2".to_string(),
                notes: HashMap::new(),
            })
            .await
            .unwrap_err();

        match err {
            PortError::Validation { message, .. } => assert!(message.contains("minimum amount")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/orders/order_missing");
            then.status(404).body("{}");
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/orders/order_down");
            then.status(503);
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/orders/order_auth");
            then.status(401);
        });

        let gateway = adapter(&server);
        assert!(gateway.fetch_order("order_missing").await.unwrap_err().is_not_found());
        assert!(matches!(
            gateway.fetch_order("order_down").await.unwrap_err(),
            PortError::ServiceUnavailable { .. }
        ));
        assert!(matches!(
            gateway.fetch_order("order_auth").await.unwrap_err(),
            PortError::Unauthorized { .. }
        ));
    }

    #[test]
    fn test_public_key_is_key_id() {
        let gateway = HostedGatewayAdapter::new(HostedGatewayConfig {
            key_id: "rzp_live_x".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(gateway.public_key(), "rzp_live_x");
    }
}
