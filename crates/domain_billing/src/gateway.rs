//! Payment gateway port
//!
//! Online payments go through a hosted checkout. The platform creates a
//! gateway order for the exact amount in minor units, the consumer pays on
//! the gateway's page, and the platform then asks the gateway for the
//! order's state instead of trusting anything the browser reports.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, PortError};

/// Order state as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayOrderStatus {
    Created,
    /// At least one payment was tried, none captured
    Attempted,
    Paid,
}

impl GatewayOrderStatus {
    pub fn from_gateway(value: &str) -> Self {
        match value {
            "paid" => GatewayOrderStatus::Paid,
            "attempted" => GatewayOrderStatus::Attempted,
            _ => GatewayOrderStatus::Created,
        }
    }
}

/// Payment state as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Created,
    Authorized,
    Captured,
    Refunded,
    Failed,
}

impl GatewayPaymentStatus {
    pub fn from_gateway(value: &str) -> Self {
        match value {
            "authorized" => GatewayPaymentStatus::Authorized,
            "captured" => GatewayPaymentStatus::Captured,
            "refunded" => GatewayPaymentStatus::Refunded,
            "failed" => GatewayPaymentStatus::Failed,
            _ => GatewayPaymentStatus::Created,
        }
    }
}

/// A gateway-side order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: GatewayOrderStatus,
    pub attempts: u32,
}

/// A payment attempt against a gateway order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: String,
    pub amount_minor: i64,
    pub status: GatewayPaymentStatus,
    pub method: Option<String>,
}

/// Parameters for a new gateway order
#[derive(Debug, Clone)]
pub struct CreateGatewayOrder {
    pub amount_minor: i64,
    pub currency: String,
    /// Our reference, echoed back by the gateway
    pub receipt: String,
    pub notes: HashMap<String, String>,
}

/// Port to the hosted payment gateway
#[async_trait]
pub trait PaymentGatewayPort: DomainPort + HealthCheckable {
    /// Public key the checkout page needs
    fn public_key(&self) -> String;

    async fn create_order(&self, request: CreateGatewayOrder) -> Result<GatewayOrder, PortError>;

    async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder, PortError>;

    async fn fetch_payments(
        &self,
        gateway_order_id: &str,
    ) -> Result<Vec<GatewayPayment>, PortError>;
}

/// In-memory gateway for tests and local development
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default)]
    struct State {
        orders: HashMap<String, GatewayOrder>,
        payments: HashMap<String, Vec<GatewayPayment>>,
        sequence: u64,
    }

    /// Gateway double whose orders are paid or failed by the test
    #[derive(Debug, Default, Clone)]
    pub struct MockPaymentGateway {
        state: Arc<RwLock<State>>,
    }

    impl MockPaymentGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulates a captured payment; returns the payment id
        pub async fn capture(&self, gateway_order_id: &str) -> Result<String, PortError> {
            self.record_attempt(gateway_order_id, GatewayPaymentStatus::Captured)
                .await
        }

        /// Simulates a declined payment; returns the payment id
        pub async fn decline(&self, gateway_order_id: &str) -> Result<String, PortError> {
            self.record_attempt(gateway_order_id, GatewayPaymentStatus::Failed)
                .await
        }

        async fn record_attempt(
            &self,
            gateway_order_id: &str,
            status: GatewayPaymentStatus,
        ) -> Result<String, PortError> {
            let mut state = self.state.write().await;
            state.sequence += 1;
            let payment_id = format!("pay_mock{:06}", state.sequence);

            let order = state
                .orders
                .get_mut(gateway_order_id)
                .ok_or_else(|| PortError::not_found("GatewayOrder", gateway_order_id))?;
            order.attempts += 1;
            order.status = if status == GatewayPaymentStatus::Captured {
                GatewayOrderStatus::Paid
            } else {
                GatewayOrderStatus::Attempted
            };
            let payment = GatewayPayment {
                id: payment_id.clone(),
                order_id: order.id.clone(),
                amount_minor: order.amount_minor,
                status,
                method: Some("upi".to_string()),
            };

            state
                .payments
                .entry(gateway_order_id.to_string())
                .or_default()
                .push(payment);
            Ok(payment_id)
        }
    }

    impl DomainPort for MockPaymentGateway {}

    #[async_trait]
    impl HealthCheckable for MockPaymentGateway {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-payment-gateway")
        }
    }

    #[async_trait]
    impl PaymentGatewayPort for MockPaymentGateway {
        fn public_key(&self) -> String {
            "rzp_test_mock".to_string()
        }

        async fn create_order(
            &self,
            request: CreateGatewayOrder,
        ) -> Result<GatewayOrder, PortError> {
            if request.amount_minor < 100 {
                return Err(PortError::validation("Order amount less than minimum amount allowed"));
            }
            let mut state = self.state.write().await;
            state.sequence += 1;
            let order = GatewayOrder {
                id: format!("order_mock{:06}", state.sequence),
                amount_minor: request.amount_minor,
                currency: request.currency,
                receipt: Some(request.receipt),
                status: GatewayOrderStatus::Created,
                attempts: 0,
            };
            state.orders.insert(order.id.clone(), order.clone());
            Ok(order)
        }

        async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder, PortError> {
            self.state
                .read()
                .await
                .orders
                .get(gateway_order_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("GatewayOrder", gateway_order_id))
        }

        async fn fetch_payments(
            &self,
            gateway_order_id: &str,
        ) -> Result<Vec<GatewayPayment>, PortError> {
            let state = self.state.read().await;
            if !state.orders.contains_key(gateway_order_id) {
                return Err(PortError::not_found("GatewayOrder", gateway_order_id));
            }
            Ok(state
                .payments
                .get(gateway_order_id)
                .cloned()
                .unwrap_or_default())
        }
    }
}
