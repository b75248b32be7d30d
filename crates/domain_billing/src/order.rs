//! Payment orders
//!
//! An order pairs one fee plan with one hosted-gateway order. A consumer may
//! create several orders for the same plan (abandoned checkouts); only one
//! of them can ever settle it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ConsumerId, Currency, FeePlanId, Money, OrderId};

use crate::error::BillingError;
use crate::fee_plan::FeePlan;
use crate::gateway::GatewayOrder;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "PAID" => OrderStatus::Paid,
            "FAILED" => OrderStatus::Failed,
            _ => OrderStatus::Created,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub gateway_order_id: String,
    pub fee_plan_id: FeePlanId,
    pub consumer_id: ConsumerId,
    /// Amount in paise
    pub amount_minor: i64,
    pub currency: Currency,
    pub status: OrderStatus,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Records a freshly created gateway order for a plan
    ///
    /// # Errors
    ///
    /// Returns `GatewayMismatch` if the gateway order's amount differs from
    /// the plan's amount
    pub fn new(
        fee_plan: &FeePlan,
        consumer_id: ConsumerId,
        gateway_order: &GatewayOrder,
    ) -> Result<Self, BillingError> {
        let expected = fee_plan.amount.to_minor()?;
        if gateway_order.amount_minor != expected {
            return Err(BillingError::GatewayMismatch(format!(
                "gateway order {} is for {} minor units, expected {}",
                gateway_order.id, gateway_order.amount_minor, expected
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            gateway_order_id: gateway_order.id.clone(),
            fee_plan_id: fee_plan.id,
            consumer_id,
            amount_minor: expected,
            currency: fee_plan.amount.currency(),
            status: OrderStatus::Created,
            gateway_payment_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor, self.currency)
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    /// Marks the order paid; PAID is terminal
    ///
    /// A FAILED order may still be paid: the consumer can retry on the
    /// same gateway order after a declined attempt.
    pub fn mark_paid(&mut self, gateway_payment_id: impl Into<String>) -> Result<(), BillingError> {
        if self.is_paid() {
            return Err(BillingError::OrderClosed(self.id.to_string()));
        }
        self.status = OrderStatus::Paid;
        self.gateway_payment_id = Some(gateway_payment_id.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_failed(&mut self) -> Result<(), BillingError> {
        if self.is_paid() {
            return Err(BillingError::OrderClosed(self.id.to_string()));
        }
        self.status = OrderStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }
}
