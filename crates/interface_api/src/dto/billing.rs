//! Fee plan, payment and transaction DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ConsumerId, FeePlanId, MemberId, OrderId, ProviderId, TransactionId};
use domain_billing::{
    Checkout, FeePlan, FeePlanStatus, Order, OrderStatus, PaymentMode, Transaction,
    VerificationOutcome, VerificationStatus,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeePlanRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    /// Rupees, e.g. `"4500.00"`
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFeePlanRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

/// `?status=DUE|PAID&overdue=true&member_id=`
#[derive(Debug, Default, Deserialize)]
pub struct FeePlanListParams {
    pub status: Option<FeePlanStatus>,
    #[serde(default)]
    pub overdue: bool,
    pub member_id: Option<MemberId>,
}

#[derive(Debug, Serialize)]
pub struct FeePlanResponse {
    pub id: FeePlanId,
    pub member_id: MemberId,
    pub provider_id: ProviderId,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: &'static str,
    pub due_date: NaiveDate,
    pub status: FeePlanStatus,
    /// DUE and past its due date
    pub overdue: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_via: Option<PaymentMode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeePlanResponse {
    pub fn new(plan: FeePlan, today: NaiveDate) -> Self {
        Self {
            overdue: plan.is_overdue(today),
            id: plan.id,
            member_id: plan.member_id,
            provider_id: plan.provider_id,
            title: plan.title,
            description: plan.description,
            amount: plan.amount.amount(),
            currency: plan.amount.currency().code(),
            due_date: plan.due_date,
            status: plan.status,
            paid_at: plan.paid_at,
            paid_via: plan.paid_via,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }

    pub fn list(plans: Vec<FeePlan>, today: NaiveDate) -> Vec<Self> {
        plans.into_iter().map(|p| Self::new(p, today)).collect()
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MarkPaidRequest {
    /// Receipt or cheque number
    #[validate(length(min = 1, max = 64, message = "must be 1 to 64 characters"))]
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub fee_plan_id: FeePlanId,
    pub provider_id: ProviderId,
    pub member_id: MemberId,
    pub consumer_id: Option<ConsumerId>,
    pub order_id: Option<OrderId>,
    pub amount: Decimal,
    pub currency: &'static str,
    pub mode: PaymentMode,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            fee_plan_id: t.fee_plan_id,
            provider_id: t.provider_id,
            member_id: t.member_id,
            consumer_id: t.consumer_id,
            order_id: t.order_id,
            amount: t.amount.amount(),
            currency: t.amount.currency().code(),
            mode: t.mode,
            reference: t.reference,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkPaidResponse {
    pub fee_plan: FeePlanResponse,
    pub transaction: TransactionResponse,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub fee_plan_id: FeePlanId,
}

/// Everything the browser needs to open the hosted checkout
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub gateway_order_id: String,
    pub key_id: String,
    /// Paise
    pub amount_minor: i64,
    pub currency: String,
    /// Where the gateway should send the browser afterwards
    pub callback_url: String,
    pub fee_plan: FeePlanResponse,
}

impl CheckoutResponse {
    pub fn new(checkout: Checkout, callback_url: String, today: NaiveDate) -> Self {
        Self {
            order_id: checkout.order_id,
            gateway_order_id: checkout.gateway_order_id,
            key_id: checkout.key_id,
            amount_minor: checkout.amount_minor,
            currency: checkout.currency,
            callback_url,
            fee_plan: FeePlanResponse::new(checkout.fee_plan, today),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, max = 64, message = "is required"))]
    pub gateway_order_id: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub gateway_order_id: String,
    pub fee_plan_id: FeePlanId,
    pub amount_minor: i64,
    pub currency: &'static str,
    pub status: OrderStatus,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            gateway_order_id: o.gateway_order_id,
            fee_plan_id: o.fee_plan_id,
            amount_minor: o.amount_minor,
            currency: o.currency.code(),
            status: o.status,
            gateway_payment_id: o.gateway_payment_id,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub status: VerificationStatus,
    pub order: OrderResponse,
    pub fee_plan: FeePlanResponse,
}

impl VerificationResponse {
    pub fn new(outcome: VerificationOutcome, today: NaiveDate) -> Self {
        Self {
            status: outcome.status,
            order: outcome.order.into(),
            fee_plan: FeePlanResponse::new(outcome.fee_plan, today),
        }
    }
}

/// Query string of the gateway's browser redirect
///
/// A cancelled checkout may come back without an order id.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentReturnParams {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: Option<String>,
}

/// `?limit=&offset=&provider_id=` for moderator transaction listing
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub provider_id: Option<ProviderId>,
    pub mode: Option<PaymentMode>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
