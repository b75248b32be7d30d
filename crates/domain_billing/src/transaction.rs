//! Payment transactions
//!
//! A transaction is the permanent record of a settled fee plan. Exactly one
//! exists per PAID plan, whether the money arrived through the gateway or
//! was collected by the provider in person.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ConsumerId, FeePlanId, MemberId, Money, OrderId, ProviderId, TransactionId};

use crate::fee_plan::{FeePlan, PaymentMode};
use crate::order::Order;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub fee_plan_id: FeePlanId,
    pub provider_id: ProviderId,
    pub member_id: MemberId,
    /// Set for online payments
    pub consumer_id: Option<ConsumerId>,
    pub order_id: Option<OrderId>,
    pub amount: Money,
    pub mode: PaymentMode,
    /// Gateway payment id, or the provider's receipt number
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Transaction for a payment captured by the gateway
    pub fn online(plan: &FeePlan, order: &Order, gateway_payment_id: impl Into<String>) -> Self {
        Self {
            id: TransactionId::new(),
            fee_plan_id: plan.id,
            provider_id: plan.provider_id,
            member_id: plan.member_id,
            consumer_id: Some(order.consumer_id),
            order_id: Some(order.id),
            amount: order.amount(),
            mode: PaymentMode::Online,
            reference: Some(gateway_payment_id.into()),
            created_at: Utc::now(),
        }
    }

    /// Transaction for cash or cheque collected by the provider
    pub fn offline(plan: &FeePlan, reference: Option<String>) -> Self {
        Self {
            id: TransactionId::new(),
            fee_plan_id: plan.id,
            provider_id: plan.provider_id,
            member_id: plan.member_id,
            consumer_id: None,
            order_id: None,
            amount: plan.amount,
            mode: PaymentMode::Offline,
            reference: reference.filter(|r| !r.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

/// Filters for listing transactions, newest first
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub provider_id: Option<ProviderId>,
    pub consumer_id: Option<ConsumerId>,
    pub member_id: Option<MemberId>,
    pub mode: Option<PaymentMode>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl TransactionQuery {
    pub fn for_provider(provider_id: ProviderId) -> Self {
        Self {
            provider_id: Some(provider_id),
            ..Default::default()
        }
    }

    pub fn for_consumer(consumer_id: ConsumerId) -> Self {
        Self {
            consumer_id: Some(consumer_id),
            ..Default::default()
        }
    }

    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        self.provider_id.map_or(true, |id| txn.provider_id == id)
            && self.consumer_id.map_or(true, |id| txn.consumer_id == Some(id))
            && self.member_id.map_or(true, |id| txn.member_id == id)
            && self.mode.map_or(true, |mode| txn.mode == mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn plan() -> FeePlan {
        FeePlan::new(
            MemberId::new(),
            ProviderId::new(),
            "Annual fee",
            Money::inr(dec!(500)),
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_offline_transaction_drops_blank_reference() {
        let plan = plan();
        let txn = Transaction::offline(&plan, Some("  ".to_string()));
        assert_eq!(txn.mode, PaymentMode::Offline);
        assert!(txn.reference.is_none());
        assert!(txn.consumer_id.is_none());
        assert_eq!(txn.amount, plan.amount);
    }

    #[test]
    fn test_query_matching() {
        let plan = plan();
        let txn = Transaction::offline(&plan, Some("RCPT-9".to_string()));

        assert!(TransactionQuery::for_provider(plan.provider_id).matches(&txn));
        assert!(!TransactionQuery::for_provider(ProviderId::new()).matches(&txn));
        assert!(!TransactionQuery::for_consumer(ConsumerId::new()).matches(&txn));
    }
}
