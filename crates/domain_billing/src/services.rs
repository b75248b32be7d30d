//! Billing domain services
//!
//! `PaymentService` orchestrates the payment flows across the billing ports,
//! the gateway and the membership check from the accounts domain.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use core_kernel::{ConsumerId, FeePlanId, OrderId, PortError, ProviderId};
use domain_accounts::MembershipPort;

use crate::error::BillingError;
use crate::fee_plan::{FeePlan, PaymentMode};
use crate::gateway::{
    CreateGatewayOrder, GatewayOrderStatus, GatewayPaymentStatus, PaymentGatewayPort,
};
use crate::order::{Order, OrderStatus};
use crate::ports::{FeePlanPort, OrderPort, Settlement, SettlementPort};
use crate::transaction::Transaction;

/// What the browser needs to open the hosted checkout
#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    pub order_id: OrderId,
    pub gateway_order_id: String,
    /// Gateway public key
    pub key_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub fee_plan: FeePlan,
}

/// Result of checking an order with the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Paid,
    /// Not paid yet; the consumer may still complete checkout
    Pending,
    Failed,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Paid => "paid",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub order: Order,
    pub fee_plan: FeePlan,
}

/// Service for online and offline fee payments
///
/// Online flow:
/// 1. `create_order` creates a gateway order for a DUE plan the consumer
///    has claimed, and records it locally as CREATED
/// 2. the consumer pays on the hosted checkout
/// 3. `verify_order` asks the gateway for the order's state and, when it
///    is paid, settles the plan atomically
///
/// Verification is idempotent: verifying a settled order again returns the
/// settled state without touching storage.
pub struct PaymentService {
    fee_plans: Arc<dyn FeePlanPort>,
    orders: Arc<dyn OrderPort>,
    settlement: Arc<dyn SettlementPort>,
    gateway: Arc<dyn PaymentGatewayPort>,
    memberships: Arc<dyn MembershipPort>,
}

impl PaymentService {
    pub fn new(
        fee_plans: Arc<dyn FeePlanPort>,
        orders: Arc<dyn OrderPort>,
        settlement: Arc<dyn SettlementPort>,
        gateway: Arc<dyn PaymentGatewayPort>,
        memberships: Arc<dyn MembershipPort>,
    ) -> Self {
        Self {
            fee_plans,
            orders,
            settlement,
            gateway,
            memberships,
        }
    }

    /// Starts an online payment for a fee plan
    ///
    /// # Errors
    ///
    /// * `NotFound` - no such plan
    /// * `Forbidden` - the consumer has not claimed the plan's member
    /// * `Conflict` - the plan is already paid
    /// * gateway errors as mapped by the gateway adapter
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        consumer_id: ConsumerId,
        fee_plan_id: FeePlanId,
    ) -> Result<Checkout, PortError> {
        let plan = self.fee_plans.get_fee_plan(fee_plan_id).await?;
        self.ensure_linked(consumer_id, &plan).await?;
        if plan.is_paid() {
            return Err(BillingError::AlreadyPaid(plan.id.to_string()).into());
        }

        let amount_minor = plan.amount.to_minor().map_err(BillingError::from)?;
        let currency = plan.amount.currency().code().to_string();

        let mut notes = HashMap::new();
        notes.insert("fee_plan_id".to_string(), plan.id.to_string());
        notes.insert("member_id".to_string(), plan.member_id.to_string());
        notes.insert("consumer_id".to_string(), consumer_id.to_string());

        let gateway_order = self
            .gateway
            .create_order(CreateGatewayOrder {
                amount_minor,
                currency: currency.clone(),
                receipt: plan.id.to_string(),
                notes,
            })
            .await?;

        let order = Order::new(&plan, consumer_id, &gateway_order)?;
        let order = self.orders.create_order(order).await?;
        info!(
            order_id = %order.id,
            gateway_order_id = %order.gateway_order_id,
            amount_minor,
            "Payment order created"
        );

        Ok(Checkout {
            order_id: order.id,
            gateway_order_id: order.gateway_order_id,
            key_id: self.gateway.public_key(),
            amount_minor,
            currency,
            fee_plan: plan,
        })
    }

    /// Checks a gateway order and settles its plan when paid
    ///
    /// When `consumer_id` is given the order must belong to that consumer.
    /// The gateway return URL verifies without a session and passes `None`.
    #[instrument(skip(self))]
    pub async fn verify_order(
        &self,
        consumer_id: Option<ConsumerId>,
        gateway_order_id: &str,
    ) -> Result<VerificationOutcome, PortError> {
        let mut order = self.orders.get_order_by_gateway_id(gateway_order_id).await?;
        if let Some(consumer_id) = consumer_id {
            if order.consumer_id != consumer_id {
                return Err(PortError::forbidden("Order belongs to another consumer"));
            }
        }

        if order.is_paid() {
            return self.current_state(order).await;
        }

        let gateway_order = self.gateway.fetch_order(gateway_order_id).await?;
        if gateway_order.amount_minor != order.amount_minor {
            return Err(BillingError::GatewayMismatch(format!(
                "gateway order {} amount {} does not match {}",
                gateway_order_id, gateway_order.amount_minor, order.amount_minor
            ))
            .into());
        }

        match gateway_order.status {
            GatewayOrderStatus::Paid => self.settle_online(order).await,
            GatewayOrderStatus::Attempted => {
                let payments = self.gateway.fetch_payments(gateway_order_id).await?;
                let any_open = payments.iter().any(|p| {
                    matches!(
                        p.status,
                        GatewayPaymentStatus::Created | GatewayPaymentStatus::Authorized
                    )
                });
                let any_failed = payments
                    .iter()
                    .any(|p| p.status == GatewayPaymentStatus::Failed);

                if any_failed && !any_open && order.status != OrderStatus::Failed {
                    order.mark_failed()?;
                    order = self.orders.update_order(order).await?;
                    warn!(order_id = %order.id, "Payment attempt failed");
                }
                let status = if order.status == OrderStatus::Failed {
                    VerificationStatus::Failed
                } else {
                    VerificationStatus::Pending
                };
                let fee_plan = self.fee_plans.get_fee_plan(order.fee_plan_id).await?;
                Ok(VerificationOutcome {
                    status,
                    order,
                    fee_plan,
                })
            }
            GatewayOrderStatus::Created => {
                let fee_plan = self.fee_plans.get_fee_plan(order.fee_plan_id).await?;
                Ok(VerificationOutcome {
                    status: VerificationStatus::Pending,
                    order,
                    fee_plan,
                })
            }
        }
    }

    /// Marks a provider's own DUE plan as paid in cash or by cheque
    ///
    /// Returns the paid plan and its OFFLINE transaction.
    #[instrument(skip(self, reference))]
    pub async fn record_offline_payment(
        &self,
        provider_id: ProviderId,
        fee_plan_id: FeePlanId,
        reference: Option<String>,
    ) -> Result<(FeePlan, Transaction), PortError> {
        let plan = self.fee_plans.get_fee_plan(fee_plan_id).await?;
        if plan.provider_id != provider_id {
            return Err(PortError::not_found("FeePlan", fee_plan_id));
        }
        if plan.is_paid() {
            return Err(BillingError::AlreadyPaid(plan.id.to_string()).into());
        }

        let transaction = Transaction::offline(&plan, reference);
        let plan = self
            .settlement
            .settle(Settlement {
                fee_plan_id,
                mode: PaymentMode::Offline,
                order: None,
                transaction: transaction.clone(),
            })
            .await?;

        info!(fee_plan_id = %plan.id, transaction_id = %transaction.id, "Offline payment recorded");
        Ok((plan, transaction))
    }

    async fn ensure_linked(&self, consumer_id: ConsumerId, plan: &FeePlan) -> Result<(), PortError> {
        match self
            .memberships
            .find_membership(consumer_id, plan.member_id)
            .await?
        {
            Some(_) => Ok(()),
            None => Err(BillingError::NotPermitted(
                "fee plan belongs to a member you have not claimed".to_string(),
            )
            .into()),
        }
    }

    async fn settle_online(&self, mut order: Order) -> Result<VerificationOutcome, PortError> {
        let payments = self.gateway.fetch_payments(&order.gateway_order_id).await?;
        let payment = payments
            .into_iter()
            .find(|p| p.status == GatewayPaymentStatus::Captured)
            .ok_or_else(|| {
                PortError::from(BillingError::GatewayMismatch(format!(
                    "gateway order {} is paid but has no captured payment",
                    order.gateway_order_id
                )))
            })?;

        let plan = self.fee_plans.get_fee_plan(order.fee_plan_id).await?;
        order.mark_paid(payment.id.clone())?;
        let transaction = Transaction::online(&plan, &order, payment.id.clone());

        let result = self
            .settlement
            .settle(Settlement {
                fee_plan_id: plan.id,
                mode: PaymentMode::Online,
                order: Some(order.clone()),
                transaction,
            })
            .await;

        match result {
            Ok(fee_plan) => {
                info!(
                    order_id = %order.id,
                    gateway_payment_id = %payment.id,
                    "Fee plan settled online"
                );
                Ok(VerificationOutcome {
                    status: VerificationStatus::Paid,
                    order,
                    fee_plan,
                })
            }
            Err(err) if err.is_conflict() => {
                // A concurrent verification may have settled this order
                let stored = self.orders.get_order(order.id).await?;
                if stored.is_paid() {
                    return self.current_state(stored).await;
                }
                warn!(
                    order_id = %order.id,
                    gateway_payment_id = %payment.id,
                    "Captured payment for a fee plan that is already settled"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn current_state(&self, order: Order) -> Result<VerificationOutcome, PortError> {
        let fee_plan = self.fee_plans.get_fee_plan(order.fee_plan_id).await?;
        let status = match order.status {
            OrderStatus::Paid => VerificationStatus::Paid,
            OrderStatus::Failed => VerificationStatus::Failed,
            OrderStatus::Created => VerificationStatus::Pending,
        };
        Ok(VerificationOutcome {
            status,
            order,
            fee_plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockPaymentGateway;
    use crate::ports::mock::MockBillingStore;
    use crate::ports::TransactionPort;
    use crate::fee_plan::FeePlanStatus;
    use chrono::NaiveDate;
    use core_kernel::{EmailAddress, Money, PhoneNumber};
    use domain_accounts::ports::mock::MockAccountStore;
    use domain_accounts::{
        Consumer, ConsumerPort, Member, MemberPort, Membership, Provider, ProviderPort,
    };
    use rust_decimal_macros::dec;

    struct Fixture {
        service: PaymentService,
        billing: MockBillingStore,
        gateway: MockPaymentGateway,
        consumer: Consumer,
        plan: FeePlan,
    }

    async fn fixture() -> Fixture {
        let accounts = MockAccountStore::new();
        let billing = MockBillingStore::new();
        let gateway = MockPaymentGateway::new();
        let phone = PhoneNumber::from_normalized("+919876543210");

        let mut provider = Provider::new(
            "Sunrise School",
            PhoneNumber::from_normalized("+919800000001"),
            EmailAddress::from_normalized("office@sunrise.edu"),
        );
        provider.verified = true;
        let provider = accounts.create_provider(provider).await.unwrap();
        let member = accounts
            .create_member(Member::new(provider.id, "Asha", phone.clone(), "R-1"))
            .await
            .unwrap();
        let consumer = accounts
            .create_consumer(Consumer::new("Ravi", phone))
            .await
            .unwrap();
        accounts
            .create_membership(Membership::authorize_claim(&consumer, &member, &provider).unwrap())
            .await
            .unwrap();

        let plan = billing
            .create_fee_plan(
                FeePlan::new(
                    member.id,
                    provider.id,
                    "Term 1",
                    Money::inr(dec!(1500.50)),
                    NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let service = PaymentService::new(
            Arc::new(billing.clone()),
            Arc::new(billing.clone()),
            Arc::new(billing.clone()),
            Arc::new(gateway.clone()),
            Arc::new(accounts),
        );

        Fixture {
            service,
            billing,
            gateway,
            consumer,
            plan,
        }
    }

    #[tokio::test]
    async fn test_create_order_for_claimed_plan() {
        let f = fixture().await;
        let checkout = f.service.create_order(f.consumer.id, f.plan.id).await.unwrap();

        assert_eq!(checkout.amount_minor, 150050);
        assert_eq!(checkout.currency, "INR");
        assert_eq!(checkout.key_id, "rzp_test_mock");

        let order = f.billing.get_order(checkout.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Created);
    }

    #[tokio::test]
    async fn test_create_order_requires_membership() {
        let f = fixture().await;
        let err = f.service.create_order(ConsumerId::new(), f.plan.id).await.unwrap_err();
        assert!(matches!(err, PortError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_verify_pending_then_paid_is_idempotent() {
        let f = fixture().await;
        let checkout = f.service.create_order(f.consumer.id, f.plan.id).await.unwrap();

        let pending = f
            .service
            .verify_order(Some(f.consumer.id), &checkout.gateway_order_id)
            .await
            .unwrap();
        assert_eq!(pending.status, VerificationStatus::Pending);

        let payment_id = f.gateway.capture(&checkout.gateway_order_id).await.unwrap();
        let paid = f
            .service
            .verify_order(Some(f.consumer.id), &checkout.gateway_order_id)
            .await
            .unwrap();
        assert_eq!(paid.status, VerificationStatus::Paid);
        assert_eq!(paid.fee_plan.status, FeePlanStatus::Paid);
        assert_eq!(paid.fee_plan.paid_via, Some(PaymentMode::Online));
        assert_eq!(paid.order.gateway_payment_id, Some(payment_id.clone()));

        let again = f.service.verify_order(None, &checkout.gateway_order_id).await.unwrap();
        assert_eq!(again.status, VerificationStatus::Paid);
        assert_eq!(f.billing.transaction_count().await, 1);

        let txn = f.billing.find_fee_plan_transaction(f.plan.id).await.unwrap().unwrap();
        assert_eq!(txn.reference, Some(payment_id));
        assert_eq!(txn.consumer_id, Some(f.consumer.id));
    }

    #[tokio::test]
    async fn test_declined_payment_marks_order_failed() {
        let f = fixture().await;
        let checkout = f.service.create_order(f.consumer.id, f.plan.id).await.unwrap();
        f.gateway.decline(&checkout.gateway_order_id).await.unwrap();

        let outcome = f
            .service
            .verify_order(Some(f.consumer.id), &checkout.gateway_order_id)
            .await
            .unwrap();
        assert_eq!(outcome.status, VerificationStatus::Failed);
        assert_eq!(outcome.fee_plan.status, FeePlanStatus::Due);

        // Retrying on the same order can still succeed
        f.gateway.capture(&checkout.gateway_order_id).await.unwrap();
        let outcome = f
            .service
            .verify_order(Some(f.consumer.id), &checkout.gateway_order_id)
            .await
            .unwrap();
        assert_eq!(outcome.status, VerificationStatus::Paid);
    }

    #[tokio::test]
    async fn test_verify_rejects_other_consumer() {
        let f = fixture().await;
        let checkout = f.service.create_order(f.consumer.id, f.plan.id).await.unwrap();
        let err = f
            .service
            .verify_order(Some(ConsumerId::new()), &checkout.gateway_order_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_offline_payment_blocks_online_order() {
        let f = fixture().await;
        f.service
            .record_offline_payment(f.plan.provider_id, f.plan.id, Some("RCPT-7".to_string()))
            .await
            .unwrap();

        let err = f.service.create_order(f.consumer.id, f.plan.id).await.unwrap_err();
        assert!(err.is_conflict());

        let again = f
            .service
            .record_offline_payment(f.plan.provider_id, f.plan.id, None)
            .await
            .unwrap_err();
        assert!(again.is_conflict());
    }

    #[tokio::test]
    async fn test_offline_payment_scoped_to_provider() {
        let f = fixture().await;
        let err = f
            .service
            .record_offline_payment(ProviderId::new(), f.plan.id, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_capture_after_offline_settlement_conflicts() {
        let f = fixture().await;
        let checkout = f.service.create_order(f.consumer.id, f.plan.id).await.unwrap();
        f.service
            .record_offline_payment(f.plan.provider_id, f.plan.id, None)
            .await
            .unwrap();
        f.gateway.capture(&checkout.gateway_order_id).await.unwrap();

        let err = f
            .service
            .verify_order(Some(f.consumer.id), &checkout.gateway_order_id)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(f.billing.transaction_count().await, 1);
    }
}
