//! Billing domain ports
//!
//! Storage contracts for fee plans, orders and transactions, plus the
//! `SettlementPort` that applies a payment atomically. Settlement is the
//! only operation touching several aggregates at once: the plan becomes
//! PAID, the order (if any) becomes PAID and the transaction is inserted,
//! all or nothing.

use async_trait::async_trait;

use core_kernel::{
    ConsumerId, DomainPort, FeePlanId, HealthCheckable, MemberId, OrderId, PortError, ProviderId,
};

use crate::fee_plan::{FeePlan, FeePlanQuery, PaymentMode};
use crate::order::Order;
use crate::transaction::{Transaction, TransactionQuery};

#[async_trait]
pub trait FeePlanPort: DomainPort + HealthCheckable {
    async fn create_fee_plan(&self, plan: FeePlan) -> Result<FeePlan, PortError>;

    async fn get_fee_plan(&self, id: FeePlanId) -> Result<FeePlan, PortError>;

    /// Plans of one member ordered by due date
    async fn list_member_fee_plans(&self, member_id: MemberId) -> Result<Vec<FeePlan>, PortError>;

    /// Plans of one provider ordered by due date
    async fn list_provider_fee_plans(
        &self,
        provider_id: ProviderId,
        query: FeePlanQuery,
    ) -> Result<Vec<FeePlan>, PortError>;

    /// Persists an edited plan; Conflict if the stored plan is already PAID
    async fn update_fee_plan(&self, plan: FeePlan) -> Result<FeePlan, PortError>;

    /// Deletes a DUE plan; Conflict if it is PAID
    async fn delete_fee_plan(&self, id: FeePlanId) -> Result<(), PortError>;
}

#[async_trait]
pub trait OrderPort: DomainPort + HealthCheckable {
    async fn create_order(&self, order: Order) -> Result<Order, PortError>;

    async fn get_order(&self, id: OrderId) -> Result<Order, PortError>;

    async fn get_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Order, PortError>;

    async fn update_order(&self, order: Order) -> Result<Order, PortError>;

    /// A consumer's orders, newest first
    async fn list_consumer_orders(&self, consumer_id: ConsumerId) -> Result<Vec<Order>, PortError>;
}

#[async_trait]
pub trait TransactionPort: DomainPort + HealthCheckable {
    async fn list_transactions(&self, query: TransactionQuery)
        -> Result<Vec<Transaction>, PortError>;

    async fn find_fee_plan_transaction(
        &self,
        fee_plan_id: FeePlanId,
    ) -> Result<Option<Transaction>, PortError>;
}

/// Everything needed to settle one fee plan
#[derive(Debug, Clone)]
pub struct Settlement {
    pub fee_plan_id: FeePlanId,
    pub mode: PaymentMode,
    /// The paid order, for online payments
    pub order: Option<Order>,
    pub transaction: Transaction,
}

#[async_trait]
pub trait SettlementPort: DomainPort + HealthCheckable {
    /// Applies a settlement atomically and returns the PAID plan
    ///
    /// Returns `PortError::Conflict` if the plan was already paid; nothing
    /// is written in that case.
    async fn settle(&self, settlement: Settlement) -> Result<FeePlan, PortError>;
}

/// In-memory implementation of every billing port
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use core_kernel::{HealthCheckResult, TransactionId};

    use crate::order::OrderStatus;

    #[derive(Debug, Default)]
    struct Tables {
        fee_plans: HashMap<FeePlanId, FeePlan>,
        orders: HashMap<OrderId, Order>,
        transactions: HashMap<TransactionId, Transaction>,
    }

    #[derive(Debug, Default, Clone)]
    pub struct MockBillingStore {
        tables: Arc<RwLock<Tables>>,
    }

    impl MockBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn transaction_count(&self) -> usize {
            self.tables.read().await.transactions.len()
        }
    }

    impl DomainPort for MockBillingStore {}

    #[async_trait]
    impl HealthCheckable for MockBillingStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-billing-store")
        }
    }

    #[async_trait]
    impl FeePlanPort for MockBillingStore {
        async fn create_fee_plan(&self, plan: FeePlan) -> Result<FeePlan, PortError> {
            self.tables.write().await.fee_plans.insert(plan.id, plan.clone());
            Ok(plan)
        }

        async fn get_fee_plan(&self, id: FeePlanId) -> Result<FeePlan, PortError> {
            self.tables
                .read()
                .await
                .fee_plans
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("FeePlan", id))
        }

        async fn list_member_fee_plans(
            &self,
            member_id: MemberId,
        ) -> Result<Vec<FeePlan>, PortError> {
            let tables = self.tables.read().await;
            let mut plans: Vec<_> = tables
                .fee_plans
                .values()
                .filter(|p| p.member_id == member_id)
                .cloned()
                .collect();
            plans.sort_by_key(|p| (p.due_date, p.created_at));
            Ok(plans)
        }

        async fn list_provider_fee_plans(
            &self,
            provider_id: ProviderId,
            query: FeePlanQuery,
        ) -> Result<Vec<FeePlan>, PortError> {
            let tables = self.tables.read().await;
            let mut plans: Vec<_> = tables
                .fee_plans
                .values()
                .filter(|p| p.provider_id == provider_id && query.matches(p))
                .cloned()
                .collect();
            plans.sort_by_key(|p| (p.due_date, p.created_at));
            Ok(plans)
        }

        async fn update_fee_plan(&self, plan: FeePlan) -> Result<FeePlan, PortError> {
            let mut tables = self.tables.write().await;
            let stored = tables
                .fee_plans
                .get(&plan.id)
                .ok_or_else(|| PortError::not_found("FeePlan", plan.id))?;
            if stored.is_paid() {
                return Err(PortError::conflict(format!("Fee plan {} is already paid", plan.id)));
            }
            tables.fee_plans.insert(plan.id, plan.clone());
            Ok(plan)
        }

        async fn delete_fee_plan(&self, id: FeePlanId) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            let stored = tables
                .fee_plans
                .get(&id)
                .ok_or_else(|| PortError::not_found("FeePlan", id))?;
            if stored.is_paid() {
                return Err(PortError::conflict(format!("Fee plan {} is already paid", id)));
            }
            tables.fee_plans.remove(&id);
            tables.orders.retain(|_, o| o.fee_plan_id != id);
            Ok(())
        }
    }

    #[async_trait]
    impl OrderPort for MockBillingStore {
        async fn create_order(&self, order: Order) -> Result<Order, PortError> {
            let mut tables = self.tables.write().await;
            if tables
                .orders
                .values()
                .any(|o| o.gateway_order_id == order.gateway_order_id)
            {
                return Err(PortError::conflict("Gateway order already recorded"));
            }
            tables.orders.insert(order.id, order.clone());
            Ok(order)
        }

        async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
            self.tables
                .read()
                .await
                .orders
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", id))
        }

        async fn get_order_by_gateway_id(
            &self,
            gateway_order_id: &str,
        ) -> Result<Order, PortError> {
            self.tables
                .read()
                .await
                .orders
                .values()
                .find(|o| o.gateway_order_id == gateway_order_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", gateway_order_id))
        }

        async fn update_order(&self, order: Order) -> Result<Order, PortError> {
            let mut tables = self.tables.write().await;
            if !tables.orders.contains_key(&order.id) {
                return Err(PortError::not_found("Order", order.id));
            }
            tables.orders.insert(order.id, order.clone());
            Ok(order)
        }

        async fn list_consumer_orders(
            &self,
            consumer_id: ConsumerId,
        ) -> Result<Vec<Order>, PortError> {
            let tables = self.tables.read().await;
            let mut orders: Vec<_> = tables
                .orders
                .values()
                .filter(|o| o.consumer_id == consumer_id)
                .cloned()
                .collect();
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(orders)
        }
    }

    #[async_trait]
    impl TransactionPort for MockBillingStore {
        async fn list_transactions(
            &self,
            query: TransactionQuery,
        ) -> Result<Vec<Transaction>, PortError> {
            let tables = self.tables.read().await;
            let mut results: Vec<_> = tables
                .transactions
                .values()
                .filter(|t| query.matches(t))
                .cloned()
                .collect();
            results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn find_fee_plan_transaction(
            &self,
            fee_plan_id: FeePlanId,
        ) -> Result<Option<Transaction>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables
                .transactions
                .values()
                .find(|t| t.fee_plan_id == fee_plan_id)
                .cloned())
        }
    }

    #[async_trait]
    impl SettlementPort for MockBillingStore {
        async fn settle(&self, settlement: Settlement) -> Result<FeePlan, PortError> {
            // One write guard for the whole settlement
            let mut tables = self.tables.write().await;

            let mut plan = tables
                .fee_plans
                .get(&settlement.fee_plan_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("FeePlan", settlement.fee_plan_id))?;
            plan.mark_paid(settlement.mode)?;

            if let Some(ref order) = settlement.order {
                let stored = tables
                    .orders
                    .get(&order.id)
                    .ok_or_else(|| PortError::not_found("Order", order.id))?;
                if stored.status == OrderStatus::Paid {
                    return Err(PortError::conflict(format!("Order {} is already paid", order.id)));
                }
            }

            tables.fee_plans.insert(plan.id, plan.clone());
            if let Some(order) = settlement.order {
                tables.orders.insert(order.id, order);
            }
            tables
                .transactions
                .insert(settlement.transaction.id, settlement.transaction);
            Ok(plan)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBillingStore;
    use super::*;
    use crate::fee_plan::FeePlanStatus;
    use chrono::NaiveDate;
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    fn plan(provider_id: ProviderId, due: (i32, u32, u32)) -> FeePlan {
        FeePlan::new(
            MemberId::new(),
            provider_id,
            "Tuition",
            Money::inr(dec!(2000)),
            NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_offline_settlement_is_applied_once() {
        let store = MockBillingStore::new();
        let plan = store.create_fee_plan(plan(ProviderId::new(), (2026, 5, 1))).await.unwrap();

        let settlement = Settlement {
            fee_plan_id: plan.id,
            mode: PaymentMode::Offline,
            order: None,
            transaction: Transaction::offline(&plan, Some("RCPT-1".to_string())),
        };
        let paid = store.settle(settlement.clone()).await.unwrap();
        assert_eq!(paid.status, FeePlanStatus::Paid);

        let err = store.settle(settlement).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.transaction_count().await, 1);
    }

    #[tokio::test]
    async fn test_paid_plan_cannot_be_updated_or_deleted() {
        let store = MockBillingStore::new();
        let plan = store.create_fee_plan(plan(ProviderId::new(), (2026, 5, 1))).await.unwrap();
        store
            .settle(Settlement {
                fee_plan_id: plan.id,
                mode: PaymentMode::Offline,
                order: None,
                transaction: Transaction::offline(&plan, None),
            })
            .await
            .unwrap();

        assert!(store.update_fee_plan(plan.clone()).await.unwrap_err().is_conflict());
        assert!(store.delete_fee_plan(plan.id).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_provider_listing_filters_and_orders() {
        let store = MockBillingStore::new();
        let provider_id = ProviderId::new();
        let later = store.create_fee_plan(plan(provider_id, (2026, 9, 1))).await.unwrap();
        let earlier = store.create_fee_plan(plan(provider_id, (2026, 3, 1))).await.unwrap();
        store.create_fee_plan(plan(ProviderId::new(), (2026, 1, 1))).await.unwrap();

        let all = store
            .list_provider_fee_plans(provider_id, FeePlanQuery::default())
            .await
            .unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![earlier.id, later.id]);

        let overdue = store
            .list_provider_fee_plans(
                provider_id,
                FeePlanQuery {
                    overdue_on: NaiveDate::from_ymd_opt(2026, 4, 1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, earlier.id);
    }
}
