//! PostgreSQL Billing Adapter
//!
//! Implements `FeePlanPort`, `OrderPort`, `TransactionPort` and
//! `SettlementPort` on top of the `BillingRepository`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use core_kernel::{
    ConsumerId, DomainPort, FeePlanId, HealthCheckResult, HealthCheckable, MemberId, OrderId,
    PortError, ProviderId,
};
use domain_billing::{
    FeePlan, FeePlanPort, FeePlanQuery, Order, OrderPort, Settlement, SettlementPort,
    Transaction, TransactionPort, TransactionQuery,
};

use crate::error::db_to_port_error;
use crate::repositories::BillingRepository;

/// PostgreSQL-backed implementation of the billing ports
#[derive(Debug, Clone)]
pub struct PostgresBillingAdapter {
    repository: BillingRepository,
    pool: PgPool,
}

impl PostgresBillingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresBillingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::probe(&self.pool, "postgres-billing-adapter").await
    }
}

#[async_trait]
impl FeePlanPort for PostgresBillingAdapter {
    #[instrument(skip(self, plan), fields(fee_plan_id = %plan.id, member_id = %plan.member_id))]
    async fn create_fee_plan(&self, plan: FeePlan) -> Result<FeePlan, PortError> {
        debug!("Inserting fee plan");
        self.repository
            .insert_fee_plan(&plan)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_fee_plan(&self, id: FeePlanId) -> Result<FeePlan, PortError> {
        self.repository.get_fee_plan(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_member_fee_plans(&self, member_id: MemberId) -> Result<Vec<FeePlan>, PortError> {
        self.repository
            .list_member_fee_plans(member_id)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_provider_fee_plans(
        &self,
        provider_id: ProviderId,
        query: FeePlanQuery,
    ) -> Result<Vec<FeePlan>, PortError> {
        self.repository
            .list_provider_fee_plans(provider_id, &query)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, plan), fields(fee_plan_id = %plan.id))]
    async fn update_fee_plan(&self, plan: FeePlan) -> Result<FeePlan, PortError> {
        self.repository
            .update_fee_plan(&plan)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn delete_fee_plan(&self, id: FeePlanId) -> Result<(), PortError> {
        self.repository.delete_fee_plan(id).await.map_err(db_to_port_error)
    }
}

#[async_trait]
impl OrderPort for PostgresBillingAdapter {
    #[instrument(skip(self, order), fields(order_id = %order.id, gateway_order_id = %order.gateway_order_id))]
    async fn create_order(&self, order: Order) -> Result<Order, PortError> {
        self.repository.insert_order(&order).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        self.repository.get_order(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Order, PortError> {
        self.repository
            .get_order_by_gateway_id(gateway_order_id)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, status = order.status.as_str()))]
    async fn update_order(&self, order: Order) -> Result<Order, PortError> {
        self.repository.update_order(&order).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_consumer_orders(&self, consumer_id: ConsumerId) -> Result<Vec<Order>, PortError> {
        self.repository
            .list_consumer_orders(consumer_id)
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl TransactionPort for PostgresBillingAdapter {
    #[instrument(skip(self))]
    async fn list_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<Transaction>, PortError> {
        self.repository
            .list_transactions(&query)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn find_fee_plan_transaction(
        &self,
        fee_plan_id: FeePlanId,
    ) -> Result<Option<Transaction>, PortError> {
        self.repository
            .find_fee_plan_transaction(fee_plan_id)
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl SettlementPort for PostgresBillingAdapter {
    #[instrument(skip(self, settlement), fields(fee_plan_id = %settlement.fee_plan_id, mode = settlement.mode.as_str()))]
    async fn settle(&self, settlement: Settlement) -> Result<FeePlan, PortError> {
        let plan = self
            .repository
            .settle(&settlement)
            .await
            .map_err(db_to_port_error)?;
        info!(transaction_id = %settlement.transaction.id, "Fee plan settled");
        Ok(plan)
    }
}
