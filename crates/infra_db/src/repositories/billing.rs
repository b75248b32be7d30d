//! Billing repository implementation
//!
//! Fee plans, gateway orders and transactions. `settle` is the one
//! multi-table write and runs inside a single database transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use core_kernel::{
    ConsumerId, Currency, FeePlanId, MemberId, Money, OrderId, ProviderId, TransactionId,
};
use domain_billing::{
    FeePlan, FeePlanQuery, FeePlanStatus, Order, OrderStatus, PaymentMode, Settlement,
    Transaction, TransactionQuery,
};

use crate::error::DatabaseError;

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    code.parse::<Currency>()
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))
}

#[derive(Debug, Clone, FromRow)]
pub struct FeePlanRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub due_date: NaiveDate,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_via: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FeePlanRow> for FeePlan {
    type Error = DatabaseError;

    fn try_from(row: FeePlanRow) -> Result<Self, Self::Error> {
        Ok(FeePlan {
            id: FeePlanId::from(row.id),
            member_id: MemberId::from(row.member_id),
            provider_id: ProviderId::from(row.provider_id),
            title: row.title,
            description: row.description,
            amount: Money::new(row.amount, parse_currency(&row.currency)?),
            due_date: row.due_date,
            status: FeePlanStatus::from_db(&row.status),
            paid_at: row.paid_at,
            paid_via: row.paid_via.as_deref().map(PaymentMode::from_db),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub gateway_order_id: String,
    pub fee_plan_id: Uuid,
    pub consumer_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId::from(row.id),
            gateway_order_id: row.gateway_order_id,
            fee_plan_id: FeePlanId::from(row.fee_plan_id),
            consumer_id: ConsumerId::from(row.consumer_id),
            amount_minor: row.amount_minor,
            currency: parse_currency(&row.currency)?,
            status: OrderStatus::from_db(&row.status),
            gateway_payment_id: row.gateway_payment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub fee_plan_id: Uuid,
    pub provider_id: Uuid,
    pub member_id: Uuid,
    pub consumer_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub mode: String,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DatabaseError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: TransactionId::from(row.id),
            fee_plan_id: FeePlanId::from(row.fee_plan_id),
            provider_id: ProviderId::from(row.provider_id),
            member_id: MemberId::from(row.member_id),
            consumer_id: row.consumer_id.map(ConsumerId::from),
            order_id: row.order_id.map(OrderId::from),
            amount: Money::new(row.amount, parse_currency(&row.currency)?),
            mode: PaymentMode::from_db(&row.mode),
            reference: row.reference,
            created_at: row.created_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, DatabaseError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Repository for the billing tables
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Fee plans
    // ------------------------------------------------------------------

    pub async fn insert_fee_plan(&self, plan: &FeePlan) -> Result<FeePlan, DatabaseError> {
        let row = sqlx::query_as::<_, FeePlanRow>(
            r#"
            INSERT INTO fee_plans (
                id, member_id, provider_id, title, description, amount, currency,
                due_date, status, paid_at, paid_via, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(plan.id))
        .bind(Uuid::from(plan.member_id))
        .bind(Uuid::from(plan.provider_id))
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.amount.amount())
        .bind(plan.amount.currency().code())
        .bind(plan.due_date)
        .bind(plan.status.as_str())
        .bind(plan.paid_at)
        .bind(plan.paid_via.map(|m| m.as_str()))
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    pub async fn get_fee_plan(&self, id: FeePlanId) -> Result<FeePlan, DatabaseError> {
        sqlx::query_as::<_, FeePlanRow>("SELECT * FROM fee_plans WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("FeePlan", id))?
            .try_into()
    }

    pub async fn list_member_fee_plans(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<FeePlan>, DatabaseError> {
        let rows = sqlx::query_as::<_, FeePlanRow>(
            "SELECT * FROM fee_plans WHERE member_id = $1 ORDER BY due_date, created_at",
        )
        .bind(Uuid::from(member_id))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    pub async fn list_provider_fee_plans(
        &self,
        provider_id: ProviderId,
        query: &FeePlanQuery,
    ) -> Result<Vec<FeePlan>, DatabaseError> {
        let rows = sqlx::query_as::<_, FeePlanRow>(
            r#"
            SELECT * FROM fee_plans
            WHERE provider_id = $1
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::DATE IS NULL OR (status = 'DUE' AND due_date < $3))
              AND ($4::UUID IS NULL OR member_id = $4)
            ORDER BY due_date, created_at
            "#,
        )
        .bind(Uuid::from(provider_id))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.overdue_on)
        .bind(query.member_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    /// Updates the editable columns of a DUE plan
    pub async fn update_fee_plan(&self, plan: &FeePlan) -> Result<FeePlan, DatabaseError> {
        let row = sqlx::query_as::<_, FeePlanRow>(
            r#"
            UPDATE fee_plans
            SET title = $2, description = $3, amount = $4, currency = $5,
                due_date = $6, updated_at = $7
            WHERE id = $1 AND status = 'DUE'
            RETURNING *
            "#,
        )
        .bind(Uuid::from(plan.id))
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.amount.amount())
        .bind(plan.amount.currency().code())
        .bind(plan.due_date)
        .bind(plan.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(self.explain_missing_due_plan(plan.id).await),
        }
    }

    pub async fn delete_fee_plan(&self, id: FeePlanId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM fee_plans WHERE id = $1 AND status = 'DUE'")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(self.explain_missing_due_plan(id).await);
        }
        Ok(())
    }

    /// A guarded write touched nothing: either the plan is gone or it is PAID
    async fn explain_missing_due_plan(&self, id: FeePlanId) -> DatabaseError {
        match self.get_fee_plan(id).await {
            Ok(_) => DatabaseError::Conflict(format!("Fee plan {} is already paid", id)),
            Err(e) => e,
        }
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    pub async fn insert_order(&self, order: &Order) -> Result<Order, DatabaseError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (
                id, gateway_order_id, fee_plan_id, consumer_id, amount_minor,
                currency, status, gateway_payment_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(order.id))
        .bind(&order.gateway_order_id)
        .bind(Uuid::from(order.fee_plan_id))
        .bind(Uuid::from(order.consumer_id))
        .bind(order.amount_minor)
        .bind(order.currency.code())
        .bind(order.status.as_str())
        .bind(&order.gateway_payment_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, DatabaseError> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Order", id))?
            .try_into()
    }

    pub async fn get_order_by_gateway_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Order, DatabaseError> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE gateway_order_id = $1")
            .bind(gateway_order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Order", gateway_order_id))?
            .try_into()
    }

    pub async fn update_order(&self, order: &Order) -> Result<Order, DatabaseError> {
        sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = $2, gateway_payment_id = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::from(order.id))
        .bind(order.status.as_str())
        .bind(&order.gateway_payment_id)
        .bind(order.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Order", order.id))?
        .try_into()
    }

    pub async fn list_consumer_orders(
        &self,
        consumer_id: ConsumerId,
    ) -> Result<Vec<Order>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE consumer_id = $1 ORDER BY created_at DESC",
        )
        .bind(Uuid::from(consumer_id))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    pub async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, DatabaseError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE ($1::UUID IS NULL OR provider_id = $1)
              AND ($2::UUID IS NULL OR consumer_id = $2)
              AND ($3::UUID IS NULL OR member_id = $3)
              AND ($4::TEXT IS NULL OR mode = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(query.provider_id.map(Uuid::from))
        .bind(query.consumer_id.map(Uuid::from))
        .bind(query.member_id.map(Uuid::from))
        .bind(query.mode.map(|m| m.as_str()))
        .bind(query.limit.map(i64::from))
        .bind(i64::from(query.offset.unwrap_or(0)))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    pub async fn find_fee_plan_transaction(
        &self,
        fee_plan_id: FeePlanId,
    ) -> Result<Option<Transaction>, DatabaseError> {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE fee_plan_id = $1")
            .bind(Uuid::from(fee_plan_id))
            .fetch_optional(&self.pool)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    /// Marks the plan PAID, stores the paid order and inserts the transaction
    ///
    /// The fee plan row (and the order row, for online payments) is locked
    /// with `FOR UPDATE` so two concurrent settlements of one plan serialize;
    /// the loser sees the PAID status and gets a conflict.
    pub async fn settle(&self, settlement: &Settlement) -> Result<FeePlan, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut plan: FeePlan =
            sqlx::query_as::<_, FeePlanRow>("SELECT * FROM fee_plans WHERE id = $1 FOR UPDATE")
                .bind(Uuid::from(settlement.fee_plan_id))
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DatabaseError::not_found("FeePlan", settlement.fee_plan_id))?
                .try_into()?;

        plan.mark_paid(settlement.mode)
            .map_err(|e| DatabaseError::Conflict(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE fee_plans
            SET status = $2, paid_at = $3, paid_via = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(plan.id))
        .bind(plan.status.as_str())
        .bind(plan.paid_at)
        .bind(plan.paid_via.map(|m| m.as_str()))
        .bind(plan.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(ref order) = settlement.order {
            Self::store_paid_order(&mut tx, order).await?;
        }

        let txn = &settlement.transaction;
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, fee_plan_id, provider_id, member_id, consumer_id, order_id,
                amount, currency, mode, reference, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::from(txn.id))
        .bind(Uuid::from(txn.fee_plan_id))
        .bind(Uuid::from(txn.provider_id))
        .bind(Uuid::from(txn.member_id))
        .bind(txn.consumer_id.map(Uuid::from))
        .bind(txn.order_id.map(Uuid::from))
        .bind(txn.amount.amount())
        .bind(txn.amount.currency().code())
        .bind(txn.mode.as_str())
        .bind(&txn.reference)
        .bind(txn.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(plan)
    }

    async fn store_paid_order(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), DatabaseError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(Uuid::from(order.id))
                .fetch_optional(&mut **tx)
                .await?;

        match status.as_deref().map(OrderStatus::from_db) {
            None => return Err(DatabaseError::not_found("Order", order.id)),
            Some(OrderStatus::Paid) => {
                return Err(DatabaseError::Conflict(format!(
                    "Order {} is already paid",
                    order.id
                )))
            }
            Some(_) => {}
        }

        sqlx::query(
            "UPDATE orders SET status = $2, gateway_payment_id = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(Uuid::from(order.id))
        .bind(order.status.as_str())
        .bind(&order.gateway_payment_id)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn plan_row(status: &str, currency: &str) -> FeePlanRow {
        let now = Utc::now();
        FeePlanRow {
            id: Uuid::now_v7(),
            member_id: Uuid::now_v7(),
            provider_id: Uuid::now_v7(),
            title: "Annual fee".to_string(),
            description: None,
            amount: dec!(2500.00),
            currency: currency.to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            status: status.to_string(),
            paid_at: None,
            paid_via: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fee_plan_row_decodes() {
        let plan = FeePlan::try_from(plan_row("DUE", "INR")).unwrap();
        assert_eq!(plan.status, FeePlanStatus::Due);
        assert_eq!(plan.amount, Money::inr(dec!(2500)));
    }

    #[test]
    fn test_unknown_currency_is_corrupt() {
        let err = FeePlan::try_from(plan_row("DUE", "XYZ")).unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptRow(_)));
    }
}
