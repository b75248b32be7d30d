//! Policy pages and support queries

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{EmailAddress, ModeratorId, PhoneNumber, PolicyId, QueryId, Role};
use domain_platform::{Policy, QueryStatus, SupportQuery};

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct PolicyRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        Policy {
            id: PolicyId::from(row.id),
            slug: row.slug,
            title: row.title,
            body: row.body,
            updated_by: row.updated_by.map(ModeratorId::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SupportQueryRow {
    pub id: Uuid,
    pub raised_by_role: Option<String>,
    pub raised_by_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub response: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SupportQueryRow> for SupportQuery {
    type Error = DatabaseError;

    fn try_from(row: SupportQueryRow) -> Result<Self, Self::Error> {
        let raised_by_role = row
            .raised_by_role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;

        Ok(SupportQuery {
            id: QueryId::from(row.id),
            raised_by_role,
            raised_by_id: row.raised_by_id,
            name: row.name,
            email: EmailAddress::from_normalized(row.email),
            phone: row.phone.map(PhoneNumber::from_normalized),
            subject: row.subject,
            message: row.message,
            status: QueryStatus::from_db(&row.status),
            response: row.response,
            resolved_by: row.resolved_by.map(ModeratorId::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PlatformRepository {
    pool: PgPool,
}

impl PlatformRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a policy or rewrites the content of the one sharing its slug
    pub async fn upsert_policy(&self, policy: &Policy) -> Result<Policy, DatabaseError> {
        let row = sqlx::query_as::<_, PolicyRow>(
            r#"
            INSERT INTO policies (id, slug, title, body, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO UPDATE
            SET title = EXCLUDED.title,
                body = EXCLUDED.body,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::from(policy.id))
        .bind(&policy.slug)
        .bind(&policy.title)
        .bind(&policy.body)
        .bind(policy.updated_by.map(Uuid::from))
        .bind(policy.created_at)
        .bind(policy.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_policy(&self, slug: &str) -> Result<Policy, DatabaseError> {
        sqlx::query_as::<_, PolicyRow>("SELECT * FROM policies WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(Policy::from)
            .ok_or_else(|| DatabaseError::not_found("Policy", slug))
    }

    pub async fn list_policies(&self) -> Result<Vec<Policy>, DatabaseError> {
        let rows = sqlx::query_as::<_, PolicyRow>("SELECT * FROM policies ORDER BY slug")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Policy::from).collect())
    }

    pub async fn delete_policy(&self, slug: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM policies WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Policy", slug));
        }
        Ok(())
    }

    pub async fn insert_query(&self, query: &SupportQuery) -> Result<SupportQuery, DatabaseError> {
        sqlx::query_as::<_, SupportQueryRow>(
            r#"
            INSERT INTO support_queries (
                id, raised_by_role, raised_by_id, name, email, phone, subject,
                message, status, response, resolved_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(query.id))
        .bind(query.raised_by_role.map(|r| r.as_str()))
        .bind(query.raised_by_id)
        .bind(&query.name)
        .bind(query.email.as_str())
        .bind(query.phone.as_ref().map(|p| p.as_str()))
        .bind(&query.subject)
        .bind(&query.message)
        .bind(query.status.as_str())
        .bind(&query.response)
        .bind(query.resolved_by.map(Uuid::from))
        .bind(query.created_at)
        .bind(query.updated_at)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    pub async fn get_query(&self, id: QueryId) -> Result<SupportQuery, DatabaseError> {
        sqlx::query_as::<_, SupportQueryRow>("SELECT * FROM support_queries WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Query", id))?
            .try_into()
    }

    pub async fn list_queries(
        &self,
        status: Option<QueryStatus>,
    ) -> Result<Vec<SupportQuery>, DatabaseError> {
        let rows = sqlx::query_as::<_, SupportQueryRow>(
            r#"
            SELECT * FROM support_queries
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SupportQuery::try_from).collect()
    }

    /// Persists the moderator-editable part of a query that is still OPEN
    ///
    /// Of two concurrent resolutions only the first lands; the other gets a
    /// conflict instead of overwriting the response.
    pub async fn update_query(&self, query: &SupportQuery) -> Result<SupportQuery, DatabaseError> {
        let row = sqlx::query_as::<_, SupportQueryRow>(
            r#"
            UPDATE support_queries
            SET status = $2, response = $3, resolved_by = $4, updated_at = $5
            WHERE id = $1 AND status = 'OPEN'
            RETURNING *
            "#,
        )
        .bind(Uuid::from(query.id))
        .bind(query.status.as_str())
        .bind(&query.response)
        .bind(query.resolved_by.map(Uuid::from))
        .bind(query.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => match self.get_query(query.id).await {
                Ok(_) => Err(DatabaseError::Conflict(format!(
                    "Query {} is already resolved",
                    query.id
                ))),
                Err(e) => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_row_with_bad_role_is_corrupt() {
        let now = Utc::now();
        let row = SupportQueryRow {
            id: Uuid::now_v7(),
            raised_by_role: Some("admin".to_string()),
            raised_by_id: None,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
            subject: "Hello".to_string(),
            message: "Hi".to_string(),
            status: "OPEN".to_string(),
            response: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            SupportQuery::try_from(row),
            Err(DatabaseError::CorruptRow(_))
        ));
    }
}
