//! Accounts repository implementation
//!
//! SQL for providers, consumers, moderators, members and memberships. Rows
//! are decoded with `FromRow` and converted into the domain entities here so
//! the adapters never see raw columns.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{
    ConsumerId, EmailAddress, MemberId, MembershipId, ModeratorId, PhoneNumber, ProviderId,
};
use domain_accounts::{
    Consumer, Member, Membership, Moderator, Provider, ProviderCategory, ProviderQuery,
};

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
    pub category: String,
    pub logo_url: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Provider {
            id: ProviderId::from(row.id),
            name: row.name,
            phone: PhoneNumber::from_normalized(row.phone),
            email: EmailAddress::from_normalized(row.email),
            address: row.address,
            category: ProviderCategory::from_db(&row.category),
            logo_url: row.logo_url,
            verified: row.verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ConsumerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConsumerRow> for Consumer {
    fn from(row: ConsumerRow) -> Self {
        Consumer {
            id: ConsumerId::from(row.id),
            name: row.name,
            phone: PhoneNumber::from_normalized(row.phone),
            email: row.email.map(EmailAddress::from_normalized),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ModeratorRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ModeratorRow> for Moderator {
    fn from(row: ModeratorRow) -> Self {
        Moderator {
            id: ModeratorId::from(row.id),
            name: row.name,
            phone: PhoneNumber::from_normalized(row.phone),
            email: EmailAddress::from_normalized(row.email),
            is_active: row.is_active,
            created_by: row.created_by.map(ModeratorId::from),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub reference: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: MemberId::from(row.id),
            provider_id: ProviderId::from(row.provider_id),
            name: row.name,
            phone: PhoneNumber::from_normalized(row.phone),
            email: row.email.map(EmailAddress::from_normalized),
            reference: row.reference,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub member_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Membership {
            id: MembershipId::from(row.id),
            consumer_id: ConsumerId::from(row.consumer_id),
            member_id: MemberId::from(row.member_id),
            created_at: row.created_at,
        }
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for account tables
#[derive(Debug, Clone)]
pub struct AccountsRepository {
    pool: PgPool,
}

impl AccountsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------

    pub async fn insert_provider(&self, provider: &Provider) -> Result<Provider, DatabaseError> {
        let row = sqlx::query_as::<_, ProviderRow>(
            r#"
            INSERT INTO providers (
                id, name, phone, email, address, category, logo_url,
                verified, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(provider.id))
        .bind(&provider.name)
        .bind(provider.phone.as_str())
        .bind(provider.email.as_str())
        .bind(&provider.address)
        .bind(provider.category.as_str())
        .bind(&provider.logo_url)
        .bind(provider.verified)
        .bind(provider.created_at)
        .bind(provider.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_provider(&self, id: ProviderId) -> Result<Provider, DatabaseError> {
        sqlx::query_as::<_, ProviderRow>("SELECT * FROM providers WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .map(Provider::from)
            .ok_or_else(|| DatabaseError::not_found("Provider", id))
    }

    pub async fn find_provider_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Provider>, DatabaseError> {
        let row = sqlx::query_as::<_, ProviderRow>("SELECT * FROM providers WHERE phone = $1")
            .bind(phone.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Provider::from))
    }

    pub async fn find_provider_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Provider>, DatabaseError> {
        let row = sqlx::query_as::<_, ProviderRow>("SELECT * FROM providers WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Provider::from))
    }

    pub async fn list_providers(&self, query: &ProviderQuery) -> Result<Vec<Provider>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT * FROM providers
            WHERE ($1::BOOLEAN IS NULL OR verified = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
            ORDER BY name, created_at
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.verified)
        .bind(query.search.as_deref().map(like_pattern))
        .bind(query.limit.map(i64::from))
        .bind(i64::from(query.offset.unwrap_or(0)))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Provider::from).collect())
    }

    pub async fn update_provider(&self, provider: &Provider) -> Result<Provider, DatabaseError> {
        sqlx::query_as::<_, ProviderRow>(
            r#"
            UPDATE providers
            SET name = $2, email = $3, address = $4, category = $5,
                logo_url = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::from(provider.id))
        .bind(&provider.name)
        .bind(provider.email.as_str())
        .bind(&provider.address)
        .bind(provider.category.as_str())
        .bind(&provider.logo_url)
        .bind(provider.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .map(Provider::from)
        .ok_or_else(|| DatabaseError::not_found("Provider", provider.id))
    }

    pub async fn set_provider_verified(
        &self,
        id: ProviderId,
        verified: bool,
    ) -> Result<Provider, DatabaseError> {
        sqlx::query_as::<_, ProviderRow>(
            "UPDATE providers SET verified = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(Uuid::from(id))
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?
        .map(Provider::from)
        .ok_or_else(|| DatabaseError::not_found("Provider", id))
    }

    // ------------------------------------------------------------------
    // Consumers
    // ------------------------------------------------------------------

    pub async fn insert_consumer(&self, consumer: &Consumer) -> Result<Consumer, DatabaseError> {
        let row = sqlx::query_as::<_, ConsumerRow>(
            r#"
            INSERT INTO consumers (id, name, phone, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(consumer.id))
        .bind(&consumer.name)
        .bind(consumer.phone.as_str())
        .bind(consumer.email.as_ref().map(|e| e.as_str()))
        .bind(consumer.created_at)
        .bind(consumer.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_consumer(&self, id: ConsumerId) -> Result<Consumer, DatabaseError> {
        sqlx::query_as::<_, ConsumerRow>("SELECT * FROM consumers WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .map(Consumer::from)
            .ok_or_else(|| DatabaseError::not_found("Consumer", id))
    }

    pub async fn find_consumer_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Consumer>, DatabaseError> {
        let row = sqlx::query_as::<_, ConsumerRow>("SELECT * FROM consumers WHERE phone = $1")
            .bind(phone.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Consumer::from))
    }

    pub async fn find_consumer_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Consumer>, DatabaseError> {
        let row = sqlx::query_as::<_, ConsumerRow>("SELECT * FROM consumers WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Consumer::from))
    }

    pub async fn update_consumer(&self, consumer: &Consumer) -> Result<Consumer, DatabaseError> {
        sqlx::query_as::<_, ConsumerRow>(
            "UPDATE consumers SET name = $2, email = $3, updated_at = $4 WHERE id = $1 RETURNING *",
        )
        .bind(Uuid::from(consumer.id))
        .bind(&consumer.name)
        .bind(consumer.email.as_ref().map(|e| e.as_str()))
        .bind(consumer.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .map(Consumer::from)
        .ok_or_else(|| DatabaseError::not_found("Consumer", consumer.id))
    }

    // ------------------------------------------------------------------
    // Moderators
    // ------------------------------------------------------------------

    pub async fn insert_moderator(&self, moderator: &Moderator) -> Result<Moderator, DatabaseError> {
        let row = sqlx::query_as::<_, ModeratorRow>(
            r#"
            INSERT INTO moderators (id, name, phone, email, is_active, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(moderator.id))
        .bind(&moderator.name)
        .bind(moderator.phone.as_str())
        .bind(moderator.email.as_str())
        .bind(moderator.is_active)
        .bind(moderator.created_by.map(Uuid::from))
        .bind(moderator.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_moderator(&self, id: ModeratorId) -> Result<Moderator, DatabaseError> {
        sqlx::query_as::<_, ModeratorRow>("SELECT * FROM moderators WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .map(Moderator::from)
            .ok_or_else(|| DatabaseError::not_found("Moderator", id))
    }

    pub async fn find_moderator_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Moderator>, DatabaseError> {
        let row = sqlx::query_as::<_, ModeratorRow>("SELECT * FROM moderators WHERE phone = $1")
            .bind(phone.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Moderator::from))
    }

    pub async fn list_moderators(&self) -> Result<Vec<Moderator>, DatabaseError> {
        let rows = sqlx::query_as::<_, ModeratorRow>("SELECT * FROM moderators ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Moderator::from).collect())
    }

    /// Deactivation locks every active moderator row first, so two
    /// moderators switching each other off serialize and the second is
    /// refused rather than leaving nobody active.
    pub async fn set_moderator_active(
        &self,
        id: ModeratorId,
        is_active: bool,
    ) -> Result<Moderator, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if !is_active {
            let active: Vec<Uuid> =
                sqlx::query_scalar("SELECT id FROM moderators WHERE is_active FOR UPDATE")
                    .fetch_all(&mut *tx)
                    .await?;
            if !active.iter().any(|other| *other != Uuid::from(id)) {
                return Err(DatabaseError::Conflict(
                    "At least one moderator must stay active".to_string(),
                ));
            }
        }

        let moderator = sqlx::query_as::<_, ModeratorRow>(
            "UPDATE moderators SET is_active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(Uuid::from(id))
        .bind(is_active)
        .fetch_optional(&mut *tx)
        .await?
        .map(Moderator::from)
        .ok_or_else(|| DatabaseError::not_found("Moderator", id))?;

        tx.commit().await?;
        Ok(moderator)
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    pub async fn insert_member(&self, member: &Member) -> Result<Member, DatabaseError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO members (
                id, provider_id, name, phone, email, reference, notes,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(member.id))
        .bind(Uuid::from(member.provider_id))
        .bind(&member.name)
        .bind(member.phone.as_str())
        .bind(member.email.as_ref().map(|e| e.as_str()))
        .bind(&member.reference)
        .bind(&member.notes)
        .bind(member.created_at)
        .bind(member.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_member(&self, id: MemberId) -> Result<Member, DatabaseError> {
        sqlx::query_as::<_, MemberRow>("SELECT * FROM members WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .map(Member::from)
            .ok_or_else(|| DatabaseError::not_found("Member", id))
    }

    pub async fn list_members(&self, provider_id: ProviderId) -> Result<Vec<Member>, DatabaseError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT * FROM members WHERE provider_id = $1 ORDER BY reference",
        )
        .bind(Uuid::from(provider_id))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Member::from).collect())
    }

    pub async fn find_member_by_reference(
        &self,
        provider_id: ProviderId,
        reference: &str,
    ) -> Result<Option<Member>, DatabaseError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT * FROM members WHERE provider_id = $1 AND reference = $2",
        )
        .bind(Uuid::from(provider_id))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Member::from))
    }

    pub async fn update_member(&self, member: &Member) -> Result<Member, DatabaseError> {
        sqlx::query_as::<_, MemberRow>(
            r#"
            UPDATE members
            SET name = $2, phone = $3, email = $4, reference = $5, notes = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::from(member.id))
        .bind(&member.name)
        .bind(member.phone.as_str())
        .bind(member.email.as_ref().map(|e| e.as_str()))
        .bind(&member.reference)
        .bind(&member.notes)
        .bind(member.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .map(Member::from)
        .ok_or_else(|| DatabaseError::not_found("Member", member.id))
    }

    /// Deletes a member and, through the cascade, its memberships
    ///
    /// Fee plans restrict the delete, which surfaces as a foreign key
    /// violation.
    pub async fn delete_member(&self, id: MemberId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Member", id));
        }
        Ok(())
    }

    pub async fn get_members(&self, ids: &[MemberId]) -> Result<Vec<Member>, DatabaseError> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT * FROM members WHERE id = ANY($1) ORDER BY reference",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Member::from).collect())
    }

    // ------------------------------------------------------------------
    // Memberships
    // ------------------------------------------------------------------

    pub async fn insert_membership(
        &self,
        membership: &Membership,
    ) -> Result<Membership, DatabaseError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO memberships (id, consumer_id, member_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(membership.id))
        .bind(Uuid::from(membership.consumer_id))
        .bind(Uuid::from(membership.member_id))
        .bind(membership.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_membership(&self, id: MembershipId) -> Result<Membership, DatabaseError> {
        sqlx::query_as::<_, MembershipRow>("SELECT * FROM memberships WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .map(Membership::from)
            .ok_or_else(|| DatabaseError::not_found("Membership", id))
    }

    pub async fn list_memberships(
        &self,
        consumer_id: ConsumerId,
    ) -> Result<Vec<Membership>, DatabaseError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT * FROM memberships WHERE consumer_id = $1 ORDER BY created_at",
        )
        .bind(Uuid::from(consumer_id))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Membership::from).collect())
    }

    pub async fn delete_membership(&self, id: MembershipId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Membership", id));
        }
        Ok(())
    }

    pub async fn find_membership(
        &self,
        consumer_id: ConsumerId,
        member_id: MemberId,
    ) -> Result<Option<Membership>, DatabaseError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            "SELECT * FROM memberships WHERE consumer_id = $1 AND member_id = $2",
        )
        .bind(Uuid::from(consumer_id))
        .bind(Uuid::from(member_id))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Membership::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("st"), "%st%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_provider_row_decodes_contacts() {
        let now = Utc::now();
        let provider: Provider = ProviderRow {
            id: Uuid::now_v7(),
            name: "Sunrise Academy".to_string(),
            phone: "+919876543210".to_string(),
            email: "office@sunrise.edu".to_string(),
            address: None,
            category: "COACHING".to_string(),
            logo_url: None,
            verified: true,
            created_at: now,
            updated_at: now,
        }
        .into();

        assert_eq!(provider.phone.as_str(), "+919876543210");
        assert_eq!(provider.category, ProviderCategory::Coaching);
        assert!(provider.verified);
    }
}
