//! PostgreSQL Accounts Adapter
//!
//! Implements every accounts port (`ProviderPort`, `ConsumerPort`,
//! `ModeratorPort`, `MemberPort`, `MembershipPort`) on top of the
//! `AccountsRepository`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    ConsumerId, DomainPort, EmailAddress, HealthCheckResult, HealthCheckable, MemberId,
    MembershipId, ModeratorId, PhoneNumber, PortError, ProviderId,
};
use domain_accounts::{
    Consumer, ConsumerPort, Member, MemberPort, Membership, MembershipPort, Moderator,
    ModeratorPort, Provider, ProviderPort, ProviderQuery,
};

use crate::error::db_to_port_error;
use crate::repositories::AccountsRepository;

/// PostgreSQL-backed implementation of the accounts ports
#[derive(Debug, Clone)]
pub struct PostgresAccountsAdapter {
    repository: AccountsRepository,
    pool: PgPool,
}

impl PostgresAccountsAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AccountsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &AccountsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresAccountsAdapter {}

#[async_trait]
impl HealthCheckable for PostgresAccountsAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::probe(&self.pool, "postgres-accounts-adapter").await
    }
}

#[async_trait]
impl ProviderPort for PostgresAccountsAdapter {
    #[instrument(skip(self, provider), fields(provider_id = %provider.id))]
    async fn create_provider(&self, provider: Provider) -> Result<Provider, PortError> {
        debug!("Inserting provider");
        self.repository
            .insert_provider(&provider)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_provider(&self, id: ProviderId) -> Result<Provider, PortError> {
        self.repository.get_provider(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, phone))]
    async fn find_provider_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Provider>, PortError> {
        self.repository
            .find_provider_by_phone(phone)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, email))]
    async fn find_provider_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Provider>, PortError> {
        self.repository
            .find_provider_by_email(email)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_providers(&self, query: ProviderQuery) -> Result<Vec<Provider>, PortError> {
        self.repository
            .list_providers(&query)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, provider), fields(provider_id = %provider.id))]
    async fn update_provider(&self, provider: Provider) -> Result<Provider, PortError> {
        self.repository
            .update_provider(&provider)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn set_provider_verified(
        &self,
        id: ProviderId,
        verified: bool,
    ) -> Result<Provider, PortError> {
        self.repository
            .set_provider_verified(id, verified)
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl ConsumerPort for PostgresAccountsAdapter {
    #[instrument(skip(self, consumer), fields(consumer_id = %consumer.id))]
    async fn create_consumer(&self, consumer: Consumer) -> Result<Consumer, PortError> {
        debug!("Inserting consumer");
        self.repository
            .insert_consumer(&consumer)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_consumer(&self, id: ConsumerId) -> Result<Consumer, PortError> {
        self.repository.get_consumer(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, phone))]
    async fn find_consumer_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Consumer>, PortError> {
        self.repository
            .find_consumer_by_phone(phone)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, email))]
    async fn find_consumer_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Consumer>, PortError> {
        self.repository
            .find_consumer_by_email(email)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, consumer), fields(consumer_id = %consumer.id))]
    async fn update_consumer(&self, consumer: Consumer) -> Result<Consumer, PortError> {
        self.repository
            .update_consumer(&consumer)
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl ModeratorPort for PostgresAccountsAdapter {
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.id))]
    async fn create_moderator(&self, moderator: Moderator) -> Result<Moderator, PortError> {
        self.repository
            .insert_moderator(&moderator)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_moderator(&self, id: ModeratorId) -> Result<Moderator, PortError> {
        self.repository.get_moderator(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, phone))]
    async fn find_moderator_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Moderator>, PortError> {
        self.repository
            .find_moderator_by_phone(phone)
            .await
            .map_err(db_to_port_error)
    }

    async fn list_moderators(&self) -> Result<Vec<Moderator>, PortError> {
        self.repository.list_moderators().await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn set_moderator_active(
        &self,
        id: ModeratorId,
        is_active: bool,
    ) -> Result<Moderator, PortError> {
        self.repository
            .set_moderator_active(id, is_active)
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl MemberPort for PostgresAccountsAdapter {
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn create_member(&self, member: Member) -> Result<Member, PortError> {
        debug!("Inserting member");
        self.repository
            .insert_member(&member)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_member(&self, id: MemberId) -> Result<Member, PortError> {
        self.repository.get_member(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_members(&self, provider_id: ProviderId) -> Result<Vec<Member>, PortError> {
        self.repository
            .list_members(provider_id)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn find_member_by_reference(
        &self,
        provider_id: ProviderId,
        reference: &str,
    ) -> Result<Option<Member>, PortError> {
        self.repository
            .find_member_by_reference(provider_id, reference)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn update_member(&self, member: Member) -> Result<Member, PortError> {
        self.repository
            .update_member(&member)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn delete_member(&self, id: MemberId) -> Result<(), PortError> {
        self.repository.delete_member(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_members(&self, ids: Vec<MemberId>) -> Result<Vec<Member>, PortError> {
        self.repository.get_members(&ids).await.map_err(db_to_port_error)
    }
}

#[async_trait]
impl MembershipPort for PostgresAccountsAdapter {
    #[instrument(skip(self, membership), fields(consumer_id = %membership.consumer_id, member_id = %membership.member_id))]
    async fn create_membership(&self, membership: Membership) -> Result<Membership, PortError> {
        self.repository
            .insert_membership(&membership)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_membership(&self, id: MembershipId) -> Result<Membership, PortError> {
        self.repository.get_membership(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_memberships(
        &self,
        consumer_id: ConsumerId,
    ) -> Result<Vec<Membership>, PortError> {
        self.repository
            .list_memberships(consumer_id)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn delete_membership(&self, id: MembershipId) -> Result<(), PortError> {
        self.repository
            .delete_membership(id)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn find_membership(
        &self,
        consumer_id: ConsumerId,
        member_id: MemberId,
    ) -> Result<Option<Membership>, PortError> {
        self.repository
            .find_membership(consumer_id, member_id)
            .await
            .map_err(db_to_port_error)
    }
}
