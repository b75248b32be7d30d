//! Accounts domain ports
//!
//! Each port is the storage contract for one aggregate. The Postgres adapters
//! in `infra_db` implement them for production; `mock::MockAccountStore`
//! implements all of them in memory for tests and local development.
//!
//! Uniqueness rules (phone and email per account table, member reference per
//! provider, one membership per consumer/member pair) are enforced by the
//! adapter and surface as `PortError::Conflict`.
//!
//! ```rust,ignore
//! let provider = providers.create_provider(Provider::new(name, phone, email)).await?;
//! let members = members.list_members(provider.id).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{
    ConsumerId, DomainPort, EmailAddress, HealthCheckable, MemberId, MembershipId, ModeratorId,
    PhoneNumber, PortError, ProviderId,
};

use crate::consumer::Consumer;
use crate::member::Member;
use crate::membership::Membership;
use crate::moderator::Moderator;
use crate::provider::{Provider, ProviderQuery};

/// Storage for provider accounts
#[async_trait]
pub trait ProviderPort: DomainPort + HealthCheckable {
    /// Inserts a provider; Conflict when phone or email is taken
    async fn create_provider(&self, provider: Provider) -> Result<Provider, PortError>;

    async fn get_provider(&self, id: ProviderId) -> Result<Provider, PortError>;

    async fn find_provider_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Provider>, PortError>;

    async fn find_provider_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Provider>, PortError>;

    /// Lists providers ordered by name
    async fn list_providers(&self, query: ProviderQuery) -> Result<Vec<Provider>, PortError>;

    /// Persists a modified provider
    async fn update_provider(&self, provider: Provider) -> Result<Provider, PortError>;

    async fn set_provider_verified(
        &self,
        id: ProviderId,
        verified: bool,
    ) -> Result<Provider, PortError>;
}

/// Storage for consumer accounts
#[async_trait]
pub trait ConsumerPort: DomainPort + HealthCheckable {
    async fn create_consumer(&self, consumer: Consumer) -> Result<Consumer, PortError>;

    async fn get_consumer(&self, id: ConsumerId) -> Result<Consumer, PortError>;

    async fn find_consumer_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Consumer>, PortError>;

    async fn find_consumer_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Consumer>, PortError>;

    async fn update_consumer(&self, consumer: Consumer) -> Result<Consumer, PortError>;
}

/// Storage for moderator accounts
#[async_trait]
pub trait ModeratorPort: DomainPort + HealthCheckable {
    async fn create_moderator(&self, moderator: Moderator) -> Result<Moderator, PortError>;

    async fn get_moderator(&self, id: ModeratorId) -> Result<Moderator, PortError>;

    async fn find_moderator_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Moderator>, PortError>;

    async fn list_moderators(&self) -> Result<Vec<Moderator>, PortError>;

    /// Conflict when deactivating would leave no active moderator
    async fn set_moderator_active(
        &self,
        id: ModeratorId,
        is_active: bool,
    ) -> Result<Moderator, PortError>;
}

/// Storage for member records
#[async_trait]
pub trait MemberPort: DomainPort + HealthCheckable {
    /// Inserts a member; Conflict when the reference is taken within the provider
    async fn create_member(&self, member: Member) -> Result<Member, PortError>;

    async fn get_member(&self, id: MemberId) -> Result<Member, PortError>;

    /// Members of one provider ordered by reference
    async fn list_members(&self, provider_id: ProviderId) -> Result<Vec<Member>, PortError>;

    /// Looks up a member by its (normalized) reference within a provider
    async fn find_member_by_reference(
        &self,
        provider_id: ProviderId,
        reference: &str,
    ) -> Result<Option<Member>, PortError>;

    async fn update_member(&self, member: Member) -> Result<Member, PortError>;

    async fn delete_member(&self, id: MemberId) -> Result<(), PortError>;

    /// Fetches several members; missing ids are skipped
    async fn get_members(&self, ids: Vec<MemberId>) -> Result<Vec<Member>, PortError>;
}

/// Storage for consumer/member links
#[async_trait]
pub trait MembershipPort: DomainPort + HealthCheckable {
    /// Inserts a membership; Conflict when the pair already exists
    async fn create_membership(&self, membership: Membership) -> Result<Membership, PortError>;

    async fn get_membership(&self, id: MembershipId) -> Result<Membership, PortError>;

    async fn list_memberships(&self, consumer_id: ConsumerId)
        -> Result<Vec<Membership>, PortError>;

    async fn delete_membership(&self, id: MembershipId) -> Result<(), PortError>;

    /// The link between a consumer and a member, if any
    async fn find_membership(
        &self,
        consumer_id: ConsumerId,
        member_id: MemberId,
    ) -> Result<Option<Membership>, PortError>;
}

/// In-memory implementation of every accounts port
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default)]
    struct Tables {
        providers: HashMap<ProviderId, Provider>,
        consumers: HashMap<ConsumerId, Consumer>,
        moderators: HashMap<ModeratorId, Moderator>,
        members: HashMap<MemberId, Member>,
        memberships: HashMap<MembershipId, Membership>,
    }

    /// In-memory account store
    #[derive(Debug, Default, Clone)]
    pub struct MockAccountStore {
        tables: Arc<RwLock<Tables>>,
    }

    impl MockAccountStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockAccountStore {}

    #[async_trait]
    impl HealthCheckable for MockAccountStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-account-store")
        }
    }

    #[async_trait]
    impl ProviderPort for MockAccountStore {
        async fn create_provider(&self, provider: Provider) -> Result<Provider, PortError> {
            let mut tables = self.tables.write().await;
            if tables
                .providers
                .values()
                .any(|p| p.phone == provider.phone || p.email == provider.email)
            {
                return Err(PortError::conflict("Provider already exists"));
            }
            tables.providers.insert(provider.id, provider.clone());
            Ok(provider)
        }

        async fn get_provider(&self, id: ProviderId) -> Result<Provider, PortError> {
            self.tables
                .read()
                .await
                .providers
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Provider", id))
        }

        async fn find_provider_by_phone(
            &self,
            phone: &PhoneNumber,
        ) -> Result<Option<Provider>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables.providers.values().find(|p| &p.phone == phone).cloned())
        }

        async fn find_provider_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Option<Provider>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables.providers.values().find(|p| &p.email == email).cloned())
        }

        async fn list_providers(&self, query: ProviderQuery) -> Result<Vec<Provider>, PortError> {
            let tables = self.tables.read().await;
            let mut results: Vec<_> = tables
                .providers
                .values()
                .filter(|p| query.matches(p))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.name.cmp(&b.name));

            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn update_provider(&self, provider: Provider) -> Result<Provider, PortError> {
            let mut tables = self.tables.write().await;
            if !tables.providers.contains_key(&provider.id) {
                return Err(PortError::not_found("Provider", provider.id));
            }
            if tables
                .providers
                .values()
                .any(|p| p.id != provider.id && p.email == provider.email)
            {
                return Err(PortError::conflict("Provider email already exists"));
            }
            tables.providers.insert(provider.id, provider.clone());
            Ok(provider)
        }

        async fn set_provider_verified(
            &self,
            id: ProviderId,
            verified: bool,
        ) -> Result<Provider, PortError> {
            let mut tables = self.tables.write().await;
            let provider = tables
                .providers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Provider", id))?;
            provider.verified = verified;
            provider.updated_at = Utc::now();
            Ok(provider.clone())
        }
    }

    #[async_trait]
    impl ConsumerPort for MockAccountStore {
        async fn create_consumer(&self, consumer: Consumer) -> Result<Consumer, PortError> {
            let mut tables = self.tables.write().await;
            let taken = tables.consumers.values().any(|c| {
                c.phone == consumer.phone || (c.email.is_some() && c.email == consumer.email)
            });
            if taken {
                return Err(PortError::conflict("Consumer already exists"));
            }
            tables.consumers.insert(consumer.id, consumer.clone());
            Ok(consumer)
        }

        async fn get_consumer(&self, id: ConsumerId) -> Result<Consumer, PortError> {
            self.tables
                .read()
                .await
                .consumers
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Consumer", id))
        }

        async fn find_consumer_by_phone(
            &self,
            phone: &PhoneNumber,
        ) -> Result<Option<Consumer>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables.consumers.values().find(|c| &c.phone == phone).cloned())
        }

        async fn find_consumer_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Option<Consumer>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables
                .consumers
                .values()
                .find(|c| c.email.as_ref() == Some(email))
                .cloned())
        }

        async fn update_consumer(&self, consumer: Consumer) -> Result<Consumer, PortError> {
            let mut tables = self.tables.write().await;
            if !tables.consumers.contains_key(&consumer.id) {
                return Err(PortError::not_found("Consumer", consumer.id));
            }
            let taken = tables.consumers.values().any(|c| {
                c.id != consumer.id && c.email.is_some() && c.email == consumer.email
            });
            if taken {
                return Err(PortError::conflict("Consumer email already exists"));
            }
            tables.consumers.insert(consumer.id, consumer.clone());
            Ok(consumer)
        }
    }

    #[async_trait]
    impl ModeratorPort for MockAccountStore {
        async fn create_moderator(&self, moderator: Moderator) -> Result<Moderator, PortError> {
            let mut tables = self.tables.write().await;
            if tables
                .moderators
                .values()
                .any(|m| m.phone == moderator.phone || m.email == moderator.email)
            {
                return Err(PortError::conflict("Moderator already exists"));
            }
            tables.moderators.insert(moderator.id, moderator.clone());
            Ok(moderator)
        }

        async fn get_moderator(&self, id: ModeratorId) -> Result<Moderator, PortError> {
            self.tables
                .read()
                .await
                .moderators
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Moderator", id))
        }

        async fn find_moderator_by_phone(
            &self,
            phone: &PhoneNumber,
        ) -> Result<Option<Moderator>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables.moderators.values().find(|m| &m.phone == phone).cloned())
        }

        async fn list_moderators(&self) -> Result<Vec<Moderator>, PortError> {
            let tables = self.tables.read().await;
            let mut results: Vec<_> = tables.moderators.values().cloned().collect();
            results.sort_by_key(|m| m.created_at);
            Ok(results)
        }

        async fn set_moderator_active(
            &self,
            id: ModeratorId,
            is_active: bool,
        ) -> Result<Moderator, PortError> {
            let mut tables = self.tables.write().await;
            let others_active = tables
                .moderators
                .values()
                .any(|m| m.is_active && m.id != id);
            let moderator = tables
                .moderators
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Moderator", id))?;
            if !is_active && !others_active {
                return Err(PortError::conflict("At least one moderator must stay active"));
            }
            moderator.is_active = is_active;
            Ok(moderator.clone())
        }
    }

    #[async_trait]
    impl MemberPort for MockAccountStore {
        async fn create_member(&self, member: Member) -> Result<Member, PortError> {
            let mut tables = self.tables.write().await;
            if !tables.providers.contains_key(&member.provider_id) {
                return Err(PortError::not_found("Provider", member.provider_id));
            }
            if tables
                .members
                .values()
                .any(|m| m.provider_id == member.provider_id && m.reference == member.reference)
            {
                return Err(PortError::conflict(format!(
                    "Member reference {} already exists",
                    member.reference
                )));
            }
            tables.members.insert(member.id, member.clone());
            Ok(member)
        }

        async fn get_member(&self, id: MemberId) -> Result<Member, PortError> {
            self.tables
                .read()
                .await
                .members
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Member", id))
        }

        async fn list_members(&self, provider_id: ProviderId) -> Result<Vec<Member>, PortError> {
            let tables = self.tables.read().await;
            let mut results: Vec<_> = tables
                .members
                .values()
                .filter(|m| m.provider_id == provider_id)
                .cloned()
                .collect();
            results.sort_by(|a, b| a.reference.cmp(&b.reference));
            Ok(results)
        }

        async fn find_member_by_reference(
            &self,
            provider_id: ProviderId,
            reference: &str,
        ) -> Result<Option<Member>, PortError> {
            let reference = crate::member::normalize_reference(reference);
            let tables = self.tables.read().await;
            Ok(tables
                .members
                .values()
                .find(|m| m.provider_id == provider_id && m.reference == reference)
                .cloned())
        }

        async fn update_member(&self, member: Member) -> Result<Member, PortError> {
            let mut tables = self.tables.write().await;
            if !tables.members.contains_key(&member.id) {
                return Err(PortError::not_found("Member", member.id));
            }
            if tables.members.values().any(|m| {
                m.id != member.id
                    && m.provider_id == member.provider_id
                    && m.reference == member.reference
            }) {
                return Err(PortError::conflict(format!(
                    "Member reference {} already exists",
                    member.reference
                )));
            }
            tables.members.insert(member.id, member.clone());
            Ok(member)
        }

        async fn delete_member(&self, id: MemberId) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            tables
                .members
                .remove(&id)
                .ok_or_else(|| PortError::not_found("Member", id))?;
            tables.memberships.retain(|_, m| m.member_id != id);
            Ok(())
        }

        async fn get_members(&self, ids: Vec<MemberId>) -> Result<Vec<Member>, PortError> {
            let tables = self.tables.read().await;
            Ok(ids
                .into_iter()
                .filter_map(|id| tables.members.get(&id).cloned())
                .collect())
        }
    }

    #[async_trait]
    impl MembershipPort for MockAccountStore {
        async fn create_membership(&self, membership: Membership) -> Result<Membership, PortError> {
            let mut tables = self.tables.write().await;
            if !tables.members.contains_key(&membership.member_id) {
                return Err(PortError::not_found("Member", membership.member_id));
            }
            if tables.memberships.values().any(|m| {
                m.consumer_id == membership.consumer_id && m.member_id == membership.member_id
            }) {
                return Err(PortError::conflict("Membership already claimed"));
            }
            tables.memberships.insert(membership.id, membership.clone());
            Ok(membership)
        }

        async fn get_membership(&self, id: MembershipId) -> Result<Membership, PortError> {
            self.tables
                .read()
                .await
                .memberships
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Membership", id))
        }

        async fn list_memberships(
            &self,
            consumer_id: ConsumerId,
        ) -> Result<Vec<Membership>, PortError> {
            let tables = self.tables.read().await;
            let mut results: Vec<_> = tables
                .memberships
                .values()
                .filter(|m| m.consumer_id == consumer_id)
                .cloned()
                .collect();
            results.sort_by_key(|m| m.created_at);
            Ok(results)
        }

        async fn delete_membership(&self, id: MembershipId) -> Result<(), PortError> {
            self.tables
                .write()
                .await
                .memberships
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Membership", id))
        }

        async fn find_membership(
            &self,
            consumer_id: ConsumerId,
            member_id: MemberId,
        ) -> Result<Option<Membership>, PortError> {
            let tables = self.tables.read().await;
            Ok(tables
                .memberships
                .values()
                .find(|m| m.consumer_id == consumer_id && m.member_id == member_id)
                .cloned())
        }
    }
}
