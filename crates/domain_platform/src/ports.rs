//! Platform domain ports

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, PortError, QueryId};

use crate::policy::Policy;
use crate::query::{QueryStatus, SupportQuery};

#[async_trait]
pub trait PolicyPort: DomainPort + HealthCheckable {
    /// Inserts the policy, or replaces title and body of the one with the
    /// same slug (keeping its id and creation time)
    async fn upsert_policy(&self, policy: Policy) -> Result<Policy, PortError>;

    async fn get_policy(&self, slug: &str) -> Result<Policy, PortError>;

    /// All policies ordered by slug
    async fn list_policies(&self) -> Result<Vec<Policy>, PortError>;

    async fn delete_policy(&self, slug: &str) -> Result<(), PortError>;
}

#[async_trait]
pub trait QueryPort: DomainPort + HealthCheckable {
    async fn create_query(&self, query: SupportQuery) -> Result<SupportQuery, PortError>;

    async fn get_query(&self, id: QueryId) -> Result<SupportQuery, PortError>;

    /// Queries newest first, optionally filtered by status
    async fn list_queries(&self, status: Option<QueryStatus>)
        -> Result<Vec<SupportQuery>, PortError>;

    async fn update_query(&self, query: SupportQuery) -> Result<SupportQuery, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory policy and query store
    #[derive(Debug, Default, Clone)]
    pub struct MockPlatformStore {
        policies: Arc<RwLock<BTreeMap<String, Policy>>>,
        queries: Arc<RwLock<HashMap<QueryId, SupportQuery>>>,
    }

    impl MockPlatformStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockPlatformStore {}

    #[async_trait]
    impl HealthCheckable for MockPlatformStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-platform-store")
        }
    }

    #[async_trait]
    impl PolicyPort for MockPlatformStore {
        async fn upsert_policy(&self, policy: Policy) -> Result<Policy, PortError> {
            let mut policies = self.policies.write().await;
            let stored = match policies.get(&policy.slug) {
                Some(existing) => Policy {
                    id: existing.id,
                    created_at: existing.created_at,
                    ..policy
                },
                None => policy,
            };
            policies.insert(stored.slug.clone(), stored.clone());
            Ok(stored)
        }

        async fn get_policy(&self, slug: &str) -> Result<Policy, PortError> {
            self.policies
                .read()
                .await
                .get(slug)
                .cloned()
                .ok_or_else(|| PortError::not_found("Policy", slug))
        }

        async fn list_policies(&self) -> Result<Vec<Policy>, PortError> {
            Ok(self.policies.read().await.values().cloned().collect())
        }

        async fn delete_policy(&self, slug: &str) -> Result<(), PortError> {
            self.policies
                .write()
                .await
                .remove(slug)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Policy", slug))
        }
    }

    #[async_trait]
    impl QueryPort for MockPlatformStore {
        async fn create_query(&self, query: SupportQuery) -> Result<SupportQuery, PortError> {
            self.queries.write().await.insert(query.id, query.clone());
            Ok(query)
        }

        async fn get_query(&self, id: QueryId) -> Result<SupportQuery, PortError> {
            self.queries
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Query", id))
        }

        async fn list_queries(
            &self,
            status: Option<QueryStatus>,
        ) -> Result<Vec<SupportQuery>, PortError> {
            let queries = self.queries.read().await;
            let mut results: Vec<_> = queries
                .values()
                .filter(|q| status.map_or(true, |s| q.status == s))
                .cloned()
                .collect();
            results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(results)
        }

        async fn update_query(&self, query: SupportQuery) -> Result<SupportQuery, PortError> {
            let mut queries = self.queries.write().await;
            match queries.get(&query.id) {
                None => return Err(PortError::not_found("Query", query.id)),
                Some(stored) if !stored.is_open() => {
                    return Err(PortError::conflict(format!(
                        "Query {} is already resolved",
                        query.id
                    )))
                }
                Some(_) => {}
            }
            queries.insert(query.id, query.clone());
            Ok(query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPlatformStore;
    use super::*;
    use core_kernel::{EmailAddress, ModeratorId};

    #[tokio::test]
    async fn test_upsert_keeps_identity() {
        let store = MockPlatformStore::new();
        let first = store
            .upsert_policy(Policy::new("terms", "Terms", "v1", None).unwrap())
            .await
            .unwrap();
        let second = store
            .upsert_policy(Policy::new("terms", "Terms", "v2", Some(ModeratorId::new())).unwrap())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.get_policy("terms").await.unwrap().body, "v2");
        assert_eq!(store.list_policies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_policy() {
        let store = MockPlatformStore::new();
        assert!(store.delete_policy("refund").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_queries_by_status() {
        let store = MockPlatformStore::new();
        let email = EmailAddress::from_normalized("a@b.in");
        let mut resolved = SupportQuery::new("A", email.clone(), "One", "First").unwrap();
        resolved.resolve(ModeratorId::new(), "Done").unwrap();
        store.create_query(resolved).await.unwrap();
        store
            .create_query(SupportQuery::new("B", email, "Two", "Second").unwrap())
            .await
            .unwrap();

        assert_eq!(store.list_queries(None).await.unwrap().len(), 2);
        let open = store.list_queries(Some(QueryStatus::Open)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].subject, "Two");
    }

    #[tokio::test]
    async fn test_stale_resolution_is_a_conflict() {
        let store = MockPlatformStore::new();
        let query = store
            .create_query(
                SupportQuery::new("A", EmailAddress::from_normalized("a@b.in"), "One", "First")
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = query.id;
        // Both moderators loaded the query while it was open
        let mut first = query.clone();
        first.resolve(ModeratorId::new(), "Refund issued").unwrap();
        let mut second = query;
        second.resolve(ModeratorId::new(), "Please call us").unwrap();

        store.update_query(first).await.unwrap();
        assert!(store.update_query(second).await.unwrap_err().is_conflict());
        let stored = store.get_query(id).await.unwrap();
        assert_eq!(stored.response.as_deref(), Some("Refund issued"));
    }
}
