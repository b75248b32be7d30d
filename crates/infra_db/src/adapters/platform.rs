//! PostgreSQL Platform Adapter
//!
//! Policies and support queries.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, QueryId};
use domain_platform::{Policy, PolicyPort, QueryPort, QueryStatus, SupportQuery};

use crate::error::db_to_port_error;
use crate::repositories::PlatformRepository;

#[derive(Debug, Clone)]
pub struct PostgresPlatformAdapter {
    repository: PlatformRepository,
    pool: PgPool,
}

impl PostgresPlatformAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PlatformRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresPlatformAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPlatformAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::probe(&self.pool, "postgres-platform-adapter").await
    }
}

#[async_trait]
impl PolicyPort for PostgresPlatformAdapter {
    #[instrument(skip(self, policy), fields(slug = %policy.slug))]
    async fn upsert_policy(&self, policy: Policy) -> Result<Policy, PortError> {
        self.repository
            .upsert_policy(&policy)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_policy(&self, slug: &str) -> Result<Policy, PortError> {
        self.repository.get_policy(slug).await.map_err(db_to_port_error)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, PortError> {
        self.repository.list_policies().await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn delete_policy(&self, slug: &str) -> Result<(), PortError> {
        self.repository.delete_policy(slug).await.map_err(db_to_port_error)
    }
}

#[async_trait]
impl QueryPort for PostgresPlatformAdapter {
    #[instrument(skip(self, query), fields(query_id = %query.id))]
    async fn create_query(&self, query: SupportQuery) -> Result<SupportQuery, PortError> {
        self.repository.insert_query(&query).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_query(&self, id: QueryId) -> Result<SupportQuery, PortError> {
        self.repository.get_query(id).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn list_queries(
        &self,
        status: Option<QueryStatus>,
    ) -> Result<Vec<SupportQuery>, PortError> {
        self.repository.list_queries(status).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, query), fields(query_id = %query.id))]
    async fn update_query(&self, query: SupportQuery) -> Result<SupportQuery, PortError> {
        self.repository.update_query(&query).await.map_err(db_to_port_error)
    }
}
