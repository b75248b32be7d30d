//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter wraps the
//! repository for its domain, converts `DatabaseError` into `PortError` and
//! reports its health by round-tripping `SELECT 1`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresAccountsAdapter;
//! use domain_accounts::ProviderPort;
//!
//! let adapter = PostgresAccountsAdapter::new(pool);
//! let provider = adapter.get_provider(provider_id).await?;
//! ```

pub mod accounts;
pub mod billing;
pub mod platform;

pub use accounts::PostgresAccountsAdapter;
pub use billing::PostgresBillingAdapter;
pub use platform::PostgresPlatformAdapter;

use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult};

/// Performs a simple SELECT 1 to verify the pool is operational
pub(crate) async fn probe(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = crate::pool::ping(pool).await;
    let (status, message) = match result {
        Ok(()) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };
    HealthCheckResult::timed(adapter_id, start, status, message)
}
