//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for Feebook using SQLx.
//!
//! # Architecture
//!
//! - `repositories`: SQL and row mapping, one repository per domain
//! - `adapters`: implementations of the domain port traits on top of the
//!   repositories
//! - `pool`: connection pool construction and embedded migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
//!
//! let pool = create_pool(&DatabaseConfig::new("postgres://localhost/feebook")).await?;
//! run_migrations(&pool).await?;
//! let billing = Arc::new(PostgresBillingAdapter::new(pool));
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, ping, run_migrations, DatabaseConfig, DatabasePool};
pub use error::{db_to_port_error, DatabaseError};
pub use adapters::{PostgresAccountsAdapter, PostgresBillingAdapter, PostgresPlatformAdapter};
