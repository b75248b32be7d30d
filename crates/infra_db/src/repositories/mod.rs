//! Repository implementations for the Feebook tables
//!
//! Repositories own the SQL. Queries are built at runtime with
//! `sqlx::query_as` and decoded through `FromRow` row structs, which are
//! then converted into domain entities.

pub mod accounts;
pub mod billing;
pub mod platform;

pub use accounts::AccountsRepository;
pub use billing::BillingRepository;
pub use platform::PlatformRepository;
