//! Database error types
//!
//! Errors raised by the repositories, plus the translation into the
//! `PortError` the domain ports speak.

use thiserror::Error;
use tracing::{error, warn};

use core_kernel::PortError;

/// Repository failures, before translation to `PortError`
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// SQLSTATE 23505, e.g. a second provider on the same phone. Carries the
    /// constraint name when Postgres reports one.
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// SQLSTATE 23503, e.g. deleting a member that still has fee plans
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// The row exists but its state forbids the write (a fee plan already PAID)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// SQLSTATE 23514
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored value no longer parses into the domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// No connection became free within the acquire timeout
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Member", "0190c2a4");
    /// assert_eq!(error.to_string(), "Member with id '0190c2a4' not found");
    /// ```
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }
}

/// Maps SQLx errors onto the PostgreSQL error codes we care about
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound {
                entity: "Record",
                id: "unknown".to_string(),
            },
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = match db_err.constraint() {
                    Some(constraint) => format!("{} ({})", db_err.message(), constraint),
                    None => db_err.message().to_string(),
                };
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(
                        db_err.constraint().map_or(message, str::to_string),
                    ),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

/// What a caller is told when a unique constraint rejects a write
fn duplicate_message(constraint: &str) -> &'static str {
    match constraint {
        "providers_phone_key" | "consumers_phone_key" | "moderators_phone_key" => {
            "An account with this phone number already exists"
        }
        "providers_email_key" | "consumers_email_key" | "moderators_email_key" => {
            "An account with this email already exists"
        }
        "members_provider_id_reference_key" => "A member with this reference already exists",
        "memberships_consumer_id_member_id_key" => "Membership already claimed",
        "orders_gateway_order_id_key" => "Order already exists",
        "transactions_fee_plan_id_key" => "Fee plan is already paid",
        "policies_slug_key" => "A policy with this slug already exists",
        _ => "Record already exists",
    }
}

/// Translates a repository error into the port error callers see
///
/// Postgres messages and constraint names go to the log, never into the
/// port error. Our own database failing is internal, not an upstream fault.
pub fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::NotFound { entity, id } => PortError::not_found(entity, id),
        DatabaseError::DuplicateEntry(constraint) => {
            warn!(%constraint, "Unique constraint rejected write");
            PortError::conflict(duplicate_message(&constraint))
        }
        DatabaseError::Conflict(msg) => PortError::conflict(msg),
        DatabaseError::ForeignKeyViolation(detail) => {
            warn!(%detail, "Foreign key rejected write");
            PortError::conflict("Referenced record is missing or still in use")
        }
        DatabaseError::ConstraintViolation(detail) => {
            warn!(%detail, "Check constraint rejected write");
            PortError::validation("Value is out of range")
        }
        DatabaseError::PoolExhausted => PortError::ServiceUnavailable {
            service: "postgres".to_string(),
        },
        e @ (DatabaseError::ConnectionFailed(_)
        | DatabaseError::CorruptRow(_)
        | DatabaseError::QueryFailed(_)
        | DatabaseError::MigrationFailed(_)) => {
            error!(error = %e, "Database failure");
            PortError::internal(e.to_string())
        }
    }
}
