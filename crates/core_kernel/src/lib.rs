//! Core Kernel - Foundational types shared by every Feebook crate
//!
//! This crate provides the building blocks used across all domain modules:
//! - Strongly-typed identifiers for every entity
//! - Money with precise decimal arithmetic and minor-unit conversion
//! - The three platform roles
//! - Validated contact value objects (phone numbers, email addresses)
//! - Port abstractions shared by adapters

pub mod money;
pub mod identifiers;
pub mod role;
pub mod contact;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    ProviderId, ConsumerId, ModeratorId, MemberId, MembershipId,
    FeePlanId, OrderId, TransactionId, PolicyId, QueryId,
};
pub use role::Role;
pub use contact::{PhoneNumber, EmailAddress, ContactError};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use error::CoreError;
