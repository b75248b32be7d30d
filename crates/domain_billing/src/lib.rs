//! Billing Domain - Fee Plans and Payments
//!
//! This crate covers everything money-related in Feebook:
//!
//! - **FeePlan**: one billable obligation of a member (title, amount, due
//!   date). Status moves from `DUE` to `PAID` and never back.
//! - **Order**: a hosted-gateway order created when a consumer starts an
//!   online payment for a plan
//! - **Transaction**: the record of a settled plan, online or offline.
//!   Exactly one exists per PAID plan.
//!
//! # Settlement
//!
//! Paying a plan touches three rows (plan, order, transaction). The
//! `SettlementPort` applies them as one unit so a crash or a concurrent
//! verification can never leave a PAID plan without its transaction.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use core_kernel::{MemberId, Money, ProviderId};
//! use domain_billing::{FeePlan, FeePlanStatus, PaymentMode, Transaction};
//! use rust_decimal_macros::dec;
//!
//! let mut plan = FeePlan::new(
//!     MemberId::new(),
//!     ProviderId::new(),
//!     "Term 1 tuition",
//!     Money::inr(dec!(15000)),
//!     NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
//! )
//! .unwrap();
//!
//! let receipt = Transaction::offline(&plan, Some("RCPT-101".to_string()));
//! plan.mark_paid(PaymentMode::Offline).unwrap();
//! assert_eq!(plan.status, FeePlanStatus::Paid);
//! assert_eq!(receipt.amount, plan.amount);
//! ```

pub mod fee_plan;
pub mod order;
pub mod transaction;
pub mod gateway;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod error;

pub use fee_plan::{FeePlan, FeePlanQuery, FeePlanStatus, FeePlanUpdate, PaymentMode};
pub use order::{Order, OrderStatus};
pub use transaction::{Transaction, TransactionQuery};
pub use gateway::{
    CreateGatewayOrder, GatewayOrder, GatewayOrderStatus, GatewayPayment, GatewayPaymentStatus,
    PaymentGatewayPort,
};
pub use ports::{FeePlanPort, OrderPort, Settlement, SettlementPort, TransactionPort};
pub use services::{Checkout, PaymentService, VerificationOutcome, VerificationStatus};
pub use adapters::{HostedGatewayAdapter, HostedGatewayConfig};
pub use error::BillingError;
