//! Accounts Domain
//!
//! Everyone who signs in to Feebook and the records they act on:
//!
//! - **Provider**: an institution collecting fees (school, coaching centre,
//!   housing society)
//! - **Consumer**: a payer, usually a parent or guardian
//! - **Moderator**: platform staff
//! - **Member**: a person on a provider's roll who owes fees
//! - **Membership**: a consumer's claim on a member, which lets the consumer
//!   see and pay that member's fees
//!
//! Accounts are identified by phone number and sign in with a one-time
//! password (`OtpPort`).
//!
//! # Claiming a member
//!
//! ```rust
//! use core_kernel::{EmailAddress, PhoneNumber};
//! use domain_accounts::{Consumer, Member, Membership, Provider};
//!
//! let mut school = Provider::new(
//!     "Sunrise School",
//!     PhoneNumber::parse("98000 00001", "91").unwrap(),
//!     EmailAddress::parse("office@sunrise.edu").unwrap(),
//! );
//! school.verified = true;
//!
//! let phone = PhoneNumber::parse("98765 43210", "91").unwrap();
//! let member = Member::new(school.id, "Asha Rao", phone.clone(), "2024/A-17");
//! let consumer = Consumer::new("Ravi Rao", phone);
//!
//! let membership = Membership::authorize_claim(&consumer, &member, &school).unwrap();
//! assert_eq!(membership.member_id, member.id);
//! ```

pub mod provider;
pub mod consumer;
pub mod moderator;
pub mod member;
pub mod membership;
pub mod validation;
pub mod otp;
pub mod ports;
pub mod adapters;
pub mod error;

pub use provider::{Provider, ProviderCategory, ProviderQuery, ProviderUpdate};
pub use consumer::{Consumer, ConsumerUpdate};
pub use moderator::Moderator;
pub use member::{Member, MemberUpdate};
pub use membership::Membership;
pub use validation::{AccountValidator, ValidationResult};
pub use otp::{FixedCodeOtp, OtpDispatch, OtpPort, OtpStatus};
pub use ports::{ConsumerPort, MemberPort, MembershipPort, ModeratorPort, ProviderPort};
pub use adapters::{HostedOtpAdapter, HostedOtpConfig};
pub use error::AccountError;
