//! External adapters for the accounts domain
//!
//! - **HostedOtpAdapter**: phone verification through a hosted SMS
//!   verification service
//! - **FixedCodeOtp** (in `otp`): fixed-code verification for development
//!
//! Storage adapters live in `infra_db`; in-memory ports in `ports::mock`.

pub mod hosted_otp;

pub use hosted_otp::{HostedOtpAdapter, HostedOtpConfig};
