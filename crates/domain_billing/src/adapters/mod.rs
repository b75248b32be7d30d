//! External adapters for the billing domain
//!
//! - **HostedGatewayAdapter**: the hosted payment gateway's REST API
//! - **MockPaymentGateway** (in `gateway::mock`): in-memory gateway for tests

pub mod hosted_gateway;

pub use hosted_gateway::{HostedGatewayAdapter, HostedGatewayConfig};
