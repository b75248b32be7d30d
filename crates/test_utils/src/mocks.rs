//! In-memory port bundle
//!
//! One `MockPorts` holds every in-memory store the API needs. Tests keep a
//! clone to seed data and to drive the gateway (capture, decline) while the
//! router works against the same shared state.

use std::sync::Arc;

use domain_accounts::ports::mock::MockAccountStore;
use domain_accounts::FixedCodeOtp;
use domain_billing::gateway::mock::MockPaymentGateway;
use domain_billing::ports::mock::MockBillingStore;
use domain_platform::ports::mock::MockPlatformStore;

/// OTP code accepted by the fixed-code verifier in tests
pub const TEST_OTP_CODE: &str = "123456";

#[derive(Debug, Clone)]
pub struct MockPorts {
    pub accounts: MockAccountStore,
    pub billing: MockBillingStore,
    pub platform: MockPlatformStore,
    pub gateway: MockPaymentGateway,
    pub otp: Arc<FixedCodeOtp>,
}

impl MockPorts {
    pub fn new() -> Self {
        Self {
            accounts: MockAccountStore::new(),
            billing: MockBillingStore::new(),
            platform: MockPlatformStore::new(),
            gateway: MockPaymentGateway::new(),
            otp: Arc::new(FixedCodeOtp::new(TEST_OTP_CODE)),
        }
    }
}

impl Default for MockPorts {
    fn default() -> Self {
        Self::new()
    }
}
