//! Application state shared across handlers

use std::sync::Arc;

use core_kernel::{Currency, HealthCheckable};
use domain_accounts::{
    ConsumerPort, MemberPort, MembershipPort, ModeratorPort, OtpPort, ProviderPort,
};
use domain_billing::{
    FeePlanPort, OrderPort, PaymentGatewayPort, PaymentService, SettlementPort, TransactionPort,
};
use domain_platform::{PolicyPort, QueryPort};
use infra_db::{
    DatabasePool, PostgresAccountsAdapter, PostgresBillingAdapter, PostgresPlatformAdapter,
};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::storage::UploadStorage;

/// Every port the API talks to
///
/// Built from the Postgres adapters in production and from in-memory stores
/// in tests.
#[derive(Clone)]
pub struct Ports {
    pub providers: Arc<dyn ProviderPort>,
    pub consumers: Arc<dyn ConsumerPort>,
    pub moderators: Arc<dyn ModeratorPort>,
    pub members: Arc<dyn MemberPort>,
    pub memberships: Arc<dyn MembershipPort>,
    pub fee_plans: Arc<dyn FeePlanPort>,
    pub orders: Arc<dyn OrderPort>,
    pub transactions: Arc<dyn TransactionPort>,
    pub settlement: Arc<dyn SettlementPort>,
    pub policies: Arc<dyn PolicyPort>,
    pub queries: Arc<dyn QueryPort>,
    pub otp: Arc<dyn OtpPort>,
    pub gateway: Arc<dyn PaymentGatewayPort>,
    /// Storage adapters checked by the readiness probe
    pub stores: Vec<Arc<dyn HealthCheckable>>,
}

impl Ports {
    /// Postgres-backed ports plus the given hosted services
    pub fn postgres(
        pool: DatabasePool,
        otp: Arc<dyn OtpPort>,
        gateway: Arc<dyn PaymentGatewayPort>,
    ) -> Self {
        let accounts = Arc::new(PostgresAccountsAdapter::new(pool.clone()));
        let billing = Arc::new(PostgresBillingAdapter::new(pool.clone()));
        let platform = Arc::new(PostgresPlatformAdapter::new(pool));

        Self {
            providers: accounts.clone(),
            consumers: accounts.clone(),
            moderators: accounts.clone(),
            members: accounts.clone(),
            memberships: accounts.clone(),
            fee_plans: billing.clone(),
            orders: billing.clone(),
            transactions: billing.clone(),
            settlement: billing.clone(),
            policies: platform.clone(),
            queries: platform.clone(),
            stores: vec![
                accounts as Arc<dyn HealthCheckable>,
                billing as Arc<dyn HealthCheckable>,
                platform as Arc<dyn HealthCheckable>,
            ],
            otp,
            gateway,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub providers: Arc<dyn ProviderPort>,
    pub consumers: Arc<dyn ConsumerPort>,
    pub moderators: Arc<dyn ModeratorPort>,
    pub members: Arc<dyn MemberPort>,
    pub memberships: Arc<dyn MembershipPort>,
    pub fee_plans: Arc<dyn FeePlanPort>,
    pub orders: Arc<dyn OrderPort>,
    pub transactions: Arc<dyn TransactionPort>,
    pub policies: Arc<dyn PolicyPort>,
    pub queries: Arc<dyn QueryPort>,
    pub otp: Arc<dyn OtpPort>,
    pub gateway: Arc<dyn PaymentGatewayPort>,
    pub payments: Arc<PaymentService>,
    pub uploads: UploadStorage,
    pub stores: Arc<Vec<Arc<dyn HealthCheckable>>>,
}

impl AppState {
    pub fn new(config: ApiConfig, ports: Ports) -> Self {
        let payments = PaymentService::new(
            ports.fee_plans.clone(),
            ports.orders.clone(),
            ports.settlement,
            ports.gateway.clone(),
            ports.memberships.clone(),
        );
        let uploads = UploadStorage::new(
            &config.upload_dir,
            &config.public_base_url,
            config.max_upload_bytes,
        );

        Self {
            config: Arc::new(config),
            providers: ports.providers,
            consumers: ports.consumers,
            moderators: ports.moderators,
            members: ports.members,
            memberships: ports.memberships,
            fee_plans: ports.fee_plans,
            orders: ports.orders,
            transactions: ports.transactions,
            policies: ports.policies,
            queries: ports.queries,
            otp: ports.otp,
            gateway: ports.gateway,
            payments: Arc::new(payments),
            uploads,
            stores: Arc::new(ports.stores),
        }
    }

    /// Currency new fee plans are billed in
    pub fn billing_currency(&self) -> Result<Currency, ApiError> {
        self.config
            .gateway
            .currency
            .parse()
            .map_err(|e| ApiError::Internal(format!("Invalid billing currency: {}", e)))
    }
}
