//! Feebook API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin feebook-api
//!
//! # Run with environment variables
//! FEEBOOK_PORT=8080 FEEBOOK_DATABASE_URL=postgres://... cargo run --bin feebook-api
//! ```
//!
//! # Environment Variables
//!
//! * `FEEBOOK_HOST`, `FEEBOOK_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `FEEBOOK_DATABASE_URL` - PostgreSQL connection string
//! * `FEEBOOK_DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `FEEBOOK_JWT_SECRET` - Session signing secret (required in production)
//! * `FEEBOOK_LOG_LEVEL`, `FEEBOOK_LOG_JSON` - Logging (`RUST_LOG` wins when set)
//! * `FEEBOOK_FRONTEND_URL`, `FEEBOOK_PUBLIC_BASE_URL` - Browser app and API origins
//! * `FEEBOOK_GATEWAY__KEY_ID`, `FEEBOOK_GATEWAY__KEY_SECRET` - Payment gateway keys
//! * `FEEBOOK_OTP__PROVIDER` - `hosted` or `fixed`
//! * `FEEBOOK_BOOTSTRAP_MODERATOR__PHONE` (with `__NAME`, `__EMAIL`) - First moderator

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_accounts::{FixedCodeOtp, HostedOtpAdapter, OtpPort};
use domain_billing::{HostedGatewayAdapter, PaymentGatewayPort};
use infra_db::{create_pool, run_migrations, DatabaseConfig};
use interface_api::bootstrap::ensure_bootstrap_moderator;
use interface_api::config::{ApiConfig, OtpProvider};
use interface_api::{create_router, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("Invalid FEEBOOK_* configuration")?;
    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Feebook API Server"
    );
    for warning in config.insecure_defaults() {
        tracing::warn!("Insecure configuration: {}", warning);
    }

    let database = DatabaseConfig::new(&config.database_url)
        .with_max_connections(config.database_max_connections);
    tracing::info!(database = %database.redacted_url(), "Connecting to the database");
    let pool = create_pool(&database)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to apply database migrations")?;

    let otp: Arc<dyn OtpPort> = match config.otp.provider {
        OtpProvider::Hosted => Arc::new(
            HostedOtpAdapter::new((&config.otp).into()).context("Failed to build OTP client")?,
        ),
        OtpProvider::Fixed => Arc::new(FixedCodeOtp::new(config.otp.fixed_code.clone())),
    };
    let gateway: Arc<dyn PaymentGatewayPort> = Arc::new(
        HostedGatewayAdapter::new((&config.gateway).into())
            .context("Failed to build payment gateway client")?,
    );

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("Invalid listen address")?;

    let state = AppState::new(config, Ports::postgres(pool, otp, gateway));
    ensure_bootstrap_moderator(&state)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create bootstrap moderator: {}", e))?;

    let app = create_router(state);

    tracing::info!(%addr, "Server listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
