//! HTTP API Layer
//!
//! The Feebook REST API, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per audience (provider, consumer, moderator,
//!   public) plus sign-in, uploads and health
//! - **Middleware**: session authentication and audit logging
//! - **DTOs**: request and response bodies
//! - **State**: the domain ports behind `Arc<dyn Port>`, so the same router
//!   runs on Postgres in production and on in-memory stores in tests
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, Ports};
//!
//! let ports = Ports::postgres(pool, otp, gateway);
//! let app = create_router(AppState::new(config, ports));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod storage;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, Request},
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn, Span};

use core_kernel::Role;

use crate::dto::auth::{LoginRequest, OtpRequest};
use crate::handlers::{auth as sign_in, consumer, health, moderator, provider, public, uploads};
use crate::middleware::{audit_middleware, auth_middleware};
use crate::storage::UPLOADS_ROUTE;

pub use crate::state::{AppState, Ports};

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD_BYTES;

    // Public routes (no session required)
    let public_api = Router::new()
        .nest(
            "/auth/provider",
            role_sign_in(Role::Provider).route("/register", post(sign_in::register_provider)),
        )
        .nest(
            "/auth/consumer",
            role_sign_in(Role::Consumer).route("/register", post(sign_in::register_consumer)),
        )
        .nest("/auth/moderator", role_sign_in(Role::Moderator))
        .route("/auth/logout", post(sign_in::logout))
        .route("/policies", get(public::list_policies))
        .route("/policies/:slug", get(public::get_policy))
        .route("/queries", post(public::submit_query))
        .route("/payments/return", get(public::payment_return));

    let provider_routes = Router::new()
        .route(
            "/profile",
            get(provider::get_profile).put(provider::update_profile),
        )
        .route(
            "/members",
            post(provider::create_member).get(provider::list_members),
        )
        .route(
            "/members/:id",
            get(provider::get_member)
                .put(provider::update_member)
                .delete(provider::delete_member),
        )
        .route(
            "/members/:id/fee-plans",
            post(provider::create_fee_plan).get(provider::list_member_fee_plans),
        )
        .route("/fee-plans", get(provider::list_fee_plans))
        .route(
            "/fee-plans/:id",
            get(provider::get_fee_plan)
                .put(provider::update_fee_plan)
                .delete(provider::delete_fee_plan),
        )
        .route("/fee-plans/:id/mark-paid", post(provider::mark_paid))
        .route("/transactions", get(provider::list_transactions));

    let consumer_routes = Router::new()
        .route(
            "/profile",
            get(consumer::get_profile).put(consumer::update_profile),
        )
        .route("/providers", get(consumer::list_providers))
        .route(
            "/memberships",
            post(consumer::claim_membership).get(consumer::list_memberships),
        )
        .route("/memberships/:id", axum::routing::delete(consumer::delete_membership))
        .route("/memberships/:id/fee-plans", get(consumer::membership_fee_plans))
        .route(
            "/payments/orders",
            post(consumer::create_order).get(consumer::list_orders),
        )
        .route("/payments/verify", post(consumer::verify_payment))
        .route("/transactions", get(consumer::list_transactions));

    let moderator_routes = Router::new()
        .route("/providers", get(moderator::list_providers))
        .route(
            "/providers/:id/verification",
            put(moderator::set_provider_verification),
        )
        .route(
            "/moderators",
            get(moderator::list_moderators).post(moderator::create_moderator),
        )
        .route("/moderators/:id/active", put(moderator::set_moderator_active))
        .route(
            "/policies/:slug",
            put(moderator::upsert_policy).delete(moderator::delete_policy),
        )
        .route("/queries", get(moderator::list_queries))
        .route("/queries/:id", put(moderator::resolve_query))
        .route("/transactions", get(moderator::list_transactions));

    // Only uploads lift axum's default body cap, to the configured file size
    let upload_routes = Router::new()
        .route("/uploads", post(uploads::upload_file))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit));

    // Protected routes: auth runs first, then audit sees the session
    let protected_api = Router::new()
        .route("/auth/me", get(sign_in::me))
        .nest("/provider", provider_routes)
        .nest("/consumer", consumer_routes)
        .nest("/moderator", moderator_routes)
        .merge(upload_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(&state.config.frontend_url);
    let upload_files = ServeDir::new(state.uploads.dir());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", public_api.merge(protected_api))
        .nest_service(UPLOADS_ROUTE, upload_files)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

/// OTP and login routes for one role
fn role_sign_in(role: Role) -> Router<AppState> {
    Router::new()
        .route(
            "/otp",
            post(move |state: State<AppState>, body: Json<OtpRequest>| {
                sign_in::request_otp(state, role, body)
            }),
        )
        .route(
            "/login",
            post(move |state: State<AppState>, body: Json<LoginRequest>| {
                sign_in::login(state, role, body)
            }),
        )
}

/// Tags every log line of a request with the id set by `SetRequestIdLayer`
fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id,
    )
}

/// Credentialed CORS for the configured frontend
///
/// Cookies only flow to an explicit origin; an unparsable origin falls back
/// to an open policy without credentials.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Err(_) => {
            warn!(frontend_url, "Invalid frontend origin; CORS allows any origin without credentials");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(Any)
        }
    }
}
