//! Sign-in handlers
//!
//! Every role signs in with a one-time code sent to its phone. Providers and
//! consumers register themselves; moderators are created by other moderators.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{PhoneNumber, Role};
use domain_accounts::{AccountError, AccountValidator, Consumer, Provider};

use crate::auth::{clear_session_cookie, create_token, session_cookie, Session};
use crate::dto::auth::*;
use crate::error::ApiError;
use crate::state::AppState;

use super::{non_blank, parse_email, parse_phone};

/// Sends a verification code; mounted once per role
pub async fn request_otp(
    State(state): State<AppState>,
    role: Role,
    Json(request): Json<OtpRequest>,
) -> Result<(StatusCode, Json<OtpResponse>), ApiError> {
    request.validate()?;
    let phone = parse_phone(&state, &request.phone)?;

    let dispatch = state
        .otp
        .send_code(&phone)
        .await
        .map_err(ApiError::from_upstream)?;
    info!(role = role.as_str(), phone = %phone.masked(), "Verification code sent");

    Ok((
        StatusCode::ACCEPTED,
        Json(OtpResponse {
            phone: dispatch.phone.masked(),
            status: dispatch.status,
            channel: dispatch.channel,
        }),
    ))
}

/// Signs in an existing account; mounted once per role
pub async fn login(
    State(state): State<AppState>,
    role: Role,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let phone = parse_phone(&state, &request.phone)?;
    check_code(&state, &phone, &request.code).await?;

    let account = match role {
        Role::Provider => state
            .providers
            .find_provider_by_phone(&phone)
            .await?
            .map(|p| (Uuid::from(p.id), p.name)),
        Role::Consumer => state
            .consumers
            .find_consumer_by_phone(&phone)
            .await?
            .map(|c| (Uuid::from(c.id), c.name)),
        Role::Moderator => match state.moderators.find_moderator_by_phone(&phone).await? {
            Some(m) if !m.is_active => {
                warn!(moderator_id = %m.id, "Inactive moderator tried to sign in");
                return Err(AccountError::InactiveAccount.into());
            }
            Some(m) => Some((Uuid::from(m.id), m.name)),
            None => None,
        },
    };

    let Some((account_id, name)) = account else {
        let hint = if role.self_registration() {
            "register first"
        } else {
            "ask a moderator for access"
        };
        return Err(ApiError::NotFound(format!(
            "No {} account for this phone; {}",
            role.as_str(),
            hint
        )));
    };

    info!(role = role.as_str(), account_id = %account_id, "Signed in");
    signed_in(&state, account_id, role, name, StatusCode::OK)
}

/// Creates a provider account and signs it in
pub async fn register_provider(
    State(state): State<AppState>,
    Json(request): Json<RegisterProviderRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let phone = parse_phone(&state, &request.phone)?;
    let email = parse_email(&request.email)?;

    if state.providers.find_provider_by_phone(&phone).await?.is_some() {
        return Err(AccountError::DuplicateAccount(
            "A provider with this phone already exists".to_string(),
        )
        .into());
    }
    if state.providers.find_provider_by_email(&email).await?.is_some() {
        return Err(AccountError::DuplicateAccount(
            "A provider with this email already exists".to_string(),
        )
        .into());
    }

    let mut provider = Provider::new(request.name, phone, email);
    if let Some(category) = request.category {
        provider = provider.with_category(category);
    }
    if let Some(address) = non_blank(request.address) {
        provider = provider.with_address(address);
    }
    AccountValidator::validate_provider(&provider).into_result()?;

    // Last check before the insert, so a rejected registration keeps its code
    check_code(&state, &provider.phone, &request.code).await?;

    let provider = state.providers.create_provider(provider).await?;
    info!(provider_id = %provider.id, "Provider registered");
    signed_in(
        &state,
        provider.id.into(),
        Role::Provider,
        provider.name,
        StatusCode::CREATED,
    )
}

/// Creates a consumer account and signs it in
pub async fn register_consumer(
    State(state): State<AppState>,
    Json(request): Json<RegisterConsumerRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let phone = parse_phone(&state, &request.phone)?;
    let email = non_blank(request.email)
        .map(|e| parse_email(&e))
        .transpose()?;

    if state.consumers.find_consumer_by_phone(&phone).await?.is_some() {
        return Err(AccountError::DuplicateAccount(
            "A consumer with this phone already exists".to_string(),
        )
        .into());
    }
    if let Some(email) = &email {
        if state.consumers.find_consumer_by_email(email).await?.is_some() {
            return Err(AccountError::DuplicateAccount(
                "A consumer with this email already exists".to_string(),
            )
            .into());
        }
    }

    let mut consumer = Consumer::new(request.name, phone);
    if let Some(email) = email {
        consumer = consumer.with_email(email);
    }
    AccountValidator::validate_consumer(&consumer).into_result()?;

    check_code(&state, &consumer.phone, &request.code).await?;

    let consumer = state.consumers.create_consumer(consumer).await?;
    info!(consumer_id = %consumer.id, "Consumer registered");
    signed_in(
        &state,
        consumer.id.into(),
        Role::Consumer,
        consumer.name,
        StatusCode::CREATED,
    )
}

/// Clears the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
    )
}

/// The signed-in account
pub async fn me(session: Session) -> Json<Session> {
    Json(session)
}

async fn check_code(state: &AppState, phone: &PhoneNumber, code: &str) -> Result<(), ApiError> {
    let approved = state
        .otp
        .check_code(phone, code)
        .await
        .map_err(ApiError::from_upstream)?;
    if approved {
        Ok(())
    } else {
        warn!(phone = %phone.masked(), "Verification code rejected");
        Err(AccountError::InvalidCode.into())
    }
}

fn signed_in(
    state: &AppState,
    account_id: Uuid,
    role: Role,
    name: String,
    status: StatusCode,
) -> Result<Response, ApiError> {
    let ttl = state.config.session_ttl_secs;
    let token = create_token(account_id, role, &name, &state.config.jwt_secret, ttl)?;
    let cookie = session_cookie(&token, ttl, state.config.cookie_secure);

    let body = SessionResponse {
        account_id,
        role,
        name,
        token,
        expires_at: Utc::now() + Duration::seconds(ttl as i64),
    };
    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}
