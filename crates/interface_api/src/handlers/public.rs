//! Handlers that need no session

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use tracing::{info, warn};
use validator::Validate;

use domain_billing::VerificationStatus;
use domain_platform::SupportQuery;

use crate::auth::MaybeSession;
use crate::dto::billing::PaymentReturnParams;
use crate::dto::platform::*;
use crate::error::ApiError;
use crate::state::AppState;

use super::{non_blank, parse_email, parse_phone};

pub async fn list_policies(
    State(state): State<AppState>,
) -> Result<Json<Vec<PolicyResponse>>, ApiError> {
    let mut policies = state.policies.list_policies().await?;
    policies.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(Json(policies.into_iter().map(Into::into).collect()))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let policy = state.policies.get_policy(&slug).await?;
    Ok(Json(policy.into()))
}

/// Contact form
///
/// Anyone may write in; a signed-in sender is recorded on the query.
pub async fn submit_query(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<QueryReceipt>), ApiError> {
    request.validate()?;
    let email = parse_email(&request.email)?;

    let mut query = SupportQuery::new(request.name, email, request.subject, request.message)?;
    if let Some(phone) = non_blank(request.phone) {
        query = query.with_phone(parse_phone(&state, &phone)?);
    }
    if let Some(session) = session {
        query = query.raised_by(session.role, session.account_id);
    }

    let query = state.queries.create_query(query).await?;
    info!(query_id = %query.id, "Support query received");
    Ok((
        StatusCode::CREATED,
        Json(QueryReceipt {
            id: query.id,
            status: query.status,
        }),
    ))
}

/// Browser return from the hosted checkout
///
/// Verifies the order and sends the browser on to the frontend's result
/// page. A failure to verify lands on the failed page rather than an error
/// body, since a person is looking at it.
pub async fn payment_return(
    State(state): State<AppState>,
    Query(params): Query<PaymentReturnParams>,
) -> Redirect {
    let order_id = params
        .order_id
        .map(|id| id.trim().to_string())
        .unwrap_or_default();
    if order_id.is_empty() {
        warn!("Payment return without an order id");
        return Redirect::to(&return_url(
            &state.config.frontend_url,
            VerificationStatus::Failed,
            "",
        ));
    }

    let status = match state.payments.verify_order(None, &order_id).await {
        Ok(outcome) => outcome.status,
        Err(e) => {
            warn!(gateway_order_id = %order_id, "Payment return could not be verified: {}", e);
            VerificationStatus::Failed
        }
    };

    Redirect::to(&return_url(
        &state.config.frontend_url,
        status,
        &order_id,
    ))
}

fn return_url(frontend_url: &str, status: VerificationStatus, order_id: &str) -> String {
    let order_id: String = order_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    format!(
        "{}/payments/{}?order_id={}",
        frontend_url.trim_end_matches('/'),
        status.as_str(),
        order_id
    )
}
