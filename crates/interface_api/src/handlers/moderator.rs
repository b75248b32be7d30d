//! Moderator handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::{ModeratorId, ProviderId, QueryId};
use domain_accounts::{AccountValidator, Moderator, ProviderQuery};
use domain_billing::TransactionQuery;
use domain_platform::Policy;

use crate::auth::ModeratorSession;
use crate::dto::accounts::*;
use crate::dto::billing::{TransactionListParams, TransactionResponse};
use crate::dto::platform::*;
use crate::dto::PageParams;
use crate::error::ApiError;
use crate::state::AppState;

use super::{parse_email, parse_phone};

/// Every provider, verified or not
pub async fn list_providers(
    State(state): State<AppState>,
    _moderator: ModeratorSession,
    Query(params): Query<ProviderListParams>,
) -> Result<Json<Vec<ProviderResponse>>, ApiError> {
    let (limit, offset) = PageParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();
    let query = ProviderQuery {
        search: params.search.filter(|s| !s.trim().is_empty()),
        verified: params.verified,
        ..Default::default()
    }
    .paginate(limit, offset);

    let providers = state.providers.list_providers(query).await?;
    Ok(Json(providers.into_iter().map(Into::into).collect()))
}

pub async fn set_provider_verification(
    State(state): State<AppState>,
    moderator: ModeratorSession,
    Path(id): Path<ProviderId>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<ProviderResponse>, ApiError> {
    let provider = state
        .providers
        .set_provider_verified(id, request.verified)
        .await?;
    info!(
        provider_id = %id,
        verified = request.verified,
        moderator_id = %moderator.id,
        "Provider verification changed"
    );
    Ok(Json(provider.into()))
}

pub async fn list_moderators(
    State(state): State<AppState>,
    _moderator: ModeratorSession,
) -> Result<Json<Vec<ModeratorResponse>>, ApiError> {
    let moderators = state.moderators.list_moderators().await?;
    Ok(Json(moderators.into_iter().map(Into::into).collect()))
}

pub async fn create_moderator(
    State(state): State<AppState>,
    moderator: ModeratorSession,
    Json(request): Json<CreateModeratorRequest>,
) -> Result<(StatusCode, Json<ModeratorResponse>), ApiError> {
    request.validate()?;
    AccountValidator::validate_name("Moderator name", &request.name).into_result()?;
    let phone = parse_phone(&state, &request.phone)?;
    let email = parse_email(&request.email)?;

    let created = state
        .moderators
        .create_moderator(Moderator::new(request.name, phone, email, Some(moderator.id)))
        .await?;
    info!(moderator_id = %created.id, created_by = %moderator.id, "Moderator created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Activates or deactivates another moderator
pub async fn set_moderator_active(
    State(state): State<AppState>,
    moderator: ModeratorSession,
    Path(id): Path<ModeratorId>,
    Json(request): Json<ModeratorActiveRequest>,
) -> Result<Json<ModeratorResponse>, ApiError> {
    if id == moderator.id {
        return Err(ApiError::Conflict(
            "Moderators cannot change their own access".to_string(),
        ));
    }
    let updated = state
        .moderators
        .set_moderator_active(id, request.is_active)
        .await?;
    info!(
        moderator_id = %id,
        is_active = request.is_active,
        changed_by = %moderator.id,
        "Moderator access changed"
    );
    Ok(Json(updated.into()))
}

/// Creates or replaces a policy document
pub async fn upsert_policy(
    State(state): State<AppState>,
    moderator: ModeratorSession,
    Path(slug): Path<String>,
    Json(request): Json<UpsertPolicyRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    request.validate()?;
    let policy = match state.policies.get_policy(&slug).await {
        Ok(mut existing) => {
            existing.revise(request.title, request.body, moderator.id)?;
            existing
        }
        Err(e) if e.is_not_found() => {
            Policy::new(&slug, request.title, request.body, Some(moderator.id))?
        }
        Err(e) => return Err(e.into()),
    };
    let policy = state.policies.upsert_policy(policy).await?;
    info!(slug = %policy.slug, moderator_id = %moderator.id, "Policy saved");
    Ok(Json(policy.into()))
}

pub async fn delete_policy(
    State(state): State<AppState>,
    moderator: ModeratorSession,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.policies.delete_policy(&slug).await?;
    info!(slug = %slug, moderator_id = %moderator.id, "Policy deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_queries(
    State(state): State<AppState>,
    _moderator: ModeratorSession,
    Query(params): Query<QueryListParams>,
) -> Result<Json<Vec<QueryResponse>>, ApiError> {
    let queries = state.queries.list_queries(params.status).await?;
    Ok(Json(queries.into_iter().map(Into::into).collect()))
}

/// Answers and closes a support query
pub async fn resolve_query(
    State(state): State<AppState>,
    moderator: ModeratorSession,
    Path(id): Path<QueryId>,
    Json(request): Json<ResolveQueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    request.validate()?;
    let mut query = state.queries.get_query(id).await?;
    query.resolve(moderator.id, request.response)?;

    let query = state.queries.update_query(query).await?;
    info!(query_id = %id, moderator_id = %moderator.id, "Query resolved");
    Ok(Json(query.into()))
}

/// Transactions across all providers
pub async fn list_transactions(
    State(state): State<AppState>,
    _moderator: ModeratorSession,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let (limit, offset) = PageParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();
    let query = TransactionQuery {
        provider_id: params.provider_id,
        mode: params.mode,
        ..Default::default()
    }
    .paginate(limit, offset);

    let transactions = state.transactions.list_transactions(query).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}
