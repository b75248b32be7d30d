//! Consumer handlers
//!
//! Consumers find verified providers, claim the members they pay for and pay
//! those members' fee plans online.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::MembershipId;
use domain_accounts::member::normalize_reference;
use domain_accounts::{AccountValidator, ConsumerUpdate, Membership, ProviderQuery};
use domain_billing::TransactionQuery;

use crate::auth::ConsumerSession;
use crate::dto::accounts::*;
use crate::dto::billing::*;
use crate::dto::PageParams;
use crate::error::ApiError;
use crate::state::AppState;

use super::{parse_email, today};

pub async fn get_profile(
    State(state): State<AppState>,
    consumer: ConsumerSession,
) -> Result<Json<ConsumerResponse>, ApiError> {
    let profile = state.consumers.get_consumer(consumer.id).await?;
    Ok(Json(profile.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Json(request): Json<UpdateConsumerRequest>,
) -> Result<Json<ConsumerResponse>, ApiError> {
    request.validate()?;
    let email = request.email.as_deref().map(parse_email).transpose()?;

    let mut profile = state.consumers.get_consumer(consumer.id).await?;
    profile.apply(ConsumerUpdate {
        name: request.name,
        email,
    });
    AccountValidator::validate_consumer(&profile).into_result()?;

    let profile = state.consumers.update_consumer(profile).await?;
    Ok(Json(profile.into()))
}

/// Verified providers, optionally searched by name
pub async fn list_providers(
    State(state): State<AppState>,
    _consumer: ConsumerSession,
    Query(params): Query<ProviderListParams>,
) -> Result<Json<Vec<ProviderListing>>, ApiError> {
    let mut query = ProviderQuery::verified();
    if let Some(term) = params.search.filter(|s| !s.trim().is_empty()) {
        query = query.search(term.trim());
    }
    let (limit, offset) = PageParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let providers = state
        .providers
        .list_providers(query.paginate(limit, offset))
        .await?;
    Ok(Json(providers.into_iter().map(Into::into).collect()))
}

/// Claims a member by provider and reference
///
/// `Membership::authorize_claim` decides: the provider must be verified and
/// the member's contact phone must be the consumer's own phone.
pub async fn claim_membership(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Json(request): Json<ClaimMembershipRequest>,
) -> Result<(StatusCode, Json<MembershipResponse>), ApiError> {
    request.validate()?;
    let provider = state.providers.get_provider(request.provider_id).await?;

    let member = state
        .members
        .find_member_by_reference(provider.id, &normalize_reference(&request.reference))
        .await?
        .ok_or_else(|| ApiError::NotFound("No member with this reference".to_string()))?;
    let account = state.consumers.get_consumer(consumer.id).await?;

    let membership = Membership::authorize_claim(&account, &member, &provider)?;
    let membership = state.memberships.create_membership(membership).await?;
    info!(
        membership_id = %membership.id,
        consumer_id = %consumer.id,
        member_id = %member.id,
        "Member claimed"
    );

    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse::new(&membership, &member, &provider)),
    ))
}

pub async fn list_memberships(
    State(state): State<AppState>,
    consumer: ConsumerSession,
) -> Result<Json<Vec<MembershipResponse>>, ApiError> {
    let memberships = state.memberships.list_memberships(consumer.id).await?;
    let members = state
        .members
        .get_members(memberships.iter().map(|m| m.member_id).collect())
        .await?;

    let mut providers = HashMap::new();
    for member in &members {
        if !providers.contains_key(&member.provider_id) {
            let provider = state.providers.get_provider(member.provider_id).await?;
            providers.insert(member.provider_id, provider);
        }
    }

    let members: HashMap<_, _> = members.into_iter().map(|m| (m.id, m)).collect();
    let responses = memberships
        .iter()
        .filter_map(|link| {
            let member = members.get(&link.member_id)?;
            let provider = providers.get(&member.provider_id)?;
            Some(MembershipResponse::new(link, member, provider))
        })
        .collect();
    Ok(Json(responses))
}

pub async fn delete_membership(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Path(id): Path<MembershipId>,
) -> Result<StatusCode, ApiError> {
    let membership = own_membership(&state, &consumer, id).await?;
    state.memberships.delete_membership(membership.id).await?;
    info!(membership_id = %membership.id, "Membership removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Fee plans of a claimed member
pub async fn membership_fee_plans(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Path(id): Path<MembershipId>,
) -> Result<Json<Vec<FeePlanResponse>>, ApiError> {
    let membership = own_membership(&state, &consumer, id).await?;
    let plans = state
        .fee_plans
        .list_member_fee_plans(membership.member_id)
        .await?;
    Ok(Json(FeePlanResponse::list(plans, today())))
}

/// Starts an online payment
pub async fn create_order(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let checkout = state
        .payments
        .create_order(consumer.id, request.fee_plan_id)
        .await
        .map_err(ApiError::from_upstream)?;

    let callback_url = format!(
        "{}/api/v1/payments/return",
        state.config.public_base_url.trim_end_matches('/')
    );
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse::new(checkout, callback_url, today())),
    ))
}

/// Checks an order with the gateway and settles it when paid
pub async fn verify_payment(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerificationResponse>, ApiError> {
    request.validate()?;
    let outcome = state
        .payments
        .verify_order(Some(consumer.id), request.gateway_order_id.trim())
        .await
        .map_err(ApiError::from_upstream)?;
    Ok(Json(VerificationResponse::new(outcome, today())))
}

pub async fn list_orders(
    State(state): State<AppState>,
    consumer: ConsumerSession,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_consumer_orders(consumer.id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Online payments made by this consumer
pub async fn list_transactions(
    State(state): State<AppState>,
    consumer: ConsumerSession,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let (limit, offset) = page.resolve();
    let transactions = state
        .transactions
        .list_transactions(TransactionQuery::for_consumer(consumer.id).paginate(limit, offset))
        .await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

async fn own_membership(
    state: &AppState,
    consumer: &ConsumerSession,
    id: MembershipId,
) -> Result<Membership, ApiError> {
    let membership = state.memberships.get_membership(id).await?;
    if membership.consumer_id != consumer.id {
        return Err(ApiError::NotFound("Membership not found".to_string()));
    }
    Ok(membership)
}
