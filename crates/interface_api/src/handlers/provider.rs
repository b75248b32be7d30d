//! Provider handlers
//!
//! A provider only ever sees its own members, fee plans and transactions.
//! Records of other providers answer 404 so their existence is not revealed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::{FeePlanId, MemberId, Money};
use domain_accounts::{AccountValidator, Member, MemberUpdate, ProviderUpdate};
use domain_billing::{FeePlan, FeePlanQuery, FeePlanUpdate, TransactionQuery};

use crate::auth::ProviderSession;
use crate::dto::accounts::*;
use crate::dto::billing::*;
use crate::dto::PageParams;
use crate::error::ApiError;
use crate::state::AppState;

use super::{non_blank, parse_email, parse_phone, today};

pub async fn get_profile(
    State(state): State<AppState>,
    provider: ProviderSession,
) -> Result<Json<ProviderResponse>, ApiError> {
    let profile = state.providers.get_provider(provider.id).await?;
    Ok(Json(profile.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    provider: ProviderSession,
    Json(request): Json<UpdateProviderRequest>,
) -> Result<Json<ProviderResponse>, ApiError> {
    request.validate()?;
    let email = request.email.as_deref().map(parse_email).transpose()?;

    let mut profile = state.providers.get_provider(provider.id).await?;
    profile.apply(ProviderUpdate {
        name: request.name,
        email,
        address: request.address,
        category: request.category,
        logo_url: request.logo_url,
    });
    AccountValidator::validate_provider(&profile).into_result()?;

    let profile = state.providers.update_provider(profile).await?;
    Ok(Json(profile.into()))
}

/// Adds a member to the provider's roll
pub async fn create_member(
    State(state): State<AppState>,
    provider: ProviderSession,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    request.validate()?;
    let phone = parse_phone(&state, &request.phone)?;

    let mut member = Member::new(provider.id, request.name, phone, &request.reference);
    if let Some(email) = non_blank(request.email) {
        member = member.with_email(parse_email(&email)?);
    }
    if let Some(notes) = non_blank(request.notes) {
        member = member.with_notes(notes);
    }
    AccountValidator::validate_member(&member).into_result()?;

    let member = state.members.create_member(member).await?;
    info!(member_id = %member.id, provider_id = %provider.id, "Member added");
    Ok((StatusCode::CREATED, Json(member.into())))
}

pub async fn list_members(
    State(state): State<AppState>,
    provider: ProviderSession,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.members.list_members(provider.id).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

pub async fn get_member(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<MemberId>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = owned_member(&state, &provider, id).await?;
    Ok(Json(member.into()))
}

pub async fn update_member(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<MemberId>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    request.validate()?;
    let phone = request
        .phone
        .as_deref()
        .map(|p| parse_phone(&state, p))
        .transpose()?;
    let email = request.email.as_deref().map(parse_email).transpose()?;

    let mut member = owned_member(&state, &provider, id).await?;
    member.apply(MemberUpdate {
        name: request.name,
        phone,
        email,
        reference: request.reference,
        notes: request.notes,
    });
    AccountValidator::validate_member(&member).into_result()?;

    let member = state.members.update_member(member).await?;
    Ok(Json(member.into()))
}

/// Removes a member that has no fee plans
///
/// Fee plans, paid or not, keep their member in place so the payment
/// history stays intact.
pub async fn delete_member(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<MemberId>,
) -> Result<StatusCode, ApiError> {
    let member = owned_member(&state, &provider, id).await?;
    let plans = state.fee_plans.list_member_fee_plans(member.id).await?;
    if !plans.is_empty() {
        return Err(ApiError::Conflict(format!(
            "Member has {} fee plan(s); delete unpaid plans first",
            plans.len()
        )));
    }

    state.members.delete_member(member.id).await?;
    info!(member_id = %member.id, "Member deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_fee_plan(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(member_id): Path<MemberId>,
    Json(request): Json<CreateFeePlanRequest>,
) -> Result<(StatusCode, Json<FeePlanResponse>), ApiError> {
    request.validate()?;
    let member = owned_member(&state, &provider, member_id).await?;
    let amount = Money::new(request.amount, state.billing_currency()?);

    let mut plan = FeePlan::new(
        member.id,
        member.provider_id,
        request.title,
        amount,
        request.due_date,
    )?;
    if let Some(description) = non_blank(request.description) {
        plan = plan.with_description(description);
    }

    let plan = state.fee_plans.create_fee_plan(plan).await?;
    info!(fee_plan_id = %plan.id, member_id = %member.id, "Fee plan created");
    Ok((StatusCode::CREATED, Json(FeePlanResponse::new(plan, today()))))
}

pub async fn list_member_fee_plans(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(member_id): Path<MemberId>,
) -> Result<Json<Vec<FeePlanResponse>>, ApiError> {
    let member = owned_member(&state, &provider, member_id).await?;
    let plans = state.fee_plans.list_member_fee_plans(member.id).await?;
    Ok(Json(FeePlanResponse::list(plans, today())))
}

/// All of the provider's fee plans, optionally filtered
pub async fn list_fee_plans(
    State(state): State<AppState>,
    provider: ProviderSession,
    Query(params): Query<FeePlanListParams>,
) -> Result<Json<Vec<FeePlanResponse>>, ApiError> {
    let today = today();
    let query = FeePlanQuery {
        status: params.status,
        overdue_on: params.overdue.then_some(today),
        member_id: params.member_id,
    };
    let plans = state
        .fee_plans
        .list_provider_fee_plans(provider.id, query)
        .await?;
    Ok(Json(FeePlanResponse::list(plans, today)))
}

pub async fn get_fee_plan(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<FeePlanId>,
) -> Result<Json<FeePlanResponse>, ApiError> {
    let plan = owned_fee_plan(&state, &provider, id).await?;
    Ok(Json(FeePlanResponse::new(plan, today())))
}

pub async fn update_fee_plan(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<FeePlanId>,
    Json(request): Json<UpdateFeePlanRequest>,
) -> Result<Json<FeePlanResponse>, ApiError> {
    request.validate()?;
    let mut plan = owned_fee_plan(&state, &provider, id).await?;
    let amount = request
        .amount
        .map(|a| Money::new(a, plan.amount.currency()));

    plan.apply(FeePlanUpdate {
        title: request.title,
        description: request.description,
        amount,
        due_date: request.due_date,
    })?;

    let plan = state.fee_plans.update_fee_plan(plan).await?;
    Ok(Json(FeePlanResponse::new(plan, today())))
}

/// Deletes an unpaid fee plan
pub async fn delete_fee_plan(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<FeePlanId>,
) -> Result<StatusCode, ApiError> {
    let plan = owned_fee_plan(&state, &provider, id).await?;
    plan.ensure_editable()?;

    state.fee_plans.delete_fee_plan(plan.id).await?;
    info!(fee_plan_id = %plan.id, "Fee plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Records a cash or cheque payment
pub async fn mark_paid(
    State(state): State<AppState>,
    provider: ProviderSession,
    Path(id): Path<FeePlanId>,
    request: Option<Json<MarkPaidRequest>>,
) -> Result<Json<MarkPaidResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let (plan, transaction) = state
        .payments
        .record_offline_payment(provider.id, id, non_blank(request.reference))
        .await?;

    Ok(Json(MarkPaidResponse {
        fee_plan: FeePlanResponse::new(plan, today()),
        transaction: transaction.into(),
    }))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    provider: ProviderSession,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let (limit, offset) = page.resolve();
    let transactions = state
        .transactions
        .list_transactions(TransactionQuery::for_provider(provider.id).paginate(limit, offset))
        .await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

async fn owned_member(
    state: &AppState,
    provider: &ProviderSession,
    id: MemberId,
) -> Result<Member, ApiError> {
    let member = state.members.get_member(id).await?;
    if !member.is_owned_by(provider.id) {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }
    Ok(member)
}

async fn owned_fee_plan(
    state: &AppState,
    provider: &ProviderSession,
    id: FeePlanId,
) -> Result<FeePlan, ApiError> {
    let plan = state.fee_plans.get_fee_plan(id).await?;
    if plan.provider_id != provider.id {
        return Err(ApiError::NotFound("FeePlan not found".to_string()));
    }
    Ok(plan)
}
