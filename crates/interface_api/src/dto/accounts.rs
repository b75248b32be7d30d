//! Provider, consumer, member and moderator DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{
    ConsumerId, EmailAddress, MemberId, MembershipId, ModeratorId, PhoneNumber, ProviderId,
};
use domain_accounts::{Consumer, Member, Membership, Moderator, Provider, ProviderCategory};

#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    pub id: ProviderId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: EmailAddress,
    pub address: Option<String>,
    pub category: ProviderCategory,
    pub logo_url: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Provider> for ProviderResponse {
    fn from(p: Provider) -> Self {
        Self {
            id: p.id,
            name: p.name,
            phone: p.phone,
            email: p.email,
            address: p.address,
            category: p.category,
            logo_url: p.logo_url,
            verified: p.verified,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// What consumers see of a provider; contact details stay private
#[derive(Debug, Serialize)]
pub struct ProviderListing {
    pub id: ProviderId,
    pub name: String,
    pub category: ProviderCategory,
    pub address: Option<String>,
    pub logo_url: Option<String>,
}

impl From<Provider> for ProviderListing {
    fn from(p: Provider) -> Self {
        Self {
            id: p.id,
            name: p.name,
            category: p.category,
            address: p.address,
            logo_url: p.logo_url,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProviderRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,
    pub category: Option<ProviderCategory>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub logo_url: Option<String>,
}

/// `?search=&verified=&limit=&offset=`
#[derive(Debug, Default, Deserialize)]
pub struct ProviderListParams {
    pub search: Option<String>,
    pub verified: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsumerResponse {
    pub id: ConsumerId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<EmailAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Consumer> for ConsumerResponse {
    fn from(c: Consumer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            phone: c.phone,
            email: c.email,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConsumerRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must be 1 to 64 characters"))]
    pub reference: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must be 1 to 64 characters"))]
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: MemberId,
    pub provider_id: ProviderId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<EmailAddress>,
    pub reference: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            provider_id: m.provider_id,
            name: m.name,
            phone: m.phone,
            email: m.email,
            reference: m.reference,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClaimMembershipRequest {
    pub provider_id: ProviderId,
    #[validate(length(min = 1, max = 64, message = "must be 1 to 64 characters"))]
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct MemberSummary {
    pub id: MemberId,
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderSummary {
    pub id: ProviderId,
    pub name: String,
}

/// A claimed member with the provider it belongs to
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: MembershipId,
    pub member: MemberSummary,
    pub provider: ProviderSummary,
    pub created_at: DateTime<Utc>,
}

impl MembershipResponse {
    pub fn new(membership: &Membership, member: &Member, provider: &Provider) -> Self {
        Self {
            id: membership.id,
            member: MemberSummary {
                id: member.id,
                name: member.name.clone(),
                reference: member.reference.clone(),
            },
            provider: ProviderSummary {
                id: provider.id,
                name: provider.name.clone(),
            },
            created_at: membership.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateModeratorRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeratorActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ModeratorResponse {
    pub id: ModeratorId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: EmailAddress,
    pub is_active: bool,
    pub created_by: Option<ModeratorId>,
    pub created_at: DateTime<Utc>,
}

impl From<Moderator> for ModeratorResponse {
    fn from(m: Moderator) -> Self {
        Self {
            id: m.id,
            name: m.name,
            phone: m.phone,
            email: m.email,
            is_active: m.is_active,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}
