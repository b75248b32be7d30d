//! Fee plans
//!
//! A fee plan is one billable obligation of a member towards its provider:
//! a title, an amount and a due date. Its status only ever moves from `DUE`
//! to `PAID`; once paid it is frozen.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{FeePlanId, MemberId, Money, ProviderId};

use crate::error::BillingError;

pub const MAX_TITLE_LEN: usize = 200;

/// Fee plan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeePlanStatus {
    Due,
    Paid,
}

impl FeePlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeePlanStatus::Due => "DUE",
            FeePlanStatus::Paid => "PAID",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "PAID" => FeePlanStatus::Paid,
            _ => FeePlanStatus::Due,
        }
    }
}

impl std::str::FromStr for FeePlanStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DUE" => Ok(FeePlanStatus::Due),
            "PAID" => Ok(FeePlanStatus::Paid),
            other => Err(BillingError::ValidationFailed(format!(
                "Unknown fee plan status: {}",
                other
            ))),
        }
    }
}

/// How a fee plan was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Through the hosted payment gateway
    Online,
    /// Cash or cheque recorded by the provider
    Offline,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Online => "ONLINE",
            PaymentMode::Offline => "OFFLINE",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "OFFLINE" => PaymentMode::Offline,
            _ => PaymentMode::Online,
        }
    }
}

/// A billable obligation of a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePlan {
    pub id: FeePlanId,
    pub member_id: MemberId,
    /// Denormalized from the member for provider-scoped queries
    pub provider_id: ProviderId,
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: FeePlanStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_via: Option<PaymentMode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeePlan {
    /// Creates a new DUE fee plan
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank or too long, or the amount is
    /// not positive with at most two decimal places
    pub fn new(
        member_id: MemberId,
        provider_id: ProviderId,
        title: impl Into<String>,
        amount: Money,
        due_date: NaiveDate,
    ) -> Result<Self, BillingError> {
        let title = title.into().trim().to_string();
        validate_title(&title)?;
        validate_amount(&amount)?;

        let now = Utc::now();
        Ok(Self {
            id: FeePlanId::new(),
            member_id,
            provider_id,
            title,
            description: None,
            amount,
            due_date,
            status: FeePlanStatus::Due,
            paid_at: None,
            paid_via: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_paid(&self) -> bool {
        self.status == FeePlanStatus::Paid
    }

    /// DUE and past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == FeePlanStatus::Due && self.due_date < today
    }

    /// Fails once the plan has been paid
    pub fn ensure_editable(&self) -> Result<(), BillingError> {
        if self.is_paid() {
            return Err(BillingError::NotEditable(self.id.to_string()));
        }
        Ok(())
    }

    /// Moves the plan from DUE to PAID
    pub fn mark_paid(&mut self, mode: PaymentMode) -> Result<(), BillingError> {
        if self.is_paid() {
            return Err(BillingError::AlreadyPaid(self.id.to_string()));
        }
        let now = Utc::now();
        self.status = FeePlanStatus::Paid;
        self.paid_at = Some(now);
        self.paid_via = Some(mode);
        self.updated_at = now;
        Ok(())
    }

    /// Applies an edit to a DUE plan; nothing changes if any field is invalid
    pub fn apply(&mut self, update: FeePlanUpdate) -> Result<(), BillingError> {
        self.ensure_editable()?;

        let title = update.title.map(|t| t.trim().to_string());
        if let Some(ref title) = title {
            validate_title(title)?;
        }
        if let Some(ref amount) = update.amount {
            validate_amount(amount)?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Editable fee plan fields; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct FeePlanUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
}

/// Filters for listing a provider's fee plans
#[derive(Debug, Clone, Default)]
pub struct FeePlanQuery {
    pub status: Option<FeePlanStatus>,
    /// Only plans overdue as of this date
    pub overdue_on: Option<NaiveDate>,
    pub member_id: Option<MemberId>,
}

impl FeePlanQuery {
    pub fn matches(&self, plan: &FeePlan) -> bool {
        if let Some(status) = self.status {
            if plan.status != status {
                return false;
            }
        }
        if let Some(today) = self.overdue_on {
            if !plan.is_overdue(today) {
                return false;
            }
        }
        if let Some(member_id) = self.member_id {
            if plan.member_id != member_id {
                return false;
            }
        }
        true
    }
}

fn validate_title(title: &str) -> Result<(), BillingError> {
    if title.is_empty() {
        return Err(BillingError::ValidationFailed("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(BillingError::ValidationFailed(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_amount(amount: &Money) -> Result<(), BillingError> {
    amount
        .ensure_chargeable()
        .map_err(|e| BillingError::InvalidAmount(e.to_string()))
}
