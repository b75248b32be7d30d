//! Test Data Builders
//!
//! Builders that let a test name only the fields it cares about.

use chrono::NaiveDate;

use core_kernel::{Money, MemberId, ProviderId};
use domain_accounts::Member;
use domain_billing::{FeePlan, PaymentMode};

use crate::fixtures::{DateFixtures, MoneyFixtures};

/// Builder for fee plans
pub struct FeePlanBuilder {
    member_id: MemberId,
    provider_id: ProviderId,
    title: String,
    description: Option<String>,
    amount: Money,
    due_date: NaiveDate,
    paid_via: Option<PaymentMode>,
}

impl FeePlanBuilder {
    /// A DUE tuition plan for `member`
    pub fn for_member(member: &Member) -> Self {
        Self {
            member_id: member.id,
            provider_id: member.provider_id,
            title: "Term 1 tuition".to_string(),
            description: None,
            amount: MoneyFixtures::tuition(),
            due_date: DateFixtures::term_due(),
            paid_via: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Builds the plan already PAID through `mode`
    pub fn paid(mut self, mode: PaymentMode) -> Self {
        self.paid_via = Some(mode);
        self
    }

    /// Builds the plan
    ///
    /// # Panics
    ///
    /// Panics if the configured title or amount is invalid
    pub fn build(self) -> FeePlan {
        let mut plan = FeePlan::new(
            self.member_id,
            self.provider_id,
            self.title,
            self.amount,
            self.due_date,
        )
        .expect("valid fee plan");
        if let Some(description) = self.description {
            plan = plan.with_description(description);
        }
        if let Some(mode) = self.paid_via {
            plan.mark_paid(mode).expect("fresh plan is DUE");
        }
        plan
    }
}
