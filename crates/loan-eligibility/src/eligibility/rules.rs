use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::context::EvaluationContext;
use super::domain::{LastLoanDate, LoanRequest, Reason};
use super::history::{HistoryLookupError, LoanHistoryLookup};
use super::policy::EligibilityPolicy;

/// Priority given to rules that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Independent unit of eligibility policy.
///
/// Rules never see each other's findings and must not assume any other rule ran. A rule
/// reports problems it finds as [`Reason`]s; `Err` is reserved for infrastructure faults.
#[async_trait]
pub trait EligibilityRule: Send + Sync {
    /// Lower runs first; equal priorities keep registration order.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Diagnostic label, not shown to applicants.
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        request: &LoanRequest,
        context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    History(#[from] HistoryLookupError),
    #[error("rule fault: {0}")]
    Internal(String),
}

fn is_invalid_amount(value: Option<Decimal>) -> bool {
    value.map_or(true, |amount| amount <= Decimal::ZERO)
}

/// Salary and requested amount must both be present and positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountRule;

#[async_trait]
impl EligibilityRule for AmountRule {
    fn priority(&self) -> i32 {
        10
    }

    fn name(&self) -> &'static str {
        "amount"
    }

    async fn evaluate(
        &self,
        request: &LoanRequest,
        _context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError> {
        let mut reasons = Vec::new();
        if is_invalid_amount(request.monthly_salary) || is_invalid_amount(request.requested_amount)
        {
            warn!(
                monthly_salary = ?request.monthly_salary,
                requested_amount = ?request.requested_amount,
                "invalid amounts"
            );
            reasons.push(Reason::InvalidData);
        }
        Ok(reasons)
    }
}

/// Term must be present and inside the configured bounds.
#[derive(Debug, Clone, Copy)]
pub struct TermRule {
    min_months: i32,
    max_months: i32,
}

impl TermRule {
    pub fn new(min_months: i32, max_months: i32) -> Self {
        Self {
            min_months,
            max_months,
        }
    }

    pub fn from_policy(policy: &EligibilityPolicy) -> Self {
        Self::new(policy.min_term_months, policy.max_term_months)
    }
}

impl Default for TermRule {
    fn default() -> Self {
        Self::from_policy(&EligibilityPolicy::default())
    }
}

#[async_trait]
impl EligibilityRule for TermRule {
    fn priority(&self) -> i32 {
        20
    }

    fn name(&self) -> &'static str {
        "term"
    }

    async fn evaluate(
        &self,
        request: &LoanRequest,
        _context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError> {
        let mut reasons = Vec::new();
        let within = request
            .term_months
            .is_some_and(|term| (self.min_months..=self.max_months).contains(&term));
        if !within {
            warn!(
                term_months = ?request.term_months,
                min = self.min_months,
                max = self.max_months,
                "term outside allowed range"
            );
            reasons.push(Reason::TermExceeded);
        }
        Ok(reasons)
    }
}

/// The installment computed for the context may not exceed a share of the salary.
///
/// Without both figures capacity cannot be judged; the amount and term rules report that.
#[derive(Debug, Clone, Copy)]
pub struct CapacityRule {
    max_payment_ratio: Decimal,
}

impl CapacityRule {
    pub fn new(max_payment_ratio: Decimal) -> Self {
        Self { max_payment_ratio }
    }

    pub fn from_policy(policy: &EligibilityPolicy) -> Self {
        Self::new(policy.max_payment_ratio)
    }
}

impl Default for CapacityRule {
    fn default() -> Self {
        Self::from_policy(&EligibilityPolicy::default())
    }
}

#[async_trait]
impl EligibilityRule for CapacityRule {
    fn priority(&self) -> i32 {
        30
    }

    fn name(&self) -> &'static str {
        "capacity"
    }

    async fn evaluate(
        &self,
        request: &LoanRequest,
        context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError> {
        let mut reasons = Vec::new();
        let (Some(salary), Some(payment)) = (request.monthly_salary, context.monthly_payment())
        else {
            debug!("capacity not assessable without salary and installment");
            return Ok(reasons);
        };

        let max_allowed = salary * self.max_payment_ratio;
        if payment > max_allowed {
            warn!(
                %payment,
                %max_allowed,
                ratio = %self.max_payment_ratio,
                "insufficient payment capacity"
            );
            reasons.push(Reason::InsufficientCapacity);
        }
        Ok(reasons)
    }
}

/// Rejects applicants whose last loan falls inside the recency window.
///
/// A date supplied on the request wins over the history service; an explicit "no prior
/// loan" passes without any lookup.
pub struct RecencyRule {
    history: Arc<dyn LoanHistoryLookup>,
}

impl RecencyRule {
    pub fn new(history: Arc<dyn LoanHistoryLookup>) -> Self {
        Self { history }
    }
}

#[async_trait]
impl EligibilityRule for RecencyRule {
    fn priority(&self) -> i32 {
        40
    }

    fn name(&self) -> &'static str {
        "recency"
    }

    async fn evaluate(
        &self,
        request: &LoanRequest,
        context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError> {
        let last_loan = match request.last_loan_date {
            LastLoanDate::ProvidedNull => {
                debug!("caller confirmed no prior loans");
                return Ok(Vec::new());
            }
            LastLoanDate::Provided(date) => Some(date),
            LastLoanDate::NotProvided => match context.applicant_id() {
                Some(applicant_id) if context.external_data_available() => {
                    let found = self.history.last_loan_date(applicant_id).await?;
                    debug!(%applicant_id, ?found, "loan history consulted");
                    found
                }
                _ => {
                    warn!("applicant identity unavailable, assuming no loan history");
                    None
                }
            },
        };

        let mut reasons = Vec::new();
        if let Some(date) = last_loan {
            let threshold = context.recent_loan_threshold();
            if date >= threshold {
                warn!(last_loan = %date, %threshold, "recent loan on record");
                reasons.push(Reason::HasRecentLoan);
            }
        }
        Ok(reasons)
    }
}
