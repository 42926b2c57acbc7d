//! Loan eligibility evaluation.
//!
//! An [`EligibilityEngine`] builds one immutable [`EvaluationContext`] per request, runs
//! every registered [`EligibilityRule`] against it (concurrently, so the history lookup
//! does not hold up the synchronous rules), and merges the reasons in rule-priority order.

pub mod applicant;
pub mod calculator;
pub mod context;
pub mod domain;
pub mod engine;
pub mod guard;
pub mod history;
pub mod policy;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use applicant::{
    ApplicantResolutionError, ApplicantResolver, FixedApplicantResolver, TieredApplicantResolver,
};
pub use calculator::PaymentCalculator;
pub use context::{Clock, EvaluationContext, FixedClock, SystemClock};
pub use domain::{ApplicantId, EvaluationResult, LastLoanDate, LoanRequest, Reason};
pub use engine::{EligibilityEngine, EvaluationError, EvaluationState};
pub use guard::{GuardLimits, RequestGuard, RequestViolation};
pub use history::{
    HistoryLookupError, InMemoryLoanHistory, LoanHistoryLookup, NoLoanHistory, TimedLoanHistory,
};
pub use policy::{EligibilityPolicy, MAX_RECENT_LOAN_MONTHS};
pub use router::{eligibility_router, status_for};
pub use rules::{AmountRule, CapacityRule, EligibilityRule, RecencyRule, RuleError, TermRule};
pub use service::{EligibilityServiceError, LoanEligibilityService};
