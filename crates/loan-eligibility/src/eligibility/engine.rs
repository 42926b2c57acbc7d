use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::try_join_all;
use tracing::{debug, error, info, instrument};

use super::applicant::{ApplicantResolutionError, ApplicantResolver};
use super::calculator::PaymentCalculator;
use super::context::{Clock, EvaluationContext};
use super::domain::{EvaluationResult, LoanRequest, Reason};
use super::history::{HistoryLookupError, LoanHistoryLookup};
use super::policy::EligibilityPolicy;
use super::rules::{AmountRule, CapacityRule, EligibilityRule, RecencyRule, RuleError, TermRule};

/// Lifecycle of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    Started,
    ContextBuilt,
    RulesRunning,
    Aggregated,
    Failed,
}

impl EvaluationState {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationState::Started => "started",
            EvaluationState::ContextBuilt => "context_built",
            EvaluationState::RulesRunning => "rules_running",
            EvaluationState::Aggregated => "aggregated",
            EvaluationState::Failed => "failed",
        }
    }
}

impl fmt::Display for EvaluationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Infrastructure or programming fault that prevents a decision. Never a rejection.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("applicant resolution failed: {0}")]
    ApplicantResolution(#[source] ApplicantResolutionError),
    #[error("rule '{rule}' could not reach loan history: {source}")]
    HistoryUnavailable {
        rule: &'static str,
        #[source]
        source: HistoryLookupError,
    },
    #[error("evaluation failed after reaching {state}: {detail}")]
    Internal {
        state: EvaluationState,
        detail: String,
    },
}

impl EvaluationError {
    /// Last state the evaluation reached before failing.
    pub fn failed_after(&self) -> EvaluationState {
        match self {
            EvaluationError::ApplicantResolution(_) => EvaluationState::Started,
            EvaluationError::HistoryUnavailable { .. } => EvaluationState::RulesRunning,
            EvaluationError::Internal { state, .. } => *state,
        }
    }
}

struct RuleOutcome {
    priority: i32,
    reasons: Vec<Reason>,
}

/// Builds the evaluation context, runs every registered rule against it and merges the
/// findings into one decision.
pub struct EligibilityEngine {
    policy: EligibilityPolicy,
    calculator: PaymentCalculator,
    resolver: Arc<dyn ApplicantResolver>,
    clock: Arc<dyn Clock>,
    rules: Vec<Box<dyn EligibilityRule>>,
}

impl EligibilityEngine {
    /// Engine with no rules registered.
    pub fn new(
        policy: EligibilityPolicy,
        resolver: Arc<dyn ApplicantResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            calculator: PaymentCalculator,
            resolver,
            clock,
            rules: Vec::new(),
        }
    }

    /// Engine with the amount, term, capacity, and recency rules.
    pub fn standard(
        policy: EligibilityPolicy,
        resolver: Arc<dyn ApplicantResolver>,
        history: Arc<dyn LoanHistoryLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rules: [Box<dyn EligibilityRule>; 4] = [
            Box::new(AmountRule),
            Box::new(TermRule::from_policy(&policy)),
            Box::new(CapacityRule::from_policy(&policy)),
            Box::new(RecencyRule::new(history)),
        ];
        rules
            .into_iter()
            .fold(Self::new(policy, resolver, clock), Self::with_rule)
    }

    pub fn with_rule(mut self, rule: Box<dyn EligibilityRule>) -> Self {
        debug!(rule = rule.name(), priority = rule.priority(), "registered rule");
        self.rules.push(rule);
        self
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Rule names in execution order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        let mut ordered: Vec<&dyn EligibilityRule> =
            self.rules.iter().map(|rule| rule.as_ref()).collect();
        ordered.sort_by_key(|rule| rule.priority());
        ordered.into_iter().map(|rule| rule.name()).collect()
    }

    /// Evaluates one request. Every rule runs; reasons come back ordered by rule priority
    /// (registration order on ties) regardless of which rule finished first.
    #[instrument(
        name = "eligibility.evaluate",
        skip_all,
        fields(state = tracing::field::Empty, applicant_id = tracing::field::Empty)
    )]
    pub async fn evaluate(
        &self,
        request: &LoanRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        debug!(
            monthly_salary = ?request.monthly_salary,
            requested_amount = ?request.requested_amount,
            term_months = ?request.term_months,
            "starting evaluation"
        );

        let outcome = self.run(request).await;
        if let Err(err) = &outcome {
            record_state(EvaluationState::Failed);
            error!(failed_after = %err.failed_after(), error = %err, "evaluation failed");
        }
        outcome
    }

    async fn run(&self, request: &LoanRequest) -> Result<EvaluationResult, EvaluationError> {
        let context = self.build_context(request)?;
        record_state(EvaluationState::ContextBuilt);
        if let Some(applicant_id) = context.applicant_id() {
            tracing::Span::current().record("applicant_id", applicant_id.as_str());
        }

        record_state(EvaluationState::RulesRunning);
        let mut outcomes = try_join_all(
            self.rules
                .iter()
                .map(|rule| run_rule(rule.as_ref(), request, &context)),
        )
        .await?;

        // Stable: equal priorities keep registration order.
        outcomes.sort_by_key(|outcome| outcome.priority);
        let reasons: Vec<Reason> = outcomes
            .into_iter()
            .flat_map(|outcome| outcome.reasons)
            .collect();

        let result = EvaluationResult::new(reasons, context.monthly_payment());
        record_state(EvaluationState::Aggregated);
        info!(
            eligible = result.eligible(),
            reasons = ?result.reasons(),
            monthly_payment = %result.monthly_payment(),
            "evaluation completed"
        );
        Ok(result)
    }

    fn build_context(&self, request: &LoanRequest) -> Result<EvaluationContext, EvaluationError> {
        let today = self.clock.today();
        let monthly_payment = self
            .calculator
            .monthly_payment(request.requested_amount, request.term_months);
        let applicant_id = self
            .resolver
            .resolve_applicant_id(request)
            .map_err(EvaluationError::ApplicantResolution)?;

        EvaluationContext::new(
            today,
            self.policy.recent_loan_months,
            monthly_payment,
            applicant_id,
        )
        .ok_or_else(|| EvaluationError::Internal {
            state: EvaluationState::Started,
            detail: format!(
                "recency window of {} months before {today} is out of range",
                self.policy.recent_loan_months
            ),
        })
    }
}

async fn run_rule(
    rule: &dyn EligibilityRule,
    request: &LoanRequest,
    context: &EvaluationContext,
) -> Result<RuleOutcome, EvaluationError> {
    debug!(rule = rule.name(), "executing rule");
    let reasons = rule
        .evaluate(request, context)
        .await
        .map_err(|err| match err {
            RuleError::History(source) => EvaluationError::HistoryUnavailable {
                rule: rule.name(),
                source,
            },
            RuleError::Internal(detail) => EvaluationError::Internal {
                state: EvaluationState::RulesRunning,
                detail: format!("rule '{}': {detail}", rule.name()),
            },
        })?;

    if !reasons.is_empty() {
        debug!(rule = rule.name(), ?reasons, "rule found violations");
    }
    Ok(RuleOutcome {
        priority: rule.priority(),
        reasons,
    })
}

fn record_state(state: EvaluationState) {
    tracing::Span::current().record("state", state.label());
}
