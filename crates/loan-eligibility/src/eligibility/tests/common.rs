use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::eligibility::applicant::{
    ApplicantResolutionError, ApplicantResolver, FixedApplicantResolver,
};
use crate::eligibility::context::{Clock, EvaluationContext, FixedClock};
use crate::eligibility::domain::{ApplicantId, LoanRequest, Reason};
use crate::eligibility::engine::EligibilityEngine;
use crate::eligibility::history::{HistoryLookupError, LoanHistoryLookup};
use crate::eligibility::policy::EligibilityPolicy;
use crate::eligibility::rules::{EligibilityRule, RuleError};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn months_ago(months: u32) -> NaiveDate {
    today()
        .checked_sub_months(Months::new(months))
        .expect("in range")
}

pub(super) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(today()))
}

pub(super) fn applicant() -> ApplicantId {
    ApplicantId::new("applicant-under-test")
}

pub(super) fn fixed_resolver() -> Arc<dyn ApplicantResolver> {
    Arc::new(FixedApplicantResolver(applicant()))
}

pub(super) fn standard_engine(history: Arc<dyn LoanHistoryLookup>) -> EligibilityEngine {
    EligibilityEngine::standard(
        EligibilityPolicy::default(),
        fixed_resolver(),
        history,
        clock(),
    )
}

pub(super) fn bare_engine() -> EligibilityEngine {
    EligibilityEngine::new(EligibilityPolicy::default(), fixed_resolver(), clock())
}

pub(super) fn context() -> EvaluationContext {
    EvaluationContext::new(today(), 3, None, Some(applicant())).expect("context builds")
}

pub(super) fn request(salary: Decimal, amount: Decimal, term: i32) -> LoanRequest {
    LoanRequest::new(salary, amount, term)
}

/// History double that records how often it was consulted.
#[derive(Default)]
pub(super) struct CountingHistory {
    last_loan: Option<NaiveDate>,
    calls: AtomicUsize,
}

impl CountingHistory {
    pub(super) fn with_last_loan(last_loan: NaiveDate) -> Self {
        Self {
            last_loan: Some(last_loan),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoanHistoryLookup for CountingHistory {
    async fn last_loan_date(
        &self,
        _applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.last_loan)
    }
}

pub(super) struct OutageHistory;

#[async_trait]
impl LoanHistoryLookup for OutageHistory {
    async fn last_loan_date(
        &self,
        _applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        Err(HistoryLookupError::Unavailable("connection refused".to_string()))
    }
}

pub(super) struct StalledHistory;

#[async_trait]
impl LoanHistoryLookup for StalledHistory {
    async fn last_loan_date(
        &self,
        _applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        std::future::pending().await
    }
}

/// Lookup that never answers and records whether its in-flight future was dropped.
#[derive(Default)]
pub(super) struct HangingHistory {
    started: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl HangingHistory {
    pub(super) fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(super) fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LoanHistoryLookup for HangingHistory {
    async fn last_loan_date(
        &self,
        _applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        self.started.store(true, Ordering::SeqCst);
        let _in_flight = DropFlag(self.dropped.clone());
        std::future::pending().await
    }
}

pub(super) struct BrokenResolver;

impl ApplicantResolver for BrokenResolver {
    fn resolve_applicant_id(
        &self,
        _request: &LoanRequest,
    ) -> Result<Option<ApplicantId>, ApplicantResolutionError> {
        Err(ApplicantResolutionError::Failed("session store offline".to_string()))
    }
}

pub(super) struct AnonymousResolver;

impl ApplicantResolver for AnonymousResolver {
    fn resolve_applicant_id(
        &self,
        _request: &LoanRequest,
    ) -> Result<Option<ApplicantId>, ApplicantResolutionError> {
        Ok(None)
    }
}

/// Rule with a fixed answer and an optional delay before answering.
pub(super) struct ScriptedRule {
    pub(super) name: &'static str,
    pub(super) priority: i32,
    pub(super) delay: Duration,
    pub(super) reasons: Vec<Reason>,
}

impl ScriptedRule {
    pub(super) fn boxed(
        name: &'static str,
        priority: i32,
        delay_ms: u64,
        reasons: Vec<Reason>,
    ) -> Box<dyn EligibilityRule> {
        Box::new(Self {
            name,
            priority,
            delay: Duration::from_millis(delay_ms),
            reasons,
        })
    }
}

#[async_trait]
impl EligibilityRule for ScriptedRule {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &'static str {
        self.name
    }

    async fn evaluate(
        &self,
        _request: &LoanRequest,
        _context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reasons.clone())
    }
}

pub(super) struct FaultyRule;

#[async_trait]
impl EligibilityRule for FaultyRule {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn evaluate(
        &self,
        _request: &LoanRequest,
        _context: &EvaluationContext,
    ) -> Result<Vec<Reason>, RuleError> {
        Err(RuleError::Internal("lost its configuration".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
