use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use loan_eligibility::config::AppConfig;
use loan_eligibility::eligibility::{
    ApplicantId, Clock, EligibilityEngine, HistoryLookupError, LoanEligibilityService,
    LoanHistoryLookup, RequestGuard, TieredApplicantResolver, TimedLoanHistory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Local loan history matching the demo identity tiers: the top tier borrowed a month
/// before today, the middle tier six months before, and the bottom tier never.
///
/// Dates are computed from the clock on every lookup so a long-running demo keeps showing
/// both recency outcomes.
pub(crate) struct DemoLoanHistory {
    clock: Arc<dyn Clock>,
    months_since_last_loan: HashMap<ApplicantId, u32>,
}

impl DemoLoanHistory {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        let months_since_last_loan = HashMap::from([
            (ApplicantId::new(TieredApplicantResolver::RECENT_LOANS), 1),
            (ApplicantId::new(TieredApplicantResolver::OLD_LOANS), 6),
        ]);
        Self {
            clock,
            months_since_last_loan,
        }
    }
}

#[async_trait]
impl LoanHistoryLookup for DemoLoanHistory {
    async fn last_loan_date(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        let Some(months) = self.months_since_last_loan.get(applicant_id) else {
            return Ok(None);
        };
        let today = self.clock.today();
        today
            .checked_sub_months(Months::new(*months))
            .map(Some)
            .ok_or_else(|| {
                HistoryLookupError::Unavailable(format!(
                    "demo loan date {months} months before {today} is out of range"
                ))
            })
    }
}

/// Wires the guard, the standard rule set, and the demo collaborators from configuration.
pub(crate) fn build_service(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> Arc<LoanEligibilityService> {
    let history = TimedLoanHistory::new(
        DemoLoanHistory::new(clock.clone()),
        config.history.lookup_timeout,
    );
    let engine = EligibilityEngine::standard(
        config.eligibility.clone(),
        Arc::new(TieredApplicantResolver::default()),
        Arc::new(history),
        clock,
    );
    debug!(rules = ?engine.rule_names(), "eligibility engine assembled");

    Arc::new(LoanEligibilityService::new(
        RequestGuard::new(config.guard.clone()),
        engine,
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
