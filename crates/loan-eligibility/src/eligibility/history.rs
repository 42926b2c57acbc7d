use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use super::domain::ApplicantId;

/// Outbound port to the service that knows an applicant's prior loans.
///
/// `Ok(None)` means no known prior loan. Outages must surface as errors so they are never
/// mistaken for a clean history.
#[async_trait]
pub trait LoanHistoryLookup: Send + Sync {
    async fn last_loan_date(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryLookupError {
    #[error("loan history service unavailable: {0}")]
    Unavailable(String),
    #[error("loan history lookup timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

/// Lookup that never knows of any prior loan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoanHistory;

#[async_trait]
impl LoanHistoryLookup for NoLoanHistory {
    async fn last_loan_date(
        &self,
        _applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        Ok(None)
    }
}

/// Read-only history backed by a map, for demos and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoanHistory {
    records: HashMap<ApplicantId, NaiveDate>,
}

impl InMemoryLoanHistory {
    pub fn with_record(mut self, applicant_id: ApplicantId, last_loan: NaiveDate) -> Self {
        self.records.insert(applicant_id, last_loan);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl LoanHistoryLookup for InMemoryLoanHistory {
    async fn last_loan_date(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        Ok(self.records.get(applicant_id).copied())
    }
}

/// Bounds another lookup's latency; expiry is reported as an error.
#[derive(Debug, Clone)]
pub struct TimedLoanHistory<L> {
    inner: L,
    timeout: Duration,
}

impl<L> TimedLoanHistory<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<L> LoanHistoryLookup for TimedLoanHistory<L>
where
    L: LoanHistoryLookup,
{
    async fn last_loan_date(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<NaiveDate>, HistoryLookupError> {
        match tokio::time::timeout(self.timeout, self.inner.last_loan_date(applicant_id)).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(%applicant_id, after_ms, "loan history lookup timed out");
                Err(HistoryLookupError::Timeout { after_ms })
            }
        }
    }
}
