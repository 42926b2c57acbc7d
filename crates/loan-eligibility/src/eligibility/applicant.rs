use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::domain::{ApplicantId, LoanRequest};

/// Supplies the identifier the loan history service is keyed by.
///
/// `Ok(None)` means no identity could be established; the evaluation continues and the
/// applicant is treated as having no known history. `Err` means the identity source
/// misbehaved and the evaluation must fail.
pub trait ApplicantResolver: Send + Sync {
    fn resolve_applicant_id(
        &self,
        request: &LoanRequest,
    ) -> Result<Option<ApplicantId>, ApplicantResolutionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicantResolutionError {
    #[error("identity source failed: {0}")]
    Failed(String),
}

/// Always resolves to the same applicant.
#[derive(Debug, Clone)]
pub struct FixedApplicantResolver(pub ApplicantId);

impl ApplicantResolver for FixedApplicantResolver {
    fn resolve_applicant_id(
        &self,
        _request: &LoanRequest,
    ) -> Result<Option<ApplicantId>, ApplicantResolutionError> {
        Ok(Some(self.0.clone()))
    }
}

/// Stand-in identity source that buckets applicants by requested amount until an
/// authenticated session is available.
#[derive(Debug, Clone)]
pub struct TieredApplicantResolver {
    recent_loans_above: Decimal,
    old_loans_above: Decimal,
}

impl TieredApplicantResolver {
    pub const RECENT_LOANS: &'static str = "applicant-recent-loans";
    pub const OLD_LOANS: &'static str = "applicant-old-loans";
    pub const NO_LOANS: &'static str = "applicant-no-loans";

    pub fn new(recent_loans_above: Decimal, old_loans_above: Decimal) -> Self {
        Self {
            recent_loans_above,
            old_loans_above,
        }
    }
}

impl Default for TieredApplicantResolver {
    fn default() -> Self {
        Self::new(dec!(15000), dec!(8000))
    }
}

impl ApplicantResolver for TieredApplicantResolver {
    fn resolve_applicant_id(
        &self,
        request: &LoanRequest,
    ) -> Result<Option<ApplicantId>, ApplicantResolutionError> {
        let id = match request.requested_amount {
            Some(amount) if amount > self.recent_loans_above => Self::RECENT_LOANS,
            Some(amount) if amount > self.old_loans_above => Self::OLD_LOANS,
            _ => Self::NO_LOANS,
        };
        debug!(applicant_id = id, "resolved applicant from amount tier");
        Ok(Some(ApplicantId::new(id)))
    }
}
