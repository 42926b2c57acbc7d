use super::domain::{EvaluationResult, LoanRequest};
use super::engine::{EligibilityEngine, EvaluationError};
use super::guard::{RequestGuard, RequestViolation};

/// Service composing the request guard and the eligibility engine.
pub struct LoanEligibilityService {
    guard: RequestGuard,
    engine: EligibilityEngine,
}

impl LoanEligibilityService {
    pub fn new(guard: RequestGuard, engine: EligibilityEngine) -> Self {
        Self { guard, engine }
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    /// Screen the request for sanity, then run the full rule set against it.
    pub async fn evaluate(
        &self,
        request: &LoanRequest,
    ) -> Result<EvaluationResult, EligibilityServiceError> {
        self.guard.check(request, self.engine.today())?;
        let result = self.engine.evaluate(request).await?;
        Ok(result)
    }
}

/// Error raised by the eligibility service.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityServiceError {
    #[error(transparent)]
    InvalidRequest(#[from] RequestViolation),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
