use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::LoanRequest;
use super::engine::EvaluationError;
use super::service::{EligibilityServiceError, LoanEligibilityService};

/// Router builder exposing the eligibility endpoint.
pub fn eligibility_router(service: Arc<LoanEligibilityService>) -> Router {
    Router::new()
        .route("/api/v1/loans/eligibility", post(eligibility_handler))
        .with_state(service)
}

/// HTTP status for a failed evaluation. An unreachable history service is a 503, never a
/// rejection.
pub fn status_for(error: &EligibilityServiceError) -> StatusCode {
    match error {
        EligibilityServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        EligibilityServiceError::Evaluation(EvaluationError::HistoryUnavailable { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        EligibilityServiceError::Evaluation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) async fn eligibility_handler(
    State(service): State<Arc<LoanEligibilityService>>,
    axum::Json(request): axum::Json<LoanRequest>,
) -> Response {
    match service.evaluate(&request).await {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => {
            let status = status_for(&error);
            warn!(%status, %error, "eligibility request failed");
            let payload = json!({
                "error": error.to_string(),
            });
            (status, axum::Json(payload)).into_response()
        }
    }
}
