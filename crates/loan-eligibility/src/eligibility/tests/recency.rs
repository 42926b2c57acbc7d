use super::common::*;
use chrono::Duration as ChronoDuration;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::eligibility::domain::{LastLoanDate, Reason};
use crate::eligibility::rules::{EligibilityRule, RecencyRule};

#[tokio::test]
async fn explicit_date_suppresses_history_lookup() {
    let history = Arc::new(CountingHistory::with_last_loan(months_ago(1)));
    let rule = RecencyRule::new(history.clone());
    let request = request(dec!(2500), dec!(6000), 24)
        .with_last_loan_date(LastLoanDate::Provided(months_ago(12)));

    let reasons = rule.evaluate(&request, &context()).await.expect("rule runs");

    assert!(reasons.is_empty(), "the supplied date is a year old");
    assert_eq!(history.calls(), 0);
}

#[tokio::test]
async fn explicit_null_means_no_prior_loans() {
    let history = Arc::new(CountingHistory::with_last_loan(months_ago(1)));
    let rule = RecencyRule::new(history.clone());
    let request =
        request(dec!(2500), dec!(6000), 24).with_last_loan_date(LastLoanDate::ProvidedNull);

    let reasons = rule.evaluate(&request, &context()).await.expect("rule runs");

    assert!(reasons.is_empty());
    assert_eq!(history.calls(), 0);
}

#[tokio::test]
async fn absent_date_consults_history_once() {
    let history = Arc::new(CountingHistory::with_last_loan(months_ago(1)));
    let rule = RecencyRule::new(history.clone());

    let reasons = rule
        .evaluate(&request(dec!(2500), dec!(6000), 24), &context())
        .await
        .expect("rule runs");

    assert_eq!(reasons, vec![Reason::HasRecentLoan]);
    assert_eq!(history.calls(), 1);
}

#[tokio::test]
async fn empty_history_passes() {
    let history = Arc::new(CountingHistory::default());
    let rule = RecencyRule::new(history.clone());

    let reasons = rule
        .evaluate(&request(dec!(2500), dec!(6000), 24), &context())
        .await
        .expect("rule runs");

    assert!(reasons.is_empty());
    assert_eq!(history.calls(), 1);
}

#[tokio::test]
async fn window_boundary_is_inclusive() {
    let rule = RecencyRule::new(Arc::new(CountingHistory::default()));
    let threshold = months_ago(3);

    let on_boundary = request(dec!(2500), dec!(6000), 24)
        .with_last_loan_date(LastLoanDate::Provided(threshold));
    let reasons = rule.evaluate(&on_boundary, &context()).await.expect("rule runs");
    assert_eq!(reasons, vec![Reason::HasRecentLoan]);

    let day_before = request(dec!(2500), dec!(6000), 24)
        .with_last_loan_date(LastLoanDate::Provided(threshold - ChronoDuration::days(1)));
    let reasons = rule.evaluate(&day_before, &context()).await.expect("rule runs");
    assert!(reasons.is_empty());
}

#[tokio::test]
async fn history_errors_propagate_instead_of_passing() {
    let rule = RecencyRule::new(Arc::new(OutageHistory));

    let outcome = rule
        .evaluate(&request(dec!(2500), dec!(6000), 24), &context())
        .await;

    assert!(outcome.is_err());
}

#[tokio::test]
async fn history_date_within_window_through_engine() {
    let history = Arc::new(CountingHistory::with_last_loan(today()));
    let engine = standard_engine(history.clone());

    let result = engine
        .evaluate(&request(dec!(2500), dec!(6000), 24))
        .await
        .expect("evaluation succeeds");

    assert_eq!(result.reasons(), &[Reason::HasRecentLoan]);
    assert_eq!(history.calls(), 1);
}
