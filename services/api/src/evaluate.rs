use crate::infra::{build_service, parse_date};
use chrono::NaiveDate;
use clap::Args;
use loan_eligibility::config::AppConfig;
use loan_eligibility::eligibility::{
    Clock, EvaluationResult, FixedClock, LastLoanDate, LoanRequest, SystemClock,
};
use loan_eligibility::error::AppError;
use loan_eligibility::telemetry;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Applicant's monthly salary
    #[arg(long)]
    pub(crate) salary: Decimal,
    /// Requested loan amount
    #[arg(long)]
    pub(crate) amount: Decimal,
    /// Loan term in months
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) term: i32,
    /// Date of the applicant's most recent loan (YYYY-MM-DD). Omit to consult loan history.
    #[arg(long, value_parser = parse_date, conflicts_with = "no_prior_loans")]
    pub(crate) last_loan_date: Option<NaiveDate>,
    /// Declare that the applicant has never had a loan; skips the history lookup.
    #[arg(long)]
    pub(crate) no_prior_loans: bool,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

impl EvaluateArgs {
    fn request(&self) -> LoanRequest {
        let last_loan_date = match (self.last_loan_date, self.no_prior_loans) {
            (Some(date), _) => LastLoanDate::Provided(date),
            (None, true) => LastLoanDate::ProvidedNull,
            (None, false) => LastLoanDate::NotProvided,
        };
        LoanRequest::new(self.salary, self.amount, self.term).with_last_loan_date(last_loan_date)
    }

    fn clock(&self) -> Arc<dyn Clock> {
        match self.today {
            Some(today) => Arc::new(FixedClock(today)),
            None => Arc::new(SystemClock),
        }
    }
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let result = evaluate_logged(&config, &args).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn evaluate_logged(
    config: &AppConfig,
    args: &EvaluateArgs,
) -> Result<EvaluationResult, AppError> {
    telemetry::init_stderr(&config.telemetry)?;
    evaluate_with(config, args).await
}

async fn evaluate_with(
    config: &AppConfig,
    args: &EvaluateArgs,
) -> Result<EvaluationResult, AppError> {
    let service = build_service(config, args.clock());
    let result = service.evaluate(&args.request()).await?;
    Ok(result)
}
