use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::domain::{LastLoanDate, LoanRequest};

/// Sanity limits applied to inbound requests before they reach the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardLimits {
    pub min_monthly_salary: Decimal,
    pub max_monthly_salary: Decimal,
    pub min_requested_amount: Decimal,
    pub max_requested_amount: Decimal,
    pub min_term_months: i32,
    pub max_term_months: i32,
    /// Requested amount as a multiple of annual salary.
    pub max_loan_to_annual_income: Decimal,
    /// Coarse installment-to-salary bound; the capacity rule makes the real decision.
    pub max_preliminary_debt_ratio: Decimal,
    pub max_last_loan_age_years: u32,
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            min_monthly_salary: dec!(100),
            max_monthly_salary: dec!(1000000),
            min_requested_amount: dec!(100),
            max_requested_amount: dec!(10000000),
            min_term_months: 1,
            max_term_months: 36,
            max_loan_to_annual_income: dec!(20),
            max_preliminary_debt_ratio: dec!(0.80),
            max_last_loan_age_years: 10,
        }
    }
}

/// Reasons a request is refused before evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestViolation {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
    },
    #[error("last loan date {0} is in the future")]
    LastLoanInFuture(NaiveDate),
    #[error("last loan date {date} is more than {years} years ago")]
    LastLoanTooOld { date: NaiveDate, years: u32 },
    #[error("requested amount is {ratio} times annual salary, maximum is {max}")]
    LoanToIncomeExceeded { ratio: Decimal, max: Decimal },
    #[error("monthly payment {payment} would exceed {max_pct}% of monthly salary")]
    PreliminaryDebtRatioExceeded { payment: Decimal, max_pct: Decimal },
}

/// Input sanity layer sitting in front of the engine.
#[derive(Debug, Clone, Default)]
pub struct RequestGuard {
    limits: GuardLimits,
}

impl RequestGuard {
    pub fn new(limits: GuardLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &GuardLimits {
        &self.limits
    }

    pub fn check(&self, request: &LoanRequest, today: NaiveDate) -> Result<(), RequestViolation> {
        let limits = &self.limits;
        let salary = bounded_amount(
            "monthlySalary",
            request.monthly_salary,
            limits.min_monthly_salary,
            limits.max_monthly_salary,
        )?;
        let amount = bounded_amount(
            "requestedAmount",
            request.requested_amount,
            limits.min_requested_amount,
            limits.max_requested_amount,
        )?;

        let term = request
            .term_months
            .ok_or(RequestViolation::Missing { field: "termMonths" })?;
        if term < limits.min_term_months || term > limits.max_term_months {
            return Err(RequestViolation::OutOfRange {
                field: "termMonths",
                min: limits.min_term_months.to_string(),
                max: limits.max_term_months.to_string(),
            });
        }

        if let LastLoanDate::Provided(date) = request.last_loan_date {
            self.check_last_loan_date(date, today)?;
        }

        let ratio = amount / (salary * Decimal::from(12));
        if ratio > limits.max_loan_to_annual_income {
            return Err(RequestViolation::LoanToIncomeExceeded {
                ratio: ratio.round_dp(2),
                max: limits.max_loan_to_annual_income,
            });
        }

        let payment = amount / Decimal::from(term);
        if payment / salary > limits.max_preliminary_debt_ratio {
            return Err(RequestViolation::PreliminaryDebtRatioExceeded {
                payment: payment.round_dp(2),
                max_pct: (limits.max_preliminary_debt_ratio * Decimal::ONE_HUNDRED).normalize(),
            });
        }

        Ok(())
    }

    fn check_last_loan_date(
        &self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<(), RequestViolation> {
        if date > today {
            return Err(RequestViolation::LastLoanInFuture(date));
        }

        let years = self.limits.max_last_loan_age_years;
        let oldest = today.checked_sub_months(Months::new(years.saturating_mul(12)));
        if oldest.is_some_and(|oldest| date < oldest) {
            return Err(RequestViolation::LastLoanTooOld { date, years });
        }
        Ok(())
    }
}

fn bounded_amount(
    field: &'static str,
    value: Option<Decimal>,
    min: Decimal,
    max: Decimal,
) -> Result<Decimal, RequestViolation> {
    let value = value.ok_or(RequestViolation::Missing { field })?;
    if value <= Decimal::ZERO {
        return Err(RequestViolation::NotPositive { field });
    }
    if value < min || value > max {
        return Err(RequestViolation::OutOfRange {
            field,
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid")
    }

    fn guard() -> RequestGuard {
        RequestGuard::default()
    }

    #[test]
    fn accepts_reasonable_requests() {
        let request = LoanRequest::new(dec!(2500), dec!(6000), 24);
        assert_eq!(guard().check(&request, today()), Ok(()));
    }

    #[test]
    fn rejects_missing_and_non_positive_salary() {
        let mut request = LoanRequest::new(dec!(2500), dec!(6000), 24);
        request.monthly_salary = None;
        assert_eq!(
            guard().check(&request, today()),
            Err(RequestViolation::Missing {
                field: "monthlySalary"
            })
        );

        request.monthly_salary = Some(dec!(0));
        assert_eq!(
            guard().check(&request, today()),
            Err(RequestViolation::NotPositive {
                field: "monthlySalary"
            })
        );
    }

    #[test]
    fn rejects_amounts_outside_limits() {
        let request = LoanRequest::new(dec!(2500), dec!(50), 24);
        assert!(matches!(
            guard().check(&request, today()),
            Err(RequestViolation::OutOfRange {
                field: "requestedAmount",
                ..
            })
        ));
    }

    #[test]
    fn rejects_terms_outside_limits() {
        let request = LoanRequest::new(dec!(2500), dec!(6000), 37);
        assert!(matches!(
            guard().check(&request, today()),
            Err(RequestViolation::OutOfRange {
                field: "termMonths",
                ..
            })
        ));
    }

    #[test]
    fn rejects_future_and_ancient_last_loans() {
        let future = NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid");
        let request = LoanRequest::new(dec!(2500), dec!(6000), 24)
            .with_last_loan_date(LastLoanDate::Provided(future));
        assert_eq!(
            guard().check(&request, today()),
            Err(RequestViolation::LastLoanInFuture(future))
        );

        let ancient = NaiveDate::from_ymd_opt(2015, 6, 14).expect("valid");
        let request = request.with_last_loan_date(LastLoanDate::Provided(ancient));
        assert_eq!(
            guard().check(&request, today()),
            Err(RequestViolation::LastLoanTooOld {
                date: ancient,
                years: 10
            })
        );

        let ten_years = NaiveDate::from_ymd_opt(2015, 6, 15).expect("valid");
        let request = request.with_last_loan_date(LastLoanDate::Provided(ten_years));
        assert_eq!(guard().check(&request, today()), Ok(()));
    }

    #[test]
    fn rejects_excessive_loan_to_income() {
        let request = LoanRequest::new(dec!(100), dec!(30000), 36);
        assert!(matches!(
            guard().check(&request, today()),
            Err(RequestViolation::LoanToIncomeExceeded { .. })
        ));
    }

    #[test]
    fn rejects_clearly_unaffordable_installments_only_above_coarse_bound() {
        let request = LoanRequest::new(dec!(1000), dec!(18000), 24);
        assert_eq!(guard().check(&request, today()), Ok(()));

        let request = LoanRequest::new(dec!(1000), dec!(9000), 10);
        match guard().check(&request, today()) {
            Err(RequestViolation::PreliminaryDebtRatioExceeded { payment, max_pct }) => {
                assert_eq!(payment, dec!(900));
                assert_eq!(max_pct, dec!(80));
            }
            other => panic!("expected debt ratio violation, got {other:?}"),
        }
    }

    #[test]
    fn limits_are_configurable() {
        let guard = RequestGuard::new(GuardLimits {
            max_term_months: 48,
            ..GuardLimits::default()
        });
        let request = LoanRequest::new(dec!(2500), dec!(6000), 48);
        assert_eq!(guard.check(&request, today()), Ok(()));
    }
}
