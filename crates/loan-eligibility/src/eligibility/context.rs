use chrono::{Local, Months, NaiveDate};
use rust_decimal::Decimal;

use super::domain::ApplicantId;

/// Source of the evaluation's notion of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Facts derived once per evaluation and shared read-only by every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    current_date: NaiveDate,
    recent_loan_threshold: NaiveDate,
    monthly_payment: Option<Decimal>,
    applicant_id: Option<ApplicantId>,
    external_data_available: bool,
}

impl EvaluationContext {
    /// Returns `None` when the recency window reaches before the supported calendar range.
    pub fn new(
        current_date: NaiveDate,
        recent_loan_months: u32,
        monthly_payment: Option<Decimal>,
        applicant_id: Option<ApplicantId>,
    ) -> Option<Self> {
        let recent_loan_threshold = recent_loan_threshold(current_date, recent_loan_months)?;
        let external_data_available = applicant_id.is_some();

        Some(Self {
            current_date,
            recent_loan_threshold,
            monthly_payment,
            applicant_id,
            external_data_available,
        })
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// Loans dated on or after this day are recent.
    pub fn recent_loan_threshold(&self) -> NaiveDate {
        self.recent_loan_threshold
    }

    pub fn monthly_payment(&self) -> Option<Decimal> {
        self.monthly_payment
    }

    pub fn applicant_id(&self) -> Option<&ApplicantId> {
        self.applicant_id.as_ref()
    }

    /// False when no applicant identity could be established for history lookups.
    pub fn external_data_available(&self) -> bool {
        self.external_data_available
    }
}

/// Calendar-month subtraction; month ends clamp (May 31 minus three months is Feb 28/29).
pub fn recent_loan_threshold(current_date: NaiveDate, months: u32) -> Option<NaiveDate> {
    current_date.checked_sub_months(Months::new(months))
}
