use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier used as the key for loan history lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl ApplicantId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the caller said about the applicant's most recent loan.
///
/// An absent field and an explicit `null` are different statements: the former asks the
/// engine to consult the loan history service, the latter confirms there is no history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastLoanDate {
    #[default]
    NotProvided,
    ProvidedNull,
    Provided(NaiveDate),
}

impl LastLoanDate {
    pub fn is_not_provided(&self) -> bool {
        matches!(self, LastLoanDate::NotProvided)
    }

    pub fn provided(&self) -> Option<NaiveDate> {
        match self {
            LastLoanDate::Provided(date) => Some(*date),
            _ => None,
        }
    }
}

impl From<Option<NaiveDate>> for LastLoanDate {
    fn from(value: Option<NaiveDate>) -> Self {
        match value {
            Some(date) => LastLoanDate::Provided(date),
            None => LastLoanDate::ProvidedNull,
        }
    }
}

impl Serialize for LastLoanDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            LastLoanDate::Provided(date) => date.serialize(serializer),
            LastLoanDate::NotProvided | LastLoanDate::ProvidedNull => serializer.serialize_none(),
        }
    }
}

// Only invoked when the field is present; `#[serde(default)]` covers the absent case.
impl<'de> Deserialize<'de> for LastLoanDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NaiveDate>::deserialize(deserializer).map(LastLoanDate::from)
    }
}

/// Inbound loan application, immutable once handed to the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    #[serde(default)]
    pub monthly_salary: Option<Decimal>,
    #[serde(default)]
    pub requested_amount: Option<Decimal>,
    #[serde(default)]
    pub term_months: Option<i32>,
    #[serde(default, skip_serializing_if = "LastLoanDate::is_not_provided")]
    pub last_loan_date: LastLoanDate,
}

impl LoanRequest {
    pub fn new(monthly_salary: Decimal, requested_amount: Decimal, term_months: i32) -> Self {
        Self {
            monthly_salary: Some(monthly_salary),
            requested_amount: Some(requested_amount),
            term_months: Some(term_months),
            last_loan_date: LastLoanDate::NotProvided,
        }
    }

    pub fn with_last_loan_date(mut self, last_loan_date: LastLoanDate) -> Self {
        self.last_loan_date = last_loan_date;
        self
    }
}

/// Closed set of ineligibility causes a rule may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    InvalidData,
    TermExceeded,
    InsufficientCapacity,
    HasRecentLoan,
}

impl Reason {
    pub const fn code(self) -> &'static str {
        match self {
            Reason::InvalidData => "INVALID_DATA",
            Reason::TermExceeded => "TERM_EXCEEDED",
            Reason::InsufficientCapacity => "INSUFFICIENT_CAPACITY",
            Reason::HasRecentLoan => "HAS_RECENT_LOAN",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Final decision for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    eligible: bool,
    reasons: Vec<Reason>,
    #[serde(with = "rust_decimal::serde::float")]
    monthly_payment: Decimal,
}

impl EvaluationResult {
    /// Eligibility is derived from the reasons so the two can never disagree.
    pub fn new(reasons: Vec<Reason>, monthly_payment: Option<Decimal>) -> Self {
        Self {
            eligible: reasons.is_empty(),
            reasons,
            monthly_payment: monthly_payment.unwrap_or(Decimal::ZERO),
        }
    }

    pub fn eligible(&self) -> bool {
        self.eligible
    }

    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    pub fn monthly_payment(&self) -> Decimal {
        self.monthly_payment
    }

    pub fn summary(&self) -> String {
        if self.eligible {
            format!("eligible (monthly payment {})", self.monthly_payment)
        } else {
            let codes: Vec<&str> = self.reasons.iter().map(|reason| reason.code()).collect();
            format!("not eligible: {}", codes.join(", "))
        }
    }
}
