use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Longest recency window accepted from configuration (one hundred years).
pub const MAX_RECENT_LOAN_MONTHS: u32 = 1_200;

/// Thresholds the rule set is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    /// Largest share of the monthly salary the installment may consume.
    pub max_payment_ratio: Decimal,
    pub min_term_months: i32,
    pub max_term_months: i32,
    /// Loans taken within this many calendar months count as recent.
    pub recent_loan_months: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            max_payment_ratio: dec!(0.40),
            min_term_months: 1,
            max_term_months: 36,
            recent_loan_months: 3,
        }
    }
}
