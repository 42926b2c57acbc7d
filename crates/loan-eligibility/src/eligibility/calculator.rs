use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

/// Decimal places kept on the monthly installment.
pub const PAYMENT_SCALE: u32 = 2;

/// Turns a requested amount and term into a flat monthly installment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentCalculator;

impl PaymentCalculator {
    /// Returns `None` when either input is missing or the term is not positive; otherwise
    /// `amount / term` rounded half-up to cents.
    pub fn monthly_payment(
        &self,
        amount: Option<Decimal>,
        term_months: Option<i32>,
    ) -> Option<Decimal> {
        let (amount, term) = match (amount, term_months) {
            (Some(amount), Some(term)) if term > 0 => (amount, term),
            _ => {
                debug!(?amount, ?term_months, "monthly payment not computable");
                return None;
            }
        };

        let mut payment = (amount / Decimal::from(term))
            .round_dp_with_strategy(PAYMENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        // Exact quotients keep a smaller scale; installments always carry cents.
        payment.rescale(PAYMENT_SCALE);
        debug!(%amount, term, %payment, "computed monthly payment");
        Some(payment)
    }
}
