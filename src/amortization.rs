//! Fixed-payment amortization for the loan that finances the remainder
//! of the purchase.
//!
//! Simple nominal-rate model: monthly rate = annual rate / 12, the
//! payment is computed once and rounded to cents, then reused for every
//! period. No residual balance is tracked.

use crate::units::snap_fiat;

/// Monthly payment for a fully amortizing loan.
///
/// payment = P * r / (1 - (1 + r)^-n),  r = annual_rate / 12
///
/// Written with the negative power so long terms converge to P * r
/// instead of overflowing.
///
/// A zero principal needs no payment. A zero rate takes the limit form
/// P / n. Inputs are expected to be validated (`term_months > 0`).
pub fn compute_monthly_payment(principal: f64, annual_rate: f64, term_months: u32) -> f64 {
    if principal <= 0.0 || term_months == 0 {
        return 0.0;
    }

    let n = term_months as f64;
    let r = annual_rate / 12.0;

    let payment = if r == 0.0 {
        principal / n
    } else {
        principal * r / (1.0 - (1.0 + r).powf(-n))
    };

    snap_fiat(payment)
}
