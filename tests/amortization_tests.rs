use approx::assert_relative_eq;
use btc_loan_sim::amortization::compute_monthly_payment;

#[test]
fn test_zero_rate_is_straight_division() {
    for (principal, term) in [(10_000.0, 2), (1_200.0, 12), (250_000.0, 360), (99.0, 9)] {
        assert_relative_eq!(
            compute_monthly_payment(principal, 0.0, term),
            principal / term as f64,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_zero_rate_rounds_to_cents() {
    // 1000 / 3 = 333.333...
    assert_relative_eq!(compute_monthly_payment(1000.0, 0.0, 3), 333.33);
}

#[test]
fn test_zero_principal_needs_no_payment() {
    for rate in [0.0, 0.035, 0.12, 1.5] {
        assert_eq!(compute_monthly_payment(0.0, rate, 360), 0.0);
    }
}

#[test]
fn test_standard_thirty_year_mortgage() {
    // 100k at 6% over 30 years: the textbook 599.55
    assert_relative_eq!(compute_monthly_payment(100_000.0, 0.06, 360), 599.55);
}

#[test]
fn test_one_period_loan_repays_principal_plus_one_month_interest() {
    // n = 1: P * r * (1+r) / r = P * (1 + r)
    let payment = compute_monthly_payment(12_000.0, 0.12, 1);
    assert_relative_eq!(payment, 12_120.0);
}

#[test]
fn test_interest_increases_payment() {
    let free = compute_monthly_payment(50_000.0, 0.0, 60);
    let charged = compute_monthly_payment(50_000.0, 0.05, 60);
    assert!(charged > free, "{} should exceed {}", charged, free);
}

#[test]
fn test_very_long_term_converges_to_interest_only() {
    // (1 + r)^n overflows f64 here; the payment tends to P * r.
    let payment = compute_monthly_payment(100_000.0, 0.10, 100_000);
    assert!(payment.is_finite());
    assert_relative_eq!(payment, 833.33);
}
