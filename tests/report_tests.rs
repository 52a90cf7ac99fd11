use btc_loan_sim::engine::simulate;
use btc_loan_sim::plan::{ContributionFrequency, SimulationInput};
use btc_loan_sim::report::*;
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn lump_sum_input() -> SimulationInput {
    SimulationInput {
        initial_price: 50_000.0,
        contribution_amount: 10_000.0,
        contribution_frequency: ContributionFrequency::LumpSum,
        annual_growth_rate: 0.0,
        start_date: d(2025, 1, 1),
        end_date: d(2025, 1, 1),
        purchase_date: d(2025, 1, 1),
        total_cost: 20_000.0,
        down_payment: 10_000.0,
        annual_interest_rate: 0.0,
        loan_term_months: 2,
    }
}

fn saver_input() -> SimulationInput {
    SimulationInput {
        initial_price: 10_000.0,
        contribution_amount: 1_000.0,
        contribution_frequency: ContributionFrequency::Monthly,
        annual_growth_rate: 0.0,
        start_date: d(2025, 1, 1),
        end_date: d(2025, 12, 1),
        purchase_date: d(2025, 12, 1),
        total_cost: 1_000.0,
        down_payment: 1_000.0,
        annual_interest_rate: 0.0,
        loan_term_months: 1,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Outcome text
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_shortfall_message() {
    let result = simulate(&lump_sum_input());
    let lines = outcome_message(&result);
    assert_eq!(
        lines,
        vec![
            "Insufficient Bitcoin to cover the loan payment. Shortfall detected on 2025-01-01."
                .to_string(),
            "Monthly Loan Payment: $5000.00".to_string(),
        ]
    );
}

#[test]
fn test_completed_message() {
    let result = simulate(&saver_input());
    let lines = outcome_message(&result);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Savings successfully covered"));
    assert_eq!(lines[1], "Monthly Loan Payment: $0.00");
    assert_eq!(
        lines[2],
        "Final Bitcoin holdings: 1.100000 BTC, worth $11000.00 USD"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Chart markers
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_markers_for_shortfall() {
    let input = lump_sum_input();
    let result = simulate(&input);
    let [start, purchase, end] = chart_markers(&result, &input);

    assert_eq!(start.label, "Start Saving: 0.200000 BTC");
    assert_eq!(purchase.label, "Purchase: 0.200000 BTC");
    assert_eq!(end.label, "Shortfall: 0.000000 BTC");
    assert_eq!(end.date, d(2025, 1, 1));
    assert_eq!(end.color, "red");
}

#[test]
fn test_markers_for_payoff() {
    let input = saver_input();
    let result = simulate(&input);
    let [start, _, end] = chart_markers(&result, &input);

    assert_eq!(start.date, d(2025, 1, 1));
    assert_eq!(end.label, "Loan Paid Off: 1.100000 BTC");
    assert_eq!(end.date, d(2026, 1, 1));
    assert_eq!(end.color, "black");
}

#[test]
fn test_markers_snap_to_month_labels() {
    let mut input = saver_input();
    input.start_date = d(2025, 1, 17);
    let result = simulate(&input);
    let [start, ..] = chart_markers(&result, &input);
    assert_eq!(start.date, d(2025, 1, 1));
}

// ═══════════════════════════════════════════════════════════════════════
// HTML report
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_generate_report_html() {
    let input = lump_sum_input();
    let result = simulate(&input);
    let html = generate_report(&result, &input, "Scenario A");

    assert!(html.contains("<!DOCTYPE html>"), "Should be valid HTML");
    assert!(html.contains("chart.js"), "Should include Chart.js");
    assert!(html.contains("chartjs-plugin-annotation"), "Should include annotations");
    assert!(html.contains("Scenario A"), "Should contain title");
    assert!(html.contains("'y-usd'") && html.contains("'y-btc'"), "Dual axis");
    assert!(html.contains("Start Saving: 0.200000 BTC"));
    assert!(html.contains("Shortfall: 0.000000 BTC"));
    assert!(html.contains("class=\"badge shortfall\""));
    assert!(html.contains("Date,Asset Value,Fiat Value"));
}

#[test]
fn test_report_contains_series_data() {
    let input = saver_input();
    let result = simulate(&input);
    let html = generate_report(&result, &input, "Saver");

    assert!(html.contains("\"2025-01-01\""));
    assert!(html.contains("\"2026-01-01\""));
    assert!(html.contains("1.10000000"));
    assert!(html.contains("Loan Paid Off: 1.100000 BTC"));
    assert!(html.contains("class=\"badge completed\""));
}

#[test]
fn test_save_report() {
    let path = std::env::temp_dir()
        .join(format!("btc_loan_sim_report_{}", std::process::id()))
        .join("report.html");
    save_report("<html></html>", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
