use crate::engine::{Outcome, SimulationResult, Totals};
use crate::plan::{PlanFile, PurchaseAnchor, SimulationInput};
use crate::report;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const SERIES_HEADER: [&str; 3] = ["Date", "Asset Value", "Fiat Value"];

/// Summary statistics for a simulation run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub outcome: &'static str,
    pub shortfall_date: Option<NaiveDate>,
    pub shortfall_cause: Option<&'static str>,
    pub horizon: NaiveDate,
    pub monthly_payment: f64,
    pub months_simulated: usize,
    pub final_holdings: f64,
    pub final_fiat_value: f64,
    pub peak_holdings: f64,
    pub peak_fiat_value: f64,
    pub holdings_at_start: f64,
    pub holdings_at_purchase: f64,
    pub holdings_at_end: f64,
    pub totals: Totals,
}

/// Compute summary statistics from a run.
pub fn compute_summary(result: &SimulationResult) -> RunSummary {
    let (final_holdings, final_fiat_value) = result
        .final_point()
        .map(|p| (p.asset_holdings, p.fiat_value))
        .unwrap_or((0.0, 0.0));

    let (shortfall_date, shortfall_cause) = match result.outcome {
        Outcome::Shortfall { date, cause } => (Some(date), Some(cause.label())),
        _ => (None, None),
    };

    RunSummary {
        outcome: result.outcome.label(),
        shortfall_date,
        shortfall_cause,
        horizon: result.horizon,
        monthly_payment: result.monthly_payment,
        months_simulated: result.series.len(),
        final_holdings,
        final_fiat_value,
        peak_holdings: result
            .series
            .iter()
            .map(|p| p.asset_holdings)
            .fold(0.0_f64, f64::max),
        peak_fiat_value: result
            .series
            .iter()
            .map(|p| p.fiat_value)
            .fold(0.0_f64, f64::max),
        holdings_at_start: result.markers.at_start,
        holdings_at_purchase: result.markers.at_purchase,
        holdings_at_end: result.markers.at_end,
        totals: result.totals,
    }
}

/// Write the series as CSV: `Date,Asset Value,Fiat Value`, asset amounts
/// to 6 places and fiat to 2.
pub fn write_series_csv<W: Write>(
    result: &SimulationResult,
    writer: W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SERIES_HEADER)?;

    for p in &result.series {
        wtr.write_record(&[
            p.date.format("%Y-%m-%d").to_string(),
            format!("{:.6}", p.asset_holdings),
            format!("{:.2}", p.fiat_value),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Save the series to a CSV file.
pub fn save_series_csv(
    result: &SimulationResult,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_series_csv(result, file)
}

/// Save summary metrics to JSON.
pub fn save_summary_json(
    summary: &RunSummary,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}

/// Save the effective plan in plan-file format.
pub fn save_plan_toml(
    input: &SimulationInput,
    anchor: PurchaseAnchor,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let plan = PlanFile::from_input(input, anchor);
    std::fs::write(path, toml::to_string_pretty(&plan)?)?;
    Ok(())
}

/// Save all outputs for a run to a directory.
pub fn save_all(
    result: &SimulationResult,
    input: &SimulationInput,
    anchor: PurchaseAnchor,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output_dir)?;

    save_series_csv(result, &output_dir.join("series.csv"))?;

    let summary = compute_summary(result);
    save_summary_json(&summary, &output_dir.join("summary.json"))?;

    save_plan_toml(input, anchor, &output_dir.join("plan.toml"))?;

    let html = report::generate_report(result, input, "Bitcoin Savings Plan");
    report::save_report(&html, &output_dir.join("report.html"))?;

    Ok(())
}
