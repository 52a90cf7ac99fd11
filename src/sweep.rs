use crate::engine::{simulate, Outcome};
use crate::plan::SimulationInput;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::path::Path;

/// Outcome of the plan under one annual growth rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub growth_rate: f64,
    pub outcome: Outcome,
    pub final_holdings: f64,
    pub final_fiat: f64,
}

impl SweepRow {
    pub fn completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// Runs one plan across several growth assumptions. Each run is an
/// independent simulation, so rates are evaluated in parallel.
pub struct GrowthSweep {
    pub base: SimulationInput,
}

impl GrowthSweep {
    pub fn new(base: SimulationInput) -> Self {
        GrowthSweep { base }
    }

    fn evaluate(&self, growth_rate: f64) -> SweepRow {
        let mut input = self.base.clone();
        input.annual_growth_rate = growth_rate;
        let result = simulate(&input);
        let (final_holdings, final_fiat) = result
            .final_point()
            .map(|p| (p.asset_holdings, p.fiat_value))
            .unwrap_or((0.0, 0.0));

        SweepRow {
            growth_rate,
            outcome: result.outcome,
            final_holdings,
            final_fiat,
        }
    }

    /// Evaluate every rate. Rows come back in the order given.
    pub fn run(&self, rates: &[f64]) -> Vec<SweepRow> {
        self.run_with_progress(rates, ProgressBar::hidden())
    }

    pub fn run_with_progress(&self, rates: &[f64], bar: ProgressBar) -> Vec<SweepRow> {
        let rows: Vec<SweepRow> = rates
            .par_iter()
            .progress_with(bar)
            .map(|&rate| self.evaluate(rate))
            .collect();

        tracing::info!(
            runs = rows.len(),
            completed = rows.iter().filter(|r| r.completed()).count(),
            "growth sweep finished"
        );
        rows
    }
}

/// Smallest swept growth rate whose run completed without a shortfall.
pub fn lowest_completing_rate(rows: &[SweepRow]) -> Option<f64> {
    rows.iter()
        .filter(|r| r.completed())
        .map(|r| r.growth_rate)
        .fold(None, |best, rate| match best {
            Some(b) if b <= rate => Some(b),
            _ => Some(rate),
        })
}

/// Parse a comma-separated list of percentages into fractional rates.
pub fn parse_rates_pct(values: &str) -> Result<Vec<f64>, std::num::ParseFloatError> {
    values
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse::<f64>().map(|pct| pct / 100.0))
        .collect()
}

/// Save sweep results to CSV.
pub fn save_sweep_csv(rows: &[SweepRow], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["growth_pct", "outcome", "shortfall_date", "final_btc", "final_usd"])?;

    for r in rows {
        wtr.write_record(&[
            format!("{:.2}", r.growth_rate * 100.0),
            r.outcome.label().to_string(),
            r.outcome
                .shortfall_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            format!("{:.6}", r.final_holdings),
            format!("{:.2}", r.final_fiat),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
