use crate::amortization::compute_monthly_payment;
use crate::calendar;
use crate::plan::{ContributionFrequency, SimulationInput};
use crate::units::{snap_asset, snap_fiat, FIAT_MINOR_UNIT};
use chrono::NaiveDate;
use serde::Serialize;

/// One point of the output series, taken at the start of a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub asset_holdings: f64,
    pub fiat_value: f64,
    pub asset_price: f64,
}

/// Which scheduled debit could not be covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallCause {
    DownPayment,
    LoanPayment,
}

impl ShortfallCause {
    pub fn label(&self) -> &'static str {
        match self {
            Self::DownPayment => "down payment",
            Self::LoanPayment => "loan payment",
        }
    }
}

/// Run outcome. `Shortfall` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Shortfall {
        date: NaiveDate,
        cause: ShortfallCause,
    },
    Completed,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn is_shortfall(&self) -> bool {
        matches!(self, Self::Shortfall { .. })
    }

    pub fn shortfall_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Shortfall { date, .. } => Some(*date),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InProgress => "IN PROGRESS",
            Self::Shortfall { .. } => "SHORTFALL",
            Self::Completed => "COMPLETED",
        }
    }
}

/// Asset amounts captured at the three annotated points of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Markers {
    pub at_start: f64,
    pub at_purchase: f64,
    pub at_end: f64,
}

/// Fiat flows over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub contributed_fiat: f64,
    pub down_payment_fiat: f64,
    pub loan_paid_fiat: f64,
    pub payments_made: u32,
}

/// Everything a run produces. Owned by the caller; the engine keeps no
/// reference to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub series: Vec<SeriesPoint>,
    pub monthly_payment: f64,
    pub markers: Markers,
    pub outcome: Outcome,
    pub horizon: NaiveDate,
    pub totals: Totals,
}

impl SimulationResult {
    pub fn final_point(&self) -> Option<&SeriesPoint> {
        self.series.last()
    }
}

/// Mutable state threaded through the monthly loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub asset_holdings: f64,
    pub asset_price: f64,
    pub outcome: Outcome,
}

/// A single run over one validated input.
pub struct Simulation<'a> {
    input: &'a SimulationInput,
    pub state: SimulationState,
    pub series: Vec<SeriesPoint>,
    pub markers: Markers,
    pub totals: Totals,
    monthly_payment: f64,
    monthly_growth: f64,
    loan_principal: f64,
    horizon: NaiveDate,
}

impl<'a> Simulation<'a> {
    pub fn new(input: &'a SimulationInput) -> Self {
        let loan_principal = input.loan_principal();
        let monthly_payment = compute_monthly_payment(
            loan_principal,
            input.annual_interest_rate,
            input.loan_term_months,
        );
        // Validated inputs always have a horizon.
        let horizon = input.horizon().unwrap_or(input.purchase_date);

        let mut totals = Totals::default();
        let asset_holdings = if input.contribution_frequency == ContributionFrequency::LumpSum {
            totals.contributed_fiat = input.contribution_amount;
            snap_asset(input.contribution_amount / input.initial_price)
        } else {
            0.0
        };

        Simulation {
            input,
            state: SimulationState {
                asset_holdings,
                asset_price: input.initial_price,
                outcome: Outcome::InProgress,
            },
            series: Vec::new(),
            markers: Markers::default(),
            totals,
            monthly_payment,
            monthly_growth: monthly_growth_rate(input.annual_growth_rate),
            loan_principal,
            horizon,
        }
    }

    pub fn monthly_payment(&self) -> f64 {
        self.monthly_payment
    }

    pub fn horizon(&self) -> NaiveDate {
        self.horizon
    }

    /// Run every month up to the horizon, stopping early on a shortfall.
    pub fn run(mut self) -> SimulationResult {
        tracing::info!(
            start = %self.input.start_date,
            purchase = %self.input.purchase_date,
            horizon = %self.horizon,
            monthly_payment = self.monthly_payment,
            "starting simulation"
        );
        if !calendar::is_month_start(self.input.purchase_date) {
            tracing::warn!(
                purchase = %self.input.purchase_date,
                "purchase date is not the first of a month; the down payment is never withdrawn"
            );
        }

        for date in calendar::month_starts(self.input.start_date, self.horizon) {
            self.step(date);
            if self.state.outcome.is_terminal() {
                break;
            }
        }

        if !self.state.outcome.is_terminal() {
            self.complete();
        }

        match self.state.outcome {
            Outcome::Shortfall { date, cause } => {
                tracing::info!(%date, cause = cause.label(), "simulation ended in shortfall")
            }
            _ => tracing::info!(
                holdings = self.state.asset_holdings,
                "simulation completed without shortfall"
            ),
        }

        SimulationResult {
            series: self.series,
            monthly_payment: self.monthly_payment,
            markers: self.markers,
            outcome: self.state.outcome,
            horizon: self.horizon,
            totals: self.totals,
        }
    }

    /// Execute one month. `date` is the first of the month.
    pub fn step(&mut self, date: NaiveDate) {
        if self.state.outcome.is_terminal() {
            return;
        }
        let input = self.input;
        let price = self.state.asset_price;

        // (1) Start-of-month snapshot
        self.record(date);

        // (2) Contribution
        if date >= input.start_date
            && date <= input.end_date
            && input.contribution_frequency != ContributionFrequency::LumpSum
        {
            let fiat = input
                .contribution_frequency
                .monthly_amount(input.contribution_amount, calendar::days_in_month(date));
            self.state.asset_holdings = snap_asset(self.state.asset_holdings + fiat / price);
            self.totals.contributed_fiat += fiat;
        }

        // (3) Start marker
        if date == input.start_date {
            self.markers.at_start = self.state.asset_holdings;
        }

        // (4) Purchase: down payment
        if date == input.purchase_date {
            self.markers.at_purchase = self.state.asset_holdings;
            if input.down_payment > 0.0 {
                let units = input.down_payment / price;
                if self.state.asset_holdings < units {
                    self.shortfall(date, ShortfallCause::DownPayment);
                    return;
                }
                self.state.asset_holdings = snap_asset(self.state.asset_holdings - units);
                self.totals.down_payment_fiat = input.down_payment;
            }
        }

        // (5) Loan payment
        if date >= input.purchase_date && date <= self.horizon && self.loan_principal > 0.0 {
            let units = self.monthly_payment / price;
            if self.state.asset_holdings < units {
                self.shortfall(date, ShortfallCause::LoanPayment);
                return;
            }
            self.state.asset_holdings = snap_asset(self.state.asset_holdings - units);
            self.totals.loan_paid_fiat += self.monthly_payment;
            self.totals.payments_made += 1;
        }

        // (6) Price growth for next month, never snapping to zero
        self.state.asset_price =
            snap_fiat(self.state.asset_price * (1.0 + self.monthly_growth)).max(FIAT_MINOR_UNIT);

        tracing::debug!(
            %date,
            holdings = self.state.asset_holdings,
            price = self.state.asset_price,
            "month simulated"
        );
    }

    fn record(&mut self, date: NaiveDate) {
        let holdings = self.state.asset_holdings;
        let price = self.state.asset_price;
        self.series.push(SeriesPoint {
            date,
            asset_holdings: holdings,
            fiat_value: snap_fiat(holdings * price),
            asset_price: price,
        });
    }

    fn shortfall(&mut self, date: NaiveDate, cause: ShortfallCause) {
        self.state.asset_holdings = 0.0;
        self.series.push(SeriesPoint {
            date,
            asset_holdings: 0.0,
            fiat_value: 0.0,
            asset_price: self.state.asset_price,
        });
        self.markers.at_end = 0.0;
        self.state.outcome = Outcome::Shortfall { date, cause };
    }

    fn complete(&mut self) {
        let ends_at_horizon = self
            .series
            .last()
            .map(|p| p.date == self.horizon)
            .unwrap_or(false);
        if !ends_at_horizon {
            self.record(self.horizon);
        }
        self.markers.at_end = self.state.asset_holdings;
        self.state.outcome = Outcome::Completed;
    }
}

/// Monthly-equivalent of a compounding annual rate: (1 + g)^(1/12) - 1.
pub fn monthly_growth_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Run one simulation over a validated input.
pub fn simulate(input: &SimulationInput) -> SimulationResult {
    Simulation::new(input).run()
}
