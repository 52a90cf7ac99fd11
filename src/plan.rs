//! Savings-and-loan plan: the validated simulation input and the TOML
//! plan file it is read from.
//!
//! The plan file mirrors the fields a user fills in (rates in percent,
//! dates as `YYYY-MM-DD`). `PlanFile::into_input` is the only way the CLI
//! builds a `SimulationInput`, so the engine never sees unvalidated data.

use crate::calendar;
use crate::units::FIAT_MINOR_UNIT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failures, one per user-reportable condition.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("initial price {value} is below the smallest fiat unit {}", FIAT_MINOR_UNIT)]
    PriceBelowMinorUnit { value: f64 },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("annual growth rate of {pct:.2}% would wipe out the asset; it must be above -100%")]
    GrowthTooLow { pct: f64 },

    #[error("{field} is not a valid date (use YYYY-MM-DD): {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("unknown contribution frequency {0:?} (expected lump_sum, monthly, weekly or daily)")]
    InvalidFrequency(String),

    #[error("unknown purchase anchor {0:?} (expected savings_start or savings_end)")]
    InvalidAnchor(String),

    #[error("savings end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("purchase date {purchase} is before the {anchor} date {anchor_date}")]
    PurchaseBeforeAnchor {
        purchase: NaiveDate,
        anchor: PurchaseAnchor,
        anchor_date: NaiveDate,
    },

    #[error("down payment {down_payment:.2} cannot exceed total cost {total_cost:.2}")]
    DownPaymentExceedsCost { down_payment: f64, total_cost: f64 },

    #[error("loan of {months} months starting {purchase} runs past the supported calendar")]
    HorizonOutOfRange { purchase: NaiveDate, months: u32 },

    #[error("failed to read plan file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse plan file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// How often the contribution amount is invested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionFrequency {
    /// Whole amount converted once, before the first month.
    LumpSum,
    Monthly,
    Weekly,
    Daily,
}

impl ContributionFrequency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LumpSum => "lump_sum",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }

    /// Fiat invested during a month with `days_in_month` days.
    ///
    /// Weekly counts fractional weeks (days / 7). Lump sums are never
    /// spread over months and contribute nothing here.
    pub fn monthly_amount(&self, amount: f64, days_in_month: u32) -> f64 {
        match self {
            Self::LumpSum => 0.0,
            Self::Monthly => amount,
            Self::Weekly => amount * days_in_month as f64 / 7.0,
            Self::Daily => amount * days_in_month as f64,
        }
    }
}

impl FromStr for ContributionFrequency {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "lump_sum" | "lumpsum" => Ok(Self::LumpSum),
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            "daily" => Ok(Self::Daily),
            _ => Err(PlanError::InvalidFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for ContributionFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Date the purchase may not precede.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseAnchor {
    /// Purchase may happen while still saving.
    SavingsStart,
    /// Purchase only after the savings window has closed.
    #[default]
    SavingsEnd,
}

impl fmt::Display for PurchaseAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SavingsStart => f.write_str("savings start"),
            Self::SavingsEnd => f.write_str("savings end"),
        }
    }
}

impl FromStr for PurchaseAnchor {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "savings_start" | "start" => Ok(Self::SavingsStart),
            "savings_end" | "end" => Ok(Self::SavingsEnd),
            _ => Err(PlanError::InvalidAnchor(s.to_string())),
        }
    }
}

/// Immutable input to one simulation run. Rates are fractions
/// (0.05 = 5%).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    /// Asset price at the start of the simulation (fiat per unit).
    pub initial_price: f64,
    pub contribution_amount: f64,
    pub contribution_frequency: ContributionFrequency,
    /// Compounding annual growth of the asset price; may be negative.
    pub annual_growth_rate: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Date the down payment is withdrawn and the loan begins.
    pub purchase_date: NaiveDate,
    pub total_cost: f64,
    pub down_payment: f64,
    pub annual_interest_rate: f64,
    pub loan_term_months: u32,
}

impl SimulationInput {
    /// Amount financed by the loan.
    pub fn loan_principal(&self) -> f64 {
        self.total_cost - self.down_payment
    }

    /// Last simulated month: `loan_term_months` after the purchase date.
    pub fn horizon(&self) -> Option<NaiveDate> {
        calendar::add_months(self.purchase_date, self.loan_term_months)
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self, anchor: PurchaseAnchor) -> Result<(), PlanError> {
        let numeric = [
            ("initial price", self.initial_price),
            ("contribution amount", self.contribution_amount),
            ("annual growth rate", self.annual_growth_rate),
            ("total cost", self.total_cost),
            ("down payment", self.down_payment),
            ("interest rate", self.annual_interest_rate),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(PlanError::NonFinite { field });
            }
        }

        if self.initial_price <= 0.0 {
            return Err(PlanError::NonPositive {
                field: "initial price",
                value: self.initial_price,
            });
        }
        if self.initial_price < FIAT_MINOR_UNIT {
            return Err(PlanError::PriceBelowMinorUnit {
                value: self.initial_price,
            });
        }
        if self.total_cost <= 0.0 {
            return Err(PlanError::NonPositive {
                field: "total cost",
                value: self.total_cost,
            });
        }
        if self.loan_term_months == 0 {
            return Err(PlanError::NonPositive {
                field: "loan term",
                value: 0.0,
            });
        }

        let non_negative = [
            ("contribution amount", self.contribution_amount),
            ("down payment", self.down_payment),
            ("interest rate", self.annual_interest_rate),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(PlanError::Negative { field, value });
            }
        }

        // (1 + g)^(1/12) is undefined or zero at and below -100%.
        if self.annual_growth_rate <= -1.0 {
            return Err(PlanError::GrowthTooLow {
                pct: self.annual_growth_rate * 100.0,
            });
        }

        if self.end_date < self.start_date {
            return Err(PlanError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }

        let anchor_date = match anchor {
            PurchaseAnchor::SavingsStart => self.start_date,
            PurchaseAnchor::SavingsEnd => self.end_date,
        };
        if self.purchase_date < anchor_date {
            return Err(PlanError::PurchaseBeforeAnchor {
                purchase: self.purchase_date,
                anchor,
                anchor_date,
            });
        }

        if self.down_payment > self.total_cost {
            return Err(PlanError::DownPaymentExceedsCost {
                down_payment: self.down_payment,
                total_cost: self.total_cost,
            });
        }

        if self.horizon().is_none() {
            return Err(PlanError::HorizonOutOfRange {
                purchase: self.purchase_date,
                months: self.loan_term_months,
            });
        }

        Ok(())
    }
}

/// On-disk plan, as a user would type it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    pub initial_price: f64,
    pub contribution_amount: f64,
    pub frequency: ContributionFrequency,
    /// Annual asset growth in percent.
    pub growth_pct: f64,
    pub start_date: String,
    pub end_date: String,
    pub purchase_date: String,
    pub total_cost: f64,
    pub down_payment: f64,
    /// Nominal annual loan rate in percent.
    pub interest_rate_pct: f64,
    pub loan_term_months: i64,
    #[serde(default)]
    pub purchase_anchor: PurchaseAnchor,
}

impl PlanFile {
    pub fn from_toml_str(s: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Convert percents and date strings, then validate.
    pub fn into_input(&self) -> Result<SimulationInput, PlanError> {
        if self.loan_term_months <= 0 || self.loan_term_months > u32::MAX as i64 {
            return Err(PlanError::NonPositive {
                field: "loan term",
                value: self.loan_term_months as f64,
            });
        }

        let input = SimulationInput {
            initial_price: self.initial_price,
            contribution_amount: self.contribution_amount,
            contribution_frequency: self.frequency,
            annual_growth_rate: self.growth_pct / 100.0,
            start_date: parse_date("start date", &self.start_date)?,
            end_date: parse_date("end date", &self.end_date)?,
            purchase_date: parse_date("purchase date", &self.purchase_date)?,
            total_cost: self.total_cost,
            down_payment: self.down_payment,
            annual_interest_rate: self.interest_rate_pct / 100.0,
            loan_term_months: self.loan_term_months as u32,
        };

        input.validate(self.purchase_anchor)?;
        Ok(input)
    }

    /// Plan file describing an existing input (used to echo the effective
    /// plan next to run outputs).
    pub fn from_input(input: &SimulationInput, anchor: PurchaseAnchor) -> Self {
        PlanFile {
            initial_price: input.initial_price,
            contribution_amount: input.contribution_amount,
            frequency: input.contribution_frequency,
            growth_pct: input.annual_growth_rate * 100.0,
            start_date: input.start_date.format(DATE_FORMAT).to_string(),
            end_date: input.end_date.format(DATE_FORMAT).to_string(),
            purchase_date: input.purchase_date.format(DATE_FORMAT).to_string(),
            total_cost: input.total_cost,
            down_payment: input.down_payment,
            interest_rate_pct: input.annual_interest_rate * 100.0,
            loan_term_months: input.loan_term_months as i64,
            purchase_anchor: anchor,
        }
    }
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, PlanError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| PlanError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
