pub mod amortization;
pub mod calendar;
pub mod engine;
pub mod output;
pub mod plan;
pub mod price_feed;
pub mod report;
pub mod sweep;
pub mod units;
