use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btc_loan_sim::engine::simulate;
use btc_loan_sim::output;
use btc_loan_sim::plan::{ContributionFrequency, PlanFile, PurchaseAnchor, SimulationInput};
use btc_loan_sim::price_feed::{self, PriceSource};
use btc_loan_sim::report;
use btc_loan_sim::sweep::{self, GrowthSweep};

#[derive(Parser)]
#[command(
    name = "btc-loan-sim",
    version,
    about = "Bitcoin savings plan and loan repayment simulator"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a savings plan through purchase and loan repayment
    Run {
        #[command(flatten)]
        plan: PlanArgs,

        #[command(flatten)]
        price: PriceArgs,

        /// Directory for series.csv, summary.json, plan.toml and report.html
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Run the plan under several annual growth rates
    Sweep {
        #[command(flatten)]
        plan: PlanArgs,

        #[command(flatten)]
        price: PriceArgs,

        /// Comma-separated annual growth rates in percent
        #[arg(long, allow_hyphen_values = true, default_value = "-50,-25,0,25,50,100")]
        rates: String,

        /// Output CSV for the sweep table
        #[arg(long, default_value = "output/sweep.csv")]
        output: String,
    },

    /// Print the current spot price
    Price {
        /// CoinGecko coin id
        #[arg(long, default_value = price_feed::DEFAULT_COIN)]
        coin: String,

        /// Quote currency
        #[arg(long, default_value = price_feed::DEFAULT_VS_CURRENCY)]
        vs: String,
    },
}

/// Plan file plus per-field overrides.
#[derive(Args, Debug)]
struct PlanArgs {
    /// Plan file (TOML)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Asset price at the start (fiat per BTC)
    #[arg(long)]
    initial_price: Option<f64>,

    /// Contribution amount per period (or the lump sum)
    #[arg(long)]
    amount: Option<f64>,

    /// lump_sum, monthly, weekly or daily
    #[arg(long)]
    frequency: Option<ContributionFrequency>,

    /// Annual price growth in percent
    #[arg(long, allow_hyphen_values = true)]
    growth_pct: Option<f64>,

    /// Savings start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Savings end date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    purchase: Option<String>,

    /// Total cost of the purchase
    #[arg(long)]
    total_cost: Option<f64>,

    /// Down payment paid in BTC at the purchase date
    #[arg(long)]
    down_payment: Option<f64>,

    /// Nominal annual loan rate in percent
    #[arg(long)]
    interest_pct: Option<f64>,

    /// Loan term in months
    #[arg(long)]
    term: Option<i64>,

    /// Earliest allowed purchase: savings_start or savings_end
    #[arg(long)]
    anchor: Option<PurchaseAnchor>,
}

#[derive(Args, Debug)]
struct PriceArgs {
    /// Fetch the starting price live, falling back to the plan's price
    #[arg(long)]
    live_price: bool,

    /// CoinGecko coin id
    #[arg(long, default_value = price_feed::DEFAULT_COIN)]
    coin: String,

    /// Quote currency
    #[arg(long, default_value = price_feed::DEFAULT_VS_CURRENCY)]
    vs: String,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("missing --{} (or pass --plan)", flag))
}

/// Load the plan file, if any, and apply command-line overrides.
fn build_plan(args: PlanArgs) -> Result<PlanFile, Box<dyn std::error::Error>> {
    let mut plan = match &args.plan {
        Some(path) => PlanFile::load(path)?,
        None => PlanFile {
            initial_price: required(args.initial_price, "initial-price")?,
            contribution_amount: required(args.amount, "amount")?,
            frequency: required(args.frequency, "frequency")?,
            growth_pct: required(args.growth_pct, "growth-pct")?,
            start_date: required(args.start.clone(), "start")?,
            end_date: required(args.end.clone(), "end")?,
            purchase_date: required(args.purchase.clone(), "purchase")?,
            total_cost: required(args.total_cost, "total-cost")?,
            down_payment: required(args.down_payment, "down-payment")?,
            interest_rate_pct: required(args.interest_pct, "interest-pct")?,
            loan_term_months: required(args.term, "term")?,
            purchase_anchor: args.anchor.unwrap_or_default(),
        },
    };

    if let Some(v) = args.initial_price {
        plan.initial_price = v;
    }
    if let Some(v) = args.amount {
        plan.contribution_amount = v;
    }
    if let Some(v) = args.frequency {
        plan.frequency = v;
    }
    if let Some(v) = args.growth_pct {
        plan.growth_pct = v;
    }
    if let Some(v) = args.start {
        plan.start_date = v;
    }
    if let Some(v) = args.end {
        plan.end_date = v;
    }
    if let Some(v) = args.purchase {
        plan.purchase_date = v;
    }
    if let Some(v) = args.total_cost {
        plan.total_cost = v;
    }
    if let Some(v) = args.down_payment {
        plan.down_payment = v;
    }
    if let Some(v) = args.interest_pct {
        plan.interest_rate_pct = v;
    }
    if let Some(v) = args.term {
        plan.loan_term_months = v;
    }
    if let Some(v) = args.anchor {
        plan.purchase_anchor = v;
    }

    Ok(plan)
}

/// Build a validated input, resolving the starting price first.
fn prepare_input(
    plan_args: PlanArgs,
    price: &PriceArgs,
) -> Result<(SimulationInput, PurchaseAnchor), Box<dyn std::error::Error>> {
    let mut plan = build_plan(plan_args)?;

    if price.live_price {
        let quote = price_feed::resolve_initial_price(
            || price_feed::fetch_spot_price(&price.coin, &price.vs),
            plan.initial_price,
        )?;
        if quote.source == PriceSource::Manual {
            println!("Live price unavailable; using manual price {:.2}", quote.price);
        }
        plan.initial_price = quote.price;
    }

    let input = plan.into_input()?;
    Ok((input, plan.purchase_anchor))
}

fn run(
    plan: PlanArgs,
    price: PriceArgs,
    output_dir: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (input, anchor) = prepare_input(plan, &price)?;
    let result = simulate(&input);

    for line in report::outcome_message(&result) {
        println!("{}", line);
    }

    if let Some(dir) = output_dir {
        let dir = PathBuf::from(dir);
        output::save_all(&result, &input, anchor, &dir)?;
        println!("Saved {} rows to {}", result.series.len(), dir.display());
    }
    Ok(())
}

fn run_sweep(
    plan: PlanArgs,
    price: PriceArgs,
    rates: &str,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (input, _) = prepare_input(plan, &price)?;
    let rates = sweep::parse_rates_pct(rates)?;
    if let Some(bad) = rates.iter().find(|r| !r.is_finite() || **r <= -1.0) {
        return Err(format!("growth rate {:.2}% must be above -100%", bad * 100.0).into());
    }

    println!("Sweeping {} growth rates...", rates.len());
    let bar = ProgressBar::new(rates.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} runs") {
        bar.set_style(style);
    }
    let rows = GrowthSweep::new(input).run_with_progress(&rates, bar.clone());
    bar.finish_and_clear();

    for r in &rows {
        let detail = match r.outcome.shortfall_date() {
            Some(date) => format!("shortfall on {}", date),
            None => format!("{:.6} BTC (${:.2})", r.final_holdings, r.final_fiat),
        };
        println!(
            "  growth={:>8.2}%  [{}] {}",
            r.growth_rate * 100.0,
            r.outcome.label(),
            detail
        );
    }
    match sweep::lowest_completing_rate(&rows) {
        Some(rate) => println!("Lowest completing growth rate: {:.2}%", rate * 100.0),
        None => println!("No swept growth rate covers the plan"),
    }

    let out_path = PathBuf::from(output);
    sweep::save_sweep_csv(&rows, &out_path)?;
    println!("Saved sweep results to {}", out_path.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let outcome = match cli.command {
        Commands::Run {
            plan,
            price,
            output_dir,
        } => run(plan, price, output_dir),

        Commands::Sweep {
            plan,
            price,
            rates,
            output,
        } => run_sweep(plan, price, &rates, &output),

        Commands::Price { coin, vs } => price_feed::fetch_spot_price(&coin, &vs)
            .map(|p| println!("{} spot price: {:.2} {}", coin, p, vs.to_uppercase()))
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
