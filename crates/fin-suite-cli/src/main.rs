mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::personal_finance::{BudgetArgs, RecurringArgs, SummaryArgs};
use commands::ratios::RatiosArgs;
use commands::valuation::{DcfArgs, NpvArgs, PaybackArgs, PvArgs, WaccArgs};

/// Time-value-of-money, valuation and personal-finance calculations
#[derive(Parser)]
#[command(
    name = "fsx",
    version,
    about = "Time-value-of-money, valuation and personal-finance calculations",
    long_about = "A CLI for financial calculations with decimal precision. Supports \
                  present value, NPV/IRR, payback, WACC, item-level DCF, financial \
                  ratios, recurring transactions, spending summaries and budgets. \
                  Rates are fractions: 0.10 means 10%."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter used when RUST_LOG is unset (e.g. debug, fin_suite_core=trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Present value of a single future amount
    Pv(PvArgs),
    /// Net present value and internal rate of return
    Npv(NpvArgs),
    /// Simple or discounted payback period
    Payback(PaybackArgs),
    /// Cost of equity (CAPM), after-tax cost of debt and WACC
    Wacc(WaccArgs),
    /// Item-level DCF projection with Gordon-growth terminal value
    Dcf(DcfArgs),
    /// Liquidity, profitability and solvency ratios
    Ratios(RatiosArgs),
    /// Expand a recurring transaction into dated occurrences
    Recurring(RecurringArgs),
    /// Income/expense summary over a date range
    Summary(SummaryArgs),
    /// Budget progress for the current month or year
    Budget(BudgetArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Pv(args) => commands::valuation::run_pv(args),
        Commands::Npv(args) => commands::valuation::run_npv(args),
        Commands::Payback(args) => commands::valuation::run_payback(args),
        Commands::Wacc(args) => commands::valuation::run_wacc(args),
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Ratios(args) => commands::ratios::run_ratios(args),
        Commands::Recurring(args) => commands::personal_finance::run_recurring(args),
        Commands::Summary(args) => commands::personal_finance::run_summary(args),
        Commands::Budget(args) => commands::personal_finance::run_budget(args),
        Commands::Version => {
            println!("fsx {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
