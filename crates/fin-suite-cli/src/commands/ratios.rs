use clap::Args;
use serde_json::Value;

use fin_suite_core::ratios::analysis::{self, FinancialStatement};

use crate::input;

/// Arguments for the ratio dashboard
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to JSON file with balance-sheet and income-statement figures
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let statement: FinancialStatement = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file is required for ratio analysis".into());
    };

    let result = analysis::calculate_ratios(&statement)?;
    Ok(serde_json::to_value(result)?)
}
