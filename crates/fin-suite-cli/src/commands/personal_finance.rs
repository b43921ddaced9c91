use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fin_suite_core::personal_finance::budget::{self, BudgetInput};
use fin_suite_core::personal_finance::recurring::{
    self, Frequency, RecurringInput, RecurringTransaction,
};
use fin_suite_core::personal_finance::summary::{self, SummaryInput};
use fin_suite_core::EntryKind;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for EntryKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Income => EntryKind::Income,
            KindArg::Expense => EntryKind::Expense,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<FrequencyArg> for Frequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Monthly => Frequency::Monthly,
            FrequencyArg::Yearly => Frequency::Yearly,
        }
    }
}

/// Arguments for recurring-transaction expansion
#[derive(Args)]
pub struct RecurringArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Template id, used as the prefix of generated ids
    #[arg(long, default_value = "recurring")]
    pub id: String,

    /// Amount per occurrence (positive)
    #[arg(long)]
    pub amount: Option<Decimal>,

    #[arg(long, value_enum, default_value = "expense")]
    pub kind: KindArg,

    #[arg(long, default_value = "Uncategorized")]
    pub category: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, value_enum, default_value = "monthly")]
    pub frequency: FrequencyArg,

    /// First occurrence (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last possible occurrence (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Expansion horizon for open-ended schedules (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for a transaction summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON file with `transactions` and optional `range` / `timeframe`
    #[arg(long)]
    pub input: Option<String>,

    /// Report date used for the default window (defaults to today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

/// Arguments for budget progress
#[derive(Args)]
pub struct BudgetArgs {
    /// Path to JSON file with `budgets`, `transactions` and optional `period`
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation date (defaults to today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run_recurring(args: RecurringArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let recurring_input: RecurringInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(with_today(data, "as_of", args.as_of))?
    } else {
        RecurringInput {
            recurring: RecurringTransaction {
                id: args.id,
                amount: args
                    .amount
                    .ok_or("--amount is required (or provide --input)")?,
                kind: args.kind.into(),
                category: args.category,
                description: args.description,
                frequency: args.frequency.into(),
                start_date: args
                    .start_date
                    .ok_or("--start-date is required (or provide --input)")?,
                end_date: args.end_date,
            },
            as_of: args.as_of.unwrap_or_else(today),
        }
    };

    let result = recurring::calculate_recurring(&recurring_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_required(args.input.as_deref(), "summary")?;
    let summary_input: SummaryInput = serde_json::from_value(with_today(data, "today", args.today))?;

    let result = summary::calculate_summary(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_budget(args: BudgetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_required(args.input.as_deref(), "budget")?;
    let budget_input: BudgetInput = serde_json::from_value(with_today(data, "today", args.today))?;

    let result = budget::calculate_budget(&budget_input)?;
    Ok(serde_json::to_value(result)?)
}

fn read_required(path: Option<&str>, command: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json_value(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input file is required for {command}").into())
    }
}

/// Fill a date field the caller left out: the flag value, else today.
/// A flag given explicitly overrides the document.
fn with_today(mut data: Value, field: &str, flag: Option<NaiveDate>) -> Value {
    if let Value::Object(ref mut map) = data {
        if flag.is_some() || !map.contains_key(field) {
            let date = flag.unwrap_or_else(today);
            map.insert(field.to_string(), Value::String(date.to_string()));
        }
    }
    data
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
