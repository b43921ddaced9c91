use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::FinSuiteError;
use crate::personal_finance::Transaction;
use crate::time_value::overflow;
use crate::types::{with_metadata, ComputationOutput, EntryKind, Money};
use crate::FinSuiteResult;

const RECURRING_SUFFIX: &str = " (Recurring)";

/// Occurrences beyond this are refused rather than materialised.
const MAX_OCCURRENCES: u32 = 100_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Template for a transaction that repeats on a fixed schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: String,
    pub amount: Money,
    pub kind: EntryKind,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Open-ended when absent.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringInput {
    pub recurring: RecurringTransaction,
    /// Expansion horizon for open-ended templates.
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringOutput {
    pub transactions: Vec<Transaction>,
    pub occurrences: usize,
    pub total_amount: Money,
    /// First occurrence on or after `as_of`, if the schedule has one.
    pub next_due: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Date of the `k`-th occurrence (k = 0 is the start date).
///
/// Month and year steps are taken from the start date, so a schedule that
/// starts on the 31st lands on the last day of shorter months and returns to
/// the 31st afterwards.
pub fn occurrence_date(rec: &RecurringTransaction, k: u32) -> Option<NaiveDate> {
    let start = rec.start_date;
    match rec.frequency {
        Frequency::Daily => start.checked_add_days(Days::new(u64::from(k))),
        Frequency::Weekly => start.checked_add_days(Days::new(u64::from(k) * 7)),
        Frequency::Monthly => start.checked_add_months(Months::new(k)),
        Frequency::Yearly => k
            .checked_mul(12)
            .and_then(|m| start.checked_add_months(Months::new(m))),
    }
}

/// Materialise every occurrence from the start date through the end date,
/// or through `as_of` when the template is open-ended. Both ends inclusive.
pub fn expand_recurring(
    rec: &RecurringTransaction,
    as_of: NaiveDate,
) -> FinSuiteResult<Vec<Transaction>> {
    validate(rec)?;
    let horizon = rec.end_date.unwrap_or(as_of);

    let mut transactions = Vec::new();
    let mut k: u32 = 0;
    while let Some(date) = occurrence_date(rec, k) {
        if date > horizon {
            break;
        }
        if k >= MAX_OCCURRENCES {
            return Err(FinSuiteError::InvalidInput {
                field: "end_date".into(),
                reason: format!("Schedule exceeds {MAX_OCCURRENCES} occurrences"),
            });
        }
        transactions.push(Transaction {
            id: format!("{}-{k}", rec.id),
            date,
            amount: rec.amount,
            kind: rec.kind,
            category: rec.category.clone(),
            description: format!("{}{RECURRING_SUFFIX}", rec.description),
            recurring_id: Some(rec.id.clone()),
        });
        k += 1;
    }

    debug!(
        recurring_id = %rec.id,
        occurrences = transactions.len(),
        %horizon,
        "expanded recurring transaction"
    );
    Ok(transactions)
}

/// First occurrence on or after `today` that does not pass the end date.
pub fn next_due(rec: &RecurringTransaction, today: NaiveDate) -> Option<NaiveDate> {
    let mut k: u32 = 0;
    loop {
        let date = occurrence_date(rec, k)?;
        if rec.end_date.is_some_and(|end| date > end) {
            return None;
        }
        if date >= today {
            return Some(date);
        }
        k = k.checked_add(1)?;
    }
}

/// Expand a recurring template and report its occurrences.
pub fn calculate_recurring(
    input: &RecurringInput,
) -> FinSuiteResult<ComputationOutput<RecurringOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let transactions = expand_recurring(&input.recurring, input.as_of)?;
    let total_amount = transactions
        .iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount))
        .ok_or_else(|| overflow("recurring total"))?;
    let next = next_due(&input.recurring, input.as_of);

    if transactions.is_empty() {
        warnings.push(format!(
            "No occurrences on or before {}: schedule starts {}",
            input.recurring.end_date.unwrap_or(input.as_of),
            input.recurring.start_date
        ));
    }
    if input.recurring.amount.is_sign_negative() {
        warnings.push("Negative amount: use `kind` to mark expenses".into());
    }

    let output = RecurringOutput {
        occurrences: transactions.len(),
        transactions,
        total_amount,
        next_due: next,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Recurring schedule expansion (calendar month stepping from start date)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate(rec: &RecurringTransaction) -> FinSuiteResult<()> {
    if let Some(end) = rec.end_date {
        if end < rec.start_date {
            return Err(FinSuiteError::InvalidInput {
                field: "end_date".into(),
                reason: format!("End date {end} is before start date {}", rec.start_date),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
