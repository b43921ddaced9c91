use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::FinSuiteError;
use crate::personal_finance::Transaction;
use crate::time_value::overflow;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FinSuiteResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> FinSuiteResult<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    fn validate(&self) -> FinSuiteResult<()> {
        if self.start > self.end {
            return Err(FinSuiteError::InvalidInput {
                field: "date_range".into(),
                reason: format!("Start {} is after end {}", self.start, self.end),
            });
        }
        Ok(())
    }
}

/// Reporting granularity. Each one has its own default look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub income: Money,
    pub expenses: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub total_income: Money,
    pub total_expenses: Money,
    pub net_amount: Money,
    /// Gross amount per category, income and expense alike.
    pub category_breakdown: BTreeMap<String, Money>,
    /// One row per day in the range, zero-filled.
    pub daily_totals: Vec<DailyTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryInput {
    pub transactions: Vec<Transaction>,
    /// Explicit range; when absent the timeframe's default window ending
    /// at `today` is used.
    #[serde(default)]
    pub range: Option<DateRange>,
    #[serde(default)]
    pub timeframe: Timeframe,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub range: DateRange,
    pub transaction_count: usize,
    #[serde(flatten)]
    pub summary: TransactionSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Default report window for a timeframe, ending at `today`.
///
/// * `Day`: month to date
/// * `Week`: from the first of the month six months back
/// * `Month`: year to date
/// * `Year`: the current and four previous calendar years
pub fn report_range(timeframe: Timeframe, today: NaiveDate) -> DateRange {
    let first_of_month = today.with_day(1).unwrap_or(today);
    let first_of_year = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let start = match timeframe {
        Timeframe::Day => first_of_month,
        Timeframe::Week => first_of_month
            .checked_sub_months(Months::new(6))
            .unwrap_or(first_of_month),
        Timeframe::Month => first_of_year,
        Timeframe::Year => NaiveDate::from_ymd_opt(today.year() - 4, 1, 1).unwrap_or(first_of_year),
    };
    DateRange { start, end: today }
}

/// Totals, per-category amounts and zero-filled daily rows for the
/// transactions that fall inside `range`.
pub fn summarize(
    transactions: &[Transaction],
    range: DateRange,
) -> FinSuiteResult<TransactionSummary> {
    range.validate()?;

    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut category_breakdown: BTreeMap<String, Money> = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, (Money, Money)> = range
        .days()
        .map(|d| (d, (Decimal::ZERO, Decimal::ZERO)))
        .collect();

    let add = |acc: &mut Money, amount: Money, what: &str| -> FinSuiteResult<()> {
        *acc = acc
            .checked_add(amount)
            .ok_or_else(|| overflow(what.to_string()))?;
        Ok(())
    };

    for tx in transactions.iter().filter(|t| range.contains(t.date)) {
        let day = daily.entry(tx.date).or_default();
        if tx.is_income() {
            add(&mut total_income, tx.amount, "total income")?;
            add(&mut day.0, tx.amount, "daily income")?;
        } else {
            add(&mut total_expenses, tx.amount, "total expenses")?;
            add(&mut day.1, tx.amount, "daily expenses")?;
        }
        let category = category_breakdown.entry(tx.category.clone()).or_default();
        add(category, tx.amount, "category total")?;
    }

    let daily_totals = daily
        .into_iter()
        .map(|(date, (income, expenses))| DailyTotal {
            date,
            income,
            expenses,
        })
        .collect();

    Ok(TransactionSummary {
        total_income,
        total_expenses,
        net_amount: total_income
            .checked_sub(total_expenses)
            .ok_or_else(|| overflow("net amount"))?,
        category_breakdown,
        daily_totals,
    })
}

/// Summarise transactions over an explicit range or a timeframe window.
pub fn calculate_summary(input: &SummaryInput) -> FinSuiteResult<ComputationOutput<SummaryOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let range = input
        .range
        .unwrap_or_else(|| report_range(input.timeframe, input.today));
    let summary = summarize(&input.transactions, range)?;
    let transaction_count = input
        .transactions
        .iter()
        .filter(|t| range.contains(t.date))
        .count();

    if transaction_count == 0 {
        warnings.push(format!("No transactions between {} and {}", range.start, range.end));
    }
    if summary.net_amount < Decimal::ZERO {
        warnings.push(format!(
            "Expenses exceed income by {}",
            summary.net_amount.abs()
        ));
    }

    let output = SummaryOutput {
        range,
        transaction_count,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Income/expense totals with category and daily breakdown",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryKind;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: &str, on: NaiveDate, amount: Decimal, kind: EntryKind, category: &str) -> Transaction {
        Transaction {
            id: id.into(),
            date: on,
            amount,
            kind,
            category: category.into(),
            description: String::new(),
            recurring_id: None,
        }
    }

    fn ledger() -> Vec<Transaction> {
        vec![
            tx("1", date(2024, 3, 1), dec!(3000), EntryKind::Income, "Salary"),
            tx("2", date(2024, 3, 2), dec!(80), EntryKind::Expense, "Groceries"),
            tx("3", date(2024, 3, 2), dec!(20), EntryKind::Expense, "Groceries"),
            tx("4", date(2024, 3, 3), dec!(1200), EntryKind::Expense, "Housing"),
            tx("5", date(2024, 4, 1), dec!(3000), EntryKind::Income, "Salary"),
        ]
    }

    #[test]
    fn test_summarize_totals_and_categories() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let s = summarize(&ledger(), range).unwrap();
        assert_eq!(s.total_income, dec!(3000));
        assert_eq!(s.total_expenses, dec!(1300));
        assert_eq!(s.net_amount, dec!(1700));
        assert_eq!(s.category_breakdown.get("Groceries"), Some(&dec!(100)));
        assert_eq!(s.category_breakdown.get("Salary"), Some(&dec!(3000)));
        assert_eq!(s.category_breakdown.len(), 3);
    }

    #[test]
    fn test_daily_totals_zero_filled() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 5)).unwrap();
        let s = summarize(&ledger(), range).unwrap();
        assert_eq!(s.daily_totals.len(), 5);
        assert_eq!(
            s.daily_totals[1],
            DailyTotal {
                date: date(2024, 3, 2),
                income: Decimal::ZERO,
                expenses: dec!(100),
            }
        );
        assert_eq!(s.daily_totals[4].income, Decimal::ZERO);
        assert_eq!(s.daily_totals[4].expenses, Decimal::ZERO);
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2024, 4, 1), date(2024, 4, 1)).unwrap();
        let s = summarize(&ledger(), range).unwrap();
        assert_eq!(s.daily_totals.len(), 1);
        assert_eq!(s.total_income, dec!(3000));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(DateRange::new(date(2024, 3, 2), date(2024, 3, 1)).is_err());
        let inverted = DateRange {
            start: date(2024, 3, 2),
            end: date(2024, 3, 1),
        };
        let err = summarize(&ledger(), inverted).unwrap_err();
        assert!(matches!(err, FinSuiteError::InvalidInput { .. }));
    }

    #[test]
    fn test_report_ranges() {
        let today = date(2024, 8, 14);
        assert_eq!(report_range(Timeframe::Day, today).start, date(2024, 8, 1));
        assert_eq!(report_range(Timeframe::Week, today).start, date(2024, 2, 1));
        assert_eq!(report_range(Timeframe::Month, today).start, date(2024, 1, 1));
        assert_eq!(report_range(Timeframe::Year, today).start, date(2020, 1, 1));
        assert_eq!(report_range(Timeframe::Year, today).end, today);
    }

    #[test]
    fn test_calculate_summary_uses_timeframe_window() {
        let input = SummaryInput {
            transactions: ledger(),
            range: None,
            timeframe: Timeframe::Day,
            today: date(2024, 3, 10),
        };
        let out = calculate_summary(&input).unwrap();
        assert_eq!(out.result.range.start, date(2024, 3, 1));
        assert_eq!(out.result.transaction_count, 4);
        assert_eq!(out.result.summary.daily_totals.len(), 10);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_calculate_summary_empty_warns() {
        let input = SummaryInput {
            transactions: vec![],
            range: None,
            timeframe: Timeframe::Month,
            today: date(2024, 3, 10),
        };
        let out = calculate_summary(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("No transactions")));
    }

    #[test]
    fn test_totals_outside_decimal_range_are_an_error() {
        let txs = vec![
            tx("a", date(2024, 3, 1), Decimal::MAX, EntryKind::Income, "Salary"),
            tx("b", date(2024, 3, 2), Decimal::MAX, EntryKind::Income, "Salary"),
        ];
        let range = DateRange {
            start: date(2024, 3, 1),
            end: date(2024, 3, 2),
        };
        let err = summarize(&txs, range).unwrap_err();
        assert!(matches!(err, FinSuiteError::NumericOverflow { .. }));
    }
}
