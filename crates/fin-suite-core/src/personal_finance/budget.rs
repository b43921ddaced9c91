use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::personal_finance::summary::DateRange;
use crate::personal_finance::Transaction;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinSuiteResult;

/// Spending share at which a budget moves from on-track to warning.
const WARNING_THRESHOLD: Rate = dec!(0.75);
/// Spending share at which a budget is at risk of being exceeded.
const DANGER_THRESHOLD: Rate = dec!(0.90);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub amount: Money,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Below 75% spent
    OnTrack,
    /// 75% up to 90% spent
    Warning,
    /// 90% up to the full amount spent
    AtRisk,
    /// The full amount or more spent
    OverBudget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub spent: Money,
    pub remaining: Money,
    /// Spent / budgeted as a fraction; `None` for a zero budget.
    pub progress: Option<Rate>,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInput {
    pub budgets: Vec<Budget>,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub period: BudgetPeriod,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetOutput {
    pub window: DateRange,
    pub progress: Vec<BudgetProgress>,
    pub total_budgeted: Money,
    pub total_spent: Money,
}

/// First day of the current month or year through `today`.
pub fn period_window(period: BudgetPeriod, today: NaiveDate) -> DateRange {
    let start = match period {
        BudgetPeriod::Monthly => today.with_day(1),
        BudgetPeriod::Yearly => NaiveDate::from_ymd_opt(today.year(), 1, 1),
    }
    .unwrap_or(today);
    DateRange { start, end: today }
}

/// Progress of every budget of the given period against the expenses booked
/// to its category in the current period window.
pub fn budget_progress(
    budgets: &[Budget],
    transactions: &[Transaction],
    period: BudgetPeriod,
    today: NaiveDate,
) -> Vec<BudgetProgress> {
    let window = period_window(period, today);

    budgets
        .iter()
        .filter(|b| b.period == period)
        .map(|budget| {
            let spent: Money = transactions
                .iter()
                .filter(|t| {
                    t.is_expense() && t.category == budget.category && window.contains(t.date)
                })
                .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount));
            // A share too large to represent is reported as fully spent.
            let progress = if budget.amount.is_zero() {
                None
            } else {
                Some(spent.checked_div(budget.amount).unwrap_or(Decimal::MAX))
            };
            BudgetProgress {
                budget: budget.clone(),
                spent,
                remaining: budget.amount.saturating_sub(spent),
                progress,
                status: status_for(spent, budget.amount, progress),
            }
        })
        .collect()
}

pub fn calculate_budget(input: &BudgetInput) -> FinSuiteResult<ComputationOutput<BudgetOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let window = period_window(input.period, input.today);
    let progress = budget_progress(
        &input.budgets,
        &input.transactions,
        input.period,
        input.today,
    );

    if progress.is_empty() {
        warnings.push(format!("No {:?} budgets defined", input.period).to_lowercase());
    }
    for p in &progress {
        if p.budget.amount.is_zero() {
            warnings.push(format!("Budget '{}' has a zero amount", p.budget.category));
        } else if p.status == BudgetStatus::OverBudget {
            warnings.push(format!(
                "Budget '{}' exceeded by {}",
                p.budget.category,
                -p.remaining
            ));
        } else if p.status == BudgetStatus::AtRisk {
            warnings.push(format!(
                "Budget '{}' is at risk: {} left",
                p.budget.category, p.remaining
            ));
        }
    }

    let total_budgeted = progress
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.budget.amount));
    let total_spent = progress
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.spent));

    let output = BudgetOutput {
        window,
        progress,
        total_budgeted,
        total_spent,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Category spend against monthly/yearly budgets",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn status_for(spent: Money, amount: Money, progress: Option<Rate>) -> BudgetStatus {
    match progress {
        Some(p) if p < WARNING_THRESHOLD => BudgetStatus::OnTrack,
        Some(p) if p < DANGER_THRESHOLD => BudgetStatus::Warning,
        Some(p) if p < Decimal::ONE => BudgetStatus::AtRisk,
        Some(_) => BudgetStatus::OverBudget,
        // Zero budget: any spend is over it.
        None if spent > amount => BudgetStatus::OverBudget,
        None => BudgetStatus::OnTrack,
    }
}
