use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::FinSuiteError;
use crate::time_value::{compound, ensure_valid_rate, overflow, present_value};
use crate::types::{with_metadata, ComputationOutput, EntryKind, Money, Rate};
use crate::FinSuiteResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How an item's yearly amounts are derived. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Compound the base amount through the per-year growth rates
    #[default]
    Growth,
    /// Use the explicit per-year amounts
    Manual,
}

/// One named revenue or cost line of the DCF model.
///
/// Both schedules are kept whatever the active mode, so switching modes never
/// loses entered values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    /// Year-0 amount that growth mode compounds from
    pub base_amount: Money,
    #[serde(default)]
    pub mode: ProjectionMode,
    /// Growth rate per projection year (fractions)
    #[serde(default)]
    pub growth_rates: Vec<Rate>,
    /// Absolute amount per projection year
    #[serde(default)]
    pub manual_projections: Vec<Money>,
}

impl CashFlowItem {
    /// New growth-mode item with zeroed schedules sized to `years`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EntryKind,
        base_amount: Money,
        years: u32,
    ) -> Self {
        let n = years as usize;
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            base_amount,
            mode: ProjectionMode::Growth,
            growth_rates: vec![Decimal::ZERO; n],
            manual_projections: vec![Decimal::ZERO; n],
        }
    }

    /// Resize both schedules to `years`, padding with zero or truncating.
    pub fn set_projection_years(&mut self, years: u32) {
        let n = years as usize;
        self.growth_rates.resize(n, Decimal::ZERO);
        self.manual_projections.resize(n, Decimal::ZERO);
    }

    pub fn set_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
    }

    /// Resolved amount for projection year `year` (1-based).
    ///
    /// Growth mode re-compounds from the base through every rate up to `year`,
    /// so editing an early rate moves every later year.
    pub fn amount_for_year(&self, year: u32) -> FinSuiteResult<Money> {
        let y = year as usize;
        match self.mode {
            ProjectionMode::Manual => Ok(self
                .manual_projections
                .get(y.saturating_sub(1))
                .copied()
                .unwrap_or(Decimal::ZERO)),
            ProjectionMode::Growth => {
                let rates: Vec<Rate> = (0..y).map(|i| self.growth_rate_at(i)).collect();
                compound(self.base_amount, &rates)
            }
        }
    }

    /// Growth rate reported for year `year`; zero in manual mode.
    pub fn growth_rate_for_year(&self, year: u32) -> Rate {
        match self.mode {
            ProjectionMode::Manual => Decimal::ZERO,
            ProjectionMode::Growth => self.growth_rate_at((year as usize).saturating_sub(1)),
        }
    }

    fn growth_rate_at(&self, idx: usize) -> Rate {
        self.growth_rates.get(idx).copied().unwrap_or(Decimal::ZERO)
    }
}

/// An item's resolved figures for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedItem {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    pub amount: Money,
    pub growth_rate: Rate,
}

/// Aggregate figures for one projection year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCashFlow {
    pub year: u32,
    pub items: Vec<ProjectedItem>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub net_cash_flow: Money,
}

/// Result of a DCF projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfProjection {
    pub yearly_flows: Vec<ProjectedCashFlow>,
    /// Sum of discounted net cash flows over the explicit period
    pub pv_of_cash_flows: Money,
    /// Gordon-growth value at the end of the last projection year
    pub terminal_value: Money,
    pub pv_of_terminal_value: Money,
    /// pv_of_cash_flows + pv_of_terminal_value
    pub enterprise_value: Money,
}

/// Input parameters for the DCF engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfInput {
    /// Discount rate
    pub wacc: Rate,
    /// Growth rate applied in perpetuity after the last projection year
    pub perpetual_growth_rate: Rate,
    pub projection_years: u32,
    pub items: Vec<CashFlowItem>,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfOutput {
    #[serde(flatten)]
    pub projection: DcfProjection,
    /// Share of enterprise value coming from the terminal value
    pub terminal_value_pct: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project item-level cash flows for `years` and value them at `wacc` with a
/// Gordon-growth terminal value.
pub fn project_dcf(
    wacc: Rate,
    perpetual_growth: Rate,
    years: u32,
    items: &[CashFlowItem],
) -> FinSuiteResult<DcfProjection> {
    validate(wacc, perpetual_growth, years)?;

    let yearly_flows: Vec<ProjectedCashFlow> = (1..=years)
        .map(|year| project_year(year, items))
        .collect::<FinSuiteResult<_>>()?;

    let mut pv_of_cash_flows = Decimal::ZERO;
    for flow in &yearly_flows {
        let pv = present_value(flow.net_cash_flow, wacc, flow.year)?;
        pv_of_cash_flows = pv_of_cash_flows
            .checked_add(pv)
            .ok_or_else(|| overflow(format!("PV of cash flows through year {}", flow.year)))?;
    }

    let last = yearly_flows.last().ok_or_else(|| {
        FinSuiteError::InsufficientData("No projection years generated".into())
    })?;

    let terminal_value = gordon_terminal_value(last.net_cash_flow, wacc, perpetual_growth)?;
    let pv_of_terminal_value = present_value(terminal_value, wacc, years)?;
    let enterprise_value = pv_of_cash_flows
        .checked_add(pv_of_terminal_value)
        .ok_or_else(|| overflow("enterprise value"))?;

    debug!(
        years,
        %pv_of_cash_flows,
        %terminal_value,
        %enterprise_value,
        "DCF projection complete"
    );

    Ok(DcfProjection {
        yearly_flows,
        pv_of_cash_flows,
        terminal_value,
        pv_of_terminal_value,
        enterprise_value,
    })
}

/// Run the DCF engine and wrap the result with warnings and metadata.
pub fn calculate_dcf(input: &DcfInput) -> FinSuiteResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.items.is_empty() {
        warnings.push("No cash-flow items; every projected year is zero".into());
    }
    for item in &input.items {
        let n = input.projection_years as usize;
        let schedule_len = match item.mode {
            ProjectionMode::Growth => item.growth_rates.len(),
            ProjectionMode::Manual => item.manual_projections.len(),
        };
        if schedule_len < n {
            warnings.push(format!(
                "Item '{}' has {schedule_len} of {n} yearly values; missing years read as zero",
                item.name
            ));
        }
    }

    let projection = project_dcf(
        input.wacc,
        input.perpetual_growth_rate,
        input.projection_years,
        &input.items,
    )?;

    let terminal_value_pct = if projection.enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        projection
            .pv_of_terminal_value
            .checked_div(projection.enterprise_value)
            .ok_or_else(|| overflow("terminal value share of enterprise value"))?
    };
    if terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
            terminal_value_pct * dec!(100)
        ));
    }
    if projection
        .yearly_flows
        .last()
        .is_some_and(|f| f.net_cash_flow < Decimal::ZERO)
    {
        warnings.push("Final-year net cash flow is negative; terminal value is negative".into());
    }

    let output = DcfOutput {
        projection,
        terminal_value_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Item-level DCF with Gordon growth terminal value",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate(wacc: Rate, perpetual_growth: Rate, years: u32) -> FinSuiteResult<()> {
    if years == 0 {
        return Err(FinSuiteError::InvalidInput {
            field: "projection_years".into(),
            reason: "At least one projection year is required".into(),
        });
    }
    ensure_valid_rate(wacc)?;
    // Gordon growth model constraint
    if wacc <= perpetual_growth {
        return Err(FinSuiteError::FinancialImpossibility(format!(
            "WACC ({wacc}) must exceed the perpetual growth rate ({perpetual_growth}) for the Gordon growth model"
        )));
    }
    Ok(())
}

/// Gordon growth: `last * (1 + g) / (wacc - g)`.
fn gordon_terminal_value(last: Money, wacc: Rate, perpetual_growth: Rate) -> FinSuiteResult<Money> {
    let spread = wacc
        .checked_sub(perpetual_growth)
        .ok_or_else(|| overflow("WACC less perpetual growth"))?;
    Decimal::ONE
        .checked_add(perpetual_growth)
        .and_then(|g| last.checked_mul(g))
        .and_then(|next| next.checked_div(spread))
        .ok_or_else(|| overflow("terminal value"))
}

fn project_year(year: u32, items: &[CashFlowItem]) -> FinSuiteResult<ProjectedCashFlow> {
    let resolved: Vec<ProjectedItem> = items
        .iter()
        .map(|item| {
            Ok(ProjectedItem {
                id: item.id.clone(),
                name: item.name.clone(),
                kind: item.kind,
                amount: item.amount_for_year(year)?,
                growth_rate: item.growth_rate_for_year(year),
            })
        })
        .collect::<FinSuiteResult<_>>()?;

    let total_for = |kind: EntryKind| -> FinSuiteResult<Money> {
        resolved
            .iter()
            .filter(|i| i.kind == kind)
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.amount))
            .ok_or_else(|| overflow(format!("{kind:?} total in year {year}")))
    };
    let total_income = total_for(EntryKind::Income)?;
    let total_expenses = total_for(EntryKind::Expense)?;
    let net_cash_flow = total_income
        .checked_sub(total_expenses)
        .ok_or_else(|| overflow(format!("net cash flow in year {year}")))?;

    Ok(ProjectedCashFlow {
        year,
        items: resolved,
        total_income,
        total_expenses,
        net_cash_flow,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
