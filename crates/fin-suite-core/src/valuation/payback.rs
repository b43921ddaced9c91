use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::time_value::{ensure_valid_rate, present_value};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FinSuiteResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One scheduled year after the initial outlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaybackFlow {
    /// Magnitude; investments are treated as additional outlays
    pub amount: Money,
    pub is_investment: bool,
}

impl PaybackFlow {
    pub fn inflow(amount: Money) -> Self {
        Self {
            amount,
            is_investment: false,
        }
    }

    pub fn investment(amount: Money) -> Self {
        Self {
            amount,
            is_investment: true,
        }
    }
}

/// Running balance after a given year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeEntry {
    pub year: u32,
    /// Signed amount for the year (investments negative), discounted when applicable
    pub amount: Money,
    pub cumulative: Money,
    pub is_investment: bool,
}

/// Payback period plus the cumulative trace that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaybackResult {
    /// Fractional years; `None` when the outlay is not recovered within the schedule
    pub period: Option<Years>,
    pub trace: Vec<CumulativeEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaybackMethod {
    Simple,
    Discounted,
}

/// Input parameters for a payback analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackInput {
    pub initial_investment: Money,
    pub cash_flows: Vec<PaybackFlow>,
    /// When present the discounted payback period is computed at this rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
}

/// Output of the payback analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackOutput {
    pub method: PaybackMethod,
    pub payback_period: Option<Years>,
    pub recovered: bool,
    pub trace: Vec<CumulativeEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simple (undiscounted) payback period.
pub fn payback_period(initial_outlay: Money, cash_flows: &[PaybackFlow]) -> PaybackResult {
    let amounts: Vec<Money> = cash_flows.iter().map(|cf| cf.amount).collect();
    walk(initial_outlay, cash_flows, &amounts)
}

/// Discounted payback period: each year's amount is discounted at `rate`
/// before it is accumulated.
///
/// A single-flow schedule resolves to `initial_outlay / discounted_amount` when
/// that one discounted amount recovers the outlay on its own.
///
/// An initial outlay of zero or less pays back at `Some(0)` for any schedule
/// length. Earlier releases reported no payback (`null`) for that case once
/// the schedule had more than one flow.
pub fn discounted_payback_period(
    initial_outlay: Money,
    cash_flows: &[PaybackFlow],
    rate: Rate,
) -> FinSuiteResult<PaybackResult> {
    ensure_valid_rate(rate)?;

    let mut discounted = Vec::with_capacity(cash_flows.len());
    for (idx, cf) in cash_flows.iter().enumerate() {
        discounted.push(present_value(cf.amount, rate, year_of(idx))?);
    }

    if let [only] = cash_flows {
        return Ok(single_flow(initial_outlay, only, discounted[0]));
    }

    Ok(walk(initial_outlay, cash_flows, &discounted))
}

/// Simple or discounted payback depending on whether a discount rate is given.
pub fn calculate_payback(input: &PaybackInput) -> FinSuiteResult<ComputationOutput<PaybackOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        warnings.push("Empty schedule: only the initial investment is shown".into());
    }
    if input.initial_investment <= Decimal::ZERO {
        warnings.push("Initial investment is not positive; payback is immediate".into());
    }
    if input
        .cash_flows
        .iter()
        .any(|cf| cf.amount < Decimal::ZERO)
    {
        warnings.push(
            "Negative amounts found; use the investment flag for additional outlays".into(),
        );
    }

    let (method, result) = match input.discount_rate {
        Some(rate) => (
            PaybackMethod::Discounted,
            discounted_payback_period(input.initial_investment, &input.cash_flows, rate)?,
        ),
        None => (
            PaybackMethod::Simple,
            payback_period(input.initial_investment, &input.cash_flows),
        ),
    };

    if result.period.is_none() {
        warnings.push("Investment is not recovered within the projection horizon".into());
    }

    let output = PaybackOutput {
        method,
        payback_period: result.period,
        recovered: result.period.is_some(),
        trace: result.trace,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    let methodology = match method {
        PaybackMethod::Simple => "Simple payback period with linear in-year interpolation",
        PaybackMethod::Discounted => "Discounted payback period with linear in-year interpolation",
    };

    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn year_of(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

fn opening_entry(initial_outlay: Money) -> CumulativeEntry {
    CumulativeEntry {
        year: 0,
        amount: -initial_outlay,
        cumulative: -initial_outlay,
        is_investment: true,
    }
}

/// Shared year-by-year walk. `amounts[i]` is the (possibly discounted)
/// magnitude for `flows[i]`.
///
/// Running totals saturate at the decimal bounds.
fn walk(initial_outlay: Money, flows: &[PaybackFlow], amounts: &[Money]) -> PaybackResult {
    let mut trace = Vec::with_capacity(flows.len() + 1);
    trace.push(opening_entry(initial_outlay));

    let mut remaining = initial_outlay;
    let mut cumulative = -initial_outlay;
    let mut period = Decimal::ZERO;

    for (idx, (flow, amount)) in flows.iter().zip(amounts).enumerate() {
        let amount = *amount;
        let effective = if flow.is_investment { -amount } else { amount };
        cumulative = cumulative.saturating_add(effective);
        trace.push(CumulativeEntry {
            year: year_of(idx),
            amount: effective,
            cumulative,
            is_investment: flow.is_investment,
        });

        // Once recovered, later years only extend the trace.
        if remaining <= Decimal::ZERO {
            continue;
        }

        let completed = Decimal::from(idx as u64);
        if flow.is_investment {
            remaining = remaining.saturating_add(amount);
            period = completed + Decimal::ONE;
        } else {
            let before = remaining;
            remaining = remaining.saturating_sub(amount);
            period = if remaining <= Decimal::ZERO {
                completed + before / amount
            } else {
                completed + Decimal::ONE
            };
        }
    }

    let period = if remaining > Decimal::ZERO {
        None
    } else {
        Some(period)
    };
    debug!(?period, years = flows.len(), "payback walk finished");

    PaybackResult { period, trace }
}

fn single_flow(initial_outlay: Money, flow: &PaybackFlow, discounted: Money) -> PaybackResult {
    let effective = if flow.is_investment {
        -discounted
    } else {
        discounted
    };

    let period = if effective > Decimal::ZERO && effective >= initial_outlay {
        Some(initial_outlay / effective)
    } else {
        None
    };

    let opening = opening_entry(initial_outlay);
    let closing = CumulativeEntry {
        year: 1,
        amount: effective,
        cumulative: opening.cumulative.saturating_add(effective),
        is_investment: flow.is_investment,
    };

    PaybackResult {
        period,
        trace: vec![opening, closing],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
