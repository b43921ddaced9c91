use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinSuiteError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinSuiteResult;

/// Rates at or below this value make `1 + r` non-positive.
const RATE_FLOOR: Decimal = dec!(-1);

/// Reject rates that would make the compounding base zero or negative.
pub fn ensure_valid_rate(rate: Rate) -> FinSuiteResult<()> {
    if rate <= RATE_FLOOR {
        return Err(FinSuiteError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

/// Error for a result outside the decimal range.
pub(crate) fn overflow(context: impl Into<String>) -> FinSuiteError {
    FinSuiteError::NumericOverflow {
        context: context.into(),
    }
}

/// Compounding factor `(1 + rate)^periods`.
fn growth_factor(rate: Rate, periods: u32) -> FinSuiteResult<Decimal> {
    ensure_valid_rate(rate)?;
    let factor = Decimal::ONE
        .checked_add(rate)
        .and_then(|base| base.checked_powu(u64::from(periods)))
        .ok_or_else(|| overflow(format!("compounding factor at period {periods}")))?;
    if factor.is_zero() {
        return Err(FinSuiteError::DivisionByZero {
            context: format!("discount factor at period {periods}"),
        });
    }
    Ok(factor)
}

/// Present value of a single amount received `periods` years from now:
/// `amount / (1 + rate)^periods`.
///
/// `periods = 0` returns `amount` unchanged.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> FinSuiteResult<Money> {
    if periods == 0 {
        ensure_valid_rate(rate)?;
        return Ok(amount);
    }
    let factor = growth_factor(rate, periods)?;
    amount
        .checked_div(factor)
        .ok_or_else(|| overflow(format!("present value at period {periods}")))
}

/// Discount factor `1 / (1 + rate)^periods`.
pub fn discount_factor(rate: Rate, periods: u32) -> FinSuiteResult<Rate> {
    let factor = growth_factor(rate, periods)?;
    Decimal::ONE
        .checked_div(factor)
        .ok_or_else(|| overflow(format!("discount factor at period {periods}")))
}

/// Compound `base` through each rate in order: `base * Π(1 + r_i)`.
pub fn compound(base: Money, rates: &[Rate]) -> FinSuiteResult<Money> {
    rates.iter().enumerate().try_fold(base, |amount, (i, r)| {
        Decimal::ONE
            .checked_add(*r)
            .and_then(|step| amount.checked_mul(step))
            .ok_or_else(|| overflow(format!("compounding through rate {}", i + 1)))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentValueInput {
    pub amount: Money,
    pub rate: Rate,
    pub periods: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentValueOutput {
    pub present_value: Money,
    pub discount_factor: Rate,
    /// amount - present_value
    pub time_value_discount: Money,
}

/// Single-amount present value with its discount factor.
pub fn calculate_present_value(
    input: &PresentValueInput,
) -> FinSuiteResult<ComputationOutput<PresentValueOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let pv = present_value(input.amount, input.rate, input.periods)?;
    let df = if input.periods == 0 {
        Decimal::ONE
    } else {
        discount_factor(input.rate, input.periods)?
    };

    if input.rate < Decimal::ZERO {
        warnings.push(format!(
            "Negative rate ({}): present value exceeds the nominal amount",
            input.rate
        ));
    }

    let output = PresentValueOutput {
        present_value: pv,
        discount_factor: df,
        time_value_discount: input
            .amount
            .checked_sub(pv)
            .ok_or_else(|| overflow("amount less present value"))?,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Present value, end-of-period discounting",
        input,
        warnings,
        elapsed,
        output,
    ))
}
