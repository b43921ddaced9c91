use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinSuiteError;
use crate::time_value::overflow;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinSuiteResult;

/// Input parameters for the cost-of-capital calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOfCapitalInput {
    /// Risk-free rate (e.g. 10-year government bond yield)
    pub risk_free_rate: Rate,
    /// Expected market return
    pub market_return: Rate,
    /// Levered beta of equity
    pub beta: Decimal,
    /// Pre-tax cost of debt
    pub pre_tax_cost_of_debt: Rate,
    /// Marginal corporate tax rate
    pub tax_rate: Rate,
    /// Market value of equity
    pub equity_value: Money,
    /// Market value of debt
    pub debt_value: Money,
}

/// Output of the cost-of-capital calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOfCapitalOutput {
    /// CAPM cost of equity
    pub cost_of_equity: Rate,
    /// Market return minus risk-free rate
    pub equity_risk_premium: Rate,
    pub after_tax_cost_of_debt: Rate,
    pub equity_weight: Rate,
    pub debt_weight: Rate,
    /// Weighted average cost of capital
    pub wacc: Rate,
}

/// CAPM cost of equity: `Rf + beta * (Rm - Rf)`, rounded to two decimals of
/// a percentage.
pub fn cost_of_equity(risk_free_rate: Rate, market_return: Rate, beta: Decimal) -> Rate {
    let ke = risk_free_rate + beta * (market_return - risk_free_rate);
    ke.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// After-tax cost of debt: `Kd * (1 - t)`.
pub fn after_tax_cost_of_debt(pre_tax_rate: Rate, tax_rate: Rate) -> Rate {
    pre_tax_rate * (Decimal::ONE - tax_rate)
}

/// Weighted average cost of capital from market values.
///
/// WACC = Ke * E/(E+D) + Kd_at * D/(E+D)
pub fn wacc(
    cost_of_equity: Rate,
    after_tax_cost_of_debt: Rate,
    equity_value: Money,
    debt_value: Money,
) -> FinSuiteResult<Rate> {
    let (equity_weight, debt_weight) = capital_weights(equity_value, debt_value)?;
    weighted(cost_of_equity, equity_weight, after_tax_cost_of_debt, debt_weight)
}

/// Calculate cost of equity, after-tax cost of debt and WACC in one pass.
pub fn calculate_cost_of_capital(
    input: &CostOfCapitalInput,
) -> FinSuiteResult<ComputationOutput<CostOfCapitalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let ke = cost_of_equity(input.risk_free_rate, input.market_return, input.beta);
    let equity_risk_premium = input.market_return - input.risk_free_rate;
    let kd_at = after_tax_cost_of_debt(input.pre_tax_cost_of_debt, input.tax_rate);
    let (equity_weight, debt_weight) = capital_weights(input.equity_value, input.debt_value)?;
    let wacc = weighted(ke, equity_weight, kd_at, debt_weight)?;

    // --- Reasonableness warnings ---
    if input.beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify market data; betas above 3.0 are unusual",
            input.beta
        ));
    }
    if equity_risk_premium < Decimal::ZERO {
        warnings.push(format!(
            "Market return is below the risk-free rate (premium {equity_risk_premium})"
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; appropriate for high-risk situations only"
        ));
    }

    let output = CostOfCapitalOutput {
        cost_of_equity: ke,
        equity_risk_premium,
        after_tax_cost_of_debt: kd_at,
        equity_weight,
        debt_weight,
        wacc,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "WACC via CAPM cost of equity and market-value weights",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Returns (equity_weight, debt_weight).
fn capital_weights(equity_value: Money, debt_value: Money) -> FinSuiteResult<(Rate, Rate)> {
    if equity_value < Decimal::ZERO || debt_value < Decimal::ZERO {
        return Err(FinSuiteError::InvalidInput {
            field: "equity_value / debt_value".into(),
            reason: "Capital values cannot be negative".into(),
        });
    }
    let total = equity_value
        .checked_add(debt_value)
        .ok_or_else(|| overflow("WACC weights: equity value + debt value"))?;
    if total.is_zero() {
        return Err(FinSuiteError::DivisionByZero {
            context: "WACC weights: equity value + debt value is zero".into(),
        });
    }
    Ok((equity_value / total, debt_value / total))
}

fn weighted(ke: Rate, equity_weight: Rate, kd_at: Rate, debt_weight: Rate) -> FinSuiteResult<Rate> {
    let equity_part = ke.checked_mul(equity_weight);
    let debt_part = kd_at.checked_mul(debt_weight);
    equity_part
        .zip(debt_part)
        .and_then(|(e, d)| e.checked_add(d))
        .ok_or_else(|| overflow("WACC"))
}

fn validate_input(input: &CostOfCapitalInput) -> FinSuiteResult<()> {
    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(FinSuiteError::InvalidInput {
            field: "tax_rate".into(),
            reason: "Tax rate must be between 0 and 1".into(),
        });
    }
    if input.pre_tax_cost_of_debt < Decimal::ZERO {
        return Err(FinSuiteError::InvalidInput {
            field: "pre_tax_cost_of_debt".into(),
            reason: "Cost of debt cannot be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> CostOfCapitalInput {
        CostOfCapitalInput {
            risk_free_rate: dec!(0.042),
            market_return: dec!(0.097),
            beta: dec!(1.10),
            pre_tax_cost_of_debt: dec!(0.055),
            tax_rate: dec!(0.21),
            equity_value: dec!(700),
            debt_value: dec!(300),
        }
    }

    #[test]
    fn test_capm_cost_of_equity() {
        // 0.042 + 1.10 * 0.055 = 0.1025
        assert_eq!(cost_of_equity(dec!(0.042), dec!(0.097), dec!(1.10)), dec!(0.1025));
    }

    #[test]
    fn test_capm_rounds_to_basis_points() {
        // 0.03 + 1.333 * 0.05 = 0.09665 -> 9.67%
        assert_eq!(cost_of_equity(dec!(0.03), dec!(0.08), dec!(1.333)), dec!(0.0967));
    }

    #[test]
    fn test_after_tax_cost_of_debt() {
        assert_eq!(after_tax_cost_of_debt(dec!(0.08), dec!(0.25)), dec!(0.06));
    }

    #[test]
    fn test_wacc_equal_weights_is_mean() {
        let w = wacc(dec!(0.14), dec!(0.05), dec!(250), dec!(250)).unwrap();
        assert_eq!(w, dec!(0.095));
    }

    #[test]
    fn test_wacc_all_equity() {
        let w = wacc(dec!(0.11), dec!(0.04), dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(w, dec!(0.11));
    }

    #[test]
    fn test_wacc_zero_capital_is_error() {
        let err = wacc(dec!(0.1), dec!(0.05), Decimal::ZERO, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, FinSuiteError::DivisionByZero { .. }));
    }

    #[test]
    fn test_wacc_negative_capital_rejected() {
        let err = wacc(dec!(0.1), dec!(0.05), dec!(-10), dec!(100)).unwrap_err();
        assert!(matches!(err, FinSuiteError::InvalidInput { .. }));
    }

    #[test]
    fn test_calculate_cost_of_capital() {
        let out = calculate_cost_of_capital(&sample_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.cost_of_equity, dec!(0.1025));
        assert_eq!(r.after_tax_cost_of_debt, dec!(0.04345));
        assert_eq!(r.equity_weight, dec!(0.7));
        assert_eq!(r.debt_weight, dec!(0.3));
        // 0.1025 * 0.7 + 0.04345 * 0.3 = 0.071750 + 0.013035
        assert_eq!(r.wacc, dec!(0.084785));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_tax_rate_out_of_range() {
        let mut input = sample_input();
        input.tax_rate = dec!(21);
        let err = calculate_cost_of_capital(&input).unwrap_err();
        match err {
            FinSuiteError::InvalidInput { field, .. } => assert_eq!(field, "tax_rate"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_high_beta_warning() {
        let mut input = sample_input();
        input.beta = dec!(3.5);
        let out = calculate_cost_of_capital(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("High beta")));
    }

    #[test]
    fn test_combined_capital_outside_decimal_range_is_an_error() {
        let err = wacc(dec!(0.10), dec!(0.05), Decimal::MAX, Decimal::MAX).unwrap_err();
        assert!(matches!(err, FinSuiteError::NumericOverflow { .. }));
    }
}
