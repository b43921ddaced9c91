use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace};

use crate::time_value::{ensure_valid_rate, overflow, present_value};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinSuiteResult;

/// Lower bound of the IRR search interval (-99%).
const IRR_LOWER_BOUND: Decimal = dec!(-0.99);
/// Upper bound of the IRR search interval (999,900%).
const IRR_UPPER_BOUND: Decimal = dec!(9999);
const MAX_IRR_ITERATIONS: u32 = 1000;
/// |NPV| below this is treated as a root.
const IRR_PRECISION: Decimal = dec!(0.00001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether a scheduled amount is received or paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Inflow,
    Outflow,
}

/// One year of a cash-flow schedule. Year `i` of the slice is discounted
/// `i + 1` periods; the initial outlay sits at year 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    /// Magnitude of the flow; the sign comes from `direction`
    pub amount: Money,
    pub direction: FlowDirection,
}

impl CashFlowEntry {
    pub fn inflow(amount: Money) -> Self {
        Self {
            amount,
            direction: FlowDirection::Inflow,
        }
    }

    pub fn outflow(amount: Money) -> Self {
        Self {
            amount,
            direction: FlowDirection::Outflow,
        }
    }

    /// Amount with the direction applied (outflows negative).
    pub fn signed(&self) -> Money {
        match self.direction {
            FlowDirection::Inflow => self.amount,
            FlowDirection::Outflow => -self.amount,
        }
    }
}

/// A converged internal rate of return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Root found by the search; NPV at this rate is within the solver precision
    pub rate: Rate,
    /// Root rounded to two decimals of a percentage (0.1235 = 12.35%)
    pub rate_rounded: Rate,
    /// Bisection steps taken
    pub iterations: u32,
}

/// Input parameters for an NPV / IRR analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvInput {
    /// Amount invested at year 0 (positive number)
    pub initial_investment: Money,
    /// Discount rate as a fraction
    pub discount_rate: Rate,
    /// Years 1..n
    pub cash_flows: Vec<CashFlowEntry>,
}

/// A single row of the discounted schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountedFlow {
    pub year: u32,
    /// Signed, undiscounted amount
    pub amount: Money,
    pub present_value: Money,
    pub cumulative_present_value: Money,
}

/// Output of the NPV / IRR analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvOutput {
    pub npv: Money,
    /// `None` when the schedule has no sign change or the search did not converge
    pub irr: Option<IrrSolution>,
    pub detailed_flows: Vec<DiscountedFlow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Net present value: `-initial_outlay + Σ signed_i / (1 + rate)^(i + 1)`.
pub fn net_present_value(
    initial_outlay: Money,
    cash_flows: &[CashFlowEntry],
    rate: Rate,
) -> FinSuiteResult<Money> {
    ensure_valid_rate(rate)?;
    let mut npv = -initial_outlay;
    for (idx, cf) in cash_flows.iter().enumerate() {
        let year = period_for(idx);
        npv = npv
            .checked_add(present_value(cf.signed(), rate, year)?)
            .ok_or_else(|| overflow(format!("NPV through year {year}")))?;
    }
    Ok(npv)
}

/// Internal rate of return by bisection over [-99%, 999,900%].
///
/// Returns `None` when the signed schedule (initial outlay included) never
/// changes sign, or when no rate within the iteration budget brings |NPV|
/// under the solver precision.
///
/// The search assumes NPV falls as the rate rises, which holds for a
/// conventional schedule (outflows then inflows). With several sign changes it
/// can settle on any one of the roots, or on none.
pub fn internal_rate_of_return(
    initial_outlay: Money,
    cash_flows: &[CashFlowEntry],
) -> Option<IrrSolution> {
    let signed = signed_schedule(initial_outlay, cash_flows);

    let has_positive = signed.iter().any(|cf| *cf > Decimal::ZERO);
    let has_negative = signed.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_positive || !has_negative {
        debug!("IRR undefined: cash-flow schedule has no sign change");
        return None;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;

    for i in 0..MAX_IRR_ITERATIONS {
        let mid = (low + high) / dec!(2);
        let npv = search_npv(&signed, mid);
        trace!(iteration = i, %mid, %npv, "IRR bisection step");

        if npv.abs() < IRR_PRECISION {
            debug!(iterations = i + 1, rate = %mid, "IRR converged");
            return Some(IrrSolution {
                rate: mid,
                rate_rounded: mid.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
                iterations: i + 1,
            });
        }

        if npv > Decimal::ZERO {
            low = mid;
        } else {
            high = mid;
        }
    }

    debug!(
        iterations = MAX_IRR_ITERATIONS,
        %low,
        %high,
        "IRR search exhausted without converging"
    );
    None
}

/// Full NPV / IRR analysis with a year-by-year discounted schedule.
pub fn calculate_npv(input: &NpvInput) -> FinSuiteResult<ComputationOutput<NpvOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_valid_rate(input.discount_rate)?;

    let mut detailed_flows = Vec::with_capacity(input.cash_flows.len() + 1);
    let mut cumulative = -input.initial_investment;
    detailed_flows.push(DiscountedFlow {
        year: 0,
        amount: -input.initial_investment,
        present_value: -input.initial_investment,
        cumulative_present_value: cumulative,
    });

    for (idx, cf) in input.cash_flows.iter().enumerate() {
        let year = period_for(idx);
        let pv = present_value(cf.signed(), input.discount_rate, year)?;
        cumulative = cumulative
            .checked_add(pv)
            .ok_or_else(|| overflow(format!("cumulative present value at year {year}")))?;
        detailed_flows.push(DiscountedFlow {
            year,
            amount: cf.signed(),
            present_value: pv,
            cumulative_present_value: cumulative,
        });
    }

    let npv = net_present_value(
        input.initial_investment,
        &input.cash_flows,
        input.discount_rate,
    )?;
    let irr = internal_rate_of_return(input.initial_investment, &input.cash_flows);

    if input.cash_flows.is_empty() {
        warnings.push("No cash flows after the initial investment".into());
    }
    if irr.is_none() {
        warnings.push(
            "IRR is undefined: no sign change in the schedule or the search did not converge"
                .into(),
        );
    }
    if npv < Decimal::ZERO {
        warnings.push(format!(
            "Negative NPV ({}) at a {}% discount rate; the project destroys value",
            npv.round_dp(2),
            (input.discount_rate * dec!(100)).round_dp(2)
        ));
    }

    let output = NpvOutput {
        npv,
        irr,
        detailed_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "NPV with bisection IRR (end-of-year discounting)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Discount period of the flow at slice index `idx`.
fn period_for(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

fn signed_schedule(initial_outlay: Money, cash_flows: &[CashFlowEntry]) -> Vec<Money> {
    std::iter::once(-initial_outlay)
        .chain(cash_flows.iter().map(CashFlowEntry::signed))
        .collect()
}

/// NPV of a year-0-indexed signed schedule, saturating instead of failing.
///
/// Once the discount factor leaves the decimal range the remaining terms are
/// negligible and are skipped; a term that cannot be represented saturates to
/// the decimal bound with its own sign.
fn search_npv(signed: &[Money], rate: Rate) -> Money {
    let one_plus_r = Decimal::ONE + rate;
    let mut total = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in signed.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                None => break,
            }
        }
        if cf.is_zero() {
            continue;
        }
        let term = cf.checked_div(discount).unwrap_or(if cf.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        });
        total = total.saturating_add(term);
    }

    total
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinSuiteError;
    use rust_decimal_macros::dec;

    fn inflows(amounts: &[Decimal]) -> Vec<CashFlowEntry> {
        amounts.iter().map(|a| CashFlowEntry::inflow(*a)).collect()
    }

    #[test]
    fn test_npv_textbook() {
        let flows = inflows(&[dec!(300), dec!(400), dec!(500)]);
        let npv = net_present_value(dec!(1000), &flows, dec!(0.10)).unwrap();
        // -1000 + 272.73 + 330.58 + 375.66 = -21.04
        assert!((npv - dec!(-21.04)).abs() < dec!(0.01), "got {npv}");
    }

    #[test]
    fn test_npv_zero_rate_is_plain_sum() {
        let flows = vec![
            CashFlowEntry::inflow(dec!(700)),
            CashFlowEntry::outflow(dec!(200)),
            CashFlowEntry::inflow(dec!(600)),
        ];
        let npv = net_present_value(dec!(1000), &flows, Decimal::ZERO).unwrap();
        assert_eq!(npv, dec!(100));
    }

    #[test]
    fn test_npv_outflow_negates_magnitude() {
        let a = net_present_value(dec!(0), &[CashFlowEntry::outflow(dec!(110))], dec!(0.10))
            .unwrap();
        assert_eq!(a, dec!(-100));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let err = net_present_value(dec!(100), &inflows(&[dec!(50)]), dec!(-1)).unwrap_err();
        assert!(matches!(err, FinSuiteError::InvalidInput { .. }));
    }

    #[test]
    fn test_irr_even_annuity() {
        let flows = inflows(&[dec!(400), dec!(400), dec!(400)]);
        let irr = internal_rate_of_return(dec!(1000), &flows).unwrap();
        // ~9.70%
        assert!((irr.rate - dec!(0.097)).abs() < dec!(0.001), "got {}", irr.rate);
        assert_eq!(irr.rate_rounded, dec!(0.097));
    }

    #[test]
    fn test_irr_zero_when_flows_just_repay() {
        let flows = inflows(&[dec!(500), dec!(500)]);
        let irr = internal_rate_of_return(dec!(1000), &flows).unwrap();
        assert!(irr.rate.abs() < dec!(0.0001), "got {}", irr.rate);
        assert!(irr.rate_rounded.is_zero());
    }

    #[test]
    fn test_irr_none_without_outlay() {
        assert!(internal_rate_of_return(dec!(0), &inflows(&[dec!(500), dec!(500)])).is_none());
    }

    #[test]
    fn test_irr_none_when_everything_is_paid_out() {
        let flows = vec![
            CashFlowEntry::outflow(dec!(100)),
            CashFlowEntry::outflow(dec!(100)),
        ];
        assert!(internal_rate_of_return(dec!(1000), &flows).is_none());
    }

    #[test]
    fn test_irr_none_when_outlay_is_a_receipt() {
        // negative outlay means money received at year 0
        assert!(internal_rate_of_return(dec!(-1000), &inflows(&[dec!(500)])).is_none());
    }

    #[test]
    fn test_irr_handles_extreme_return() {
        // Doubling in one year: IRR = 100%
        let irr = internal_rate_of_return(dec!(100), &inflows(&[dec!(200)])).unwrap();
        assert_eq!(irr.rate_rounded, dec!(1));
    }

    #[test]
    fn test_search_npv_saturates_near_lower_bound() {
        let big = dec!(100000000000000000000000000);
        let signed = vec![dec!(-1), big, big, big];
        let v = search_npv(&signed, dec!(-0.99));
        assert!(v > Decimal::ZERO);
    }

    #[test]
    fn test_calculate_npv_schedule() {
        let input = NpvInput {
            initial_investment: dec!(1000),
            discount_rate: dec!(0.10),
            cash_flows: inflows(&[dec!(550), dec!(605)]),
        };
        let out = calculate_npv(&input).unwrap();
        let res = &out.result;
        assert_eq!(res.detailed_flows.len(), 3);
        assert_eq!(res.detailed_flows[1].present_value, dec!(500));
        assert_eq!(res.detailed_flows[2].present_value, dec!(500));
        assert_eq!(res.detailed_flows[2].cumulative_present_value, Decimal::ZERO);
        assert_eq!(res.npv, Decimal::ZERO);
        let irr = res.irr.as_ref().unwrap();
        assert_eq!(irr.rate_rounded, dec!(0.1));
    }

    #[test]
    fn test_calculate_npv_warns_on_undefined_irr() {
        let input = NpvInput {
            initial_investment: dec!(0),
            discount_rate: dec!(0.08),
            cash_flows: inflows(&[dec!(10)]),
        };
        let out = calculate_npv(&input).unwrap();
        assert!(out.result.irr.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("IRR is undefined")));
    }

    #[test]
    fn test_npv_outside_decimal_range_is_an_error() {
        let flows = inflows(&[dec!(10000000000); 14]);
        let err = net_present_value(dec!(1), &flows, dec!(-0.99)).unwrap_err();
        assert!(matches!(err, FinSuiteError::NumericOverflow { .. }));
    }

    #[test]
    fn test_npv_sum_outside_decimal_range_is_an_error() {
        let flows = inflows(&[Decimal::MAX, Decimal::MAX]);
        let err = net_present_value(Decimal::ZERO, &flows, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, FinSuiteError::NumericOverflow { .. }));
    }
}
