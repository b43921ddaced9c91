use fin_suite_core::time_value::present_value;
use fin_suite_core::valuation::{cost_of_capital, dcf, npv, payback};
use fin_suite_core::{EntryKind, FinSuiteError};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn inflows(amounts: &[Decimal]) -> Vec<npv::CashFlowEntry> {
    amounts.iter().map(|a| npv::CashFlowEntry::inflow(*a)).collect()
}

// ===========================================================================
// NPV / IRR
// ===========================================================================

#[test]
fn test_npv_falls_as_rate_rises() {
    let flows = inflows(&[dec!(300), dec!(400), dec!(500)]);
    let rates = [dec!(0), dec!(0.05), dec!(0.10), dec!(0.20), dec!(0.50)];
    let values: Vec<Decimal> = rates
        .iter()
        .map(|r| npv::net_present_value(dec!(1000), &flows, *r).unwrap())
        .collect();
    assert_eq!(values[0], dec!(200));
    for pair in values.windows(2) {
        assert!(pair[1] < pair[0], "NPV not decreasing: {pair:?}");
    }
}

#[test]
fn test_irr_zeroes_npv() {
    let flows = inflows(&[dec!(300), dec!(400), dec!(500)]);
    let irr = npv::internal_rate_of_return(dec!(1000), &flows).unwrap();
    let at_irr = npv::net_present_value(dec!(1000), &flows, irr.rate).unwrap();
    assert!(at_irr.abs() < dec!(0.0001), "NPV at IRR = {at_irr}");
    // ~8.9%
    assert!((irr.rate - dec!(0.089)).abs() < dec!(0.001));
}

#[test]
fn test_irr_absent_without_sign_change() {
    let all_in = inflows(&[dec!(100), dec!(100)]);
    assert!(npv::internal_rate_of_return(Decimal::ZERO, &all_in).is_none());

    let all_out = vec![
        npv::CashFlowEntry::outflow(dec!(100)),
        npv::CashFlowEntry::outflow(dec!(50)),
    ];
    assert!(npv::internal_rate_of_return(dec!(10), &all_out).is_none());
}

#[test]
fn test_npv_envelope_matches_plain_function() {
    let input = npv::NpvInput {
        initial_investment: dec!(1000),
        discount_rate: dec!(0.08),
        cash_flows: inflows(&[dec!(300), dec!(400), dec!(500)]),
    };
    let out = npv::calculate_npv(&input).unwrap();
    let plain = npv::net_present_value(dec!(1000), &input.cash_flows, dec!(0.08)).unwrap();
    assert_eq!(out.result.npv, plain);
    // Year 0 carries the initial investment.
    assert_eq!(out.result.detailed_flows.len(), 4);
    assert_eq!(out.result.detailed_flows[3].cumulative_present_value, plain);
}

// ===========================================================================
// Payback
// ===========================================================================

#[test]
fn test_payback_reference_cases() {
    let even = [payback::PaybackFlow::inflow(dec!(500)), payback::PaybackFlow::inflow(dec!(500))];
    assert_eq!(payback::payback_period(dec!(1000), &even).period, Some(dec!(2)));

    let uneven = [payback::PaybackFlow::inflow(dec!(600)), payback::PaybackFlow::inflow(dec!(600))];
    let period = payback::payback_period(dec!(1000), &uneven).period.unwrap();
    assert_eq!(period.round_dp(2), dec!(1.67));
}

#[test]
fn test_discounted_payback_is_never_shorter() {
    let flows: Vec<_> = [dec!(400), dec!(400), dec!(400), dec!(400)]
        .into_iter()
        .map(payback::PaybackFlow::inflow)
        .collect();
    let simple = payback::payback_period(dec!(1000), &flows).period.unwrap();
    let discounted = payback::discounted_payback_period(dec!(1000), &flows, dec!(0.10))
        .unwrap()
        .period
        .unwrap();
    assert!(discounted > simple);
}

// ===========================================================================
// Cost of capital
// ===========================================================================

#[test]
fn test_wacc_equal_capital_is_mean() {
    let input = cost_of_capital::CostOfCapitalInput {
        risk_free_rate: dec!(0.04),
        market_return: dec!(0.09),
        beta: dec!(1.2),
        pre_tax_cost_of_debt: dec!(0.06),
        tax_rate: dec!(0.25),
        equity_value: dec!(500),
        debt_value: dec!(500),
    };
    let out = cost_of_capital::calculate_cost_of_capital(&input).unwrap();
    // Ke = 0.04 + 1.2 * 0.05 = 0.10; Kd_at = 0.045
    assert_eq!(out.result.cost_of_equity, dec!(0.10));
    assert_eq!(out.result.wacc, dec!(0.0725));
}

// ===========================================================================
// DCF
// ===========================================================================

fn sample_items() -> Vec<dcf::CashFlowItem> {
    let mut revenue = dcf::CashFlowItem::new("rev", "Revenue", EntryKind::Income, dec!(1000), 5);
    revenue.growth_rates = vec![dec!(0.10); 5];
    let mut costs = dcf::CashFlowItem::new("opex", "Operating costs", EntryKind::Expense, dec!(600), 5);
    costs.growth_rates = vec![dec!(0.05); 5];
    let mut capex = dcf::CashFlowItem::new("capex", "Capex", EntryKind::Expense, Decimal::ZERO, 5);
    capex.set_mode(dcf::ProjectionMode::Manual);
    capex.manual_projections = vec![dec!(50), dec!(50), dec!(80), dec!(80), dec!(100)];
    vec![revenue, costs, capex]
}

#[test]
fn test_dcf_round_trip_through_npv() {
    let wacc = dec!(0.09);
    let projection = dcf::project_dcf(wacc, dec!(0.02), 5, &sample_items()).unwrap();
    let nets: Vec<npv::CashFlowEntry> = projection
        .yearly_flows
        .iter()
        .map(|y| {
            if y.net_cash_flow < Decimal::ZERO {
                npv::CashFlowEntry::outflow(-y.net_cash_flow)
            } else {
                npv::CashFlowEntry::inflow(y.net_cash_flow)
            }
        })
        .collect();
    let via_npv = npv::net_present_value(Decimal::ZERO, &nets, wacc).unwrap();
    assert_eq!(via_npv, projection.pv_of_cash_flows);
}

#[test]
fn test_dcf_terminal_value_discounted_from_last_year() {
    let projection = dcf::project_dcf(dec!(0.09), dec!(0.02), 5, &sample_items()).unwrap();
    let expected = present_value(projection.terminal_value, dec!(0.09), 5).unwrap();
    assert_eq!(projection.pv_of_terminal_value, expected);
    assert_eq!(
        projection.enterprise_value,
        projection.pv_of_cash_flows + projection.pv_of_terminal_value
    );
}

#[test]
fn test_dcf_growth_equal_to_wacc_is_impossible() {
    let err = dcf::project_dcf(dec!(0.05), dec!(0.05), 5, &sample_items()).unwrap_err();
    assert!(matches!(err, FinSuiteError::FinancialImpossibility(_)));
}

#[test]
fn test_dcf_envelope_serializes_flat() {
    let input = dcf::DcfInput {
        wacc: dec!(0.09),
        perpetual_growth_rate: dec!(0.02),
        projection_years: 5,
        items: sample_items(),
    };
    let out = dcf::calculate_dcf(&input).unwrap();
    let json = serde_json::to_value(&out.result).unwrap();
    assert!(json.get("enterprise_value").is_some());
    assert!(json.get("terminal_value_pct").is_some());
    assert_eq!(json["yearly_flows"].as_array().map(Vec::len), Some(5));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_npv_strictly_decreasing_in_rate(
        outlay in 1i64..100_000,
        amounts in prop::collection::vec(1i64..50_000, 1..8),
        r1 in 0u32..5_000,
        step in 1u32..5_000,
    ) {
        let flows = inflows(&amounts.iter().map(|a| Decimal::from(*a)).collect::<Vec<_>>());
        let low = Decimal::new(i64::from(r1), 4);
        let high = Decimal::new(i64::from(r1 + step), 4);
        let npv_low = npv::net_present_value(Decimal::from(outlay), &flows, low).unwrap();
        let npv_high = npv::net_present_value(Decimal::from(outlay), &flows, high).unwrap();
        prop_assert!(npv_high < npv_low);
    }

    #[test]
    fn prop_irr_zeroes_npv_when_defined(
        outlay in 100i64..100_000,
        amounts in prop::collection::vec(1i64..50_000, 1..8),
    ) {
        let flows = inflows(&amounts.iter().map(|a| Decimal::from(*a)).collect::<Vec<_>>());
        if let Some(irr) = npv::internal_rate_of_return(Decimal::from(outlay), &flows) {
            let at_irr = npv::net_present_value(Decimal::from(outlay), &flows, irr.rate).unwrap();
            prop_assert!(at_irr.abs() < dec!(0.0001), "NPV at IRR {} = {}", irr.rate, at_irr);
        }
    }
}
