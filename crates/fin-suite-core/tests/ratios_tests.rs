use fin_suite_core::ratios::analysis::{self, FinancialStatement, RatioGroup};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn distressed() -> FinancialStatement {
    FinancialStatement {
        current_assets: dec!(300),
        total_assets: dec!(1000),
        current_liabilities: dec!(400),
        total_liabilities: dec!(900),
        inventory: dec!(200),
        accounts_receivable: dec!(50),
        cash: dec!(20),
        equity: dec!(100),
        revenue: dec!(2000),
        gross_profit: dec!(300),
        operating_income: dec!(60),
        net_income: dec!(10),
        ebit: dec!(60),
        interest_expense: dec!(40),
    }
}

#[test]
fn test_distressed_company_fails_every_check() {
    let out = analysis::calculate_ratios(&distressed()).unwrap();
    let a = &out.result.assessments;
    assert_eq!(a.len(), 11);
    let healthy: Vec<&str> = a.iter().filter(|x| x.healthy).map(|x| x.ratio.as_str()).collect();
    // Even ROE (10 / 100 = 10%) misses its 15% bar.
    assert!(healthy.is_empty(), "unexpected healthy ratios: {healthy:?}");
    assert_eq!(out.result.ratios.debt_to_equity, Some(dec!(9)));
    assert_eq!(out.result.ratios.interest_coverage, Some(dec!(1.5)));
}

#[test]
fn test_assessments_grouped_in_dashboard_order() {
    let out = analysis::calculate_ratios(&distressed()).unwrap();
    let groups: Vec<RatioGroup> = out.result.assessments.iter().map(|a| a.group).collect();
    assert_eq!(groups[..3], [RatioGroup::Liquidity; 3]);
    assert_eq!(groups[3..8], [RatioGroup::Profitability; 5]);
    assert_eq!(groups[8..], [RatioGroup::Solvency; 3]);
}

#[test]
fn test_all_zero_statement_is_empty_not_error() {
    let zero = FinancialStatement {
        current_assets: Decimal::ZERO,
        total_assets: Decimal::ZERO,
        current_liabilities: Decimal::ZERO,
        total_liabilities: Decimal::ZERO,
        inventory: Decimal::ZERO,
        accounts_receivable: Decimal::ZERO,
        cash: Decimal::ZERO,
        equity: Decimal::ZERO,
        revenue: Decimal::ZERO,
        gross_profit: Decimal::ZERO,
        operating_income: Decimal::ZERO,
        net_income: Decimal::ZERO,
        ebit: Decimal::ZERO,
        interest_expense: Decimal::ZERO,
    };
    let out = analysis::calculate_ratios(&zero).unwrap();
    assert!(out.result.assessments.is_empty());
    assert_eq!(out.warnings.len(), 11);
}
