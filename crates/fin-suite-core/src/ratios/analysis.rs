use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::FinSuiteResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Balance-sheet and income-statement figures for one reporting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatement {
    // Balance sheet
    pub current_assets: Money,
    pub total_assets: Money,
    pub current_liabilities: Money,
    pub total_liabilities: Money,
    pub inventory: Money,
    pub accounts_receivable: Money,
    pub cash: Money,
    pub equity: Money,
    // Income statement
    pub revenue: Money,
    pub gross_profit: Money,
    pub operating_income: Money,
    pub net_income: Money,
    pub ebit: Money,
    pub interest_expense: Money,
}

/// Ratios are `None` when their denominator is zero or the quotient is out of
/// decimal range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    // Liquidity
    pub current_ratio: Option<Multiple>,
    pub quick_ratio: Option<Multiple>,
    pub cash_ratio: Option<Multiple>,
    // Profitability (fractions)
    pub gross_profit_margin: Option<Rate>,
    pub operating_margin: Option<Rate>,
    pub net_profit_margin: Option<Rate>,
    pub return_on_assets: Option<Rate>,
    pub return_on_equity: Option<Rate>,
    // Solvency
    pub debt_to_equity: Option<Multiple>,
    pub interest_coverage: Option<Multiple>,
    pub debt_to_assets: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioGroup {
    Liquidity,
    Profitability,
    Solvency,
}

/// Which side of the threshold counts as healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioAssessment {
    pub ratio: String,
    pub group: RatioGroup,
    pub value: Decimal,
    pub formula: String,
    pub threshold: Decimal,
    pub healthy: bool,
    pub verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioAnalysisOutput {
    pub ratios: FinancialRatios,
    pub assessments: Vec<RatioAssessment>,
}

/// Static description of one dashboard ratio.
struct RatioRule {
    name: &'static str,
    group: RatioGroup,
    formula: &'static str,
    threshold: Decimal,
    direction: Direction,
    healthy: &'static str,
    unhealthy: &'static str,
}

const RULES: [RatioRule; 11] = [
    RatioRule {
        name: "Current Ratio",
        group: RatioGroup::Liquidity,
        formula: "Current Assets / Current Liabilities",
        threshold: dec!(2),
        direction: Direction::AtLeast,
        healthy: "Healthy liquidity position",
        unhealthy: "Potential liquidity concerns",
    },
    RatioRule {
        name: "Quick Ratio",
        group: RatioGroup::Liquidity,
        formula: "(Current Assets - Inventory) / Current Liabilities",
        threshold: dec!(1),
        direction: Direction::AtLeast,
        healthy: "Strong acid-test ratio",
        unhealthy: "May struggle with immediate obligations",
    },
    RatioRule {
        name: "Cash Ratio",
        group: RatioGroup::Liquidity,
        formula: "Cash / Current Liabilities",
        threshold: dec!(0.2),
        direction: Direction::AtLeast,
        healthy: "Good cash position",
        unhealthy: "Limited immediate cash availability",
    },
    RatioRule {
        name: "Gross Profit Margin",
        group: RatioGroup::Profitability,
        formula: "Gross Profit / Revenue",
        threshold: dec!(0.30),
        direction: Direction::AtLeast,
        healthy: "Strong operational efficiency",
        unhealthy: "Room for operational improvement",
    },
    RatioRule {
        name: "Operating Margin",
        group: RatioGroup::Profitability,
        formula: "Operating Income / Revenue",
        threshold: dec!(0.15),
        direction: Direction::AtLeast,
        healthy: "Efficient operations",
        unhealthy: "Operating efficiency could be improved",
    },
    RatioRule {
        name: "Net Profit Margin",
        group: RatioGroup::Profitability,
        formula: "Net Income / Revenue",
        threshold: dec!(0.10),
        direction: Direction::AtLeast,
        healthy: "Good profitability",
        unhealthy: "Profitability needs attention",
    },
    RatioRule {
        name: "Return on Assets",
        group: RatioGroup::Profitability,
        formula: "Net Income / Total Assets",
        threshold: dec!(0.05),
        direction: Direction::AtLeast,
        healthy: "Good asset utilization",
        unhealthy: "Asset efficiency could be improved",
    },
    RatioRule {
        name: "Return on Equity",
        group: RatioGroup::Profitability,
        formula: "Net Income / Total Equity",
        threshold: dec!(0.15),
        direction: Direction::AtLeast,
        healthy: "Strong shareholder returns",
        unhealthy: "Limited shareholder value generation",
    },
    RatioRule {
        name: "Debt to Equity",
        group: RatioGroup::Solvency,
        formula: "Total Liabilities / Total Equity",
        threshold: dec!(2),
        direction: Direction::AtMost,
        healthy: "Sustainable debt levels",
        unhealthy: "High leverage - potential risk",
    },
    RatioRule {
        name: "Interest Coverage",
        group: RatioGroup::Solvency,
        formula: "EBIT / Interest Expense",
        threshold: dec!(3),
        direction: Direction::AtLeast,
        healthy: "Strong debt service capability",
        unhealthy: "Debt service pressure",
    },
    RatioRule {
        name: "Debt to Assets",
        group: RatioGroup::Solvency,
        formula: "Total Liabilities / Total Assets",
        threshold: dec!(0.5),
        direction: Direction::AtMost,
        healthy: "Conservative financing",
        unhealthy: "High financial leverage",
    },
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the dashboard ratios. Any ratio with a zero denominator or an
/// unrepresentable quotient is `None`.
pub fn compute_ratios(s: &FinancialStatement) -> FinancialRatios {
    FinancialRatios {
        current_ratio: ratio(s.current_assets, s.current_liabilities),
        quick_ratio: s
            .current_assets
            .checked_sub(s.inventory)
            .and_then(|quick_assets| ratio(quick_assets, s.current_liabilities)),
        cash_ratio: ratio(s.cash, s.current_liabilities),
        gross_profit_margin: ratio(s.gross_profit, s.revenue),
        operating_margin: ratio(s.operating_income, s.revenue),
        net_profit_margin: ratio(s.net_income, s.revenue),
        return_on_assets: ratio(s.net_income, s.total_assets),
        return_on_equity: ratio(s.net_income, s.equity),
        debt_to_equity: ratio(s.total_liabilities, s.equity),
        interest_coverage: ratio(s.ebit, s.interest_expense),
        debt_to_assets: ratio(s.total_liabilities, s.total_assets),
    }
}

/// Compare each available ratio with its rule-of-thumb threshold.
pub fn assess_ratios(ratios: &FinancialRatios) -> Vec<RatioAssessment> {
    RULES
        .iter()
        .zip(ordered_values(ratios))
        .filter_map(|(rule, value)| value.map(|v| assess(rule, v)))
        .collect()
}

/// Ratio dashboard for one financial statement.
pub fn calculate_ratios(
    statement: &FinancialStatement,
) -> FinSuiteResult<ComputationOutput<RatioAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let ratios = compute_ratios(statement);
    for (rule, value) in RULES.iter().zip(ordered_values(&ratios)) {
        if value.is_none() {
            warnings.push(format!(
                "{} unavailable: denominator is zero or quotient out of range ({})",
                rule.name, rule.formula
            ));
        }
    }
    if statement.equity < Decimal::ZERO {
        warnings.push("Negative equity; equity-based ratios are not meaningful".into());
    }
    if statement.inventory > statement.current_assets {
        warnings.push("Inventory exceeds current assets; check the balance sheet".into());
    }

    let assessments = assess_ratios(&ratios);
    let output = RatioAnalysisOutput {
        ratios,
        assessments,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Liquidity, profitability and solvency ratios",
        statement,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `None` for a zero denominator or a quotient outside the decimal range.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

/// Values in the same order as `RULES`.
fn ordered_values(r: &FinancialRatios) -> [Option<Decimal>; 11] {
    [
        r.current_ratio,
        r.quick_ratio,
        r.cash_ratio,
        r.gross_profit_margin,
        r.operating_margin,
        r.net_profit_margin,
        r.return_on_assets,
        r.return_on_equity,
        r.debt_to_equity,
        r.interest_coverage,
        r.debt_to_assets,
    ]
}

fn assess(rule: &RatioRule, value: Decimal) -> RatioAssessment {
    let healthy = match rule.direction {
        Direction::AtLeast => value >= rule.threshold,
        Direction::AtMost => value <= rule.threshold,
    };
    RatioAssessment {
        ratio: rule.name.to_string(),
        group: rule.group,
        value,
        formula: rule.formula.to_string(),
        threshold: rule.threshold,
        healthy,
        verdict: if healthy { rule.healthy } else { rule.unhealthy }.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> FinancialStatement {
        FinancialStatement {
            current_assets: dec!(500),
            total_assets: dec!(2000),
            current_liabilities: dec!(200),
            total_liabilities: dec!(800),
            inventory: dec!(100),
            accounts_receivable: dec!(150),
            cash: dec!(80),
            equity: dec!(1200),
            revenue: dec!(1000),
            gross_profit: dec!(400),
            operating_income: dec!(180),
            net_income: dec!(120),
            ebit: dec!(200),
            interest_expense: dec!(40),
        }
    }

    #[test]
    fn test_liquidity_ratios() {
        let r = compute_ratios(&sample());
        assert_eq!(r.current_ratio, Some(dec!(2.5)));
        assert_eq!(r.quick_ratio, Some(dec!(2)));
        assert_eq!(r.cash_ratio, Some(dec!(0.4)));
    }

    #[test]
    fn test_profitability_ratios_are_fractions() {
        let r = compute_ratios(&sample());
        assert_eq!(r.gross_profit_margin, Some(dec!(0.4)));
        assert_eq!(r.operating_margin, Some(dec!(0.18)));
        assert_eq!(r.net_profit_margin, Some(dec!(0.12)));
        assert_eq!(r.return_on_assets, Some(dec!(0.06)));
        assert_eq!(r.return_on_equity, Some(dec!(0.1)));
    }

    #[test]
    fn test_solvency_ratios() {
        let r = compute_ratios(&sample());
        assert_eq!(r.interest_coverage, Some(dec!(5)));
        assert_eq!(r.debt_to_assets, Some(dec!(0.4)));
    }

    #[test]
    fn test_zero_denominator_gives_none() {
        let mut s = sample();
        s.interest_expense = Decimal::ZERO;
        s.revenue = Decimal::ZERO;
        let r = compute_ratios(&s);
        assert_eq!(r.interest_coverage, None);
        assert_eq!(r.gross_profit_margin, None);
        assert_eq!(r.net_profit_margin, None);
        assert!(r.current_ratio.is_some());
    }

    #[test]
    fn test_assessment_thresholds() {
        let assessments = assess_ratios(&compute_ratios(&sample()));
        assert_eq!(assessments.len(), 11);
        let roe = assessments
            .iter()
            .find(|a| a.ratio == "Return on Equity")
            .unwrap();
        assert!(!roe.healthy);
        assert_eq!(roe.verdict, "Limited shareholder value generation");
        let de = assessments
            .iter()
            .find(|a| a.ratio == "Debt to Equity")
            .unwrap();
        assert!(de.healthy);
        assert_eq!(de.group, RatioGroup::Solvency);
    }

    #[test]
    fn test_calculate_ratios_warns_on_missing() {
        let mut s = sample();
        s.current_liabilities = Decimal::ZERO;
        let out = calculate_ratios(&s).unwrap();
        assert_eq!(out.result.assessments.len(), 8);
        assert_eq!(
            out.warnings
                .iter()
                .filter(|w| w.contains("denominator is zero"))
                .count(),
            3
        );
    }

    #[test]
    fn test_unrepresentable_ratio_is_none() {
        let mut s = sample();
        s.current_liabilities = dec!(0.0000000000000000000000000001);
        s.current_assets = Decimal::MAX;
        let r = compute_ratios(&s);
        assert_eq!(r.current_ratio, None);
        assert!(r.debt_to_assets.is_some());
    }
}
