use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use fin_suite_core::time_value::{self, PresentValueInput};
use fin_suite_core::valuation::cost_of_capital::{self, CostOfCapitalInput};
use fin_suite_core::valuation::dcf::{self, CashFlowItem, DcfInput};
use fin_suite_core::valuation::npv::{self, CashFlowEntry, NpvInput};
use fin_suite_core::valuation::payback::{self, PaybackFlow, PaybackInput};
use fin_suite_core::EntryKind;

use crate::input;

/// Arguments for a single-amount present value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PvArgs {
    /// Future amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Discount rate per period (e.g. 0.08 for 8%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of periods until the amount is received
    #[arg(long)]
    pub periods: Option<u32>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for NPV / IRR
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Initial investment at year 0 (positive magnitude)
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Discount rate (e.g. 0.10 for 10%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Yearly cash flows from year 1, negative for outflows (e.g. "300,400,-50,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

/// Arguments for payback period
#[derive(Args)]
pub struct PaybackArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Initial investment at year 0
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Yearly cash flows from year 1, negative for additional investments
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate; when given the discounted payback period is computed
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

/// Arguments for cost of capital
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Risk-free rate (e.g. 0.042 for 4.2%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Expected market return
    #[arg(long)]
    pub market_return: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Market value of equity
    #[arg(long)]
    pub equity_value: Option<Decimal>,

    /// Market value of debt
    #[arg(long)]
    pub debt_value: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for DCF valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DcfArgs {
    /// Path to JSON input file with line items (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Year-0 income for a single income line
    #[arg(long)]
    pub base_income: Option<Decimal>,

    /// Yearly income growth rate
    #[arg(long, default_value = "0")]
    pub income_growth: Decimal,

    /// Year-0 expenses for a single expense line
    #[arg(long, default_value = "0")]
    pub base_expenses: Decimal,

    /// Yearly expense growth rate
    #[arg(long, default_value = "0")]
    pub expense_growth: Decimal,

    /// Discount rate (WACC)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Perpetual growth rate after the projection period
    #[arg(long)]
    pub perpetual_growth: Option<Decimal>,

    /// Projection years
    #[arg(long, default_value = "5")]
    pub years: u32,
}

pub fn run_pv(args: PvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pv_input: PresentValueInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PresentValueInput {
            amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            periods: args
                .periods
                .ok_or("--periods is required (or provide --input)")?,
        }
    };

    let result = time_value::calculate_present_value(&pv_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let npv_input: NpvInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?
            .into_iter()
            .map(|cf| {
                if cf < Decimal::ZERO {
                    CashFlowEntry::outflow(-cf)
                } else {
                    CashFlowEntry::inflow(cf)
                }
            })
            .collect();

        NpvInput {
            initial_investment: args
                .initial_investment
                .ok_or("--initial-investment is required (or provide --input)")?,
            discount_rate: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            cash_flows,
        }
    };

    let result = npv::calculate_npv(&npv_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payback(args: PaybackArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payback_input: PaybackInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?
            .into_iter()
            .map(|cf| {
                if cf < Decimal::ZERO {
                    PaybackFlow::investment(-cf)
                } else {
                    PaybackFlow::inflow(cf)
                }
            })
            .collect();

        PaybackInput {
            initial_investment: args
                .initial_investment
                .ok_or("--initial-investment is required (or provide --input)")?,
            cash_flows,
            discount_rate: args.discount_rate,
        }
    };

    let result = payback::calculate_payback(&payback_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wacc_input: CostOfCapitalInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CostOfCapitalInput {
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
            market_return: args
                .market_return
                .ok_or("--market-return is required (or provide --input)")?,
            beta: args.beta.unwrap_or(dec!(1.0)),
            pre_tax_cost_of_debt: args
                .cost_of_debt
                .ok_or("--cost-of-debt is required (or provide --input)")?,
            tax_rate: args
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?,
            equity_value: args
                .equity_value
                .ok_or("--equity-value is required (or provide --input)")?,
            debt_value: args.debt_value.unwrap_or(Decimal::ZERO),
        }
    };

    let result = cost_of_capital::calculate_cost_of_capital(&wacc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dcf_input: DcfInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let years = args.years;
        let mut income = CashFlowItem::new(
            "income",
            "Income",
            EntryKind::Income,
            args.base_income
                .ok_or("--base-income is required (or provide --input)")?,
            years,
        );
        income.growth_rates = vec![args.income_growth; years as usize];

        let mut items = vec![income];
        if !args.base_expenses.is_zero() {
            let mut expenses = CashFlowItem::new(
                "expenses",
                "Expenses",
                EntryKind::Expense,
                args.base_expenses,
                years,
            );
            expenses.growth_rates = vec![args.expense_growth; years as usize];
            items.push(expenses);
        }

        DcfInput {
            wacc: args.wacc.ok_or("--wacc is required (or provide --input)")?,
            perpetual_growth_rate: args
                .perpetual_growth
                .ok_or("--perpetual-growth is required (or provide --input)")?,
            projection_years: years,
            items,
        }
    };

    let result = dcf::calculate_dcf(&dcf_input)?;
    Ok(serde_json::to_value(result)?)
}
