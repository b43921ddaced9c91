pub mod personal_finance;
pub mod ratios;
pub mod valuation;
