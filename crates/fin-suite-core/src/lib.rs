pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "ratios")]
pub mod ratios;

#[cfg(feature = "personal_finance")]
pub mod personal_finance;

pub use error::FinSuiteError;
pub use types::*;

/// Standard result type for all fin-suite operations
pub type FinSuiteResult<T> = Result<T, FinSuiteError>;
