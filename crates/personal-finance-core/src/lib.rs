pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "savings")]
pub mod savings;

#[cfg(any(
    feature = "tax_harvesting",
    feature = "rent_vs_buy",
    feature = "portfolio"
))]
pub mod comparison;

pub use error::PersonalFinanceError;
pub use types::*;

/// Standard result type for all personal-finance operations
pub type PersonalFinanceResult<T> = Result<T, PersonalFinanceError>;
