use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersonalFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PersonalFinanceError {
    /// Shorthand for the most common validation failure.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PersonalFinanceError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Arithmetic that left the representable decimal range.
    pub fn overflow(context: &str) -> Self {
        PersonalFinanceError::FinancialImpossibility(format!(
            "{context} exceeds the representable decimal range; check that rates are decimals (0.085), not percentages (8.5)"
        ))
    }
}

impl From<serde_json::Error> for PersonalFinanceError {
    fn from(e: serde_json::Error) -> Self {
        PersonalFinanceError::SerializationError(e.to_string())
    }
}
