use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PersonalFinanceError;
use crate::PersonalFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.085 = 8.5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// When a periodic contribution lands within its period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTiming {
    /// Annuity-due: invested on the first day of the month.
    Beginning,
    /// Ordinary annuity: invested on the last day of the month.
    #[default]
    End,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata.
///
/// Warnings are mirrored to the `log` facade so a CLI run with `RUST_LOG=warn`
/// shows them on stderr even when stdout carries only the result.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for w in &warnings {
        log::warn!("{methodology}: {w}");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Compute base^n for a non-negative integer exponent via iterative
/// multiplication (avoids Decimal::powd drift). Errors instead of panicking
/// once the power leaves the decimal range.
pub(crate) fn checked_pow(base: Decimal, n: u32, context: &str) -> PersonalFinanceResult<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = checked_mul(result, base, context)?;
    }
    Ok(result)
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal, context: &str) -> PersonalFinanceResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| PersonalFinanceError::overflow(context))
}

pub(crate) fn checked_add(a: Decimal, b: Decimal, context: &str) -> PersonalFinanceResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| PersonalFinanceError::overflow(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checked_pow() {
        assert_eq!(checked_pow(dec!(1.1), 0, "t").unwrap(), Decimal::ONE);
        assert_eq!(checked_pow(dec!(1.1), 2, "t").unwrap(), dec!(1.21));
    }

    #[test]
    fn test_checked_pow_overflow_is_an_error() {
        // 9.5^240 is far outside the 96-bit mantissa
        let err = checked_pow(dec!(9.5), 240, "growth factor").unwrap_err();
        match err {
            PersonalFinanceError::FinancialImpossibility(msg) => {
                assert!(msg.contains("growth factor"));
                assert!(msg.contains("percentages"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(checked_mul(Decimal::MAX, dec!(2), "x").is_err());
        assert!(checked_add(Decimal::MAX, Decimal::ONE, "x").is_err());
    }

    #[test]
    fn test_envelope_echoes_assumptions() {
        let out = with_metadata("m", &serde_json::json!({"a": 1}), vec![], 7, dec!(5));
        assert_eq!(out.assumptions["a"], 1);
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
