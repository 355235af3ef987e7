use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PersonalFinanceError;
use crate::types::{checked_mul, checked_pow, with_metadata, ComputationOutput, Money, Rate};
use crate::PersonalFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound on a deposit term (100 years).
const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How often interest is credited to the deposit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundingFrequency {
    Annual,
    SemiAnnual,
    #[default]
    Quarterly,
    Monthly,
    Daily,
}

impl CompoundingFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Annual => 1,
            CompoundingFrequency::SemiAnnual => 2,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Daily => 365,
        }
    }
}

/// A one-time deposit (fixed deposit / certificate of deposit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpSumInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    #[serde(default)]
    pub compounding: CompoundingFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpSumYear {
    pub year: u32,
    pub opening_balance: Money,
    pub interest_earned: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpSumOutput {
    pub maturity_value: Money,
    pub interest_earned: Money,
    pub effective_annual_yield: Rate,
    pub growth_multiple: Decimal,
    pub year_by_year: Vec<LumpSumYear>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project a lump-sum deposit to maturity.
///
/// Whole compounding periods compound; a trailing partial period earns
/// simple interest, the way banks credit broken-period interest on term
/// deposits.
pub fn project_lump_sum(
    input: &LumpSumInput,
) -> PersonalFinanceResult<ComputationOutput<LumpSumOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let m = input.compounding.periods_per_year();
    if m > 12 && input.term_months % 12 != 0 {
        warnings.push(
            "Daily compounding over a term that is not whole years approximates each month as 365/12 days"
                .to_string(),
        );
    }

    let periodic = input.annual_rate / Decimal::from(m);
    let year_factor = growth_over(periodic, m, 12)?;
    let effective_annual_yield = year_factor - Decimal::ONE;

    let total_years = input.term_months.div_ceil(12);
    let mut year_by_year = Vec::with_capacity(total_years as usize);
    let mut opening = input.principal;
    for year in 1..=total_years {
        let months = (input.term_months - (year - 1) * 12).min(12);
        let factor = if months == 12 {
            year_factor
        } else {
            growth_over(periodic, m, months)?
        };
        let closing = checked_mul(opening, factor, "Deposit balance")?;
        year_by_year.push(LumpSumYear {
            year,
            opening_balance: opening,
            interest_earned: closing - opening,
            closing_balance: closing,
        });
        opening = closing;
    }

    let maturity_value = opening;
    let interest_earned = maturity_value - input.principal;

    log::debug!(
        "lump sum: {} months at {} ({:?}) -> {}",
        input.term_months,
        input.annual_rate,
        input.compounding,
        maturity_value
    );

    let output = LumpSumOutput {
        maturity_value,
        interest_earned,
        effective_annual_yield,
        growth_multiple: maturity_value / input.principal,
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Compound interest: P(1 + r/m)^(m·t) with simple interest on a broken period",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Growth multiplier over `months` months, at most one year.
///
/// Elapsed time is measured in compounding periods, `m·months/12`. Whole
/// periods compound and the leftover fraction of a period earns simple
/// interest. Year boundaries always fall on whole periods, so chaining
/// yearly factors matches compounding over the full term.
fn growth_over(periodic: Rate, m: u32, months: u32) -> PersonalFinanceResult<Decimal> {
    let scaled = m * months;
    let whole_periods = scaled / 12;
    let remainder = Decimal::from(scaled % 12) / dec!(12);

    let compounded = checked_pow(Decimal::ONE + periodic, whole_periods, "Deposit growth factor")?;
    checked_mul(
        compounded,
        Decimal::ONE + periodic * remainder,
        "Deposit growth factor",
    )
}

fn validate(input: &LumpSumInput) -> PersonalFinanceResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "principal",
            "Deposit amount must be positive",
        ));
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "annual_rate",
            "Interest rate cannot be negative",
        ));
    }
    if input.term_months == 0 {
        return Err(PersonalFinanceError::invalid(
            "term_months",
            "Term must be at least one month",
        ));
    }
    if input.term_months > MAX_TERM_MONTHS {
        return Err(PersonalFinanceError::invalid(
            "term_months",
            format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
