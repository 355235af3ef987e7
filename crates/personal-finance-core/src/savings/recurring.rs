use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PersonalFinanceError;
use crate::time_value;
use crate::types::{
    checked_add, checked_mul, checked_pow, with_metadata, ComputationOutput, Money, PaymentTiming,
    Rate,
};
use crate::PersonalFinanceResult;

/// Longest horizon accepted for a plan or goal.
const MAX_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Systematic monthly investing with an optional yearly step-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringInput {
    #[serde(default)]
    pub initial_balance: Money,
    pub monthly_contribution: Money,
    pub annual_return: Rate,
    pub years: u32,
    /// Contribution increase applied every 12 months (0.10 = +10% a year).
    #[serde(default)]
    pub annual_step_up: Rate,
    #[serde(default)]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringYear {
    pub year: u32,
    pub monthly_contribution: Money,
    pub contributed_in_year: Money,
    pub invested_to_date: Money,
    pub value: Money,
    pub gains: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringOutput {
    pub total_invested: Money,
    pub final_value: Money,
    pub total_gains: Money,
    pub wealth_ratio: Decimal,
    pub year_by_year: Vec<RecurringYear>,
}

/// Saving towards a future goal stated in today's money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalInput {
    pub target_amount: Money,
    pub years: u32,
    pub annual_return: Rate,
    #[serde(default)]
    pub inflation_rate: Rate,
    #[serde(default)]
    pub current_savings: Money,
    #[serde(default)]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalOutput {
    pub inflation_adjusted_target: Money,
    pub future_value_of_savings: Money,
    pub shortfall: Money,
    pub required_monthly_contribution: Money,
    pub total_contributions: Money,
    pub expected_gains: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Grow a monthly contribution stream with monthly compounding at
/// `annual_return / 12`.
pub fn project_recurring(
    input: &RecurringInput,
) -> PersonalFinanceResult<ComputationOutput<RecurringOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_recurring(input)?;

    if input.annual_return < Decimal::ZERO {
        warnings.push(format!(
            "Negative expected return {}; the projection will lose value",
            input.annual_return
        ));
    }

    let i = input.annual_return / dec!(12);
    let mut balance = input.initial_balance;
    let mut invested = input.initial_balance;
    let mut year_by_year = Vec::with_capacity(input.years as usize);

    for year in 1..=input.years {
        let step_up = checked_pow(Decimal::ONE + input.annual_step_up, year - 1, "Step-up factor")?;
        let monthly = checked_mul(input.monthly_contribution, step_up, "Stepped-up contribution")?;
        for _ in 0..12 {
            balance = grow_one_month(balance, monthly, i, input.timing)?;
        }
        let contributed = checked_mul(monthly, dec!(12), "Yearly contribution")?;
        invested = checked_add(invested, contributed, "Total invested")?;

        year_by_year.push(RecurringYear {
            year,
            monthly_contribution: monthly,
            contributed_in_year: contributed,
            invested_to_date: invested,
            value: balance,
            gains: balance - invested,
        });
    }

    log::debug!(
        "recurring: {} years, invested {}, value {}",
        input.years,
        invested,
        balance
    );

    let wealth_ratio = if invested > Decimal::ZERO {
        balance / invested
    } else {
        Decimal::ZERO
    };

    let output = RecurringOutput {
        total_invested: invested,
        final_value: balance,
        total_gains: balance - invested,
        wealth_ratio,
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Recurring monthly contributions, monthly compounding, yearly step-up",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Level monthly contribution needed to reach an inflation-adjusted target.
pub fn plan_goal(input: &GoalInput) -> PersonalFinanceResult<ComputationOutput<GoalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_goal(input)?;

    let months = input.years * 12;
    let i = input.annual_return / dec!(12);

    let inflation =
        checked_pow(Decimal::ONE + input.inflation_rate, input.years, "Inflation factor")?;
    let inflation_adjusted_target = checked_mul(input.target_amount, inflation, "Inflated target")?;
    let future_value_of_savings = time_value::fv(i, months, Decimal::ZERO, -input.current_savings)?;
    let shortfall = inflation_adjusted_target - future_value_of_savings;

    let required_monthly_contribution = if shortfall <= Decimal::ZERO {
        warnings.push("Current savings already reach the target; no further contribution needed".into());
        Decimal::ZERO
    } else {
        let ordinary = time_value::pmt(i, months, Decimal::ZERO, -shortfall)?;
        match input.timing {
            PaymentTiming::End => ordinary,
            PaymentTiming::Beginning => ordinary / (Decimal::ONE + i),
        }
    };

    if input.annual_return <= input.inflation_rate {
        warnings.push(format!(
            "Expected return {} does not beat inflation {}; the real value of savings shrinks",
            input.annual_return, input.inflation_rate
        ));
    }

    let total_contributions = required_monthly_contribution * Decimal::from(months);
    let expected_gains = inflation_adjusted_target.max(future_value_of_savings)
        - total_contributions
        - input.current_savings;

    let output = GoalOutput {
        inflation_adjusted_target,
        future_value_of_savings,
        shortfall: shortfall.max(Decimal::ZERO),
        required_monthly_contribution,
        total_contributions,
        expected_gains,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Goal planning: inflate target, subtract grown savings, solve the annuity payment",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn grow_one_month(
    balance: Money,
    contribution: Money,
    i: Rate,
    timing: PaymentTiming,
) -> PersonalFinanceResult<Money> {
    let growth = Decimal::ONE + i;
    match timing {
        PaymentTiming::Beginning => checked_mul(
            checked_add(balance, contribution, "Investment balance")?,
            growth,
            "Investment balance",
        ),
        PaymentTiming::End => checked_add(
            checked_mul(balance, growth, "Investment balance")?,
            contribution,
            "Investment balance",
        ),
    }
}

fn validate_years(years: u32) -> PersonalFinanceResult<()> {
    if years == 0 {
        return Err(PersonalFinanceError::invalid("years", "Horizon must be at least one year"));
    }
    if years > MAX_YEARS {
        return Err(PersonalFinanceError::invalid(
            "years",
            format!("Horizon cannot exceed {MAX_YEARS} years"),
        ));
    }
    Ok(())
}

fn validate_recurring(input: &RecurringInput) -> PersonalFinanceResult<()> {
    if input.monthly_contribution < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "monthly_contribution",
            "Contribution cannot be negative",
        ));
    }
    if input.initial_balance < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "initial_balance",
            "Initial balance cannot be negative",
        ));
    }
    if input.monthly_contribution.is_zero() && input.initial_balance.is_zero() {
        return Err(PersonalFinanceError::invalid(
            "monthly_contribution",
            "Either a contribution or an initial balance is required",
        ));
    }
    if input.annual_return <= dec!(-1) {
        return Err(PersonalFinanceError::invalid(
            "annual_return",
            "Return must be greater than -100%",
        ));
    }
    if input.annual_step_up < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "annual_step_up",
            "Step-up cannot be negative",
        ));
    }
    validate_years(input.years)
}

fn validate_goal(input: &GoalInput) -> PersonalFinanceResult<()> {
    if input.target_amount <= Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "target_amount",
            "Target must be positive",
        ));
    }
    validate_years(input.years)?;
    if input.annual_return <= dec!(-1) {
        return Err(PersonalFinanceError::invalid(
            "annual_return",
            "Return must be greater than -100%",
        ));
    }
    if input.inflation_rate <= dec!(-1) {
        return Err(PersonalFinanceError::invalid(
            "inflation_rate",
            "Inflation must be greater than -100%",
        ));
    }
    if input.current_savings < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "current_savings",
            "Current savings cannot be negative",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
