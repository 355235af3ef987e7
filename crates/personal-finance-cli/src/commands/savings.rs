use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::savings::compound::{self, CompoundingFrequency, LumpSumInput};
use personal_finance_core::savings::recurring::{self, GoalInput, RecurringInput};
use personal_finance_core::PaymentTiming;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompoundingArg {
    Annual,
    SemiAnnual,
    Quarterly,
    Monthly,
    Daily,
}

impl From<CompoundingArg> for CompoundingFrequency {
    fn from(c: CompoundingArg) -> Self {
        match c {
            CompoundingArg::Annual => CompoundingFrequency::Annual,
            CompoundingArg::SemiAnnual => CompoundingFrequency::SemiAnnual,
            CompoundingArg::Quarterly => CompoundingFrequency::Quarterly,
            CompoundingArg::Monthly => CompoundingFrequency::Monthly,
            CompoundingArg::Daily => CompoundingFrequency::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimingArg {
    /// Invest on the first day of each month
    Beginning,
    /// Invest on the last day of each month
    End,
}

impl From<TimingArg> for PaymentTiming {
    fn from(t: TimingArg) -> Self {
        match t {
            TimingArg::Beginning => PaymentTiming::Beginning,
            TimingArg::End => PaymentTiming::End,
        }
    }
}

/// Arguments for a lump-sum deposit
#[derive(Args)]
pub struct LumpSumArgs {
    /// Amount deposited
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (e.g. 0.075 for 7.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub months: Option<u32>,

    /// How often interest is credited
    #[arg(long, value_enum, default_value = "quarterly")]
    pub compounding: CompoundingArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a recurring monthly investment
#[derive(Args)]
pub struct RecurringArgs {
    /// Amount invested each month
    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// Expected annual return (e.g. 0.12 for 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Investment horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Balance already invested at the start
    #[arg(long, default_value = "0")]
    pub initial: Decimal,

    /// Yearly increase in the monthly amount (e.g. 0.10 for 10%)
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,

    /// When in the month each instalment is invested
    #[arg(long, value_enum, default_value = "end")]
    pub timing: TimingArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for goal planning
#[derive(Args)]
pub struct GoalArgs {
    /// Goal amount in today's money
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Years until the goal
    #[arg(long)]
    pub years: Option<u32>,

    /// Expected annual return on savings
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Annual inflation applied to the target
    #[arg(long, default_value = "0")]
    pub inflation: Decimal,

    /// Savings already set aside for the goal
    #[arg(long, default_value = "0")]
    pub current_savings: Decimal,

    /// When in the month each instalment is invested
    #[arg(long, value_enum, default_value = "end")]
    pub timing: TimingArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_lump_sum(args: LumpSumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deposit: LumpSumInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => LumpSumInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args.months.ok_or("--months is required (or provide --input)")?,
            compounding: args.compounding.into(),
        },
    };
    let result = compound::project_lump_sum(&deposit)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_recurring(args: RecurringArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan: RecurringInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => RecurringInput {
            initial_balance: args.initial,
            monthly_contribution: args
                .monthly
                .ok_or("--monthly is required (or provide --input)")?,
            annual_return: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            annual_step_up: args.step_up,
            timing: args.timing.into(),
        },
    };
    let result = recurring::project_recurring(&plan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_goal(args: GoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal: GoalInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => GoalInput {
            target_amount: args.target.ok_or("--target is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            annual_return: args.rate.ok_or("--rate is required (or provide --input)")?,
            inflation_rate: args.inflation,
            current_savings: args.current_savings,
            timing: args.timing.into(),
        },
    };
    let result = recurring::plan_goal(&goal)?;
    Ok(serde_json::to_value(result)?)
}
