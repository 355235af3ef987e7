use clap::{Args, ValueEnum};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::loans::emi::{self, LoanInput, PrepaymentStrategy};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Keep the EMI, close the loan early
    ReduceTenure,
    /// Keep the end date, lower the EMI
    ReduceEmi,
}

impl From<StrategyArg> for PrepaymentStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::ReduceTenure => PrepaymentStrategy::ReduceTenure,
            StrategyArg::ReduceEmi => PrepaymentStrategy::ReduceEmi,
        }
    }
}

/// Arguments for the EMI calculation
#[derive(Args)]
pub struct EmiArgs {
    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (e.g. 0.085 for 8.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long, conflicts_with = "tenure_years")]
    pub tenure_months: Option<u32>,

    /// Tenure in years (rounded up to whole months)
    #[arg(long)]
    pub tenure_years: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct AmortizationArgs {
    #[command(flatten)]
    pub loan: EmiArgs,

    /// What part prepayments in the input file buy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Drop the month-by-month rows and keep the yearly roll-up
    #[arg(long)]
    pub yearly_only: bool,
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input = resolve_loan(&args)?;
    let result = emi::calculate_emi(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_amortization(args: AmortizationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut loan_input = resolve_loan(&args.loan)?;
    if let Some(strategy) = args.strategy {
        loan_input.prepayment_strategy = strategy.into();
    }

    let mut result = emi::build_amortization(&loan_input)?;
    if args.yearly_only {
        result.result.schedule.clear();
    }
    Ok(serde_json::to_value(result)?)
}

fn resolve_loan(args: &EmiArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    if let Some(loan) = input::load::<LoanInput>(args.input.as_deref())? {
        return Ok(loan);
    }

    let tenure_months = match (args.tenure_months, args.tenure_years) {
        (Some(months), _) => months,
        (None, Some(years)) => years_to_months(years)?,
        (None, None) => {
            return Err("--tenure-months or --tenure-years is required (or provide --input)".into())
        }
    };

    Ok(LoanInput {
        principal: args
            .principal
            .ok_or("--principal is required (or provide --input)")?,
        annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
        tenure_months,
        prepayments: Vec::new(),
        prepayment_strategy: PrepaymentStrategy::default(),
    })
}

/// Whole months covering `years`; a partial month counts as a full one.
fn years_to_months(years: Decimal) -> Result<u32, Box<dyn std::error::Error>> {
    if years <= Decimal::ZERO {
        return Err("--tenure-years must be positive".into());
    }
    (years * Decimal::from(12))
        .ceil()
        .to_u32()
        .ok_or_else(|| format!("--tenure-years {} is out of range", years).into())
}
