use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::comparison::portfolio::{self, PortfolioInput};
use personal_finance_core::comparison::rent_vs_buy::{self, RentVsBuyInput};
use personal_finance_core::comparison::tax_harvesting::{self, TaxHarvestInput};

use crate::input;

#[derive(Args)]
pub struct TaxHarvestArgs {
    /// JSON file with `lots`, optional `as_of`, `rules` and realised gains
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct PortfolioArgs {
    /// JSON file with `holdings` and `as_of`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the rent-versus-buy comparison
#[derive(Args)]
pub struct RentVsBuyArgs {
    /// Purchase price of the home
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Fraction of the price paid upfront
    #[arg(long, default_value = "0.2")]
    pub down_payment: Decimal,

    /// Annual home-loan rate
    #[arg(long)]
    pub loan_rate: Option<Decimal>,

    /// Home-loan tenure in years
    #[arg(long, default_value = "20")]
    pub loan_years: u32,

    /// One-off purchase costs as a fraction of price
    #[arg(long, default_value = "0")]
    pub purchase_costs: Decimal,

    /// Selling costs as a fraction of the value at the horizon
    #[arg(long, default_value = "0")]
    pub selling_costs: Decimal,

    /// Yearly maintenance as a fraction of home value
    #[arg(long, default_value = "0")]
    pub maintenance: Decimal,

    /// Annual property appreciation
    #[arg(long)]
    pub appreciation: Option<Decimal>,

    /// Current monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Annual rent increase
    #[arg(long, default_value = "0.05")]
    pub rent_escalation: Decimal,

    /// Annual return on invested surplus
    #[arg(long)]
    pub investment_return: Option<Decimal>,

    /// Years to compare over
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tax_harvest(args: TaxHarvestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lots: TaxHarvestInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for tax harvesting")?;
    let result = tax_harvesting::analyze_tax_harvest(&lots)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let holdings: PortfolioInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for portfolio analysis")?;
    let result = portfolio::analyze_portfolio(&holdings)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rent_vs_buy(args: RentVsBuyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario: RentVsBuyInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => RentVsBuyInput {
            property_price: args.price.ok_or("--price is required (or provide --input)")?,
            down_payment_fraction: args.down_payment,
            loan_rate: args
                .loan_rate
                .ok_or("--loan-rate is required (or provide --input)")?,
            loan_tenure_years: args.loan_years,
            purchase_cost_fraction: args.purchase_costs,
            selling_cost_fraction: args.selling_costs,
            maintenance_fraction: args.maintenance,
            property_appreciation: args
                .appreciation
                .ok_or("--appreciation is required (or provide --input)")?,
            monthly_rent: args.rent.ok_or("--rent is required (or provide --input)")?,
            rent_escalation: args.rent_escalation,
            investment_return: args
                .investment_return
                .ok_or("--investment-return is required (or provide --input)")?,
            horizon_years: args.horizon.unwrap_or(args.loan_years),
        },
    };
    let result = rent_vs_buy::compare_rent_vs_buy(&scenario)?;
    Ok(serde_json::to_value(result)?)
}
