use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PersonalFinanceError;
use crate::loans::emi;
use crate::types::{
    checked_add, checked_mul, checked_pow, with_metadata, ComputationOutput, Money, Rate,
};
use crate::PersonalFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_HORIZON_YEARS: u32 = 50;
const MAX_LOAN_TENURE_YEARS: u32 = 50;

/// Final net-worth gaps smaller than this are reported as `Indifferent`.
const INDIFFERENCE_BAND: Money = dec!(1);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub property_price: Money,
    /// Fraction of the price paid upfront (0.20 = 20%).
    pub down_payment_fraction: Rate,
    pub loan_rate: Rate,
    pub loan_tenure_years: u32,
    /// Stamp duty, registration and similar one-off costs, as a fraction of price.
    #[serde(default)]
    pub purchase_cost_fraction: Rate,
    /// Brokerage and fees on sale, as a fraction of the value at the horizon.
    #[serde(default)]
    pub selling_cost_fraction: Rate,
    /// Yearly upkeep as a fraction of the current home value.
    #[serde(default)]
    pub maintenance_fraction: Rate,
    pub property_appreciation: Rate,
    pub monthly_rent: Money,
    pub rent_escalation: Rate,
    /// Return earned on whatever cash each side does not spend.
    pub investment_return: Rate,
    pub horizon_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Rent,
    Indifferent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentVsBuyYear {
    pub year: u32,
    pub home_value: Money,
    pub loan_balance: Money,
    pub buyer_outflow: Money,
    pub renter_outflow: Money,
    pub buyer_portfolio: Money,
    pub buyer_net_worth: Money,
    pub renter_net_worth: Money,
    pub buy_advantage: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyOutput {
    pub loan_amount: Money,
    pub emi: Money,
    pub upfront_cash: Money,
    pub year_by_year: Vec<RentVsBuyYear>,
    pub final_buyer_net_worth: Money,
    pub final_renter_net_worth: Money,
    pub buy_advantage: Money,
    pub breakeven_year: Option<u32>,
    pub recommendation: Recommendation,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compare the net worth of buying with a loan against renting and
/// investing the difference, month by month over the horizon.
pub fn compare_rent_vs_buy(
    input: &RentVsBuyInput,
) -> PersonalFinanceResult<ComputationOutput<RentVsBuyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let down_payment = input.property_price * input.down_payment_fraction;
    let purchase_costs = input.property_price * input.purchase_cost_fraction;
    let loan_amount = input.property_price - down_payment;
    let tenure_months = input.loan_tenure_years * 12;

    let payment = if loan_amount > Decimal::ZERO {
        emi::emi(loan_amount, input.loan_rate, tenure_months)?
    } else {
        Decimal::ZERO
    };

    if loan_amount > Decimal::ZERO && input.horizon_years < input.loan_tenure_years {
        warnings.push(format!(
            "Horizon of {} years ends before the {}-year loan; the outstanding balance is netted off the home value",
            input.horizon_years, input.loan_tenure_years
        ));
    }

    let monthly_return = input.investment_return / dec!(12);
    let upfront_cash = down_payment + purchase_costs;
    let mut renter_portfolio = upfront_cash;
    let mut buyer_portfolio = Decimal::ZERO;
    let mut year_by_year = Vec::with_capacity(input.horizon_years as usize);
    let mut breakeven_year = None;

    let appreciation = Decimal::ONE + input.property_appreciation;
    let growth = Decimal::ONE + monthly_return;

    for year in 1..=input.horizon_years {
        let value_at_start = checked_mul(
            input.property_price,
            checked_pow(appreciation, year - 1, "Property appreciation")?,
            "Home value",
        )?;
        let rent = checked_mul(
            input.monthly_rent,
            checked_pow(Decimal::ONE + input.rent_escalation, year - 1, "Rent escalation")?,
            "Monthly rent",
        )?;
        let maintenance = value_at_start * input.maintenance_fraction / dec!(12);

        let mut buyer_outflow = Decimal::ZERO;
        let mut renter_outflow = Decimal::ZERO;

        for m in 1..=12 {
            let month = (year - 1) * 12 + m;
            let instalment = if month <= tenure_months { payment } else { Decimal::ZERO };
            let buyer_month = checked_add(instalment, maintenance, "Buyer outflow")?;
            buyer_outflow = checked_add(buyer_outflow, buyer_month, "Buyer outflow")?;
            renter_outflow = checked_add(renter_outflow, rent, "Renter outflow")?;

            renter_portfolio = checked_mul(renter_portfolio, growth, "Renter portfolio")?;
            buyer_portfolio = checked_mul(buyer_portfolio, growth, "Buyer portfolio")?;

            // Whoever spends less invests the difference.
            let diff = buyer_month - rent;
            if diff > Decimal::ZERO {
                renter_portfolio = checked_add(renter_portfolio, diff, "Renter portfolio")?;
            } else {
                buyer_portfolio = checked_add(buyer_portfolio, -diff, "Buyer portfolio")?;
            }
        }

        let home_value = checked_mul(value_at_start, appreciation, "Home value")?;
        let loan_balance = if loan_amount > Decimal::ZERO {
            emi::outstanding_balance(loan_amount, input.loan_rate, tenure_months, year * 12)?
        } else {
            Decimal::ZERO
        };
        let home_equity = home_value * (Decimal::ONE - input.selling_cost_fraction) - loan_balance;
        let buyer_net_worth = checked_add(home_equity, buyer_portfolio, "Buyer net worth")?;
        let buy_advantage = buyer_net_worth - renter_portfolio;

        if breakeven_year.is_none() && buy_advantage >= Decimal::ZERO {
            breakeven_year = Some(year);
        }

        year_by_year.push(RentVsBuyYear {
            year,
            home_value,
            loan_balance,
            buyer_outflow,
            renter_outflow,
            buyer_portfolio,
            buyer_net_worth,
            renter_net_worth: renter_portfolio,
            buy_advantage,
        });
    }

    let (final_buyer_net_worth, final_renter_net_worth) = year_by_year
        .last()
        .map(|y| (y.buyer_net_worth, y.renter_net_worth))
        .unwrap_or_default();
    let buy_advantage = final_buyer_net_worth - final_renter_net_worth;
    let recommendation = if buy_advantage.abs() < INDIFFERENCE_BAND {
        Recommendation::Indifferent
    } else if buy_advantage > Decimal::ZERO {
        Recommendation::Buy
    } else {
        Recommendation::Rent
    };

    if breakeven_year.is_none() {
        warnings.push(format!(
            "Buying never catches up with renting within {} years",
            input.horizon_years
        ));
    }

    log::debug!(
        "rent vs buy: {} years, buyer {}, renter {}, {:?}",
        input.horizon_years,
        final_buyer_net_worth,
        final_renter_net_worth,
        recommendation
    );

    let output = RentVsBuyOutput {
        loan_amount,
        emi: payment,
        upfront_cash,
        year_by_year,
        final_buyer_net_worth,
        final_renter_net_worth,
        buy_advantage,
        breakeven_year,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent vs buy: home equity plus invested savings against a renter investing the down payment and monthly difference",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(input: &RentVsBuyInput) -> PersonalFinanceResult<()> {
    if input.property_price <= Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "property_price",
            "Property price must be positive",
        ));
    }
    for (field, fraction) in [
        ("down_payment_fraction", input.down_payment_fraction),
        ("purchase_cost_fraction", input.purchase_cost_fraction),
        ("selling_cost_fraction", input.selling_cost_fraction),
        ("maintenance_fraction", input.maintenance_fraction),
    ] {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(PersonalFinanceError::invalid(field, "Must be between 0 and 1"));
        }
    }
    if input.down_payment_fraction < Decimal::ONE && input.loan_tenure_years == 0 {
        return Err(PersonalFinanceError::invalid(
            "loan_tenure_years",
            "A loan needs a tenure of at least one year",
        ));
    }
    if input.loan_tenure_years > MAX_LOAN_TENURE_YEARS {
        return Err(PersonalFinanceError::invalid(
            "loan_tenure_years",
            format!("Loan tenure cannot exceed {MAX_LOAN_TENURE_YEARS} years"),
        ));
    }
    if input.monthly_rent < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "monthly_rent",
            "Rent cannot be negative",
        ));
    }
    if input.horizon_years == 0 || input.horizon_years > MAX_HORIZON_YEARS {
        return Err(PersonalFinanceError::invalid(
            "horizon_years",
            format!("Horizon must be between 1 and {MAX_HORIZON_YEARS} years"),
        ));
    }
    for (field, rate) in [
        ("property_appreciation", input.property_appreciation),
        ("rent_escalation", input.rent_escalation),
        ("investment_return", input.investment_return),
    ] {
        if rate <= dec!(-1) {
            return Err(PersonalFinanceError::invalid(field, "Rate must be greater than -100%"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
