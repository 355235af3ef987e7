use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::PersonalFinanceError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::PersonalFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub asset_class: String,
    pub invested: Money,
    pub current_value: Money,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub holdings: Vec<Holding>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingAnalysis {
    pub name: String,
    pub asset_class: String,
    pub invested: Money,
    pub current_value: Money,
    pub gain: Money,
    pub return_pct: Rate,
    pub holding_years: Years,
    /// CAGR when held a year or more, otherwise the simple return.
    pub annualized_return: Rate,
    pub weight: Rate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub invested: Money,
    pub current_value: Money,
    pub gain: Money,
    pub weight: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub holdings: Vec<HoldingAnalysis>,
    pub total_invested: Money,
    pub total_current_value: Money,
    pub total_gain: Money,
    pub total_return_pct: Rate,
    pub xirr: Option<Rate>,
    pub allocation: BTreeMap<String, AllocationSlice>,
    pub best_performer: Option<String>,
    pub worst_performer: Option<String>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Aggregate holdings into returns, allocation and a money-weighted XIRR.
pub fn analyze_portfolio(
    input: &PortfolioInput,
) -> PersonalFinanceResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let total_invested: Money = input.holdings.iter().map(|h| h.invested).sum();
    let total_current_value: Money = input.holdings.iter().map(|h| h.current_value).sum();
    let total_gain = total_current_value - total_invested;

    let mut holdings = Vec::with_capacity(input.holdings.len());
    let mut allocation: BTreeMap<String, AllocationSlice> = BTreeMap::new();

    for h in &input.holdings {
        let gain = h.current_value - h.invested;
        let return_pct = gain / h.invested;
        let holding_years = time_value::year_fraction(h.purchase_date, input.as_of);
        let annualized_return = if holding_years >= Decimal::ONE {
            time_value::cagr(h.invested, h.current_value, holding_years)?
        } else {
            return_pct
        };
        let weight = share_of(h.current_value, total_current_value);

        let slice = allocation.entry(h.asset_class.clone()).or_default();
        slice.invested += h.invested;
        slice.current_value += h.current_value;
        slice.gain += gain;

        holdings.push(HoldingAnalysis {
            name: h.name.clone(),
            asset_class: h.asset_class.clone(),
            invested: h.invested,
            current_value: h.current_value,
            gain,
            return_pct,
            holding_years,
            annualized_return,
            weight,
        });
    }

    for slice in allocation.values_mut() {
        slice.weight = share_of(slice.current_value, total_current_value);
    }

    let mut flows: Vec<(NaiveDate, Money)> = input
        .holdings
        .iter()
        .map(|h| (h.purchase_date, -h.invested))
        .collect();
    flows.push((input.as_of, total_current_value));
    let xirr = match time_value::xirr(&flows, dec!(0.1)) {
        Ok(rate) => Some(rate),
        Err(e) => {
            warnings.push(format!("Portfolio XIRR unavailable: {e}"));
            None
        }
    };

    let best_performer = holdings
        .iter()
        .max_by(|a, b| a.return_pct.cmp(&b.return_pct).then_with(|| b.name.cmp(&a.name)))
        .map(|h| h.name.clone());
    let worst_performer = holdings
        .iter()
        .min_by(|a, b| a.return_pct.cmp(&b.return_pct).then_with(|| a.name.cmp(&b.name)))
        .map(|h| h.name.clone());

    log::debug!(
        "portfolio: {} holdings across {} asset classes, value {}",
        holdings.len(),
        allocation.len(),
        total_current_value
    );

    let output = PortfolioOutput {
        holdings,
        total_invested,
        total_current_value,
        total_gain,
        total_return_pct: total_gain / total_invested,
        xirr,
        allocation,
        best_performer,
        worst_performer,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio aggregation: absolute and annualised returns, asset-class allocation, XIRR",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn share_of(part: Money, whole: Money) -> Rate {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole
    }
}

fn validate(input: &PortfolioInput) -> PersonalFinanceResult<()> {
    if input.holdings.is_empty() {
        return Err(PersonalFinanceError::InsufficientData(
            "Portfolio analysis needs at least one holding".into(),
        ));
    }
    for h in &input.holdings {
        if h.invested <= Decimal::ZERO {
            return Err(PersonalFinanceError::invalid(
                "holdings.invested",
                format!("Holding '{}' must have a positive invested amount", h.name),
            ));
        }
        if h.current_value < Decimal::ZERO {
            return Err(PersonalFinanceError::invalid(
                "holdings.current_value",
                format!("Holding '{}' has a negative value", h.name),
            ));
        }
        if h.purchase_date > input.as_of {
            return Err(PersonalFinanceError::DateError(format!(
                "Holding '{}' was bought on {}, after the valuation date {}",
                h.name, h.purchase_date, input.as_of
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
