//! Capital-gains bucketing and loss offsetting for tax harvesting.
//!
//! Lots are split into short-term and long-term gains and losses. Losses are
//! set off in a fixed order: short-term losses against short-term gains,
//! long-term losses against long-term gains, and whatever short-term loss is
//! left against the remaining long-term gains. Long-term losses never touch
//! short-term gains. The long-term exemption applies after set-off.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PersonalFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PersonalFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingTerm {
    ShortTerm,
    LongTerm,
}

/// One purchase lot, valued at the current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxLot {
    pub label: String,
    pub quantity: Decimal,
    pub purchase_price: Money,
    pub current_price: Money,
    /// Explicit classification. Takes precedence over `purchase_date`.
    #[serde(default)]
    pub term: Option<HoldingTerm>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
}

/// Statutory parameters. Defaults follow listed-equity rules for FY 2024-25
/// onwards: 20% STCG, 12.5% LTCG above a 1,25,000 exemption, 12-month
/// holding period, 4% cess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRules {
    pub stcg_rate: Rate,
    pub ltcg_rate: Rate,
    pub ltcg_exemption: Money,
    pub long_term_months: u32,
    pub cess_rate: Rate,
}

impl Default for TaxRules {
    fn default() -> Self {
        TaxRules {
            stcg_rate: dec!(0.20),
            ltcg_rate: dec!(0.125),
            ltcg_exemption: dec!(125_000),
            long_term_months: 12,
            cess_rate: dec!(0.04),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxHarvestInput {
    pub lots: Vec<TaxLot>,
    /// Valuation date used to classify lots by `purchase_date`.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub rules: TaxRules,
    /// Gains (positive) or losses (negative) already booked this year.
    #[serde(default)]
    pub realized_stcg: Money,
    #[serde(default)]
    pub realized_ltcg: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotClassification {
    pub label: String,
    pub term: HoldingTerm,
    pub gain: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holding_months: Option<u32>,
}

/// Gross amounts per bucket. Losses are reported as positive numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GainBuckets {
    pub short_term_gains: Money,
    pub short_term_losses: Money,
    pub long_term_gains: Money,
    pub long_term_losses: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossOffsets {
    pub short_term_loss_against_stcg: Money,
    pub long_term_loss_against_ltcg: Money,
    pub short_term_loss_against_ltcg: Money,
    pub short_term_loss_carried_forward: Money,
    pub long_term_loss_carried_forward: Money,
}

impl LossOffsets {
    pub fn total_offset(&self) -> Money {
        self.short_term_loss_against_stcg
            + self.long_term_loss_against_ltcg
            + self.short_term_loss_against_ltcg
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxComputation {
    pub net_stcg: Money,
    pub net_ltcg: Money,
    pub exemption_used: Money,
    pub taxable_ltcg: Money,
    pub stcg_tax: Money,
    pub ltcg_tax: Money,
    pub cess: Money,
    pub total_tax: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxHarvestOutput {
    pub lots: Vec<LotClassification>,
    pub buckets: GainBuckets,
    pub offsets: LossOffsets,
    pub tax: TaxComputation,
    /// Tax if no loss were booked: gains alone.
    pub tax_without_losses: TaxComputation,
    pub tax_saved_by_losses: Money,
    /// Long-term gains that could still be booked tax-free this year.
    pub unused_ltcg_exemption: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Bucket lots by term and sign, set off losses, and compute the tax.
pub fn analyze_tax_harvest(
    input: &TaxHarvestInput,
) -> PersonalFinanceResult<ComputationOutput<TaxHarvestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let mut lots = Vec::with_capacity(input.lots.len());
    let mut buckets = GainBuckets::default();

    for lot in &input.lots {
        let (term, holding_months) = resolve_term(lot, input.as_of, &input.rules)?;
        let gain = (lot.current_price - lot.purchase_price) * lot.quantity;
        add_to_bucket(&mut buckets, term, gain);
        lots.push(LotClassification {
            label: lot.label.clone(),
            term,
            gain,
            holding_months,
        });
    }
    add_to_bucket(&mut buckets, HoldingTerm::ShortTerm, input.realized_stcg);
    add_to_bucket(&mut buckets, HoldingTerm::LongTerm, input.realized_ltcg);

    let offsets = set_off_losses(&buckets);

    let net_stcg = buckets.short_term_gains - offsets.short_term_loss_against_stcg;
    let net_ltcg = buckets.long_term_gains
        - offsets.long_term_loss_against_ltcg
        - offsets.short_term_loss_against_ltcg;
    let tax = compute_tax(net_stcg, net_ltcg, &input.rules);
    let tax_without_losses = compute_tax(buckets.short_term_gains, buckets.long_term_gains, &input.rules);
    let unused_ltcg_exemption = input.rules.ltcg_exemption - tax.exemption_used;

    let carried = offsets.short_term_loss_carried_forward + offsets.long_term_loss_carried_forward;
    if carried > Decimal::ZERO {
        warnings.push(format!(
            "Losses of {carried} exceed the gains they can offset and are carried forward"
        ));
    }
    if unused_ltcg_exemption > Decimal::ZERO && buckets.long_term_gains > Decimal::ZERO {
        warnings.push(format!(
            "{unused_ltcg_exemption} of the long-term exemption is unused; booking more long-term gains this year is tax-free up to that amount"
        ));
    }

    log::debug!(
        "tax harvest: {} lots, net stcg {}, net ltcg {}, tax {}",
        lots.len(),
        net_stcg,
        net_ltcg,
        tax.total_tax
    );

    let output = TaxHarvestOutput {
        lots,
        buckets,
        tax_saved_by_losses: tax_without_losses.total_tax - tax.total_tax,
        offsets,
        tax,
        tax_without_losses,
        unused_ltcg_exemption,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Capital gains bucketing: ST/LT gain-loss set-off, LTCG exemption, flat rates plus cess",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn add_to_bucket(buckets: &mut GainBuckets, term: HoldingTerm, gain: Money) {
    match (term, gain >= Decimal::ZERO) {
        (HoldingTerm::ShortTerm, true) => buckets.short_term_gains += gain,
        (HoldingTerm::ShortTerm, false) => buckets.short_term_losses -= gain,
        (HoldingTerm::LongTerm, true) => buckets.long_term_gains += gain,
        (HoldingTerm::LongTerm, false) => buckets.long_term_losses -= gain,
    }
}

/// Set-off order. Long-term losses go first against long-term gains since
/// that is their only use; short-term losses left over spill onto what
/// remains, so the carried-forward loss keeps as much short-term character
/// as possible.
pub fn set_off_losses(buckets: &GainBuckets) -> LossOffsets {
    let st_vs_st = buckets.short_term_losses.min(buckets.short_term_gains);
    let st_left = buckets.short_term_losses - st_vs_st;

    let lt_vs_lt = buckets.long_term_losses.min(buckets.long_term_gains);
    let lt_gains_left = buckets.long_term_gains - lt_vs_lt;

    let st_vs_lt = st_left.min(lt_gains_left);

    LossOffsets {
        short_term_loss_against_stcg: st_vs_st,
        long_term_loss_against_ltcg: lt_vs_lt,
        short_term_loss_against_ltcg: st_vs_lt,
        short_term_loss_carried_forward: st_left - st_vs_lt,
        long_term_loss_carried_forward: buckets.long_term_losses - lt_vs_lt,
    }
}

/// Tax on net short-term and long-term gains.
pub fn compute_tax(net_stcg: Money, net_ltcg: Money, rules: &TaxRules) -> TaxComputation {
    let net_stcg = net_stcg.max(Decimal::ZERO);
    let net_ltcg = net_ltcg.max(Decimal::ZERO);
    let exemption_used = net_ltcg.min(rules.ltcg_exemption);
    let taxable_ltcg = net_ltcg - exemption_used;
    let stcg_tax = net_stcg * rules.stcg_rate;
    let ltcg_tax = taxable_ltcg * rules.ltcg_rate;
    let cess = (stcg_tax + ltcg_tax) * rules.cess_rate;

    TaxComputation {
        net_stcg,
        net_ltcg,
        exemption_used,
        taxable_ltcg,
        stcg_tax,
        ltcg_tax,
        cess,
        total_tax: stcg_tax + ltcg_tax + cess,
    }
}

fn resolve_term(
    lot: &TaxLot,
    as_of: Option<NaiveDate>,
    rules: &TaxRules,
) -> PersonalFinanceResult<(HoldingTerm, Option<u32>)> {
    let dated = match (lot.purchase_date, as_of) {
        (Some(bought), Some(as_of)) => {
            if bought > as_of {
                return Err(PersonalFinanceError::DateError(format!(
                    "Lot '{}' was bought on {bought}, after the valuation date {as_of}",
                    lot.label
                )));
            }
            let threshold = bought
                .checked_add_months(Months::new(rules.long_term_months))
                .ok_or_else(|| {
                    PersonalFinanceError::DateError(format!(
                        "Holding-period threshold overflows for lot '{}'",
                        lot.label
                    ))
                })?;
            // Long-term means held for more than the threshold.
            let term = if as_of > threshold {
                HoldingTerm::LongTerm
            } else {
                HoldingTerm::ShortTerm
            };
            Some((term, whole_months_between(bought, as_of)))
        }
        _ => None,
    };

    match (lot.term, dated) {
        (Some(term), dated) => Ok((term, dated.map(|(_, m)| m))),
        (None, Some((term, months))) => Ok((term, Some(months))),
        (None, None) => Err(PersonalFinanceError::invalid(
            "lots.term",
            format!(
                "Lot '{}' needs either a term or a purchase_date with an as_of date",
                lot.label
            ),
        )),
    }
}

fn whole_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    let months = if to.day() < from.day() { months - 1 } else { months };
    months.max(0) as u32
}

fn validate(input: &TaxHarvestInput) -> PersonalFinanceResult<()> {
    if input.lots.is_empty() && input.realized_stcg.is_zero() && input.realized_ltcg.is_zero() {
        return Err(PersonalFinanceError::InsufficientData(
            "At least one lot or a realised gain is required".into(),
        ));
    }
    for lot in &input.lots {
        if lot.quantity <= Decimal::ZERO {
            return Err(PersonalFinanceError::invalid(
                "lots.quantity",
                format!("Lot '{}' must have a positive quantity", lot.label),
            ));
        }
        if lot.purchase_price <= Decimal::ZERO || lot.current_price < Decimal::ZERO {
            return Err(PersonalFinanceError::invalid(
                "lots.price",
                format!("Lot '{}' has an invalid price", lot.label),
            ));
        }
    }
    let rules = &input.rules;
    for (field, rate) in [
        ("rules.stcg_rate", rules.stcg_rate),
        ("rules.ltcg_rate", rules.ltcg_rate),
        ("rules.cess_rate", rules.cess_rate),
    ] {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(PersonalFinanceError::invalid(field, "Rate must be between 0 and 1"));
        }
    }
    if rules.ltcg_exemption < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "rules.ltcg_exemption",
            "Exemption cannot be negative",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
