//! Level-payment (EMI) loans: payment, amortization schedule and part
//! prepayments.
//!
//! The monthly rate is `annual_rate / 12`. Every schedule closes at a balance
//! of exactly zero: the last instalment absorbs whatever residual the
//! level payment leaves behind, so the principal column always sums to the
//! amount borrowed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::PersonalFinanceError;
use crate::types::{
    checked_add, checked_mul, checked_pow, with_metadata, ComputationOutput, Money, Rate,
};
use crate::PersonalFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Rates above this are accepted but flagged.
const HIGH_RATE_WARNING: Rate = dec!(0.36);

/// Upper bound on tenure (50 years).
const MAX_TENURE_MONTHS: u32 = 600;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a part prepayment buys the borrower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentStrategy {
    /// Keep the EMI, finish the loan early.
    #[default]
    ReduceTenure,
    /// Keep the end date, re-level the EMI over the remaining months.
    ReduceEmi,
}

/// A lump-sum principal payment made right after the given month's EMI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prepayment {
    pub month: u32,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    #[serde(default)]
    pub prepayments: Vec<Prepayment>,
    #[serde(default)]
    pub prepayment_strategy: PrepaymentStrategy,
}

/// Headline figures for a level-payment loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiOutput {
    pub emi: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub interest_to_principal: Rate,
}

/// One month of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub prepayment: Money,
    pub closing_balance: Money,
}

/// Twelve schedule rows rolled up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub prepayments: Money,
    pub closing_balance: Money,
}

/// Savings relative to the same loan without prepayments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentImpact {
    pub baseline_total_interest: Money,
    pub interest_saved: Money,
    pub baseline_tenure_months: u32,
    pub months_saved: u32,
    pub total_prepaid: Money,
    pub final_emi: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub emi: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_paid: Money,
    pub effective_tenure_months: u32,
    pub interest_to_principal: Rate,
    pub schedule: Vec<AmortizationRow>,
    pub yearly: Vec<AmortizationYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepayment_impact: Option<PrepaymentImpact>,
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// Level monthly payment: `P·i·(1+i)^n / ((1+i)^n − 1)` with `i = r/12`.
///
/// Evaluated in discount form, `P·i / (1 − (1+i)^−n)`, which stays in range
/// however large the rate. A zero rate degenerates to `P/n`.
pub fn emi(principal: Money, annual_rate: Rate, tenure_months: u32) -> PersonalFinanceResult<Money> {
    validate_terms(principal, annual_rate, tenure_months)?;

    if annual_rate.is_zero() {
        return Ok(principal / Decimal::from(tenure_months));
    }

    let i = annual_rate / MONTHS_PER_YEAR;
    let annuity = annuity_factor(i, tenure_months)?;
    if annuity.is_zero() {
        return Err(PersonalFinanceError::DivisionByZero {
            context: "EMI annuity factor".into(),
        });
    }
    Ok(checked_mul(principal, i, "EMI interest component")? / annuity)
}

/// Balance left after `months_paid` level payments, in closed form: the
/// present value of the instalments still due.
pub fn outstanding_balance(
    principal: Money,
    annual_rate: Rate,
    tenure_months: u32,
    months_paid: u32,
) -> PersonalFinanceResult<Money> {
    let payment = emi(principal, annual_rate, tenure_months)?;
    if months_paid >= tenure_months {
        return Ok(Decimal::ZERO);
    }

    let remaining = tenure_months - months_paid;
    if annual_rate.is_zero() {
        return Ok(payment * Decimal::from(remaining));
    }

    let i = annual_rate / MONTHS_PER_YEAR;
    let balance = payment * annuity_factor(i, remaining)? / i;
    Ok(balance.max(Decimal::ZERO))
}

/// `1 − (1+i)^−n`; the discount factor shrinks towards zero instead of
/// growing without bound.
fn annuity_factor(i: Rate, n: u32) -> PersonalFinanceResult<Decimal> {
    let discount = Decimal::ONE / (Decimal::ONE + i);
    Ok(Decimal::ONE - checked_pow(discount, n, "EMI discount factor")?)
}

/// EMI plus lifetime totals, without building the schedule.
pub fn calculate_emi(input: &LoanInput) -> PersonalFinanceResult<ComputationOutput<EmiOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    rate_warnings(input.annual_rate, &mut warnings);
    if !input.prepayments.is_empty() {
        warnings.push(
            "Prepayments are ignored by the EMI summary; build the amortization schedule to see their effect"
                .to_string(),
        );
    }

    let payment = emi(input.principal, input.annual_rate, input.tenure_months)?;
    let total_paid = checked_mul(payment, Decimal::from(input.tenure_months), "Total repayment")?;
    let total_interest = total_paid - input.principal;

    let output = EmiOutput {
        emi: payment,
        total_interest,
        total_paid,
        interest_to_principal: total_interest / input.principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equated Monthly Instalment (reducing-balance annuity)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Month-by-month amortization schedule with yearly roll-up and optional
/// part prepayments.
pub fn build_amortization(
    input: &LoanInput,
) -> PersonalFinanceResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    rate_warnings(input.annual_rate, &mut warnings);
    validate_prepayments(input)?;

    let prepayments = collect_prepayments(&input.prepayments);
    let walk = walk_schedule(input, &prepayments, &mut warnings)?;

    let prepayment_impact = if prepayments.is_empty() {
        None
    } else {
        let mut ignored = Vec::new();
        let baseline = walk_schedule(input, &BTreeMap::new(), &mut ignored)?;
        let baseline_interest: Money = baseline.schedule.iter().map(|r| r.interest).sum();
        let total_interest: Money = walk.schedule.iter().map(|r| r.interest).sum();
        let baseline_tenure = baseline.schedule.len() as u32;
        Some(PrepaymentImpact {
            baseline_total_interest: baseline_interest,
            interest_saved: baseline_interest - total_interest,
            baseline_tenure_months: baseline_tenure,
            months_saved: baseline_tenure.saturating_sub(walk.schedule.len() as u32),
            total_prepaid: walk.schedule.iter().map(|r| r.prepayment).sum(),
            final_emi: walk.final_emi,
        })
    };

    let total_interest: Money = walk.schedule.iter().map(|r| r.interest).sum();
    let total_principal: Money = walk
        .schedule
        .iter()
        .map(|r| r.principal + r.prepayment)
        .sum();
    let total_paid = total_principal + total_interest;
    let yearly = roll_up_years(&walk.schedule);

    log::debug!(
        "amortization: {} months, {} years, total interest {}",
        walk.schedule.len(),
        yearly.len(),
        total_interest
    );

    let output = AmortizationOutput {
        emi: walk.initial_emi,
        total_interest,
        total_principal,
        total_paid,
        effective_tenure_months: walk.schedule.len() as u32,
        interest_to_principal: total_interest / input.principal,
        schedule: walk.schedule,
        yearly,
        prepayment_impact,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reducing-balance amortization schedule with part prepayments",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Schedule walk
// ---------------------------------------------------------------------------

struct ScheduleWalk {
    initial_emi: Money,
    final_emi: Money,
    schedule: Vec<AmortizationRow>,
}

fn walk_schedule(
    input: &LoanInput,
    prepayments: &BTreeMap<u32, Money>,
    warnings: &mut Vec<String>,
) -> PersonalFinanceResult<ScheduleWalk> {
    let n = input.tenure_months;
    let i = input.annual_rate / MONTHS_PER_YEAR;
    let initial_emi = emi(input.principal, input.annual_rate, n)?;

    let mut payment = initial_emi;
    let mut balance = input.principal;
    let mut schedule = Vec::with_capacity(n as usize);

    for month in 1..=n {
        if balance <= Decimal::ZERO {
            break;
        }

        let opening = balance;
        let interest = checked_mul(opening, i, "Monthly interest")?;
        let mut principal = payment - interest;
        let mut this_payment = payment;

        // Last scheduled month, or the level payment now overshoots.
        if month == n || principal >= opening {
            principal = opening;
            this_payment = checked_add(opening, interest, "Final instalment")?;
        }
        balance = opening - principal;

        let mut prepaid = Decimal::ZERO;
        if let Some(requested) = prepayments.get(&month) {
            if *requested > balance {
                warnings.push(format!(
                    "Prepayment of {requested} in month {month} exceeds the outstanding balance {balance}; clamped"
                ));
            }
            prepaid = (*requested).min(balance);
            balance -= prepaid;

            if balance > Decimal::ZERO
                && input.prepayment_strategy == PrepaymentStrategy::ReduceEmi
                && month < n
            {
                payment = emi(balance, input.annual_rate, n - month)?;
            }
        }

        schedule.push(AmortizationRow {
            month,
            opening_balance: opening,
            payment: this_payment,
            interest,
            principal,
            prepayment: prepaid,
            closing_balance: balance,
        });
    }

    Ok(ScheduleWalk {
        initial_emi,
        final_emi: payment,
        schedule,
    })
}

fn roll_up_years(schedule: &[AmortizationRow]) -> Vec<AmortizationYear> {
    let mut years: Vec<AmortizationYear> = Vec::new();
    for row in schedule {
        let year = (row.month - 1) / 12 + 1;
        match years.last_mut() {
            Some(y) if y.year == year => {
                y.principal_paid += row.principal;
                y.interest_paid += row.interest;
                y.prepayments += row.prepayment;
                y.closing_balance = row.closing_balance;
            }
            _ => years.push(AmortizationYear {
                year,
                principal_paid: row.principal,
                interest_paid: row.interest,
                prepayments: row.prepayment,
                closing_balance: row.closing_balance,
            }),
        }
    }
    years
}

/// Same-month prepayments are summed.
fn collect_prepayments(prepayments: &[Prepayment]) -> BTreeMap<u32, Money> {
    let mut by_month = BTreeMap::new();
    for p in prepayments {
        *by_month.entry(p.month).or_insert(Decimal::ZERO) += p.amount;
    }
    by_month
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_terms(principal: Money, annual_rate: Rate, tenure_months: u32) -> PersonalFinanceResult<()> {
    if principal <= Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "principal",
            "Loan principal must be positive",
        ));
    }
    if annual_rate < Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "annual_rate",
            "Interest rate cannot be negative",
        ));
    }
    if tenure_months == 0 {
        return Err(PersonalFinanceError::invalid(
            "tenure_months",
            "Tenure must be at least one month",
        ));
    }
    if tenure_months > MAX_TENURE_MONTHS {
        return Err(PersonalFinanceError::invalid(
            "tenure_months",
            format!("Tenure cannot exceed {MAX_TENURE_MONTHS} months"),
        ));
    }
    Ok(())
}

fn validate_prepayments(input: &LoanInput) -> PersonalFinanceResult<()> {
    for p in &input.prepayments {
        if p.month == 0 || p.month > input.tenure_months {
            return Err(PersonalFinanceError::invalid(
                "prepayments.month",
                format!("Prepayment month {} is outside 1..={}", p.month, input.tenure_months),
            ));
        }
        if p.amount <= Decimal::ZERO {
            return Err(PersonalFinanceError::invalid(
                "prepayments.amount",
                "Prepayment amount must be positive",
            ));
        }
    }
    Ok(())
}

fn rate_warnings(annual_rate: Rate, warnings: &mut Vec<String>) {
    if annual_rate > HIGH_RATE_WARNING {
        warnings.push(format!(
            "Annual rate {annual_rate} is above {HIGH_RATE_WARNING}; check that it is a decimal, not a percentage"
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.000001);

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn home_loan() -> LoanInput {
        LoanInput {
            principal: dec!(2_000_000),
            annual_rate: dec!(0.085),
            tenure_months: 240,
            prepayments: vec![],
            prepayment_strategy: PrepaymentStrategy::ReduceTenure,
        }
    }

    #[test]
    fn test_emi_reference_home_loan() {
        let payment = emi(dec!(2_000_000), dec!(0.085), 240).unwrap();
        assert_close(payment, dec!(17356.46), dec!(0.01), "EMI");
    }

    #[test]
    fn test_emi_zero_rate_is_straight_line() {
        let payment = emi(dec!(120_000), Decimal::ZERO, 12).unwrap();
        assert_eq!(payment, dec!(10_000));
    }

    #[test]
    fn test_emi_rejects_bad_terms() {
        assert!(emi(Decimal::ZERO, dec!(0.08), 12).is_err());
        assert!(emi(dec!(-5), dec!(0.08), 12).is_err());
        assert!(emi(dec!(1000), dec!(-0.01), 12).is_err());
        assert!(emi(dec!(1000), dec!(0.08), 0).is_err());
        assert!(emi(dec!(1000), dec!(0.08), MAX_TENURE_MONTHS + 1).is_err());
    }

    #[test]
    fn test_schedule_principal_sums_to_loan() {
        let out = build_amortization(&home_loan()).unwrap().result;
        let principal: Money = out.schedule.iter().map(|r| r.principal).sum();
        assert_close(principal, dec!(2_000_000), TOL, "principal column");
        assert_close(out.total_principal, dec!(2_000_000), TOL, "total principal");
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let out = build_amortization(&home_loan()).unwrap().result;
        assert_eq!(out.schedule.len(), 240);
        assert_eq!(out.schedule.last().unwrap().closing_balance, Decimal::ZERO);
        assert_eq!(out.effective_tenure_months, 240);
    }

    #[test]
    fn test_total_paid_is_principal_plus_interest() {
        let out = build_amortization(&home_loan()).unwrap().result;
        assert_close(out.total_paid, dec!(2_000_000) + out.total_interest, TOL, "total paid");
        let payments: Money = out.schedule.iter().map(|r| r.payment).sum();
        assert_close(payments, out.total_paid, TOL, "payment column");
    }

    #[test]
    fn test_payment_constant_across_schedule() {
        let out = build_amortization(&home_loan()).unwrap().result;
        let (last, rest) = out.schedule.split_last().unwrap();
        assert!(rest.iter().all(|r| r.payment == out.emi));
        assert_close(last.payment, out.emi, dec!(0.01), "closing instalment");
    }

    #[test]
    fn test_interest_declines_principal_rises() {
        let out = build_amortization(&home_loan()).unwrap().result;
        for pair in out.schedule.windows(2) {
            assert!(pair[1].interest < pair[0].interest);
            assert!(pair[1].principal > pair[0].principal || pair[1].month == 240);
        }
    }

    #[test]
    fn test_summary_matches_schedule() {
        let summary = calculate_emi(&home_loan()).unwrap().result;
        let schedule = build_amortization(&home_loan()).unwrap().result;
        assert_eq!(summary.emi, schedule.emi);
        assert_close(summary.total_interest, schedule.total_interest, dec!(0.01), "interest");
    }

    #[test]
    fn test_zero_rate_schedule_has_no_interest() {
        let input = LoanInput {
            principal: dec!(100),
            annual_rate: Decimal::ZERO,
            tenure_months: 3,
            prepayments: vec![],
            prepayment_strategy: PrepaymentStrategy::ReduceTenure,
        };
        let out = build_amortization(&input).unwrap().result;
        assert_eq!(out.total_interest, Decimal::ZERO);
        assert_close(out.total_paid, dec!(100), TOL, "total paid");
        assert_eq!(out.schedule.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_yearly_rollup() {
        let out = build_amortization(&home_loan()).unwrap().result;
        assert_eq!(out.yearly.len(), 20);
        let interest: Money = out.yearly.iter().map(|y| y.interest_paid).sum();
        assert_close(interest, out.total_interest, TOL, "yearly interest");
        assert_eq!(out.yearly[0].closing_balance, out.schedule[11].closing_balance);
    }

    #[test]
    fn test_outstanding_balance_matches_schedule() {
        let out = build_amortization(&home_loan()).unwrap().result;
        let closed = outstanding_balance(dec!(2_000_000), dec!(0.085), 240, 60).unwrap();
        assert_close(closed, out.schedule[59].closing_balance, dec!(0.001), "balance after 60");
        assert_eq!(
            outstanding_balance(dec!(2_000_000), dec!(0.085), 240, 240).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_prepayment_reduce_tenure() {
        let mut input = home_loan();
        input.prepayments = vec![Prepayment {
            month: 12,
            amount: dec!(500_000),
        }];
        let out = build_amortization(&input).unwrap().result;
        let impact = out.prepayment_impact.unwrap();

        assert!(out.effective_tenure_months < 240);
        assert!(impact.months_saved > 0);
        assert!(impact.interest_saved > Decimal::ZERO);
        assert_eq!(impact.final_emi, out.emi);
        assert_close(out.total_principal, dec!(2_000_000), TOL, "total principal");
    }

    #[test]
    fn test_prepayment_reduce_emi() {
        let mut input = home_loan();
        input.prepayment_strategy = PrepaymentStrategy::ReduceEmi;
        input.prepayments = vec![Prepayment {
            month: 12,
            amount: dec!(500_000),
        }];
        let out = build_amortization(&input).unwrap().result;
        let impact = out.prepayment_impact.unwrap();

        assert_eq!(out.effective_tenure_months, 240);
        assert_eq!(impact.months_saved, 0);
        assert!(impact.final_emi < out.emi);
        assert_eq!(out.schedule[12].payment, impact.final_emi);
        assert_eq!(out.schedule.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_prepayment_is_clamped() {
        let mut input = home_loan();
        input.prepayments = vec![Prepayment {
            month: 1,
            amount: dec!(5_000_000),
        }];
        let result = build_amortization(&input).unwrap();
        assert_eq!(result.result.effective_tenure_months, 1);
        assert_close(result.result.total_principal, dec!(2_000_000), TOL, "total principal");
        assert!(result.warnings.iter().any(|w| w.contains("clamped")));
    }

    #[test]
    fn test_prepayment_outside_tenure_rejected() {
        let mut input = home_loan();
        input.prepayments = vec![Prepayment {
            month: 241,
            amount: dec!(1000),
        }];
        assert!(build_amortization(&input).is_err());
    }

    #[test]
    fn test_high_rate_warns() {
        let mut input = home_loan();
        input.annual_rate = dec!(8.5);
        let result = calculate_emi(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("percentage")));
        // Interest alone is ~70.8% a month, so the EMI is barely above it
        let monthly_interest = dec!(2_000_000) * dec!(8.5) / dec!(12);
        assert!(result.result.emi > monthly_interest);
        assert_close(result.result.emi, monthly_interest, dec!(0.01), "EMI at 850%");
    }

    #[test]
    fn test_percentage_rate_schedule_stays_in_range() {
        let mut input = home_loan();
        input.annual_rate = dec!(8.5);
        let result = build_amortization(&input).unwrap();
        assert_eq!(result.result.schedule.len(), 240);
        assert_eq!(result.result.schedule.last().unwrap().closing_balance, Decimal::ZERO);
        assert!(!result.warnings.is_empty());
        assert_eq!(
            outstanding_balance(dec!(2_000_000), dec!(8.5), 240, 120).unwrap().round_dp(2),
            dec!(2_000_000)
        );
    }

    #[test]
    fn test_huge_principal_at_extreme_rate_is_an_error() {
        let err = emi(Decimal::MAX, dec!(100), 12).unwrap_err();
        assert!(matches!(err, PersonalFinanceError::FinancialImpossibility(_)));
    }
}
