use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::PersonalFinanceError;
use crate::types::{checked_add, checked_mul, checked_pow, Money, Rate, Years};
use crate::PersonalFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const DAYS_PER_YEAR: Decimal = dec!(365.25);

/// Newton steps outside this band hand over to bisection.
const MIN_IRR: Rate = dec!(-0.99);
const MAX_IRR: Rate = dec!(100);
const MAX_BISECTION_ITERATIONS: u32 = 200;
const BISECTION_WIDTH: Decimal = dec!(0.0000000001);

/// Candidate rates scanned for a sign change of the XNPV.
const BRACKET_GRID: [Rate; 14] = [
    dec!(-0.9999),
    dec!(-0.99),
    dec!(-0.9),
    dec!(-0.75),
    dec!(-0.5),
    dec!(-0.25),
    dec!(0),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(2),
    dec!(5),
    dec!(10),
    dec!(100),
];

/// Net Present Value of a series of periodic cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PersonalFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(PersonalFinanceError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(PersonalFinanceError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Future Value (spreadsheet sign convention: outflows negative)
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> PersonalFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(PersonalFinanceError::invalid(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }
    if rate.is_zero() {
        return Ok(-(present_value + pmt * Decimal::from(nper)));
    }

    let factor = checked_pow(Decimal::ONE + rate, nper, "FV growth factor")?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    let grown = checked_mul(present_value, factor, "FV of present value")?;
    let annuity = checked_mul(pmt, annuity_factor, "FV of payments")?;
    Ok(-checked_add(grown, annuity, "FV")?)
}

/// Payment (PMT), spreadsheet sign convention
pub fn pmt(
    rate: Rate,
    nper: u32,
    present_value: Money,
    future_value: Money,
) -> PersonalFinanceResult<Money> {
    if nper == 0 {
        return Err(PersonalFinanceError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = checked_pow(Decimal::ONE + rate, nper, "PMT growth factor")?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(PersonalFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let grown = checked_mul(present_value, factor, "PMT of present value")?;
    Ok(-checked_add(grown, future_value, "PMT")? / annuity_factor)
}

/// Compound Annual Growth Rate between two values over `years`.
pub fn cagr(begin: Money, end: Money, years: Years) -> PersonalFinanceResult<Rate> {
    if begin <= Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "begin",
            "Beginning value must be positive",
        ));
    }
    if years <= Decimal::ZERO {
        return Err(PersonalFinanceError::invalid(
            "years",
            "Holding period must be positive",
        ));
    }
    if end <= Decimal::ZERO {
        // Total loss: growth rate is -100%
        return Ok(dec!(-1));
    }

    let ratio = end
        .checked_div(begin)
        .ok_or_else(|| PersonalFinanceError::overflow("CAGR growth ratio"))?;
    let growth = ratio
        .checked_powd(Decimal::ONE / years)
        .ok_or_else(|| PersonalFinanceError::overflow("CAGR"))?;
    Ok(growth - Decimal::ONE)
}

/// Year fraction between two dates on an actual/365.25 basis.
pub fn year_fraction(from: NaiveDate, to: NaiveDate) -> Years {
    Decimal::from((to - from).num_days()) / DAYS_PER_YEAR
}

/// Extended IRR for irregular cash flow dates.
///
/// Newton-Raphson from `guess`; when a step leaves `(-99%, 10000%)`, a
/// discount factor overflows, or the iterations run out, the root is
/// bracketed on a fixed rate grid and bisected instead.
pub fn xirr(dated_flows: &[(NaiveDate, Money)], guess: Rate) -> PersonalFinanceResult<Rate> {
    if dated_flows.len() < 2 {
        return Err(PersonalFinanceError::InsufficientData(
            "XIRR requires at least 2 cash flows".into(),
        ));
    }
    let has_outflow = dated_flows.iter().any(|(_, a)| *a < Decimal::ZERO);
    let has_inflow = dated_flows.iter().any(|(_, a)| *a > Decimal::ZERO);
    if !has_outflow || !has_inflow {
        return Err(PersonalFinanceError::FinancialImpossibility(
            "XIRR needs at least one negative and one positive cash flow".into(),
        ));
    }

    let base_date = dated_flows
        .iter()
        .map(|(d, _)| *d)
        .min()
        .unwrap_or(dated_flows[0].0);
    if dated_flows.iter().all(|(d, _)| *d == base_date) {
        return Err(PersonalFinanceError::InsufficientData(
            "XIRR requires cash flows on at least two distinct dates".into(),
        ));
    }

    let timed: Vec<(Years, Money)> = dated_flows
        .iter()
        .map(|(date, amount)| (year_fraction(base_date, *date), *amount))
        .collect();

    let mut rate = guess;
    let mut npv_val = Decimal::ZERO;

    for _ in 0..MAX_IRR_ITERATIONS {
        let Some((value, slope)) = xnpv_with_slope(&timed, rate) else {
            break;
        };
        npv_val = value;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
        if slope.is_zero() {
            break;
        }

        let Some(next) = npv_val
            .checked_div(slope)
            .and_then(|step| rate.checked_sub(step))
        else {
            break;
        };
        if next <= MIN_IRR || next >= MAX_IRR {
            break;
        }
        rate = next;
    }

    log::debug!("XIRR Newton did not settle from guess {guess}; bisecting");
    bisect_xirr(&timed).ok_or(PersonalFinanceError::ConvergenceFailure {
        function: "XIRR".into(),
        iterations: MAX_IRR_ITERATIONS + MAX_BISECTION_ITERATIONS,
        last_delta: npv_val,
    })
}

/// XNPV at `rate` and its derivative with respect to the rate. `None` when a
/// discount factor or present value leaves the decimal range.
fn xnpv_with_slope(timed: &[(Years, Money)], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;
    for (years, amount) in timed {
        let discount = one_plus_r.checked_powd(*years)?;
        if discount.is_zero() {
            return None;
        }
        let present = amount.checked_div(discount)?;
        value = value.checked_add(present)?;
        let d_present = years.checked_mul(present)?.checked_div(one_plus_r)?;
        slope = slope.checked_sub(d_present)?;
    }
    Some((value, slope))
}

fn bisect_xirr(timed: &[(Years, Money)]) -> Option<Rate> {
    let mut previous: Option<(Rate, Decimal)> = None;

    for &rate in BRACKET_GRID.iter() {
        let Some((value, _)) = xnpv_with_slope(timed, rate) else {
            continue;
        };
        if value.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }
        if let Some((low, low_value)) = previous {
            if low_value.is_sign_negative() != value.is_sign_negative() {
                return bisect_between(timed, low, low_value, rate);
            }
        }
        previous = Some((rate, value));
    }
    None
}

fn bisect_between(
    timed: &[(Years, Money)],
    mut low: Rate,
    mut low_value: Decimal,
    mut high: Rate,
) -> Option<Rate> {
    let mut mid = (low + high) / dec!(2);
    for _ in 0..MAX_BISECTION_ITERATIONS {
        mid = (low + high) / dec!(2);
        let (value, _) = xnpv_with_slope(timed, mid)?;
        if value.abs() < CONVERGENCE_THRESHOLD || high - low < BISECTION_WIDTH {
            return Some(mid);
        }
        if value.is_sign_negative() == low_value.is_sign_negative() {
            low = mid;
            low_value = value;
        } else {
            high = mid;
        }
    }
    Some(mid)
}
