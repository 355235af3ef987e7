use personal_finance_core::savings::compound::{self, CompoundingFrequency, LumpSumInput};
use personal_finance_core::savings::recurring::{self, GoalInput, RecurringInput};
use personal_finance_core::{time_value, PaymentTiming};
use proptest::prelude::{prop_assert, proptest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn sip(contribution: Decimal, rate: Decimal, years: u32) -> RecurringInput {
    RecurringInput {
        initial_balance: Decimal::ZERO,
        monthly_contribution: contribution,
        annual_return: rate,
        years,
        annual_step_up: Decimal::ZERO,
        timing: PaymentTiming::End,
    }
}

// ===========================================================================
// Recurring contributions
// ===========================================================================

#[test]
fn test_sip_ten_years_reference() {
    // 5,000 a month for 10 years at 12% → ≈ 11.5 lakh
    let out = recurring::project_recurring(&sip(dec!(5_000), dec!(0.12), 10)).unwrap();
    let value = out.result.final_value;
    assert!((value - dec!(1_150_193.45)).abs() < dec!(0.1), "value was {}", value);
    assert_eq!(out.result.total_invested, dec!(600_000));
    assert!(out.result.wealth_ratio > dec!(1.9));
}

#[test]
fn test_recurring_json_defaults() {
    let input: RecurringInput = serde_json::from_str(
        r#"{"monthly_contribution": "1000", "annual_return": "0.08", "years": 2}"#,
    )
    .unwrap();
    assert_eq!(input.initial_balance, Decimal::ZERO);
    assert_eq!(input.annual_step_up, Decimal::ZERO);
    assert_eq!(input.timing, PaymentTiming::End);
}

#[test]
fn test_goal_plan_round_trips_through_fv() {
    let input = GoalInput {
        target_amount: dec!(2_500_000),
        years: 10,
        annual_return: dec!(0.11),
        inflation_rate: dec!(0.05),
        current_savings: Decimal::ZERO,
        timing: PaymentTiming::End,
    };
    let out = recurring::plan_goal(&input).unwrap().result;
    let reached = time_value::fv(
        dec!(0.11) / dec!(12),
        120,
        -out.required_monthly_contribution,
        Decimal::ZERO,
    )
    .unwrap();
    assert!((reached - out.inflation_adjusted_target).abs() < dec!(0.01));
    assert!(out.inflation_adjusted_target > dec!(4_000_000));
}

// ===========================================================================
// Lump sums
// ===========================================================================

#[test]
fn test_fixed_deposit_quarterly_five_years() {
    let input = LumpSumInput {
        principal: dec!(100_000),
        annual_rate: dec!(0.075),
        term_months: 60,
        compounding: CompoundingFrequency::Quarterly,
    };
    let out = compound::project_lump_sum(&input).unwrap().result;
    // 1,00,000 · 1.01875^20 ≈ 1,44,994.80
    assert!((out.maturity_value - dec!(144_994.80)).abs() < dec!(0.01));
    assert_eq!(out.year_by_year.len(), 5);
}

#[test]
fn test_lump_sum_defaults_to_quarterly() {
    let input: LumpSumInput = serde_json::from_str(
        r#"{"principal": "1000", "annual_rate": "0.06", "term_months": 12}"#,
    )
    .unwrap();
    assert_eq!(input.compounding, CompoundingFrequency::Quarterly);
}

// ===========================================================================
// Monotonicity laws
// ===========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(48))]

    #[test]
    fn prop_recurring_non_decreasing_in_contribution(
        contribution in 100u32..200_000,
        extra in 0u32..50_000,
        rate_bp in 0u32..2_000,
        years in 1u32..31,
    ) {
        let rate = Decimal::new(rate_bp as i64, 4);
        let low = recurring::project_recurring(&sip(Decimal::from(contribution), rate, years)).unwrap();
        let high = recurring::project_recurring(&sip(Decimal::from(contribution + extra), rate, years)).unwrap();
        prop_assert!(high.result.final_value >= low.result.final_value);
    }

    #[test]
    fn prop_recurring_non_decreasing_in_rate(
        contribution in 100u32..200_000,
        rate_bp in 0u32..2_000,
        bump_bp in 0u32..500,
        years in 1u32..31,
    ) {
        let c = Decimal::from(contribution);
        let low = recurring::project_recurring(&sip(c, Decimal::new(rate_bp as i64, 4), years)).unwrap();
        let high = recurring::project_recurring(&sip(c, Decimal::new((rate_bp + bump_bp) as i64, 4), years)).unwrap();
        prop_assert!(high.result.final_value >= low.result.final_value);
    }

    #[test]
    fn prop_lump_sum_non_decreasing_in_rate_and_principal(
        principal in 1_000u32..10_000_000,
        extra in 0u32..1_000_000,
        rate_bp in 0u32..1_500,
        bump_bp in 0u32..500,
        months in 1u32..241,
    ) {
        let base = LumpSumInput {
            principal: Decimal::from(principal),
            annual_rate: Decimal::new(rate_bp as i64, 4),
            term_months: months,
            compounding: CompoundingFrequency::Monthly,
        };
        let mut richer = base.clone();
        richer.principal = Decimal::from(principal + extra);
        let mut faster = base.clone();
        faster.annual_rate = Decimal::new((rate_bp + bump_bp) as i64, 4);

        let v = compound::project_lump_sum(&base).unwrap().result.maturity_value;
        prop_assert!(compound::project_lump_sum(&richer).unwrap().result.maturity_value >= v);
        prop_assert!(compound::project_lump_sum(&faster).unwrap().result.maturity_value >= v);
    }

    #[test]
    fn prop_recurring_non_decreasing_in_step_up(
        contribution in 100u32..200_000,
        rate_bp in 0u32..2_000,
        step_bp in 0u32..2_000,
        bump_bp in 0u32..1_000,
        years in 1u32..31,
    ) {
        let mut flat = sip(Decimal::from(contribution), Decimal::new(rate_bp as i64, 4), years);
        flat.annual_step_up = Decimal::new(step_bp as i64, 4);
        let mut steeper = flat.clone();
        steeper.annual_step_up = Decimal::new((step_bp + bump_bp) as i64, 4);

        let low = recurring::project_recurring(&flat).unwrap().result;
        let high = recurring::project_recurring(&steeper).unwrap().result;
        prop_assert!(high.final_value >= low.final_value);
        prop_assert!(high.total_invested >= low.total_invested);
    }

    #[test]
    fn prop_lump_sum_non_decreasing_in_compounding_frequency(
        principal in 1_000u32..10_000_000,
        rate_bp in 0u32..1_500,
        months in 1u32..241,
    ) {
        let frequencies = [
            CompoundingFrequency::Annual,
            CompoundingFrequency::SemiAnnual,
            CompoundingFrequency::Quarterly,
            CompoundingFrequency::Monthly,
            CompoundingFrequency::Daily,
        ];
        let values: Vec<Decimal> = frequencies
            .iter()
            .map(|&compounding| {
                let input = LumpSumInput {
                    principal: Decimal::from(principal),
                    annual_rate: Decimal::new(rate_bp as i64, 4),
                    term_months: months,
                    compounding,
                };
                compound::project_lump_sum(&input).unwrap().result.maturity_value
            })
            .collect();
        for pair in values.windows(2) {
            prop_assert!(pair[1] + dec!(0.0001) >= pair[0], "{} then {}", pair[0], pair[1]);
        }
    }
}
