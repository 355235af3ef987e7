use personal_finance_core::loans::emi::{self, LoanInput, Prepayment, PrepaymentStrategy};
use personal_finance_core::PersonalFinanceError;
use proptest::prelude::{prop_assert, proptest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan(principal: Decimal, rate: Decimal, months: u32) -> LoanInput {
    LoanInput {
        principal,
        annual_rate: rate,
        tenure_months: months,
        prepayments: vec![],
        prepayment_strategy: PrepaymentStrategy::ReduceTenure,
    }
}

// ===========================================================================
// Reference home loan: 20 lakh at 8.5% over 20 years
// ===========================================================================

#[test]
fn test_reference_home_loan_emi() {
    let out = emi::calculate_emi(&loan(dec!(2_000_000), dec!(0.085), 240)).unwrap();
    let emi = out.result.emi;
    // Closed form gives 17,356.46; the commonly quoted figure is ~17,349
    assert!((emi - dec!(17_356.46)).abs() < dec!(0.01), "EMI was {}", emi);
    assert!((emi - dec!(17_349)).abs() / dec!(17_349) < dec!(0.001));
}

#[test]
fn test_reference_home_loan_total_interest() {
    let out = emi::build_amortization(&loan(dec!(2_000_000), dec!(0.085), 240)).unwrap();
    let interest = out.result.total_interest;
    assert!(
        (interest - dec!(2_165_551.52)).abs() < dec!(1),
        "Total interest was {}",
        interest
    );
    assert!((interest - dec!(2_163_760)).abs() / dec!(2_163_760) < dec!(0.001));
}

#[test]
fn test_envelope_echoes_input() {
    let out = emi::calculate_emi(&loan(dec!(500_000), dec!(0.10), 60)).unwrap();
    assert_eq!(out.assumptions["tenure_months"], 60);
    assert!(out.methodology.contains("Equated Monthly Instalment"));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_zero_rate_loan_never_produces_nan() {
    let out = emi::build_amortization(&loan(dec!(100_000), Decimal::ZERO, 7)).unwrap();
    assert_eq!(out.result.total_interest, Decimal::ZERO);
    assert!(out.result.schedule.iter().all(|r| r.interest.is_zero()));
    assert_eq!(out.result.schedule.last().unwrap().closing_balance, Decimal::ZERO);
}

#[test]
fn test_non_positive_principal_is_an_error() {
    let err = emi::calculate_emi(&loan(dec!(-1), dec!(0.08), 12)).unwrap_err();
    match err {
        PersonalFinanceError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_multiple_prepayments_same_month_are_combined() {
    let mut input = loan(dec!(1_000_000), dec!(0.09), 120);
    input.prepayments = vec![
        Prepayment {
            month: 24,
            amount: dec!(50_000),
        },
        Prepayment {
            month: 24,
            amount: dec!(25_000),
        },
    ];
    let out = emi::build_amortization(&input).unwrap().result;
    assert_eq!(out.schedule[23].prepayment, dec!(75_000));
    assert_eq!(out.prepayment_impact.unwrap().total_prepaid, dec!(75_000));
}

#[test]
fn test_reduce_tenure_saves_more_interest_than_reduce_emi() {
    let prepayments = vec![Prepayment {
        month: 36,
        amount: dec!(300_000),
    }];
    let mut tenure = loan(dec!(3_000_000), dec!(0.09), 240);
    tenure.prepayments = prepayments.clone();
    let mut emi_cut = tenure.clone();
    emi_cut.prepayment_strategy = PrepaymentStrategy::ReduceEmi;

    let saved_tenure = emi::build_amortization(&tenure)
        .unwrap()
        .result
        .prepayment_impact
        .unwrap()
        .interest_saved;
    let saved_emi = emi::build_amortization(&emi_cut)
        .unwrap()
        .result
        .prepayment_impact
        .unwrap()
        .interest_saved;
    assert!(saved_tenure > saved_emi);
    assert!(saved_emi > Decimal::ZERO);
}

// ===========================================================================
// Schedule laws
// ===========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(48))]

    #[test]
    fn prop_principal_portions_sum_to_principal(
        principal in 1_000u32..50_000_000,
        rate_bp in 0u32..2_400,
        months in 1u32..361,
    ) {
        let input = loan(Decimal::from(principal), Decimal::new(rate_bp as i64, 4), months);
        let out = emi::build_amortization(&input).unwrap().result;
        let principal_sum: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        prop_assert!((principal_sum - Decimal::from(principal)).abs() < dec!(0.000001));
        prop_assert!((out.total_paid - Decimal::from(principal) - out.total_interest).abs() < dec!(0.000001));
        prop_assert!(out.schedule.last().unwrap().closing_balance.is_zero());
    }

    #[test]
    fn prop_payment_is_level_until_the_closing_month(
        principal in 1_000u32..50_000_000,
        rate_bp in 1u32..2_400,
        months in 2u32..361,
    ) {
        let input = loan(Decimal::from(principal), Decimal::new(rate_bp as i64, 4), months);
        let out = emi::build_amortization(&input).unwrap().result;
        let (last, rest) = out.schedule.split_last().unwrap();
        prop_assert!(rest.iter().all(|r| r.payment == out.emi));
        prop_assert!((last.payment - out.emi).abs() < dec!(0.01));
    }

    #[test]
    fn prop_emi_increases_with_rate(
        principal in 1_000u32..50_000_000,
        rate_bp in 0u32..2_000,
        bump_bp in 1u32..400,
        months in 1u32..361,
    ) {
        let p = Decimal::from(principal);
        let low = emi::emi(p, Decimal::new(rate_bp as i64, 4), months).unwrap();
        let high = emi::emi(p, Decimal::new((rate_bp + bump_bp) as i64, 4), months).unwrap();
        prop_assert!(high >= low);
    }
}
