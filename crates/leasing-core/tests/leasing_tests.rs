use chrono::NaiveDate;
use leasing_core::amortization::math::{annuity_payment, monthly_rate, round_money};
use leasing_core::{
    build_quote, compute_payoff, compute_rpmn, generate_schedule, solve_missing, LeasingError,
    LoanTerms, MissingField, PartialTerms, PaymentType, PenaltyModel, QuoteRequest, RpmnInput,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_terms() -> LoanTerms {
    LoanTerms::annuity(dec!(10000), dec!(0.089), 48)
}

// ===========================================================================
// Schedule generation
// ===========================================================================

#[test]
fn test_reference_annuity_payment() {
    let terms = reference_terms();
    let payment = annuity_payment(terms.principal, monthly_rate(terms.nominal_annual_rate), 48)
        .unwrap();
    // 10,000 at 8.9% over 48 months
    assert_eq!(round_money(payment), dec!(248.38));
}

#[test]
fn test_reference_schedule_totals() {
    let sched = generate_schedule(&reference_terms()).unwrap();
    assert_eq!(sched.total_principal, dec!(10000));
    assert_eq!(sched.items.last().unwrap().balance, Decimal::ZERO);
    // 48 payments of ~248.38 less the principal
    assert!(
        (sched.total_interest - dec!(1922.04)).abs() < dec!(0.50),
        "total interest {}",
        sched.total_interest
    );
    assert_eq!(sched.total_payments, sched.total_principal + sched.total_interest);
}

#[test]
fn test_linear_zero_rate_scenario() {
    let terms = LoanTerms {
        payment_type: PaymentType::Linear,
        ..LoanTerms::annuity(dec!(12000), Decimal::ZERO, 12)
    };
    let sched = generate_schedule(&terms).unwrap();
    assert_eq!(sched.items.len(), 12);
    for item in &sched.items {
        assert_eq!(item.principal, dec!(1000));
        assert_eq!(item.interest, Decimal::ZERO);
        assert_eq!(item.payment, dec!(1000));
    }
    assert_eq!(sched.total_payments, dec!(12000));
}

#[test]
fn test_interest_component_tracks_previous_balance() {
    let terms = LoanTerms {
        payment_type: PaymentType::Linear,
        ..LoanTerms::annuity(dec!(23456.78), dec!(0.0725), 60)
    };
    let r = monthly_rate(terms.nominal_annual_rate);
    let sched = generate_schedule(&terms).unwrap();
    let mut previous = terms.principal;
    for item in &sched.items {
        assert!((item.interest - previous * r).abs() <= dec!(0.01));
        previous = item.balance;
    }
}

#[test]
fn test_due_dates_follow_first_payment() {
    let terms = LoanTerms {
        first_payment_date: NaiveDate::from_ymd_opt(2025, 10, 15),
        ..reference_terms()
    };
    let sched = generate_schedule(&terms).unwrap();
    assert_eq!(sched.items[0].due_date, NaiveDate::from_ymd_opt(2025, 10, 15));
    assert_eq!(sched.items[3].due_date, NaiveDate::from_ymd_opt(2026, 1, 15));
}

#[test]
fn test_schedule_json_shape() {
    let sched = generate_schedule(&reference_terms()).unwrap();
    let value = serde_json::to_value(&sched).unwrap();
    assert_eq!(value["payment_type"], "annuity");
    assert_eq!(value["items"][0]["period"], 1);
    // Decimals travel as strings
    assert!(value["items"][0]["interest"].is_string());
    assert!(value["items"][0].get("due_date").is_none());
}

// ===========================================================================
// Parameter solving
// ===========================================================================

#[test]
fn test_solve_principal_from_payment_and_rate() {
    let partial = PartialTerms {
        principal: None,
        payment: Some(dec!(500)),
        nominal_annual_rate: Some(dec!(0.06)),
        term_in_months: 36,
    };
    let principal = solve_missing(&partial, MissingField::Principal).unwrap();
    // PV of 500/month for 36 months at 0.5%/month
    assert_eq!(round_money(principal), dec!(16435.51));
}

#[test]
fn test_solve_rate_matches_quoted_rate() {
    let exact = annuity_payment(dec!(25000), monthly_rate(dec!(0.0399)), 72).unwrap();
    let partial = PartialTerms {
        principal: Some(dec!(25000)),
        payment: Some(exact),
        nominal_annual_rate: None,
        term_in_months: 72,
    };
    assert_eq!(
        solve_missing(&partial, MissingField::NominalAnnualRate).unwrap(),
        dec!(0.0399)
    );
}

// ===========================================================================
// RPMN
// ===========================================================================

#[test]
fn test_reference_rpmn_without_fees() {
    let result = compute_rpmn(&RpmnInput::from_terms(&reference_terms()).unwrap()).unwrap();
    assert_eq!(result.rpmn, dec!(8.900));
    assert_eq!(result.effective_loan_amount, dec!(10000));
}

#[test]
fn test_reference_rpmn_with_fees() {
    let terms = LoanTerms {
        processing_fee: dec!(200),
        monthly_fee: dec!(5),
        ..reference_terms()
    };
    let input = RpmnInput::from_terms(&terms).unwrap();
    assert_eq!(input.effective_loan_amount(), dec!(10200));
    let result = compute_rpmn(&input).unwrap();
    assert!(result.rpmn > dec!(8.900));
    assert_eq!(result.effective_loan_amount, dec!(10200));
    // (1 + r)^12 - 1 on the monthly IRR of 9,800 disbursed against 48 x 253.38
    assert!((result.rpmn - dec!(11.593)).abs() < dec!(0.01), "rpmn {}", result.rpmn);
}

#[test]
fn test_maximum_term_quote_at_high_rate() {
    let request = QuoteRequest {
        principal: dec!(10000),
        nominal_annual_rate: Some(dec!(1.5)),
        monthly_payment: None,
        term_in_months: 600,
        payment_type: PaymentType::Linear,
        processing_fee: Decimal::ZERO,
        monthly_fee: Decimal::ZERO,
        first_payment_date: None,
        annualization: Default::default(),
    };
    let out = build_quote(&request).unwrap();
    assert_eq!(out.result.rpmn.rpmn, dec!(150.000));
    assert_eq!(out.result.schedule.items[599].balance, Decimal::ZERO);
}

#[test]
fn test_interest_only_rpmn_with_monthly_fee() {
    let terms = LoanTerms {
        payment_type: PaymentType::InterestOnly,
        monthly_fee: dec!(10),
        ..LoanTerms::annuity(dec!(20000), dec!(0.05), 24)
    };
    let result = compute_rpmn(&RpmnInput::from_terms(&terms).unwrap()).unwrap();
    assert!(result.converged);
    assert!(result.rpmn > dec!(5.000));
}

// ===========================================================================
// Early repayment
// ===========================================================================

#[test]
fn test_payoff_prorated_fee_scenario() {
    let terms = LoanTerms {
        processing_fee: dec!(480),
        ..reference_terms()
    };
    let sched = generate_schedule(&terms).unwrap();
    let payoff = compute_payoff(&sched, &terms, 24, PenaltyModel::None).unwrap();
    assert_eq!(payoff.remaining_prorated_processing_fee, dec!(240));
}

#[test]
fn test_payoff_at_term_is_zero() {
    let terms = LoanTerms {
        payment_type: PaymentType::InterestOnly,
        processing_fee: dec!(300),
        ..reference_terms()
    };
    let sched = generate_schedule(&terms).unwrap();
    let payoff = compute_payoff(&sched, &terms, 48, PenaltyModel::None).unwrap();
    assert_eq!(payoff.total_payoff_amount, Decimal::ZERO);
}

#[test]
fn test_payoff_interest_only_keeps_full_balance() {
    let terms = LoanTerms {
        payment_type: PaymentType::InterestOnly,
        ..reference_terms()
    };
    let sched = generate_schedule(&terms).unwrap();
    let payoff = compute_payoff(
        &sched,
        &terms,
        30,
        PenaltyModel::PercentageOfBalance(dec!(0.02)),
    )
    .unwrap();
    assert_eq!(payoff.remaining_principal, dec!(10000));
    assert_eq!(payoff.penalty_amount, dec!(200));
    assert_eq!(payoff.total_payoff_amount, dec!(10200));
}

#[test]
fn test_payoff_invalid_period() {
    let terms = reference_terms();
    let sched = generate_schedule(&terms).unwrap();
    let err = compute_payoff(&sched, &terms, 60, PenaltyModel::None).unwrap_err();
    assert!(matches!(err, LeasingError::InvalidPeriod { period: 60, term: 48 }));
    assert!(err.to_string().contains("60"));
}

// ===========================================================================
// Quote
// ===========================================================================

#[test]
fn test_quote_round_trips_through_json() {
    let request: QuoteRequest = serde_json::from_str(
        r#"{
            "principal": "18000",
            "monthly_payment": "389.50",
            "term_in_months": 48,
            "payment_type": "anuita",
            "processing_fee": "150",
            "monthly_fee": "3.50",
            "first_payment_date": "2025-11-01"
        }"#,
    )
    .unwrap();
    let out = build_quote(&request).unwrap();
    let quote = &out.result;
    assert!(quote.rate_was_solved);
    assert!(quote.terms.nominal_annual_rate > Decimal::ZERO);
    assert!(quote.rpmn.rpmn > quote.terms.nominal_annual_rate * dec!(100));
    assert_eq!(
        quote.schedule.items[0].due_date,
        NaiveDate::from_ymd_opt(2025, 11, 1)
    );

    let json = serde_json::to_string(&out).unwrap();
    assert!(json.contains("\"rpmn\""));
}
