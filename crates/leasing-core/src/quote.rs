//! One-call contract quote.
//!
//! Fills in whichever of nominal rate and monthly payment is missing, then
//! builds the schedule, headline figures and RPMN for the completed terms.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::math::round_money;
use crate::amortization::schedule::{generate_schedule, summarise, PaymentSummary, Schedule};
use crate::error::LeasingError;
use crate::rpmn::{compute_rpmn, Annualization, RpmnInput, RpmnResult};
use crate::solver::parameters::solve_rate;
use crate::types::*;
use crate::LeasingResult;

const MAX_NOMINAL_RATE: Rate = Decimal::ONE;
const RATE_DECIMALS: u32 = 5;
/// Supplied and computed payments further apart than this get a warning.
const PAYMENT_MISMATCH_TOLERANCE: Money = dec!(0.01);

/// Contract terms where the nominal rate or the monthly payment may be omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub principal: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_annual_rate: Option<Rate>,
    /// Quoted payment excluding the monthly fee (first instalment for linear)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Money>,
    pub term_in_months: u32,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub processing_fee: Money,
    #[serde(default)]
    pub monthly_fee: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub annualization: Annualization,
}

/// Completed terms with everything a quote displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasingQuote {
    pub terms: LoanTerms,
    /// True when the nominal rate was inferred from the monthly payment
    pub rate_was_solved: bool,
    pub summary: PaymentSummary,
    pub rpmn: RpmnResult,
    pub schedule: Schedule,
}

/// Complete a contract from partial terms and price it.
pub fn build_quote(request: &QuoteRequest) -> LeasingResult<ComputationOutput<LeasingQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if request.principal <= Decimal::ZERO {
        return Err(LeasingError::invalid_terms(
            "principal",
            "Principal must be positive",
        ));
    }
    if request.term_in_months < 1 {
        return Err(LeasingError::invalid_terms(
            "term_in_months",
            "Term must be at least 1 month",
        ));
    }

    let (nominal_annual_rate, rate_was_solved) =
        match (request.nominal_annual_rate, request.monthly_payment) {
            (Some(rate), _) => (rate, false),
            (None, Some(payment)) => (implied_rate(request, payment, &mut warnings)?, true),
            (None, None) => {
                return Err(LeasingError::invalid_terms(
                    "nominal_annual_rate",
                    "either nominal_annual_rate or monthly_payment must be supplied",
                ))
            }
        };

    let terms = LoanTerms {
        principal: request.principal,
        nominal_annual_rate,
        term_in_months: request.term_in_months,
        payment_type: request.payment_type,
        processing_fee: request.processing_fee,
        monthly_fee: request.monthly_fee,
        first_payment_date: request.first_payment_date,
    };

    let schedule = generate_schedule(&terms)?;
    let summary = summarise(&terms, &schedule)?;

    if let (false, Some(supplied)) = (rate_was_solved, request.monthly_payment) {
        if (round_money(supplied) - summary.monthly_payment).abs() > PAYMENT_MISMATCH_TOLERANCE {
            warnings.push(format!(
                "Supplied monthly payment {supplied} differs from {} implied by the nominal rate; \
                 the nominal rate was used",
                summary.monthly_payment
            ));
        }
    }

    let rpmn_input = RpmnInput {
        annualization: request.annualization,
        ..RpmnInput::from_terms(&terms)?
    };
    let rpmn = compute_rpmn(&rpmn_input)?;
    if !rpmn.converged {
        warnings.push(format!(
            "RPMN search stopped after {} iterations without converging; {}% is an estimate",
            rpmn.iterations, rpmn.rpmn
        ));
    }

    let quote = LeasingQuote {
        terms,
        rate_was_solved,
        summary,
        rpmn,
        schedule,
    };

    let rpmn_basis = if quote.terms.has_fees() {
        "IRR on principal net of processing fee"
    } else {
        "nominal rate"
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Leasing quote: amortization schedule, parameter solve and RPMN",
        &serde_json::json!({
            "principal": request.principal.to_string(),
            "term_in_months": request.term_in_months,
            "payment_type": request.payment_type.as_str(),
            "nominal_annual_rate": quote.terms.nominal_annual_rate.to_string(),
            "rate_was_solved": rate_was_solved,
            "processing_fee": request.processing_fee.to_string(),
            "monthly_fee": request.monthly_fee.to_string(),
            "rpmn_basis": rpmn_basis,
            "rpmn_annualization": request.annualization,
            "fee_proration": "straight-line by period",
        }),
        warnings,
        elapsed,
        quote,
    ))
}

/// Nominal rate implied by the quoted payment for the request's payment type.
fn implied_rate(
    request: &QuoteRequest,
    payment: Money,
    warnings: &mut Vec<String>,
) -> LeasingResult<Rate> {
    if payment <= Decimal::ZERO {
        return Err(LeasingError::invalid_terms(
            "monthly_payment",
            "Monthly payment must be positive",
        ));
    }

    let principal = request.principal;
    let n = Decimal::from(request.term_in_months);
    let monthly = match request.payment_type {
        PaymentType::Annuity => {
            let outcome = solve_rate(principal, payment, request.term_in_months)?;
            if !outcome.converged {
                warnings.push(format!(
                    "Nominal rate search stopped after {} iterations without converging; \
                     {} is an estimate",
                    outcome.iterations, outcome.value
                ));
            }
            return Ok(outcome.value);
        }
        // First instalment = P/n + P·r
        PaymentType::Linear => (payment - principal / n) / principal,
        // Coupon = P·r
        PaymentType::InterestOnly => payment / principal,
    };

    let annual = (monthly * dec!(12))
        .round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    if annual < Decimal::ZERO {
        return Err(LeasingError::invalid_terms(
            "monthly_payment",
            format!("payment {payment} implies a negative interest rate"),
        ));
    }
    if annual > MAX_NOMINAL_RATE {
        warnings.push(format!(
            "Payment {payment} implies {annual} p.a.; rate capped at 100% p.a."
        ));
        return Ok(MAX_NOMINAL_RATE);
    }
    Ok(annual)
}
