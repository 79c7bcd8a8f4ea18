//! Infer one missing contract parameter from the others.
//!
//! Principal and payment have closed forms (the annuity formula and its
//! inverse). The nominal rate has none and is found with the shared bounded
//! Newton–Raphson loop, searching directly over the annual rate.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::math::{
    annuity_payment, annuity_payment_derivative, monthly_rate, principal_from_payment,
};
use crate::error::LeasingError;
use crate::solver::newton::{newton_raphson, NewtonConfig};
use crate::types::{Money, Rate, MAX_TERM_MONTHS};
use crate::LeasingResult;

/// Seed for the rate search (5% p.a.).
const RATE_SEED: Rate = dec!(0.05);
/// Stop once the annual rate moves by less than this.
const RATE_TOLERANCE: Rate = dec!(0.0001);
const RATE_MAX_ITERATIONS: u32 = 100;
/// Rates are searched within 0%..100% p.a.
const RATE_BOUNDS: (Rate, Rate) = (Decimal::ZERO, Decimal::ONE);
/// Solved rates are reported to 3 decimals of a percentage.
const RATE_DECIMALS: u32 = 5;
/// A payment within half a cent of `P/n` is treated as interest-free.
const ZERO_RATE_PAYMENT_TOLERANCE: Money = dec!(0.005);

/// Which contract parameter is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingField {
    Principal,
    Payment,
    NominalAnnualRate,
}

/// Contract terms with up to one unknown among principal, payment and rate.
///
/// Payments follow annuity semantics: a level monthly payment covering
/// principal and interest, excluding fees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_annual_rate: Option<Rate>,
    pub term_in_months: u32,
}

/// Partial terms and the field to solve for, as one input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub terms: PartialTerms,
    pub missing: MissingField,
}

/// A solved value together with the search diagnostics.
///
/// Closed-form solves report zero iterations and always converge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub value: Decimal,
    pub iterations: u32,
    pub converged: bool,
}

impl SolveOutcome {
    fn exact(value: Decimal) -> Self {
        SolveOutcome {
            value,
            iterations: 0,
            converged: true,
        }
    }
}

/// Solve for the missing field and return its value.
///
/// Principal and payment are returned at full precision. A solved rate is a
/// decimal fraction rounded to 5 places; if the search did not converge it is
/// the best estimate found (see [`solve_missing_detailed`] for the flag).
pub fn solve_missing(partial: &PartialTerms, missing: MissingField) -> LeasingResult<Decimal> {
    solve_missing_detailed(partial, missing).map(|outcome| outcome.value)
}

/// Solve for the missing field, exposing iteration count and convergence.
pub fn solve_missing_detailed(
    partial: &PartialTerms,
    missing: MissingField,
) -> LeasingResult<SolveOutcome> {
    validate_term(partial.term_in_months)?;

    match missing {
        MissingField::Principal => {
            reject_supplied("principal", partial.principal)?;
            let payment = require_positive("payment", partial.payment)?;
            let rate = require_rate(partial.nominal_annual_rate)?;
            let principal =
                principal_from_payment(payment, monthly_rate(rate), partial.term_in_months)?;
            Ok(SolveOutcome::exact(principal))
        }
        MissingField::Payment => {
            reject_supplied("payment", partial.payment)?;
            let principal = require_positive("principal", partial.principal)?;
            let rate = require_rate(partial.nominal_annual_rate)?;
            let payment = annuity_payment(principal, monthly_rate(rate), partial.term_in_months)?;
            Ok(SolveOutcome::exact(payment))
        }
        MissingField::NominalAnnualRate => {
            reject_supplied("nominal_annual_rate", partial.nominal_annual_rate)?;
            let principal = require_positive("principal", partial.principal)?;
            let payment = require_positive("payment", partial.payment)?;
            solve_rate(principal, payment, partial.term_in_months)
        }
    }
}

/// Nominal annual rate at which a level payment amortizes the principal.
///
/// Quoted payments are cent-rounded, so one within half a cent of `P/n` is
/// taken as interest-free.
pub fn solve_rate(principal: Money, payment: Money, periods: u32) -> LeasingResult<SolveOutcome> {
    search_rate(principal, payment, periods, ZERO_RATE_PAYMENT_TOLERANCE)
}

/// [`solve_rate`] for an unrounded payment: anything above `P/n` carries interest.
pub(crate) fn solve_rate_exact(
    principal: Money,
    payment: Money,
    periods: u32,
) -> LeasingResult<SolveOutcome> {
    search_rate(principal, payment, periods, Decimal::ZERO)
}

fn search_rate(
    principal: Money,
    payment: Money,
    periods: u32,
    zero_rate_tolerance: Money,
) -> LeasingResult<SolveOutcome> {
    validate_term(periods)?;
    let interest_free_payment = principal / Decimal::from(periods);

    // Rounding a 0% payment down to the cent never counts as underpayment.
    let gap = payment - interest_free_payment;
    let rounded_down = gap <= Decimal::ZERO && -gap < ZERO_RATE_PAYMENT_TOLERANCE;
    if rounded_down || gap.abs() < zero_rate_tolerance {
        return Ok(SolveOutcome::exact(Decimal::ZERO));
    }
    if payment < interest_free_payment {
        return Err(LeasingError::invalid_terms(
            "payment",
            format!(
                "payment {payment} does not repay principal {principal} over {periods} months \
                 (minimum {interest_free_payment:.2} at 0%)"
            ),
        ));
    }

    // Search over the annual rate a; the payment formula works on a / 12.
    let objective = |a: Rate| {
        annuity_payment(principal, monthly_rate(a), periods)
            .map(|m| payment - m)
            .unwrap_or(Decimal::ZERO)
    };
    let derivative = |a: Rate| {
        annuity_payment_derivative(principal, monthly_rate(a), periods)
            .map(|d| -d / dec!(12))
            .unwrap_or(Decimal::ZERO)
    };

    let search = newton_raphson(
        objective,
        derivative,
        RATE_SEED,
        RATE_BOUNDS,
        &NewtonConfig::new(RATE_TOLERANCE, RATE_MAX_ITERATIONS),
    );

    Ok(SolveOutcome {
        value: search
            .root
            .round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        iterations: search.iterations,
        converged: search.converged,
    })
}

fn validate_term(periods: u32) -> LeasingResult<()> {
    if periods < 1 {
        return Err(LeasingError::invalid_terms(
            "term_in_months",
            "Term must be at least 1 month",
        ));
    }
    if periods > MAX_TERM_MONTHS {
        return Err(LeasingError::invalid_terms(
            "term_in_months",
            format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
        ));
    }
    Ok(())
}

fn reject_supplied(field: &str, value: Option<Decimal>) -> LeasingResult<()> {
    if value.is_some() {
        return Err(LeasingError::invalid_terms(
            field,
            "field to solve for must be left empty",
        ));
    }
    Ok(())
}

fn require_positive(field: &str, value: Option<Decimal>) -> LeasingResult<Decimal> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        Some(_) => Err(LeasingError::invalid_terms(field, "must be positive")),
        None => Err(LeasingError::invalid_terms(field, "required for this solve")),
    }
}

fn require_rate(value: Option<Rate>) -> LeasingResult<Rate> {
    match value {
        Some(v) if v >= Decimal::ZERO => Ok(v),
        Some(_) => Err(LeasingError::invalid_terms(
            "nominal_annual_rate",
            "Nominal rate cannot be negative",
        )),
        None => Err(LeasingError::invalid_terms(
            "nominal_annual_rate",
            "required for this solve",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::math::round_money;

    fn partial(principal: Option<Money>, payment: Option<Money>, rate: Option<Rate>) -> PartialTerms {
        PartialTerms {
            principal,
            payment,
            nominal_annual_rate: rate,
            term_in_months: 48,
        }
    }

    #[test]
    fn test_solve_payment() {
        let p = partial(Some(dec!(10000)), None, Some(dec!(0.089)));
        let payment = solve_missing(&p, MissingField::Payment).unwrap();
        assert_eq!(round_money(payment), dec!(248.38));
    }

    #[test]
    fn test_solve_principal_zero_rate() {
        let p = PartialTerms {
            payment: Some(dec!(250)),
            nominal_annual_rate: Some(Decimal::ZERO),
            term_in_months: 12,
            ..Default::default()
        };
        assert_eq!(solve_missing(&p, MissingField::Principal).unwrap(), dec!(3000));
    }

    #[test]
    fn test_payment_principal_round_trip() {
        let p = partial(Some(dec!(18500)), None, Some(dec!(0.0749)));
        let payment = solve_missing(&p, MissingField::Payment).unwrap();
        let back = partial(None, Some(payment), Some(dec!(0.0749)));
        let principal = solve_missing(&back, MissingField::Principal).unwrap();
        assert!((principal - dec!(18500)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_solve_rate_from_exact_payment() {
        let payment = annuity_payment(dec!(10000), monthly_rate(dec!(0.089)), 48).unwrap();
        let p = partial(Some(dec!(10000)), Some(payment), None);
        let outcome = solve_missing_detailed(&p, MissingField::NominalAnnualRate).unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations > 0);
        assert_eq!(outcome.value, dec!(0.08900));
    }

    #[test]
    fn test_solve_rate_from_rounded_payment() {
        // A cent-rounded payment pins the rate down to about 1e-5
        let p = partial(Some(dec!(10000)), Some(dec!(248.38)), None);
        let rate = solve_missing(&p, MissingField::NominalAnnualRate).unwrap();
        assert!((rate - dec!(0.089)).abs() <= dec!(0.00002), "{rate}");
    }

    #[test]
    fn test_solve_rate_zero_interest_shortcut() {
        let p = partial(Some(dec!(12000)), Some(dec!(250)), None);
        let outcome = solve_missing_detailed(&p, MissingField::NominalAnnualRate).unwrap();
        assert_eq!(outcome.value, Decimal::ZERO);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.converged);
    }

    #[test]
    fn test_solve_rate_payment_too_small() {
        let p = partial(Some(dec!(12000)), Some(dec!(200)), None);
        assert!(matches!(
            solve_missing(&p, MissingField::NominalAnnualRate),
            Err(LeasingError::InvalidTerms { .. })
        ));
    }

    #[test]
    fn test_solve_rate_clamped_at_100_percent() {
        // 1000/month on 10000 over 48 months implies far more than 100% p.a.
        let p = partial(Some(dec!(10000)), Some(dec!(1000)), None);
        let outcome = solve_missing_detailed(&p, MissingField::NominalAnnualRate).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.value, Decimal::ONE);
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let p = partial(Some(dec!(10000)), None, None);
        assert!(solve_missing(&p, MissingField::Payment).is_err());

        let p = partial(Some(dec!(10000)), Some(dec!(250)), Some(dec!(0.05)));
        assert!(solve_missing(&p, MissingField::Payment).is_err());

        let p = PartialTerms {
            term_in_months: 0,
            ..partial(Some(dec!(10000)), None, Some(dec!(0.05)))
        };
        assert!(solve_missing(&p, MissingField::Payment).is_err());
    }

    #[test]
    fn test_solve_request_from_json() {
        let request: SolveRequest = serde_json::from_str(
            r#"{"terms": {"principal": "10000", "nominal_annual_rate": "0.089", "term_in_months": 48}, "missing": "payment"}"#,
        )
        .unwrap();
        assert_eq!(request.missing, MissingField::Payment);
        let payment = solve_missing(&request.terms, request.missing).unwrap();
        assert_eq!(round_money(payment), dec!(248.38));
    }

    #[test]
    fn test_exact_solve_keeps_tiny_rates() {
        // 1 bp on 100.00 moves the payment by well under half a cent
        let exact = annuity_payment(dec!(100), monthly_rate(dec!(0.0001)), 600).unwrap();
        assert_eq!(solve_rate(dec!(100), exact, 600).unwrap().value, Decimal::ZERO);
        assert_eq!(
            solve_rate_exact(dec!(100), exact, 600).unwrap().value,
            dec!(0.0001)
        );
        assert_eq!(
            solve_rate_exact(dec!(1200), dec!(2), 600).unwrap().value,
            Decimal::ZERO
        );
        // 10000 / 12 rounded down to the cent
        assert_eq!(
            solve_rate_exact(dec!(10000), dec!(833.33), 12).unwrap().value,
            Decimal::ZERO
        );
    }
}
