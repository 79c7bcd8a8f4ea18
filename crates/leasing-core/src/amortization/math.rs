//! Closed-form amortization formulas.
//!
//! Everything here works on a per-period (monthly) rate and keeps full
//! decimal precision. Rounding to cents happens only where a value leaves
//! the engine as a schedule item or summary figure.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::LeasingError;
use crate::types::{Money, PaymentType, Rate};
use crate::LeasingResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Nominal annual rate to monthly rate.
pub fn monthly_rate(nominal_annual_rate: Rate) -> Rate {
    nominal_annual_rate / MONTHS_PER_YEAR
}

/// `vⁿ = (1 + r)^−n`. For non-negative rates this only shrinks, so long
/// terms at high rates underflow towards zero instead of overflowing.
fn discount_factor(monthly_rate: Rate, periods: u32) -> LeasingResult<Decimal> {
    let v = Decimal::ONE
        .checked_div(Decimal::ONE + monthly_rate)
        .filter(|v| v.is_sign_positive())
        .ok_or_else(|| {
            LeasingError::invalid_terms(
                "nominal_annual_rate",
                "Monthly rate must be greater than -100%",
            )
        })?;
    v.checked_powi(i64::from(periods)).ok_or_else(|| {
        LeasingError::invalid_terms(
            "nominal_annual_rate",
            format!("discounting over {periods} periods is out of range"),
        )
    })
}

fn require_periods(periods: u32) -> LeasingResult<Decimal> {
    if periods == 0 {
        return Err(LeasingError::invalid_terms(
            "term_in_months",
            "Number of periods must be > 0",
        ));
    }
    Ok(Decimal::from(periods))
}

/// Level annuity payment: `M = P·r / (1 − (1+r)^−n)`, or `P/n` when `r == 0`.
pub fn annuity_payment(principal: Money, monthly_rate: Rate, periods: u32) -> LeasingResult<Money> {
    let n = require_periods(periods)?;
    if monthly_rate.is_zero() {
        return Ok(principal / n);
    }

    let denominator = Decimal::ONE - discount_factor(monthly_rate, periods)?;
    if denominator.is_zero() {
        return Err(LeasingError::invalid_terms(
            "nominal_annual_rate",
            "annuity factor is zero",
        ));
    }
    Ok(principal * monthly_rate / denominator)
}

/// Derivative of [`annuity_payment`] with respect to the monthly rate.
///
/// With `v = 1/(1+r)`: `dM/dr = P·[(1 − vⁿ) − r·n·vⁿ⁺¹] / (1 − vⁿ)²`.
/// At `r == 0` the limit `P·(n+1) / (2n)` is used.
pub fn annuity_payment_derivative(
    principal: Money,
    monthly_rate: Rate,
    periods: u32,
) -> LeasingResult<Decimal> {
    let n = require_periods(periods)?;
    if monthly_rate.is_zero() {
        return Ok(principal * (n + Decimal::ONE) / (dec!(2) * n));
    }

    let v_n = discount_factor(monthly_rate, periods)?;
    let v_n1 = v_n / (Decimal::ONE + monthly_rate);
    let one_minus = Decimal::ONE - v_n;
    if one_minus.is_zero() {
        return Err(LeasingError::invalid_terms(
            "nominal_annual_rate",
            "annuity factor is zero",
        ));
    }
    Ok(principal * (one_minus - monthly_rate * n * v_n1) / (one_minus * one_minus))
}

/// Inverse of [`annuity_payment`]: `P = M·(1 − (1+r)^−n) / r`, or `M·n` when `r == 0`.
pub fn principal_from_payment(payment: Money, monthly_rate: Rate, periods: u32) -> LeasingResult<Money> {
    let n = require_periods(periods)?;
    if monthly_rate.is_zero() {
        return Ok(payment * n);
    }

    let v_n = discount_factor(monthly_rate, periods)?;
    Ok(payment * (Decimal::ONE - v_n) / monthly_rate)
}

/// Fixed principal repaid each period under linear amortization.
pub fn linear_principal(principal: Money, periods: u32) -> LeasingResult<Money> {
    Ok(principal / require_periods(periods)?)
}

/// The payment a contract is quoted with: the level annuity payment, the
/// first (highest) linear payment, or the interest-only coupon.
pub fn first_period_payment(
    payment_type: PaymentType,
    principal: Money,
    monthly_rate: Rate,
    periods: u32,
) -> LeasingResult<Money> {
    match payment_type {
        PaymentType::Annuity => annuity_payment(principal, monthly_rate, periods),
        PaymentType::Linear => Ok(linear_principal(principal, periods)? + principal * monthly_rate),
        PaymentType::InterestOnly => {
            require_periods(periods)?;
            Ok(principal * monthly_rate)
        }
    }
}

/// Unrounded principal-plus-interest payment for every period, in order.
pub fn payment_stream(
    payment_type: PaymentType,
    principal: Money,
    monthly_rate: Rate,
    periods: u32,
) -> LeasingResult<Vec<Money>> {
    let n = require_periods(periods)?;
    let len = periods as usize;
    match payment_type {
        PaymentType::Annuity => Ok(vec![annuity_payment(principal, monthly_rate, periods)?; len]),
        PaymentType::Linear => {
            let step = principal / n;
            Ok((0..periods)
                .map(|k| {
                    let opening = principal - step * Decimal::from(k);
                    step + opening * monthly_rate
                })
                .collect())
        }
        PaymentType::InterestOnly => {
            let mut stream = vec![principal * monthly_rate; len];
            stream[len - 1] += principal;
            Ok(stream)
        }
    }
}
