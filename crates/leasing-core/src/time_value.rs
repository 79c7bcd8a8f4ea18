use rust_decimal::Decimal;

use crate::error::LeasingError;
use crate::types::{Money, Rate};
use crate::LeasingResult;

/// Present value of payments received at the end of periods 1..=n.
///
/// Once `(1+r)^k` leaves the decimal range every later term is below the
/// smallest representable amount, so the sum stops there.
pub fn present_value(rate: Rate, payments: &[Money]) -> LeasingResult<Money> {
    let one_plus_r = one_plus(rate)?;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for payment in payments {
        discount = match discount.checked_mul(one_plus_r) {
            Some(next) => next,
            None => break,
        };
        result += payment / discount;
    }

    Ok(result)
}

/// Derivative of [`present_value`] with respect to the rate:
/// `Σ −k·E_k / (1+r)^(k+1)`.
pub fn present_value_derivative(rate: Rate, payments: &[Money]) -> LeasingResult<Decimal> {
    let one_plus_r = one_plus(rate)?;
    let mut result = Decimal::ZERO;
    let mut discount = one_plus_r;

    for (idx, payment) in payments.iter().enumerate() {
        discount = match discount.checked_mul(one_plus_r) {
            Some(next) => next,
            None => break,
        };
        let k = Decimal::from(idx as u64 + 1);
        result -= k * payment / discount;
    }

    Ok(result)
}

fn one_plus(rate: Rate) -> LeasingResult<Decimal> {
    if rate <= Decimal::NEGATIVE_ONE {
        return Err(LeasingError::invalid_terms(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }
    Ok(Decimal::ONE + rate)
}
