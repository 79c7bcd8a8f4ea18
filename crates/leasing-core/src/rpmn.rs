//! RPMN (APRC): the annual percentage rate of charge.
//!
//! The monthly rate `r` is the internal rate of return of the borrower's
//! cash flows: the amount actually paid out (principal less the processing
//! fee withheld at disbursement) against every instalment including its
//! monthly fee. It is reported as the annual rate whose monthly equivalent
//! is `r`, as a percentage.
//!
//! Fee-free contracts are special-cased so the result agrees exactly with
//! the quoted nominal rate.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::math::{monthly_rate, payment_stream, round_money};
use crate::error::LeasingError;
use crate::solver::newton::{newton_raphson, NewtonConfig, RootSearch};
use crate::solver::parameters::solve_rate_exact;
use crate::time_value::{present_value, present_value_derivative};
use crate::types::*;
use crate::LeasingResult;

/// Seed for the search (10% p.a.).
const RPMN_SEED: Rate = dec!(0.10);
/// Stop once the annual rate moves by less than this.
const RPMN_TOLERANCE: Rate = dec!(0.00001);
const RPMN_MAX_ITERATIONS: u32 = 100;
/// Annual rate is kept within (0%, 200%].
const RPMN_BOUNDS: (Rate, Rate) = (dec!(0.000001), dec!(2));
/// RPMN is quoted as a percentage with 3 decimals.
const RPMN_DECIMALS: u32 = 3;
const MONTHLY_RATE_DECIMALS: u32 = 10;

/// How the monthly IRR is turned into an annual figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Annualization {
    /// `(1 + r)^12 − 1`, the regulatory APRC convention
    #[default]
    Effective,
    /// `r × 12`
    Nominal,
}

impl Annualization {
    fn monthly(self, annual: Rate) -> Rate {
        match self {
            Annualization::Effective => {
                (Decimal::ONE + annual).powd(Decimal::ONE / dec!(12)) - Decimal::ONE
            }
            Annualization::Nominal => annual / dec!(12),
        }
    }

    /// `dr/da` at the given annual rate and its monthly equivalent.
    fn monthly_derivative(self, annual: Rate, monthly: Rate) -> Decimal {
        match self {
            Annualization::Effective => {
                (Decimal::ONE + monthly) / (dec!(12) * (Decimal::ONE + annual))
            }
            Annualization::Nominal => Decimal::ONE / dec!(12),
        }
    }
}

/// Cash-flow description of a contract for the RPMN calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpmnInput {
    pub principal: Money,
    /// One-time fee withheld at disbursement
    #[serde(default)]
    pub processing_fee: Money,
    /// Level instalment (principal + interest); first instalment when a stream is given
    pub scheduled_payment: Money,
    #[serde(default)]
    pub monthly_fee: Money,
    pub periods: u32,
    /// Per-period principal + interest for non-level schedules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_stream: Option<Vec<Money>>,
    #[serde(default)]
    pub annualization: Annualization,
}

impl RpmnInput {
    /// Build the cash flows from contract terms using unrounded payments.
    pub fn from_terms(terms: &LoanTerms) -> LeasingResult<Self> {
        terms.validate()?;
        let stream = payment_stream(
            terms.payment_type,
            terms.principal,
            monthly_rate(terms.nominal_annual_rate),
            terms.term_in_months,
        )?;
        let scheduled_payment = stream[0];
        let payment_stream = match terms.payment_type {
            PaymentType::Annuity => None,
            PaymentType::Linear | PaymentType::InterestOnly => Some(stream),
        };

        Ok(RpmnInput {
            principal: terms.principal,
            processing_fee: terms.processing_fee,
            scheduled_payment,
            monthly_fee: terms.monthly_fee,
            periods: terms.term_in_months,
            payment_stream,
            annualization: Annualization::default(),
        })
    }

    /// Principal plus processing fee.
    pub fn effective_loan_amount(&self) -> Money {
        self.principal + self.processing_fee
    }

    /// Scheduled payment plus monthly fee.
    pub fn effective_payment(&self) -> Money {
        self.scheduled_payment + self.monthly_fee
    }

    fn has_fees(&self) -> bool {
        !self.processing_fee.is_zero() || !self.monthly_fee.is_zero()
    }

    fn scheduled_stream(&self) -> Vec<Money> {
        match &self.payment_stream {
            Some(stream) => stream.clone(),
            None => vec![self.scheduled_payment; self.periods as usize],
        }
    }

    fn validate(&self) -> LeasingResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LeasingError::invalid_terms(
                "principal",
                "Principal must be positive",
            ));
        }
        if self.periods < 1 || self.periods > MAX_TERM_MONTHS {
            return Err(LeasingError::invalid_terms(
                "periods",
                format!("Number of periods must be between 1 and {MAX_TERM_MONTHS}"),
            ));
        }
        if self.processing_fee < Decimal::ZERO || self.monthly_fee < Decimal::ZERO {
            return Err(LeasingError::invalid_terms(
                "fees",
                "Fees cannot be negative",
            ));
        }
        if self.processing_fee >= self.principal {
            return Err(LeasingError::invalid_terms(
                "processing_fee",
                "Processing fee must be smaller than the principal",
            ));
        }
        match &self.payment_stream {
            Some(stream) => {
                if stream.len() != self.periods as usize {
                    return Err(LeasingError::invalid_terms(
                        "payment_stream",
                        format!(
                            "expected {} payments, got {}",
                            self.periods,
                            stream.len()
                        ),
                    ));
                }
                if stream.iter().any(|p| *p < Decimal::ZERO) {
                    return Err(LeasingError::invalid_terms(
                        "payment_stream",
                        "Payments cannot be negative",
                    ));
                }
            }
            None => {
                if self.scheduled_payment <= Decimal::ZERO {
                    return Err(LeasingError::invalid_terms(
                        "scheduled_payment",
                        "Scheduled payment must be positive",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// RPMN together with the contract's cost totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpmnResult {
    /// Annual percentage rate of charge, in percent (8.9 = 8.9% p.a.)
    pub rpmn: Decimal,
    /// Solved per-period internal rate of return
    pub monthly_rate: Rate,
    pub annualization: Annualization,
    pub effective_loan_amount: Money,
    /// Every instalment with its monthly fee, plus the processing fee
    pub total_cost: Money,
    /// Total cost less the principal
    pub total_interest_and_fees: Money,
    pub iterations: u32,
    /// False when the search stopped on its iteration budget or at a bound;
    /// `rpmn` is then the best estimate found.
    pub converged: bool,
}

/// Compute the RPMN for a contract's cash flows.
pub fn compute_rpmn(input: &RpmnInput) -> LeasingResult<RpmnResult> {
    input.validate()?;

    let scheduled = input.scheduled_stream();
    let flows: Vec<Money> = scheduled.iter().map(|p| p + input.monthly_fee).collect();
    let payments_total: Money = flows.iter().sum();
    let total_cost = round_money(payments_total + input.processing_fee);

    let (annual, monthly, annualization, search) = if input.has_fees() {
        let net_disbursed = input.principal - input.processing_fee;
        let search = solve_irr(net_disbursed, &flows, input.annualization)?;
        let monthly = input.annualization.monthly(search.root);
        (search.root, monthly, input.annualization, search)
    } else if input.payment_stream.is_none() {
        // Level and fee-free: this is exactly the nominal rate back-solve.
        let outcome =
            solve_rate_exact(input.principal, input.scheduled_payment, input.periods)?;
        let search = RootSearch {
            root: outcome.value,
            iterations: outcome.iterations,
            converged: outcome.converged,
        };
        (outcome.value, outcome.value / dec!(12), Annualization::Nominal, search)
    } else if payments_total == input.principal {
        let search = RootSearch {
            root: Decimal::ZERO,
            iterations: 0,
            converged: true,
        };
        (Decimal::ZERO, Decimal::ZERO, Annualization::Nominal, search)
    } else {
        let search = solve_irr(input.principal, &flows, Annualization::Nominal)?;
        (search.root, search.root / dec!(12), Annualization::Nominal, search)
    };

    Ok(RpmnResult {
        rpmn: (annual * dec!(100))
            .round_dp_with_strategy(RPMN_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        monthly_rate: monthly
            .round_dp_with_strategy(MONTHLY_RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        annualization,
        effective_loan_amount: round_money(input.effective_loan_amount()),
        total_cost,
        total_interest_and_fees: total_cost - round_money(input.principal),
        iterations: search.iterations,
        converged: search.converged,
    })
}

/// Annual rate `a` at which the flows' present value equals the amount disbursed.
fn solve_irr(
    disbursed: Money,
    flows: &[Money],
    annualization: Annualization,
) -> LeasingResult<RootSearch> {
    // Surface a bad rate domain up front rather than inside the closures.
    present_value(annualization.monthly(RPMN_SEED), flows)?;

    let objective = |a: Rate| {
        present_value(annualization.monthly(a), flows)
            .map(|pv| pv - disbursed)
            .unwrap_or(Decimal::ZERO)
    };
    let derivative = |a: Rate| {
        let r = annualization.monthly(a);
        present_value_derivative(r, flows)
            .map(|d| d * annualization.monthly_derivative(a, r))
            .unwrap_or(Decimal::ZERO)
    };

    Ok(newton_raphson(
        objective,
        derivative,
        RPMN_SEED,
        RPMN_BOUNDS,
        &NewtonConfig::new(RPMN_TOLERANCE, RPMN_MAX_ITERATIONS),
    ))
}
