use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::math::round_money;
use crate::amortization::{generate_schedule, Schedule};
use crate::error::LeasingError;
use crate::types::*;
use crate::LeasingResult;

/// Early termination penalty charged by the lessor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "value", rename_all = "kebab-case")]
pub enum PenaltyModel {
    /// Fraction of the outstanding principal (0.03 = 3%)
    #[serde(alias = "percent_principal")]
    PercentageOfBalance(Rate),
    /// Flat amount
    #[serde(alias = "fixed_amount")]
    Fixed(Money),
    #[default]
    None,
}

/// Amount due to settle a contract after a given instalment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffResult {
    pub as_of_period: u32,
    pub remaining_periods: u32,
    pub remaining_principal: Money,
    /// Unconsumed share of the processing fee, prorated straight-line by period
    pub remaining_prorated_processing_fee: Money,
    pub penalty_amount: Money,
    pub total_payoff_amount: Money,
}

/// Terms plus the payoff point, for callers holding no schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffRequest {
    pub terms: LoanTerms,
    pub as_of_period: u32,
    #[serde(default)]
    pub penalty: PenaltyModel,
}

/// Build the schedule for `request.terms` and compute the payoff on it.
pub fn compute_payoff_for_terms(request: &PayoffRequest) -> LeasingResult<PayoffResult> {
    let schedule = generate_schedule(&request.terms)?;
    compute_payoff(
        &schedule,
        &request.terms,
        request.as_of_period,
        request.penalty,
    )
}

/// Payoff amount immediately after instalment `as_of_period` has been paid.
pub fn compute_payoff(
    schedule: &Schedule,
    terms: &LoanTerms,
    as_of_period: u32,
    penalty: PenaltyModel,
) -> LeasingResult<PayoffResult> {
    terms.validate()?;

    let term = terms.term_in_months;
    let item = match schedule.item(as_of_period) {
        Some(item) if as_of_period <= term => item,
        _ => {
            return Err(LeasingError::InvalidPeriod {
                period: as_of_period,
                term: term.min(schedule.len() as u32),
            })
        }
    };

    let remaining_periods = term - as_of_period;
    let remaining_principal = item.balance;
    let remaining_fee = round_money(
        terms.processing_fee / Decimal::from(term) * Decimal::from(remaining_periods),
    );

    let penalty_amount = match penalty {
        PenaltyModel::PercentageOfBalance(rate) => {
            if rate < Decimal::ZERO {
                return Err(LeasingError::invalid_terms(
                    "penalty",
                    "Penalty rate cannot be negative",
                ));
            }
            round_money(remaining_principal * rate)
        }
        PenaltyModel::Fixed(amount) => {
            if amount < Decimal::ZERO {
                return Err(LeasingError::invalid_terms(
                    "penalty",
                    "Penalty amount cannot be negative",
                ));
            }
            round_money(amount)
        }
        PenaltyModel::None => Decimal::ZERO,
    };

    Ok(PayoffResult {
        as_of_period,
        remaining_periods,
        remaining_principal,
        remaining_prorated_processing_fee: remaining_fee,
        penalty_amount,
        total_payoff_amount: remaining_principal + remaining_fee + penalty_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms_with_fee() -> LoanTerms {
        LoanTerms {
            processing_fee: dec!(480),
            ..LoanTerms::annuity(dec!(10000), dec!(0.089), 48)
        }
    }

    #[test]
    fn test_midway_prorated_fee() {
        let terms = terms_with_fee();
        let sched = generate_schedule(&terms).unwrap();
        let payoff = compute_payoff(&sched, &terms, 24, PenaltyModel::None).unwrap();
        assert_eq!(payoff.remaining_prorated_processing_fee, dec!(240));
        assert_eq!(payoff.remaining_principal, sched.items[23].balance);
        assert_eq!(payoff.remaining_periods, 24);
        assert_eq!(payoff.penalty_amount, Decimal::ZERO);
        assert_eq!(
            payoff.total_payoff_amount,
            sched.items[23].balance + dec!(240)
        );
    }

    #[test]
    fn test_percentage_penalty() {
        let terms = terms_with_fee();
        let sched = generate_schedule(&terms).unwrap();
        let payoff = compute_payoff(
            &sched,
            &terms,
            12,
            PenaltyModel::PercentageOfBalance(dec!(0.03)),
        )
        .unwrap();
        assert_eq!(
            payoff.penalty_amount,
            round_money(sched.items[11].balance * dec!(0.03))
        );
        assert_eq!(payoff.remaining_prorated_processing_fee, dec!(360));
    }

    #[test]
    fn test_fixed_penalty() {
        let terms = terms_with_fee();
        let sched = generate_schedule(&terms).unwrap();
        let payoff = compute_payoff(&sched, &terms, 1, PenaltyModel::Fixed(dec!(150))).unwrap();
        assert_eq!(payoff.penalty_amount, dec!(150));
        assert_eq!(payoff.remaining_prorated_processing_fee, dec!(470));
    }

    #[test]
    fn test_final_period_settles_to_zero() {
        let terms = terms_with_fee();
        let sched = generate_schedule(&terms).unwrap();
        let payoff = compute_payoff(&sched, &terms, 48, PenaltyModel::None).unwrap();
        assert_eq!(payoff.total_payoff_amount, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_periods() {
        let terms = terms_with_fee();
        let sched = generate_schedule(&terms).unwrap();
        assert!(matches!(
            compute_payoff(&sched, &terms, 0, PenaltyModel::None),
            Err(LeasingError::InvalidPeriod { period: 0, .. })
        ));
        assert!(matches!(
            compute_payoff(&sched, &terms, 49, PenaltyModel::None),
            Err(LeasingError::InvalidPeriod { period: 49, term: 48 })
        ));
    }

    #[test]
    fn test_period_beyond_shorter_schedule() {
        let terms = terms_with_fee();
        let short_terms = LoanTerms {
            term_in_months: 12,
            ..terms.clone()
        };
        let short = generate_schedule(&short_terms).unwrap();
        assert!(matches!(
            compute_payoff(&short, &terms, 24, PenaltyModel::None),
            Err(LeasingError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_penalty_model_serde() {
        let pct: PenaltyModel =
            serde_json::from_str(r#"{"model": "percentage-of-balance", "value": "0.03"}"#).unwrap();
        assert_eq!(pct, PenaltyModel::PercentageOfBalance(dec!(0.03)));
        let fixed: PenaltyModel =
            serde_json::from_str(r#"{"model": "fixed_amount", "value": "250"}"#).unwrap();
        assert_eq!(fixed, PenaltyModel::Fixed(dec!(250)));
        let none: PenaltyModel = serde_json::from_str(r#"{"model": "none"}"#).unwrap();
        assert_eq!(none, PenaltyModel::None);
    }

    #[test]
    fn test_negative_penalty_rejected() {
        let terms = terms_with_fee();
        let sched = generate_schedule(&terms).unwrap();
        assert!(compute_payoff(&sched, &terms, 10, PenaltyModel::Fixed(dec!(-1))).is_err());
    }

    #[test]
    fn test_payoff_request_from_json() {
        let request: PayoffRequest = serde_json::from_str(
            r#"{
                "terms": {
                    "principal": "10000",
                    "nominal_annual_rate": "0.089",
                    "term_in_months": 48,
                    "processing_fee": "480"
                },
                "as_of_period": 24
            }"#,
        )
        .unwrap();
        assert_eq!(request.penalty, PenaltyModel::None);
        let payoff = compute_payoff_for_terms(&request).unwrap();
        assert_eq!(payoff.remaining_prorated_processing_fee, dec!(240));
        assert_eq!(payoff.remaining_periods, 24);
    }
}
