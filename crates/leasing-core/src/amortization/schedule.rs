use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::math::{
    annuity_payment, first_period_payment, linear_principal, monthly_rate, round_money,
};
use crate::error::LeasingError;
use crate::types::*;
use crate::LeasingResult;

/// A single instalment in the repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Instalment number (1-indexed)
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Principal plus interest, excluding the monthly fee
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub monthly_fee: Money,
    /// Payment plus monthly fee
    pub total_payment: Money,
    /// Outstanding principal after this instalment
    pub balance: Money,
}

/// Full repayment schedule for one contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub payment_type: PaymentType,
    pub term_in_months: u32,
    pub items: Vec<ScheduleItem>,
    pub total_principal: Money,
    pub total_interest: Money,
    /// Sum of scheduled payments (principal + interest)
    pub total_payments: Money,
    /// Processing fee plus every monthly fee
    pub total_fees: Money,
    pub total_cost: Money,
}

impl Schedule {
    /// Item for a 1-indexed period.
    pub fn item(&self, period: u32) -> Option<&ScheduleItem> {
        period
            .checked_sub(1)
            .and_then(|idx| self.items.get(idx as usize))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Headline figures for a contract, as shown next to a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    /// Quoted payment without the monthly fee (first instalment for linear schedules)
    pub monthly_payment: Money,
    pub monthly_fee: Money,
    pub total_monthly_payment: Money,
    pub total_interest: Money,
    /// Principal + interest + monthly fees
    pub total_amount: Money,
}

/// Build the period-by-period schedule for a contract.
///
/// Balances are carried at full precision between periods; each item is
/// rounded to cents on the way out. The reported principal of an item is the
/// difference between consecutive rounded balances, so principal components
/// always sum to the (rounded) amount financed and the final balance is zero
/// by construction.
pub fn generate_schedule(terms: &LoanTerms) -> LeasingResult<Schedule> {
    terms.validate()?;

    let n = terms.term_in_months;
    let r = monthly_rate(terms.nominal_annual_rate);
    let level_payment = match terms.payment_type {
        PaymentType::Annuity => annuity_payment(terms.principal, r, n)?,
        PaymentType::Linear => linear_principal(terms.principal, n)?,
        PaymentType::InterestOnly => Decimal::ZERO,
    };
    let monthly_fee = round_money(terms.monthly_fee);

    let mut items = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;
    let mut reported_balance = round_money(terms.principal);
    let mut total_principal = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut total_payments = Decimal::ZERO;

    for period in 1..=n {
        let interest_exact = balance * r;

        let principal_exact = if period == n {
            balance
        } else {
            match terms.payment_type {
                PaymentType::Annuity => level_payment - interest_exact,
                PaymentType::Linear => level_payment,
                PaymentType::InterestOnly => Decimal::ZERO,
            }
        };

        balance -= principal_exact;
        let closing = if period == n {
            Decimal::ZERO
        } else {
            round_money(balance)
        };

        let principal = reported_balance - closing;
        let interest = round_money(interest_exact);
        let payment = principal + interest;

        items.push(ScheduleItem {
            period,
            due_date: due_date(terms.first_payment_date, period)?,
            payment,
            principal,
            interest,
            monthly_fee,
            total_payment: payment + monthly_fee,
            balance: closing,
        });

        total_principal += principal;
        total_interest += interest;
        total_payments += payment;
        reported_balance = closing;
    }

    let total_fees = round_money(terms.processing_fee) + monthly_fee * Decimal::from(n);

    Ok(Schedule {
        payment_type: terms.payment_type,
        term_in_months: n,
        items,
        total_principal,
        total_interest,
        total_payments,
        total_fees,
        total_cost: total_payments + total_fees,
    })
}

/// Quoted payment and contract totals.
pub fn payment_summary(terms: &LoanTerms) -> LeasingResult<PaymentSummary> {
    let schedule = generate_schedule(terms)?;
    summarise(terms, &schedule)
}

pub(crate) fn summarise(terms: &LoanTerms, schedule: &Schedule) -> LeasingResult<PaymentSummary> {
    let quoted = first_period_payment(
        terms.payment_type,
        terms.principal,
        monthly_rate(terms.nominal_annual_rate),
        terms.term_in_months,
    )?;
    let monthly_payment = round_money(quoted);
    let monthly_fee = round_money(terms.monthly_fee);
    let monthly_fees_total = monthly_fee * Decimal::from(terms.term_in_months);

    Ok(PaymentSummary {
        monthly_payment,
        monthly_fee,
        total_monthly_payment: monthly_payment + monthly_fee,
        total_interest: schedule.total_interest,
        total_amount: round_money(terms.principal) + schedule.total_interest + monthly_fees_total,
    })
}

fn due_date(first: Option<NaiveDate>, period: u32) -> LeasingResult<Option<NaiveDate>> {
    let Some(first) = first else {
        return Ok(None);
    };
    first
        .checked_add_months(Months::new(period - 1))
        .map(Some)
        .ok_or_else(|| {
            LeasingError::invalid_terms(
                "first_payment_date",
                format!("due date of instalment {period} is out of range"),
            )
        })
}
