pub mod payoff;
pub mod pricing;
pub mod schedule;

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;

use leasing_core::{LoanTerms, PaymentType};

/// Contract flags shared by the schedule, rpmn and payoff commands
#[derive(Args)]
pub struct TermsArgs {
    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate (e.g. 0.089 for 8.9%)
    #[arg(long, alias = "rate")]
    pub nominal_annual_rate: Option<Decimal>,

    /// Number of monthly instalments
    #[arg(long, alias = "term")]
    pub term_in_months: Option<u32>,

    /// annuity, linear or interest-only
    #[arg(long, default_value = "annuity")]
    pub payment_type: PaymentType,

    /// One-time fee charged at disbursement
    #[arg(long, default_value = "0")]
    pub processing_fee: Decimal,

    /// Fee charged with every instalment
    #[arg(long, default_value = "0")]
    pub monthly_fee: Decimal,

    /// Due date of the first instalment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,
}

impl TermsArgs {
    pub fn to_terms(&self) -> Result<LoanTerms, Box<dyn std::error::Error>> {
        Ok(LoanTerms {
            principal: self
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            nominal_annual_rate: self
                .nominal_annual_rate
                .ok_or("--nominal-annual-rate is required (or provide --input)")?,
            term_in_months: self
                .term_in_months
                .ok_or("--term-in-months is required (or provide --input)")?,
            payment_type: self.payment_type,
            processing_fee: self.processing_fee,
            monthly_fee: self.monthly_fee,
            first_payment_date: self.first_payment_date,
        })
    }
}
