use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LeasingError;
use crate::LeasingResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.089 = 8.9%). Never as percentages.
pub type Rate = Decimal;

/// Longest contract the engine accepts (50 years of monthly instalments).
pub const MAX_TERM_MONTHS: u32 = 600;

/// How principal is repaid over the term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    /// Level payment; the principal/interest split shifts over time
    #[default]
    #[serde(alias = "anuita")]
    Annuity,
    /// Level principal; interest declines with the balance
    #[serde(alias = "lineárne")]
    Linear,
    /// Interest only, with the whole principal repaid in the final period
    #[serde(alias = "len_úrok")]
    InterestOnly,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Annuity => "annuity",
            PaymentType::Linear => "linear",
            PaymentType::InterestOnly => "interest-only",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = LeasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "annuity" | "anuita" => Ok(PaymentType::Annuity),
            "linear" | "lineárne" => Ok(PaymentType::Linear),
            "interest-only" | "interest_only" | "len_úrok" => Ok(PaymentType::InterestOnly),
            other => Err(LeasingError::invalid_terms(
                "payment_type",
                format!("unrecognised payment type '{other}'"),
            )),
        }
    }
}

/// Contract terms for a single leasing or loan calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount financed
    pub principal: Money,
    /// Nominal annual interest rate (0.089 = 8.9% p.a.)
    pub nominal_annual_rate: Rate,
    /// Number of monthly instalments
    pub term_in_months: u32,
    #[serde(default)]
    pub payment_type: PaymentType,
    /// One-time fee charged at disbursement
    #[serde(default)]
    pub processing_fee: Money,
    /// Fee charged with every instalment
    #[serde(default)]
    pub monthly_fee: Money,
    /// Due date of the first instalment; later instalments fall monthly after it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanTerms {
    /// Fee-free annuity terms; the remaining fields can be set with struct update syntax.
    pub fn annuity(principal: Money, nominal_annual_rate: Rate, term_in_months: u32) -> Self {
        LoanTerms {
            principal,
            nominal_annual_rate,
            term_in_months,
            payment_type: PaymentType::Annuity,
            processing_fee: Decimal::ZERO,
            monthly_fee: Decimal::ZERO,
            first_payment_date: None,
        }
    }

    pub fn validate(&self) -> LeasingResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LeasingError::invalid_terms(
                "principal",
                "Principal must be positive",
            ));
        }
        if self.term_in_months < 1 {
            return Err(LeasingError::invalid_terms(
                "term_in_months",
                "Term must be at least 1 month",
            ));
        }
        if self.term_in_months > MAX_TERM_MONTHS {
            return Err(LeasingError::invalid_terms(
                "term_in_months",
                format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
            ));
        }
        if self.nominal_annual_rate < Decimal::ZERO {
            return Err(LeasingError::invalid_terms(
                "nominal_annual_rate",
                "Nominal rate cannot be negative",
            ));
        }
        if self.processing_fee < Decimal::ZERO {
            return Err(LeasingError::invalid_terms(
                "processing_fee",
                "Processing fee cannot be negative",
            ));
        }
        if self.monthly_fee < Decimal::ZERO {
            return Err(LeasingError::invalid_terms(
                "monthly_fee",
                "Monthly fee cannot be negative",
            ));
        }
        Ok(())
    }

    pub fn has_fees(&self) -> bool {
        !self.processing_fee.is_zero() || !self.monthly_fee.is_zero()
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
