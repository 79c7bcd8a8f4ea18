use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use leasing_core::{
    build_quote, compute_rpmn, solve_missing_detailed, Annualization, LoanTerms, MissingField,
    PartialTerms, PaymentType, QuoteRequest, RpmnInput, SolveRequest,
};

use crate::commands::TermsArgs;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SolveFor {
    Principal,
    Payment,
    Rate,
}

impl From<SolveFor> for MissingField {
    fn from(value: SolveFor) -> Self {
        match value {
            SolveFor::Principal => MissingField::Principal,
            SolveFor::Payment => MissingField::Payment,
            SolveFor::Rate => MissingField::NominalAnnualRate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum AnnualizationArg {
    #[default]
    Effective,
    Nominal,
}

impl From<AnnualizationArg> for Annualization {
    fn from(value: AnnualizationArg) -> Self {
        match value {
            AnnualizationArg::Effective => Annualization::Effective,
            AnnualizationArg::Nominal => Annualization::Nominal,
        }
    }
}

/// Arguments for solving a missing parameter
#[derive(Args)]
pub struct SolveArgs {
    /// Which parameter to solve for
    #[arg(long, value_enum)]
    pub solve_for: Option<SolveFor>,

    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Level monthly payment excluding fees
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Nominal annual rate (e.g. 0.089 for 8.9%)
    #[arg(long, alias = "rate")]
    pub nominal_annual_rate: Option<Decimal>,

    /// Number of monthly instalments
    #[arg(long, alias = "term")]
    pub term_in_months: Option<u32>,

    /// Path to JSON input file with {terms, missing} (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the RPMN calculation
#[derive(Args)]
pub struct RpmnArgs {
    #[command(flatten)]
    pub terms: TermsArgs,

    /// How the monthly IRR is annualized when fees apply
    #[arg(long, value_enum, default_value = "effective")]
    pub annualization: AnnualizationArg,

    /// Path to JSON input file with contract terms or raw RPMN cash flows
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a full quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate; solved from --monthly-payment when omitted
    #[arg(long, alias = "rate")]
    pub nominal_annual_rate: Option<Decimal>,

    /// Quoted monthly payment excluding fees
    #[arg(long)]
    pub monthly_payment: Option<Decimal>,

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

    /// How the monthly IRR is annualized when fees apply
    #[arg(long, value_enum, default_value = "effective")]
    pub annualization: AnnualizationArg,

    /// Path to JSON input file with the quote request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_solve(args: SolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SolveRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SolveRequest {
            terms: PartialTerms {
                principal: args.principal,
                payment: args.payment,
                nominal_annual_rate: args.nominal_annual_rate,
                term_in_months: args
                    .term_in_months
                    .ok_or("--term-in-months is required (or provide --input)")?,
            },
            missing: args
                .solve_for
                .ok_or("--solve-for is required (or provide --input)")?
                .into(),
        }
    };

    let outcome = solve_missing_detailed(&request.terms, request.missing)?;
    if !outcome.converged {
        tracing::warn!(
            iterations = outcome.iterations,
            value = %outcome.value,
            "rate search did not converge"
        );
    }

    Ok(serde_json::json!({
        "missing": request.missing,
        "value": outcome.value.to_string(),
        "iterations": outcome.iterations,
        "converged": outcome.converged,
    }))
}

pub fn run_rpmn(args: RpmnArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: Option<Value> = if let Some(ref path) = args.input {
        Some(input::file::read_json_value(path)?)
    } else {
        input::stdin::read_stdin()?
    };

    let rpmn_input = match document {
        // Raw cash flows carry the scheduled payment themselves
        Some(data) if data.get("scheduled_payment").is_some() => {
            serde_json::from_value::<RpmnInput>(data)?
        }
        Some(data) => {
            let terms: LoanTerms = serde_json::from_value(data)?;
            RpmnInput {
                annualization: args.annualization.into(),
                ..RpmnInput::from_terms(&terms)?
            }
        }
        None => RpmnInput {
            annualization: args.annualization.into(),
            ..RpmnInput::from_terms(&args.terms.to_terms()?)?
        },
    };

    let result = compute_rpmn(&rpmn_input)?;
    if !result.converged {
        tracing::warn!(
            iterations = result.iterations,
            rpmn = %result.rpmn,
            "RPMN search did not converge"
        );
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: QuoteRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        QuoteRequest {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            nominal_annual_rate: args.nominal_annual_rate,
            monthly_payment: args.monthly_payment,
            term_in_months: args
                .term_in_months
                .ok_or("--term-in-months is required (or provide --input)")?,
            payment_type: args.payment_type,
            processing_fee: args.processing_fee,
            monthly_fee: args.monthly_fee,
            first_payment_date: args.first_payment_date,
            annualization: args.annualization.into(),
        }
    };

    let output = build_quote(&request)?;
    Ok(serde_json::to_value(output)?)
}
