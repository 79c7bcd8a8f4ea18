use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use leasing_core::{compute_payoff_for_terms, PayoffRequest, PenaltyModel};

use crate::commands::TermsArgs;
use crate::input;

/// Arguments for the early repayment calculation
#[derive(Args)]
pub struct PayoffArgs {
    #[command(flatten)]
    pub terms: TermsArgs,

    /// Instalment after which the contract is settled
    #[arg(long)]
    pub as_of_period: Option<u32>,

    /// Penalty as a fraction of the outstanding principal (e.g. 0.03)
    #[arg(long, conflicts_with = "penalty_fixed")]
    pub penalty_percent: Option<Decimal>,

    /// Flat penalty amount
    #[arg(long)]
    pub penalty_fixed: Option<Decimal>,

    /// Path to JSON input file with {terms, as_of_period, penalty} (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PayoffRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let penalty = match (args.penalty_percent, args.penalty_fixed) {
            (Some(rate), _) => PenaltyModel::PercentageOfBalance(rate),
            (None, Some(amount)) => PenaltyModel::Fixed(amount),
            (None, None) => PenaltyModel::None,
        };
        PayoffRequest {
            terms: args.terms.to_terms()?,
            as_of_period: args
                .as_of_period
                .ok_or("--as-of-period is required (or provide --input)")?,
            penalty,
        }
    };

    let result = compute_payoff_for_terms(&request)?;
    Ok(serde_json::to_value(result)?)
}
