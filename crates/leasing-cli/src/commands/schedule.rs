use clap::Args;
use serde_json::Value;

use leasing_core::{generate_schedule, payment_summary, LoanTerms};

use crate::commands::TermsArgs;
use crate::input;

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub terms: TermsArgs,

    /// Print only the headline payment figures
    #[arg(long)]
    pub summary_only: bool,

    /// Path to JSON input file with contract terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        args.terms.to_terms()?
    };

    if args.summary_only {
        let summary = payment_summary(&terms)?;
        return Ok(serde_json::to_value(summary)?);
    }

    let schedule = generate_schedule(&terms)?;
    Ok(serde_json::to_value(schedule)?)
}
