mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::payoff::PayoffArgs;
use commands::pricing::{QuoteArgs, RpmnArgs, SolveArgs};
use commands::schedule::ScheduleArgs;

/// Leasing and consumer-loan calculations
#[derive(Parser)]
#[command(
    name = "leasing",
    version,
    about = "Leasing and consumer-loan calculations",
    long_about = "A CLI for vehicle leasing and loan contracts with decimal precision. \
                  Generates amortization schedules, solves for a missing principal, \
                  payment or rate, computes the RPMN and prices early repayment."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Enable verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a period-by-period amortization schedule
    Schedule(ScheduleArgs),
    /// Solve for the missing principal, payment or nominal rate
    Solve(SolveArgs),
    /// Compute the RPMN (annual percentage rate of charge)
    Rpmn(RpmnArgs),
    /// Amount due to settle the contract after a given instalment
    Payoff(PayoffArgs),
    /// Complete partial terms and price them in one call
    Quote(QuoteArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("leasing_core=debug,leasing=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("leasing_core=warn,leasing=warn"))
    };

    // stdout carries the result document
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Solve(args) => commands::pricing::run_solve(args),
        Commands::Rpmn(args) => commands::pricing::run_rpmn(args),
        Commands::Payoff(args) => commands::payoff::run_payoff(args),
        Commands::Quote(args) => commands::pricing::run_quote(args),
        Commands::Version => {
            println!("leasing {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
