mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::absorption::{AbsorptionArgs, BurnScheduleArgs};
use commands::cash_flow::{IrrArgs, PeakCapitalArgs, TimelineArgs};
use commands::proforma::{FinancingArgs, ProformaArgs};

/// Land-development proforma calculations
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Land-development proforma calculations",
    long_about = "A CLI for land-development proforma modelling with decimal precision. \
                  Computes cost/revenue roll-ups, unlevered IRR, peak capital, \
                  construction financing, absorption and burn schedules."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver and scheduling decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute full proforma metrics for a deal
    Proforma(ProformaArgs),
    /// Estimate construction loan interest
    Financing(FinancingArgs),
    /// Monthly absorption schedule for one product type
    Absorption(AbsorptionArgs),
    /// Monthly and quarterly starts across several rows
    BurnSchedule(BurnScheduleArgs),
    /// Annualised IRR of a monthly cash-flow series
    Irr(IrrArgs),
    /// Peak capital exposure of a monthly cash-flow series
    PeakCapital(PeakCapitalArgs),
    /// IRR and peak capital of dated cost/revenue events
    Timeline(TimelineArgs),
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

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Proforma(args) => commands::proforma::run_proforma(args),
        Commands::Financing(args) => commands::proforma::run_financing(args),
        Commands::Absorption(args) => commands::absorption::run_absorption(args),
        Commands::BurnSchedule(args) => commands::absorption::run_burn_schedule(args),
        Commands::Irr(args) => commands::cash_flow::run_irr(args),
        Commands::PeakCapital(args) => commands::cash_flow::run_peak_capital(args),
        Commands::Timeline(args) => commands::cash_flow::run_timeline(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
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
