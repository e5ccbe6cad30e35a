use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::cash_flow::{self, MonthlySeriesInput};
use proforma_core::timeline::{self, TimelineInput};

use crate::input;

/// Arguments for IRR of a monthly series
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly cash flows, month 0 first (comma-separated, e.g. "-100,0,0,110")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Monthly Newton-Raphson starting rate (default 0.01)
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = match input::load::<MonthlySeriesInput>(args.input.as_deref())? {
        Some(mut v) => {
            if args.seed.is_some() {
                v.seed = args.seed;
            }
            v
        }
        None => MonthlySeriesInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            seed: args.seed,
        },
    };

    let result = cash_flow::run_irr(&series)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for peak capital of a monthly series
#[derive(Args)]
pub struct PeakCapitalArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly cash flows, month 0 first (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_peak_capital(args: PeakCapitalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series: MonthlySeriesInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => MonthlySeriesInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            seed: None,
        },
    };

    let result = cash_flow::run_peak_capital(&series)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the dated-events timeline
#[derive(Args)]
pub struct TimelineArgs {
    /// Path to JSON/YAML input file with an `events` array
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_timeline(args: TimelineArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let timeline_input: TimelineInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for timeline")?;

    let result = timeline::run_timeline(&timeline_input)?;
    Ok(serde_json::to_value(result)?)
}
