use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::absorption::{self, AbsorptionInput};
use proforma_core::burn_schedule::{self, BurnScheduleInput};

use crate::input;

/// Arguments for a single absorption schedule
#[derive(Args)]
pub struct AbsorptionArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// First month of sales (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Units to absorb
    #[arg(long)]
    pub units: Option<Decimal>,

    /// Units absorbed per month
    #[arg(long)]
    pub pace: Option<Decimal>,

    /// Cut the schedule off after this many months
    #[arg(long)]
    pub max_months: Option<u32>,
}

pub fn run_absorption(args: AbsorptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let absorption_input: AbsorptionInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => AbsorptionInput {
            start_date: Some(args.start.ok_or("--start is required (or provide --input)")?),
            total_units: args.units.ok_or("--units is required (or provide --input)")?,
            pace_per_month: args.pace.ok_or("--pace is required (or provide --input)")?,
            max_months: args.max_months,
        },
    };

    let result = absorption::run_absorption(&absorption_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a multi-row burn schedule
#[derive(Args)]
pub struct BurnScheduleArgs {
    /// Path to JSON/YAML input file with a `rows` array
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_burn_schedule(args: BurnScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: BurnScheduleInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for burn schedule")?;

    let result = burn_schedule::run_burn_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
