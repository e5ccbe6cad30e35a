use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::proforma::financing::{self, FinancingInput};
use proforma_core::proforma::{self, ProformaInputs};

use crate::input;

/// Arguments for the full proforma
#[derive(Args)]
pub struct ProformaArgs {
    /// Path to a JSON or YAML deal file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_proforma(args: ProformaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal: ProformaInputs = input::load(args.input.as_deref())?
        .ok_or("--input <deal.json|deal.yaml> or stdin required for proforma")?;

    let result = proforma::run_proforma(&deal)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the construction financing estimate
#[derive(Args)]
pub struct FinancingArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual loan interest rate in percent (e.g. 8 for 8%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in months for the flat-rate estimate
    #[arg(long)]
    pub term_months: Option<Decimal>,

    /// Development costs the loan funds
    #[arg(long)]
    pub development_costs: Option<Decimal>,

    /// Completion date (YYYY-MM-DD) used with draws
    #[arg(long)]
    pub completion_date: Option<NaiveDate>,

    /// Use this amount instead of any estimate
    #[arg(long = "override")]
    pub manual_override: Option<Decimal>,
}

pub fn run_financing(args: FinancingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let financing_input: FinancingInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => {
            if args.rate.is_none() && args.manual_override.is_none() {
                return Err("--rate or --override is required (or provide --input)".into());
            }
            FinancingInput {
                construction_draws: Vec::new(),
                completion_date: args.completion_date,
                annual_rate_pct: args.rate.unwrap_or_default(),
                loan_term_months: args.term_months,
                development_costs: args.development_costs.unwrap_or_default(),
                manual_override: args.manual_override,
            }
        }
    };

    let result = financing::run_financing(&financing_input)?;
    Ok(serde_json::to_value(result)?)
}
