use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cash_flow::peak_capital::{self, PeakCapital};
use crate::error::ProformaError;
use crate::time_value::{self, PROFORMA_IRR_SEED};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A dense monthly series where index 0 is the reference month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlySeriesInput {
    pub cash_flows: Vec<Money>,
    /// Monthly Newton-Raphson seed; defaults to 1%
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrReport {
    /// Annualized IRR in percent, `None` when indeterminate
    pub irr_pct: Option<Percent>,
    pub monthly_rate: Option<Rate>,
    pub iterations: Option<u32>,
    pub total_inflows: Money,
    pub total_outflows: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve the monthly IRR of a series and wrap it with metadata. An
/// indeterminate IRR is reported as a warning, not an error.
pub fn run_irr(input: &MonthlySeriesInput) -> ProformaResult<ComputationOutput<IrrReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let seed = input.seed.unwrap_or(PROFORMA_IRR_SEED);
    if seed <= -Decimal::ONE {
        return Err(ProformaError::InvalidInput {
            field: "seed".into(),
            reason: "Seed rate must be greater than -100%".into(),
        });
    }

    let (monthly_rate, irr_pct, iterations) =
        match time_value::solve_monthly_irr(&input.cash_flows, seed) {
            Ok(s) => (Some(s.monthly_rate), Some(s.annualized_pct), Some(s.iterations)),
            Err(failure) => {
                warnings.push(format!("IRR is indeterminate: {failure}"));
                (None, None, None)
            }
        };

    let report = IrrReport {
        irr_pct,
        monthly_rate,
        iterations,
        total_inflows: input.cash_flows.iter().filter(|cf| **cf > Decimal::ZERO).sum(),
        total_outflows: input
            .cash_flows
            .iter()
            .filter(|cf| **cf < Decimal::ZERO)
            .map(|cf| cf.abs())
            .sum(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly IRR (Newton-Raphson, annualized)",
        &serde_json::json!({
            "periods": input.cash_flows.len(),
            "seed": seed.to_string(),
        }),
        warnings,
        elapsed,
        report,
    ))
}

/// Peak capital of a series wrapped with metadata.
pub fn run_peak_capital(
    input: &MonthlySeriesInput,
) -> ProformaResult<ComputationOutput<PeakCapital>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        warnings.push("Empty cash-flow series".into());
    }
    let peak = peak_capital::analyze(&input.cash_flows);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Peak Capital (minimum cumulative balance)",
        &serde_json::json!({ "periods": input.cash_flows.len() }),
        warnings,
        elapsed,
        peak,
    ))
}
