use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::YearMonth;
use crate::cash_flow::{peak_capital, CashFlowEvent, CashFlowSeries, MonthlyCashFlow, PeakCapital};
use crate::coerce;
use crate::error::ProformaError;
use crate::time_value::{self, TIMELINE_IRR_SEED};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Cost,
    Revenue,
}

/// A dated line on a deal's timeline. `amount` is a magnitude; `kind`
/// decides the sign. Events without a usable date are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub amount: Money,
    pub kind: EventKind,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineInput {
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    /// Month 0 of the analysis; defaults to the earliest event
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineOutput {
    pub total_costs: Money,
    pub total_revenue: Money,
    pub net_cash_flow: Money,
    pub irr_pct: Option<Percent>,
    pub peak_capital: PeakCapital,
    pub peak_capital_date: Option<NaiveDate>,
    pub reference_month: Option<YearMonth>,
    pub monthly_cash_flows: Vec<MonthlyCashFlow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Net a flat list of cost/revenue events into monthly flows and derive
/// IRR and peak capital from them.
pub fn analyze_timeline(input: &TimelineInput) -> TimelineOutput {
    let mut warnings = Vec::new();
    compute_timeline(input, &mut warnings)
}

/// Validate, analyse and wrap the timeline with metadata.
pub fn run_timeline(input: &TimelineInput) -> ProformaResult<ComputationOutput<TimelineOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (i, e) in input.events.iter().enumerate() {
        if e.amount < Decimal::ZERO {
            return Err(ProformaError::InvalidInput {
                field: format!("events[{i}].amount"),
                reason: "Event amounts are magnitudes; use kind to mark costs".into(),
            });
        }
    }

    let output = compute_timeline(input, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Timeline Events IRR (monthly Newton-Raphson)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn compute_timeline(input: &TimelineInput, warnings: &mut Vec<String>) -> TimelineOutput {
    let dated: Vec<(NaiveDate, &TimelineEvent)> = input
        .events
        .iter()
        .filter_map(|e| e.date.map(|d| (d, e)))
        .collect();
    let undated = input.events.len() - dated.len();
    if undated > 0 {
        warnings.push(format!(
            "{undated} event(s) have no valid date and were ignored"
        ));
    }

    let total_costs: Money = dated
        .iter()
        .filter(|(_, e)| e.kind == EventKind::Cost)
        .map(|(_, e)| e.amount)
        .sum();
    let total_revenue: Money = dated
        .iter()
        .filter(|(_, e)| e.kind == EventKind::Revenue)
        .map(|(_, e)| e.amount)
        .sum();

    let reference = input
        .reference_date
        .or_else(|| dated.iter().map(|(d, _)| *d).min())
        .map(YearMonth::from_date);

    let Some(reference) = reference else {
        warnings.push("Timeline has no events".into());
        return TimelineOutput {
            total_costs,
            total_revenue,
            net_cash_flow: total_revenue - total_costs,
            irr_pct: None,
            peak_capital: peak_capital::analyze(&[]),
            peak_capital_date: None,
            reference_month: None,
            monthly_cash_flows: Vec::new(),
        };
    };

    let events: Vec<CashFlowEvent> = dated
        .iter()
        .map(|(date, e)| {
            let month = YearMonth::from_date(*date);
            match e.kind {
                EventKind::Cost => CashFlowEvent::outflow(month, e.amount, e.description.clone()),
                EventKind::Revenue => {
                    CashFlowEvent::inflow(month, e.amount, e.description.clone())
                }
            }
        })
        .collect();
    let series = CashFlowSeries::build(reference, &events);

    if series.clamped_events() > 0 {
        warnings.push(format!(
            "{} event(s) precede the reference date and were booked in month 0",
            series.clamped_events()
        ));
    }

    let irr_pct = match time_value::solve_monthly_irr(series.flows(), TIMELINE_IRR_SEED) {
        Ok(solution) => Some(solution.annualized_pct),
        Err(reason) => {
            warnings.push(format!("IRR is indeterminate: {reason}"));
            None
        }
    };

    let peak = peak_capital::analyze(series.flows());
    let peak_capital_date = peak
        .month_index
        .and_then(|t| series.month_at(t).first_day());

    TimelineOutput {
        total_costs,
        total_revenue,
        net_cash_flow: total_revenue - total_costs,
        irr_pct,
        peak_capital: peak,
        peak_capital_date,
        reference_month: Some(reference),
        monthly_cash_flows: series.monthly(),
    }
}
