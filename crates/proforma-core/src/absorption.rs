use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::YearMonth;
use crate::coerce;
use crate::error::ProformaError;
use crate::types::{with_metadata, ComputationOutput, Units};
use crate::ProformaResult;

/// Longest schedule the validated entry points will lay out (100 years).
pub const MAX_SCHEDULE_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Units absorbed (sold or started) in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAbsorption {
    pub month: YearMonth,
    pub units: Units,
}

/// A schedule cut off after a maximum number of months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedSchedule {
    pub months: Vec<MonthlyAbsorption>,
    /// Units left over when the cap was reached (0 when fully absorbed)
    pub unabsorbed: Units,
}

/// One product line to absorb at a steady monthly pace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbsorptionInput {
    #[serde(default, deserialize_with = "coerce::opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub total_units: Units,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub pace_per_month: Units,
    /// Stop after this many months; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionReport {
    pub months: Vec<MonthlyAbsorption>,
    pub months_to_absorb: Option<u32>,
    pub absorbed_units: Units,
    pub unabsorbed: Units,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Starting in the month containing `start_date`, assign
/// `min(pace, remaining)` units to each successive month until nothing remains.
///
/// Returns an empty schedule when there is no start date or when either the
/// unit total or the pace is not positive. The assigned units always sum to
/// `total_units` exactly and the schedule has `ceil(total_units / pace)` entries.
pub fn schedule(
    start_date: Option<NaiveDate>,
    total_units: Units,
    pace_per_month: Units,
) -> Vec<MonthlyAbsorption> {
    absorb(start_date, total_units, pace_per_month, None).months
}

/// Same as [`schedule`] but stops after `max_months` entries, reporting the
/// remainder that did not fit.
pub fn schedule_capped(
    start_date: Option<NaiveDate>,
    total_units: Units,
    pace_per_month: Units,
    max_months: u32,
) -> CappedSchedule {
    absorb(start_date, total_units, pace_per_month, Some(max_months))
}

/// Number of months needed to absorb `total_units` at `pace_per_month`.
pub fn months_to_absorb(total_units: Units, pace_per_month: Units) -> Option<u32> {
    use rust_decimal::prelude::ToPrimitive;

    if total_units <= Decimal::ZERO || pace_per_month <= Decimal::ZERO {
        return None;
    }
    total_units
        .checked_div(pace_per_month)
        .and_then(|m| m.ceil().to_u32())
}

/// Validate, schedule and wrap one absorption run with metadata.
pub fn run_absorption(input: &AbsorptionInput) -> ProformaResult<ComputationOutput<AbsorptionReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.total_units < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "total_units".into(),
            reason: "Unit count cannot be negative".into(),
        });
    }
    if input.pace_per_month < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "pace_per_month".into(),
            reason: "Pace cannot be negative".into(),
        });
    }
    if input.total_units > Decimal::ZERO {
        if input.start_date.is_none() {
            warnings.push("No start date given; nothing was scheduled".into());
        } else if input.pace_per_month.is_zero() {
            warnings.push("Absorption pace is zero; nothing was scheduled".into());
        }
    }

    let cap = input
        .max_months
        .map_or(MAX_SCHEDULE_MONTHS, |m| m.min(MAX_SCHEDULE_MONTHS));
    let capped = absorb(
        input.start_date,
        input.total_units,
        input.pace_per_month,
        Some(cap),
    );
    if capped.unabsorbed > Decimal::ZERO {
        warnings.push(format!(
            "{} units remain unabsorbed after the {}-month cap",
            capped.unabsorbed,
            capped.months.len()
        ));
    }

    let report = AbsorptionReport {
        absorbed_units: capped.months.iter().map(|m| m.units).sum(),
        months_to_absorb: months_to_absorb(input.total_units, input.pace_per_month),
        months: capped.months,
        unabsorbed: capped.unabsorbed,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Greedy Monthly Absorption",
        &serde_json::json!({
            "total_units": input.total_units.to_string(),
            "pace_per_month": input.pace_per_month.to_string(),
            "max_months": input.max_months,
        }),
        warnings,
        elapsed,
        report,
    ))
}

fn absorb(
    start_date: Option<NaiveDate>,
    total_units: Units,
    pace: Units,
    max_months: Option<u32>,
) -> CappedSchedule {
    let start = match start_date {
        Some(d) if total_units > Decimal::ZERO && pace > Decimal::ZERO => YearMonth::from_date(d),
        _ => {
            return CappedSchedule {
                months: Vec::new(),
                unabsorbed: Decimal::ZERO,
            }
        }
    };

    let mut months = Vec::new();
    let mut remaining = total_units;
    let mut month = start;

    while remaining > Decimal::ZERO {
        if max_months.is_some_and(|cap| months.len() as u64 >= u64::from(cap)) {
            tracing::debug!(%start, %remaining, "absorption truncated at month cap");
            break;
        }
        let units = pace.min(remaining);
        months.push(MonthlyAbsorption { month, units });
        remaining -= units;
        month = month.succ();
    }

    CappedSchedule {
        months,
        unabsorbed: remaining,
    }
}
