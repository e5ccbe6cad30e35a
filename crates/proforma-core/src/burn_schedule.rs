use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::absorption::{self, months_to_absorb, MonthlyAbsorption, MAX_SCHEDULE_MONTHS};
use crate::calendar::YearMonth;
use crate::coerce;
use crate::error::ProformaError;
use crate::types::{with_metadata, ComputationOutput, Units};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One product / plat row of a burn schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BurnRow {
    #[serde(default)]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub total_units: Units,
    /// Starts per month
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub pace: Units,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurnScheduleInput {
    pub rows: Vec<BurnRow>,
}

/// A row's starts laid out on the report's shared month axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRowSchedule {
    pub label: String,
    /// Aligned with `BurnScheduleReport::months`; 0 where the row is inactive
    pub units_by_month: Vec<Units>,
    pub total_units: Units,
    pub first_month: Option<YearMonth>,
    pub last_month: Option<YearMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    /// `YYYY-MM` or `YYYY-Qn`
    pub period: String,
    pub units: Units,
    pub cumulative: Units,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnScheduleReport {
    /// Contiguous months from the earliest to the latest active row month
    pub months: Vec<YearMonth>,
    pub rows: Vec<BurnRowSchedule>,
    pub monthly_totals: Vec<PeriodTotal>,
    pub quarterly_totals: Vec<PeriodTotal>,
    pub grand_total: Units,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Schedule every row and sum starts per calendar month and quarter.
///
/// Rows may start in different months; the report's month axis spans the
/// union of all rows' active months. Rows that cannot be scheduled (no start
/// date, no pace, no units) contribute all-zero lines. Each row is cut off
/// after [`MAX_SCHEDULE_MONTHS`]; [`run_burn_schedule`] rejects such rows.
pub fn burn_schedule(rows: &[BurnRow]) -> BurnScheduleReport {
    let schedules: Vec<Vec<MonthlyAbsorption>> = rows
        .iter()
        .map(|r| {
            absorption::schedule_capped(r.start_date, r.total_units, r.pace, MAX_SCHEDULE_MONTHS)
                .months
        })
        .collect();

    let active = schedules.iter().flatten().map(|m| m.month);
    let (first, last) = match (active.clone().min(), active.max()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return BurnScheduleReport {
                months: Vec::new(),
                rows: rows.iter().map(|r| inactive_row(&r.label)).collect(),
                monthly_totals: Vec::new(),
                quarterly_totals: Vec::new(),
                grand_total: Decimal::ZERO,
            }
        }
    };

    let span = last.months_since(first) as usize + 1;
    let months: Vec<YearMonth> = (0..span).map(|i| first.add_months(i as i64)).collect();

    let row_schedules: Vec<BurnRowSchedule> = rows
        .iter()
        .zip(&schedules)
        .map(|(row, schedule)| {
            let mut units_by_month = vec![Decimal::ZERO; span];
            for m in schedule {
                units_by_month[m.month.months_since(first) as usize] += m.units;
            }
            BurnRowSchedule {
                label: row.label.clone(),
                total_units: schedule.iter().map(|m| m.units).sum(),
                first_month: schedule.first().map(|m| m.month),
                last_month: schedule.last().map(|m| m.month),
                units_by_month,
            }
        })
        .collect();

    let per_month: Vec<Units> = (0..span)
        .map(|i| row_schedules.iter().map(|r| r.units_by_month[i]).sum())
        .collect();

    let monthly_totals = with_cumulative(
        months
            .iter()
            .zip(&per_month)
            .map(|(m, units)| (m.to_string(), *units)),
    );

    let mut quarters: Vec<(String, Units)> = Vec::new();
    for (m, units) in months.iter().zip(&per_month) {
        let label = m.quarter_label();
        match quarters.last_mut() {
            Some((q, total)) if *q == label => *total += *units,
            _ => quarters.push((label, *units)),
        }
    }
    let quarterly_totals = with_cumulative(quarters.into_iter());

    BurnScheduleReport {
        months,
        grand_total: per_month.iter().copied().sum(),
        rows: row_schedules,
        monthly_totals,
        quarterly_totals,
    }
}

/// Validate rows, build the report and wrap it with metadata.
pub fn run_burn_schedule(
    input: &BurnScheduleInput,
) -> ProformaResult<ComputationOutput<BurnScheduleReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (i, row) in input.rows.iter().enumerate() {
        if row.total_units < Decimal::ZERO {
            return Err(ProformaError::InvalidInput {
                field: format!("rows[{i}].total_units"),
                reason: "Unit count cannot be negative".into(),
            });
        }
        if row.pace < Decimal::ZERO {
            return Err(ProformaError::InvalidInput {
                field: format!("rows[{i}].pace"),
                reason: "Pace cannot be negative".into(),
            });
        }
        if row.total_units > Decimal::ZERO && (row.start_date.is_none() || row.pace.is_zero()) {
            warnings.push(format!(
                "Row '{}' has no start date or pace; excluded from the schedule",
                row.label
            ));
        }
    }

    check_schedule_length(&input.rows)?;

    let output = burn_schedule(&input.rows);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Burn Schedule (greedy monthly absorption, summed across rows)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Reject rows, or row combinations, whose month axis would run past
/// [`MAX_SCHEDULE_MONTHS`].
fn check_schedule_length(rows: &[BurnRow]) -> ProformaResult<()> {
    let mut bounds: Option<(YearMonth, YearMonth)> = None;

    for (i, row) in rows.iter().enumerate() {
        let Some(start) = row.start_date.map(YearMonth::from_date) else {
            continue;
        };
        if row.total_units <= Decimal::ZERO || row.pace <= Decimal::ZERO {
            continue;
        }
        let months = months_to_absorb(row.total_units, row.pace)
            .filter(|m| *m <= MAX_SCHEDULE_MONTHS)
            .ok_or_else(|| ProformaError::InvalidInput {
                field: format!("rows[{i}].pace"),
                reason: format!(
                    "Pace absorbs {} units in more than {MAX_SCHEDULE_MONTHS} months",
                    row.total_units
                ),
            })?;
        let end = start.add_months(i64::from(months) - 1);
        bounds = Some(match bounds {
            Some((first, last)) => (first.min(start), last.max(end)),
            None => (start, end),
        });
    }

    if let Some((first, last)) = bounds {
        if last.months_since(first) >= i64::from(MAX_SCHEDULE_MONTHS) {
            return Err(ProformaError::InvalidInput {
                field: "rows".into(),
                reason: format!(
                    "Rows span {first} to {last}, more than {MAX_SCHEDULE_MONTHS} months"
                ),
            });
        }
    }
    Ok(())
}

fn inactive_row(label: &str) -> BurnRowSchedule {
    BurnRowSchedule {
        label: label.to_string(),
        units_by_month: Vec::new(),
        total_units: Decimal::ZERO,
        first_month: None,
        last_month: None,
    }
}

fn with_cumulative(periods: impl Iterator<Item = (String, Units)>) -> Vec<PeriodTotal> {
    let mut cumulative = Decimal::ZERO;
    periods
        .map(|(period, units)| {
            cumulative += units;
            PeriodTotal {
                period,
                units,
                cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(label: &str, start: (i32, u32), total: Decimal, pace: Decimal) -> BurnRow {
        BurnRow {
            label: label.into(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, 1),
            total_units: total,
            pace,
        }
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_union_of_heterogeneous_rows() {
        let rows = vec![
            row("Plat A", (2025, 2), dec!(6), dec!(2)), // Feb-Apr
            row("Plat B", (2025, 5), dec!(4), dec!(4)), // May
        ];
        let report = burn_schedule(&rows);
        assert_eq!(report.months.first(), Some(&ym(2025, 2)));
        assert_eq!(report.months.last(), Some(&ym(2025, 5)));
        assert_eq!(report.months.len(), 4);
        assert_eq!(
            report.rows[1].units_by_month,
            vec![Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, dec!(4)]
        );
        assert_eq!(report.grand_total, dec!(10));
    }

    #[test]
    fn test_overlapping_rows_sum_per_month() {
        let rows = vec![
            row("A", (2025, 1), dec!(9), dec!(3)),
            row("B", (2025, 2), dec!(4), dec!(2)),
        ];
        let report = burn_schedule(&rows);
        let units: Vec<Decimal> = report.monthly_totals.iter().map(|t| t.units).collect();
        assert_eq!(units, vec![dec!(3), dec!(5), dec!(5)]);
        let cumulative: Vec<Decimal> =
            report.monthly_totals.iter().map(|t| t.cumulative).collect();
        assert_eq!(cumulative, vec![dec!(3), dec!(8), dec!(13)]);
        assert_eq!(report.monthly_totals[0].period, "2025-01");
    }

    #[test]
    fn test_gap_between_rows_is_zero_filled() {
        let rows = vec![
            row("A", (2025, 1), dec!(1), dec!(1)),
            row("B", (2025, 4), dec!(1), dec!(1)),
        ];
        let report = burn_schedule(&rows);
        let units: Vec<Decimal> = report.monthly_totals.iter().map(|t| t.units).collect();
        assert_eq!(units, vec![dec!(1), Decimal::ZERO, Decimal::ZERO, dec!(1)]);
    }

    #[test]
    fn test_quarterly_totals() {
        let rows = vec![row("A", (2025, 2), dec!(10), dec!(2))]; // Feb-Jun
        let report = burn_schedule(&rows);
        let quarters: Vec<(&str, Decimal)> = report
            .quarterly_totals
            .iter()
            .map(|q| (q.period.as_str(), q.units))
            .collect();
        assert_eq!(quarters, vec![("2025-Q1", dec!(4)), ("2025-Q2", dec!(6))]);
        let q_sum: Decimal = report.quarterly_totals.iter().map(|q| q.units).sum();
        assert_eq!(q_sum, report.grand_total);
    }

    #[test]
    fn test_inactive_rows_only() {
        let rows = vec![BurnRow {
            label: "Unscheduled".into(),
            total_units: dec!(20),
            pace: dec!(2),
            start_date: None,
        }];
        let report = burn_schedule(&rows);
        assert!(report.months.is_empty());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_no_rows() {
        let report = burn_schedule(&[]);
        assert!(report.months.is_empty());
        assert!(report.quarterly_totals.is_empty());
    }

    #[test]
    fn test_run_burn_schedule_warns_and_validates() {
        let input = BurnScheduleInput {
            rows: vec![
                row("A", (2025, 1), dec!(4), dec!(2)),
                BurnRow {
                    label: "No start".into(),
                    total_units: dec!(5),
                    pace: dec!(1),
                    start_date: None,
                },
            ],
        };
        let out = run_burn_schedule(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("No start")));
        assert_eq!(out.result.grand_total, dec!(4));

        let bad = BurnScheduleInput {
            rows: vec![row("Bad", (2025, 1), dec!(-1), dec!(1))],
        };
        assert!(run_burn_schedule(&bad).is_err());
    }
}
