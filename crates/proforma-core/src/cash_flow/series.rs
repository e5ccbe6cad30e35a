use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::YearMonth;
use crate::types::{MonthIndex, Money};

/// A signed monetary event landing in a calendar month.
/// Outflows are negative, inflows positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub month: YearMonth,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CashFlowEvent {
    /// A cost: `amount` is given as a positive magnitude and stored negated.
    pub fn outflow(month: YearMonth, amount: Money, label: impl Into<String>) -> Self {
        Self {
            month,
            amount: -amount,
            label: Some(label.into()),
        }
    }

    pub fn inflow(month: YearMonth, amount: Money, label: impl Into<String>) -> Self {
        Self {
            month,
            amount,
            label: Some(label.into()),
        }
    }
}

/// One month of a materialized series, with the running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCashFlow {
    pub month_index: MonthIndex,
    pub month: YearMonth,
    pub amount: Money,
    pub cumulative: Money,
}

/// Dense monthly cash flows: `flows()[t]` is the net amount in month
/// `reference_month + t`. Every month from 0 to the last populated one is
/// present; months after it are implicitly zero and not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSeries {
    reference: YearMonth,
    flows: Vec<Money>,
    clamped_events: usize,
}

impl CashFlowSeries {
    /// Merge `events` onto the month axis starting at `reference`.
    ///
    /// Events in the same month are summed. Events dated before the reference
    /// month are booked in month 0.
    pub fn build(reference: YearMonth, events: &[CashFlowEvent]) -> Self {
        let mut sparse: BTreeMap<MonthIndex, Money> = BTreeMap::new();
        let mut clamped_events = 0;

        for event in events {
            let offset = event.month.months_since(reference);
            if offset < 0 {
                tracing::debug!(month = %event.month, %reference, "event before reference month booked at month 0");
                clamped_events += 1;
            }
            let index = MonthIndex::try_from(offset.max(0)).unwrap_or(MonthIndex::MAX);
            *sparse.entry(index).or_insert(Decimal::ZERO) += event.amount;
        }

        let flows = match sparse.last_key_value() {
            Some((&last, _)) => {
                let mut dense = vec![Decimal::ZERO; last as usize + 1];
                for (index, amount) in sparse {
                    dense[index as usize] = amount;
                }
                dense
            }
            None => Vec::new(),
        };

        Self {
            reference,
            flows,
            clamped_events,
        }
    }

    pub fn reference_month(&self) -> YearMonth {
        self.reference
    }

    pub fn flows(&self) -> &[Money] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Calendar month of index `t`.
    pub fn month_at(&self, t: MonthIndex) -> YearMonth {
        self.reference.add_months(i64::from(t))
    }

    /// Number of events that predated the reference month.
    pub fn clamped_events(&self) -> usize {
        self.clamped_events
    }

    pub fn total_inflows(&self) -> Money {
        self.flows.iter().filter(|cf| **cf > Decimal::ZERO).sum()
    }

    pub fn total_outflows(&self) -> Money {
        self.flows
            .iter()
            .filter(|cf| **cf < Decimal::ZERO)
            .map(|cf| cf.abs())
            .sum()
    }

    /// Month-by-month view with calendar months and the cumulative balance.
    pub fn monthly(&self) -> Vec<MonthlyCashFlow> {
        let mut cumulative = Decimal::ZERO;
        self.flows
            .iter()
            .enumerate()
            .map(|(t, amount)| {
                cumulative += *amount;
                let t = t as MonthIndex;
                MonthlyCashFlow {
                    month_index: t,
                    month: self.month_at(t),
                    amount: *amount,
                    cumulative,
                }
            })
            .collect()
    }
}
