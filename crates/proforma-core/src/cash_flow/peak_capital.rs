use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{MonthIndex, Money};

/// Peak capital exposure: the deepest point of the cumulative cash balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakCapital {
    /// Magnitude of the most negative cumulative balance (0 if never negative)
    pub amount: Money,
    /// Month of the first occurrence of that balance
    pub month_index: Option<MonthIndex>,
}

/// Scan the running cumulative sum of a dense monthly series for its minimum.
pub fn analyze(cash_flows: &[Money]) -> PeakCapital {
    let mut cumulative = Decimal::ZERO;
    let mut lowest = Decimal::ZERO;
    let mut month_index = None;

    for (t, cf) in cash_flows.iter().enumerate() {
        cumulative += *cf;
        if cumulative < lowest {
            lowest = cumulative;
            month_index = Some(t as MonthIndex);
        }
    }

    PeakCapital {
        amount: lowest.abs(),
        month_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_peak_is_cumulative_minimum() {
        // cumulative: -100, -150, -120, 80
        let peak = analyze(&[dec!(-100), dec!(-50), dec!(30), dec!(200)]);
        assert_eq!(peak.amount, dec!(150));
        assert_eq!(peak.month_index, Some(1));
    }

    #[test]
    fn test_not_the_largest_single_outflow() {
        // Largest single outflow is month 0, but the balance bottoms out at month 2.
        let peak = analyze(&[dec!(-100), dec!(-40), dec!(-40), dec!(500)]);
        assert_eq!(peak.amount, dec!(180));
        assert_eq!(peak.month_index, Some(2));
    }

    #[test]
    fn test_never_negative_floors_at_zero() {
        let peak = analyze(&[dec!(100), dec!(50)]);
        assert_eq!(peak.amount, Decimal::ZERO);
        assert_eq!(peak.month_index, None);
    }

    #[test]
    fn test_first_occurrence_of_minimum() {
        let peak = analyze(&[dec!(-100), Decimal::ZERO, Decimal::ZERO, dec!(100)]);
        assert_eq!(peak.month_index, Some(0));
    }

    #[test]
    fn test_empty_series() {
        let peak = analyze(&[]);
        assert_eq!(peak.amount, Decimal::ZERO);
        assert_eq!(peak.month_index, None);
    }
}
