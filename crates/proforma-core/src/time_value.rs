use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Money, Percent, Rate};

/// Step size below which Newton-Raphson is considered converged.
const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0001);
/// |dNPV/dr| below this means the NPV curve is flat and the step is meaningless.
const DERIVATIVE_FLOOR: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(10);

/// Monthly seed for the full proforma IRR.
pub const PROFORMA_IRR_SEED: Rate = dec!(0.01);
/// Monthly seed for the timeline-events IRR.
pub const TIMELINE_IRR_SEED: Rate = dec!(0.10);

/// A converged monthly IRR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Monthly rate r with NPV(r) = 0
    pub monthly_rate: Rate,
    /// ((1 + r)^12 - 1) * 100
    pub annualized_pct: Percent,
    pub iterations: u32,
}

/// Why no IRR could be determined. None of these are errors for the caller:
/// an indeterminate IRR is reported as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IrrFailure {
    #[error("IRR requires at least 2 monthly cash flows")]
    InsufficientData,
    #[error("IRR requires both outflows and inflows")]
    NoSignChange,
    #[error("IRR derivative is near zero (flat NPV curve)")]
    FlatDerivative,
    #[error("IRR did not converge within {MAX_IRR_ITERATIONS} iterations")]
    NotConverged,
    #[error("IRR diverged outside the (-99%, 1000%) monthly range")]
    Diverged,
}

/// Solve for the monthly IRR of a dense monthly series (index = month) by
/// Newton-Raphson from `seed`.
pub fn solve_monthly_irr(cash_flows: &[Money], seed: Rate) -> Result<IrrSolution, IrrFailure> {
    if cash_flows.len() < 2 {
        return Err(IrrFailure::InsufficientData);
    }
    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !(has_outflow && has_inflow) {
        return Err(IrrFailure::NoSignChange);
    }

    let mut rate = seed;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(cash_flows, rate).ok_or(IrrFailure::Diverged)?;

        if dnpv.abs() < DERIVATIVE_FLOOR {
            tracing::debug!(iteration = i, %rate, "IRR aborted on flat derivative");
            return Err(IrrFailure::FlatDerivative);
        }

        let new_rate = npv
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
            .ok_or(IrrFailure::Diverged)?;

        // Guard against runaway
        if new_rate <= RATE_FLOOR || new_rate >= RATE_CEILING {
            tracing::debug!(iteration = i, %new_rate, "IRR left the solvable range");
            return Err(IrrFailure::Diverged);
        }

        if (new_rate - rate).abs() < CONVERGENCE_THRESHOLD {
            return Ok(IrrSolution {
                monthly_rate: new_rate,
                annualized_pct: annualize_monthly(new_rate),
                iterations: i + 1,
            });
        }

        rate = new_rate;
    }

    tracing::debug!(%rate, "IRR hit the iteration cap");
    Err(IrrFailure::NotConverged)
}

/// Annualized IRR in percent, or `None` when indeterminate.
pub fn solve(cash_flows: &[Money], seed: Rate) -> Option<Percent> {
    solve_monthly_irr(cash_flows, seed)
        .ok()
        .map(|s| s.annualized_pct)
}

/// ((1 + r)^12 - 1) * 100
pub fn annualize_monthly(monthly_rate: Rate) -> Percent {
    let one_plus_r = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..12 {
        compound *= one_plus_r;
    }
    (compound - Decimal::ONE) * dec!(100)
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
/// `None` when the discount factors overflow, which only happens as r
/// approaches -100%.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^-t

    for (t, cf) in cash_flows.iter().enumerate() {
        let pv = cf.checked_mul(discount)?;
        npv = npv.checked_add(pv)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as u64)
                .checked_mul(pv)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}
