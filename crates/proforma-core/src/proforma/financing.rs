use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::months_between;
use crate::coerce;
use crate::error::ProformaError;
use crate::proforma::inputs::ProformaInputs;
use crate::types::{with_metadata, ComputationOutput, DatedAmount, Money, Percent};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the financing cost was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingMethod {
    /// Interest accrued per draw from its funding month to completion
    DrawWeighted,
    /// Simple interest on development costs over the loan term
    FlatRate,
    /// Caller-supplied figure
    ManualOverride,
    /// Nothing to estimate from
    Unavailable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancingInput {
    #[serde(default)]
    pub construction_draws: Vec<DatedAmount>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_date: Option<NaiveDate>,
    /// Annual loan interest rate in percent
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub annual_rate_pct: Percent,
    #[serde(
        default,
        deserialize_with = "coerce::opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub loan_term_months: Option<Decimal>,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub development_costs: Money,
    #[serde(
        default,
        deserialize_with = "coerce::opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub manual_override: Option<Money>,
}

impl From<&ProformaInputs> for FinancingInput {
    fn from(p: &ProformaInputs) -> Self {
        Self {
            construction_draws: p.construction_draws.clone(),
            completion_date: p.development_completion_date,
            annual_rate_pct: p.loan_interest_rate,
            loan_term_months: p.loan_term_months,
            development_costs: p.development_costs,
            manual_override: p.financing_costs,
        }
    }
}

/// Interest attributed to one construction draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawInterest {
    pub date: NaiveDate,
    pub amount: Money,
    pub months_outstanding: u32,
    pub interest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingCost {
    pub amount: Money,
    pub method: FinancingMethod,
    /// Per-draw breakdown (draw-weighted method only)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub draw_interest: Vec<DrawInterest>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate loan interest.
///
/// Dated draws, a completion date and a positive rate select the draw-weighted
/// method: each draw accrues `amount * rate * months_outstanding / 12`, so
/// late draws cost less. Otherwise a loan term and development costs give
/// simple interest over the term. Otherwise the manual figure, else zero.
pub fn calculate(input: &FinancingInput) -> FinancingCost {
    let rate = input.annual_rate_pct / dec!(100);
    let has_rate = input.annual_rate_pct > Decimal::ZERO;

    if let Some(completion) = input
        .completion_date
        .filter(|_| has_rate && input.construction_draws.iter().any(|d| d.date.is_some()))
    {
        let draw_interest: Vec<DrawInterest> = input
            .construction_draws
            .iter()
            .filter_map(|draw| {
                let date = draw.date?;
                let months = months_between(date, completion).max(0);
                let months_outstanding = u32::try_from(months).unwrap_or(u32::MAX);
                let interest =
                    draw.amount * rate * Decimal::from(months_outstanding) / dec!(12);
                Some(DrawInterest {
                    date,
                    amount: draw.amount,
                    months_outstanding,
                    interest,
                })
            })
            .collect();
        let amount = draw_interest.iter().map(|d| d.interest).sum();
        return FinancingCost {
            amount,
            method: FinancingMethod::DrawWeighted,
            draw_interest,
        };
    }

    if let Some(term) = input.loan_term_months {
        if has_rate && term > Decimal::ZERO && input.development_costs > Decimal::ZERO {
            return FinancingCost {
                amount: input.development_costs * rate * term / dec!(12),
                method: FinancingMethod::FlatRate,
                draw_interest: Vec::new(),
            };
        }
    }

    match input.manual_override {
        Some(amount) => FinancingCost {
            amount,
            method: FinancingMethod::ManualOverride,
            draw_interest: Vec::new(),
        },
        None => FinancingCost {
            amount: Decimal::ZERO,
            method: FinancingMethod::Unavailable,
            draw_interest: Vec::new(),
        },
    }
}

/// Validated financing estimate wrapped with metadata.
pub fn run_financing(
    input: &FinancingInput,
) -> ProformaResult<ComputationOutput<FinancingCost>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rate_pct < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    for (i, d) in input.construction_draws.iter().enumerate() {
        if d.amount < Decimal::ZERO {
            return Err(ProformaError::InvalidInput {
                field: format!("construction_draws[{i}].amount"),
                reason: "Draw amount cannot be negative".into(),
            });
        }
    }

    check_draws(input, &mut warnings);

    let output = calculate(input);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Construction Loan Interest (draw-weighted, flat-rate fallback)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Warnings for draw schedules that cannot be used as given.
pub(crate) fn check_draws(input: &FinancingInput, warnings: &mut Vec<String>) {
    if input.construction_draws.is_empty() {
        return;
    }
    if input.completion_date.is_none() {
        warnings.push(
            "Construction draws ignored for financing; no development completion date".into(),
        );
    } else if input.annual_rate_pct.is_zero() {
        warnings.push("Construction draws ignored for financing; no loan interest rate".into());
    }
    let undated = input
        .construction_draws
        .iter()
        .filter(|d| d.date.is_none())
        .count();
    if undated > 0 {
        warnings.push(format!(
            "{undated} construction draw(s) have no valid date and accrue no interest"
        ));
    }
    if let Some(completion) = input.completion_date {
        let late = input
            .construction_draws
            .iter()
            .filter_map(|d| d.date)
            .filter(|date| months_between(*date, completion) < 0)
            .count();
        if late > 0 {
            warnings.push(format!(
                "{late} construction draw(s) fall after completion and accrue no interest"
            ));
        }
    }
}
