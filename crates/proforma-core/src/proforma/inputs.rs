use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::error::ProformaError;
use crate::types::{DatedAmount, Money, Percent, Units};
use crate::ProformaResult;

/// A saleable product line within a development (e.g. 50' lots, townhomes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductType {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::count_or_zero")]
    pub number_of_units: i64,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub sales_price_per_unit: Money,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub direct_cost_per_unit: Money,
    /// Building permit cost per unit
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub building_permit_cost: Money,
    /// Units sold per month once closings begin
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub absorption_pace: Units,
    #[serde(
        default,
        deserialize_with = "coerce::opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub average_sqft: Option<Decimal>,
}

impl ProductType {
    pub fn units(&self) -> Units {
        Decimal::from(self.number_of_units)
    }

    pub fn gross_revenue(&self) -> Money {
        self.units() * self.sales_price_per_unit
    }

    pub fn direct_costs(&self) -> Money {
        self.units() * self.direct_cost_per_unit
    }

    pub fn permit_costs(&self) -> Money {
        self.units() * self.building_permit_cost
    }
}

/// Everything the engine needs to evaluate one deal's proforma.
///
/// Every numeric field is parsed tolerantly: numbers, numeric strings,
/// formatted strings and blanks are all accepted, blanks becoming zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProformaInputs {
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub development_costs: Money,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub soft_costs: Money,
    /// Manual financing cost, used only when neither draws nor a flat loan
    /// term allow the interest to be estimated
    #[serde(
        default,
        deserialize_with = "coerce::opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub financing_costs: Option<Money>,
    /// Annual loan interest rate in percent
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub loan_interest_rate: Percent,
    #[serde(
        default,
        deserialize_with = "coerce::opt_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub loan_term_months: Option<Decimal>,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub contingency_percentage: Percent,
    #[serde(default, deserialize_with = "coerce::money_or_zero")]
    pub sales_commission_percentage: Percent,
    /// Staged land payments; when present they replace the lump-sum purchase
    /// price on the cash-flow timeline
    #[serde(default)]
    pub purchase_takedowns: Vec<DatedAmount>,
    #[serde(default)]
    pub construction_draws: Vec<DatedAmount>,
    #[serde(default)]
    pub product_types: Vec<ProductType>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub development_start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub development_completion_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_home_closing: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Upper bound for any single amount, per-unit price or loan term.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);
/// Upper bound for unit counts and monthly paces.
pub const MAX_UNITS: Decimal = dec!(1000000000);
/// Upper bound for any percentage input.
pub const MAX_PERCENT: Decimal = dec!(1000);

/// Reject malformed shapes (negative or out-of-range amounts, counts, paces
/// or percentages) and collect warnings for assumptions that will silently limit the model.
pub fn validate_inputs(
    input: &ProformaInputs,
    warnings: &mut Vec<String>,
) -> ProformaResult<()> {
    let money_fields = [
        ("purchase_price", input.purchase_price),
        ("development_costs", input.development_costs),
        ("soft_costs", input.soft_costs),
        ("financing_costs", input.financing_costs.unwrap_or_default()),
        ("loan_term_months", input.loan_term_months.unwrap_or_default()),
    ];
    for (field, value) in money_fields {
        require_in_range(field, value, MAX_AMOUNT)?;
    }

    let pct_fields = [
        ("loan_interest_rate", input.loan_interest_rate),
        ("contingency_percentage", input.contingency_percentage),
        ("sales_commission_percentage", input.sales_commission_percentage),
    ];
    for (field, value) in pct_fields {
        require_in_range(field, value, MAX_PERCENT)?;
    }

    for (i, t) in input.purchase_takedowns.iter().enumerate() {
        require_in_range(&format!("purchase_takedowns[{i}].amount"), t.amount, MAX_AMOUNT)?;
    }
    for (i, d) in input.construction_draws.iter().enumerate() {
        require_in_range(&format!("construction_draws[{i}].amount"), d.amount, MAX_AMOUNT)?;
    }

    for (i, p) in input.product_types.iter().enumerate() {
        if p.number_of_units < 0 {
            return Err(ProformaError::InvalidInput {
                field: format!("product_types[{i}].number_of_units"),
                reason: "Unit count cannot be negative".into(),
            });
        }
        let per_unit = [
            ("number_of_units", p.units(), MAX_UNITS),
            ("sales_price_per_unit", p.sales_price_per_unit, MAX_AMOUNT),
            ("direct_cost_per_unit", p.direct_cost_per_unit, MAX_AMOUNT),
            ("building_permit_cost", p.building_permit_cost, MAX_AMOUNT),
            ("absorption_pace", p.absorption_pace, MAX_UNITS),
        ];
        for (name, value, limit) in per_unit {
            require_in_range(&format!("product_types[{i}].{name}"), value, limit)?;
        }

        if p.number_of_units > 0 && p.absorption_pace.is_zero() {
            warnings.push(format!(
                "Product type '{}' has no absorption pace; its revenue is excluded from the cash-flow timeline",
                p.name
            ));
        }
    }

    // --- Warnings for unusual assumptions ---
    if input.sales_commission_percentage > dec!(10) {
        warnings.push(format!(
            "Sales commission of {}% exceeds 10%; verify broker terms",
            input.sales_commission_percentage
        ));
    }
    if input.contingency_percentage > dec!(25) {
        warnings.push(format!(
            "Contingency of {}% exceeds 25%; unusually conservative",
            input.contingency_percentage
        ));
    }
    if let (Some(start), Some(done)) = (
        input.development_start_date,
        input.development_completion_date,
    ) {
        if done < start {
            warnings.push("Development completion date precedes the start date".into());
        }
    }

    Ok(())
}

fn require_in_range(field: &str, value: Decimal, limit: Decimal) -> ProformaResult<()> {
    if value < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: field.into(),
            reason: "Value cannot be negative".into(),
        });
    }
    if value > limit {
        return Err(ProformaError::InvalidInput {
            field: field.into(),
            reason: format!("Value exceeds the supported maximum of {limit}"),
        });
    }
    Ok(())
}
