use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::absorption::{self, months_to_absorb};
use crate::calendar::YearMonth;
use crate::cash_flow::{peak_capital, CashFlowEvent, CashFlowSeries, MonthlyCashFlow};
use crate::proforma::financing::{self, FinancingInput, FinancingMethod};
use crate::proforma::inputs::{validate_inputs, ProductType, ProformaInputs};
use crate::time_value::{self, PROFORMA_IRR_SEED};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate, Units};
use crate::ProformaResult;

/// Revenue is scheduled for at most this many months after first closing.
pub const REVENUE_MONTH_CAP: u32 = 240;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Roll-up of a single product type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTypeSummary {
    pub name: String,
    pub units: Units,
    pub gross_revenue: Money,
    pub net_revenue: Money,
    pub direct_costs: Money,
    pub permit_costs: Money,
    /// Sales price per square foot, when an average size is known
    pub price_per_sqft: Option<Money>,
    /// Months from first closing to sell out at the given pace
    pub months_to_sell: Option<u32>,
}

/// Derived investment metrics for one proforma. All `_pct` fields are
/// percentage points; any ratio with a zero denominator is reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProformaMetrics {
    pub gross_revenue: Money,
    pub sales_commission: Money,
    pub net_revenue: Money,
    pub total_direct_costs: Money,
    pub total_permit_costs: Money,
    pub contingency: Money,
    pub financing_costs: Money,
    pub financing_method: FinancingMethod,
    pub total_costs: Money,
    pub profit: Money,
    pub roi_pct: Percent,
    pub profit_margin_pct: Percent,
    pub gross_margin_pct: Percent,
    /// Return on net assets: profit over capitalised costs (excluding financing)
    pub rona_pct: Percent,
    /// Annualised IRR of the unlevered monthly cash flows; `None` if indeterminate
    pub unlevered_irr_pct: Option<Percent>,
    pub peak_capital_amount: Money,
    pub peak_capital_date: Option<NaiveDate>,
    /// Month 0 of the cash-flow timeline
    pub reference_month: Option<YearMonth>,
    pub product_types: Vec<ProductTypeSummary>,
    pub monthly_cash_flows: Vec<MonthlyCashFlow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the full metrics set. Never fails: missing data yields zeros and
/// `None`s rather than errors.
pub fn aggregate(input: &ProformaInputs) -> ProformaMetrics {
    let mut warnings = Vec::new();
    compute_metrics(input, &mut warnings)
}

/// Validate, compute and wrap the metrics with warnings and metadata.
pub fn run_proforma(
    input: &ProformaInputs,
) -> ProformaResult<ComputationOutput<ProformaMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_inputs(input, &mut warnings)?;

    let output = compute_metrics(input, &mut warnings);

    if output.profit < Decimal::ZERO {
        warnings.push(format!(
            "Project shows a loss of {}; net revenue does not cover total costs",
            output.profit.abs()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Land Development Proforma (monthly unlevered cash flows)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Roll-up
// ---------------------------------------------------------------------------

fn compute_metrics(input: &ProformaInputs, warnings: &mut Vec<String>) -> ProformaMetrics {
    let _span =
        tracing::debug_span!("proforma", product_types = input.product_types.len()).entered();

    let total_direct_costs: Money = input.product_types.iter().map(ProductType::direct_costs).sum();
    let total_permit_costs: Money = input.product_types.iter().map(ProductType::permit_costs).sum();
    let gross_revenue: Money = input.product_types.iter().map(ProductType::gross_revenue).sum();

    let commission_rate = input.sales_commission_percentage / dec!(100);
    let sales_commission = gross_revenue * commission_rate;
    let net_revenue = gross_revenue - sales_commission;

    let base_costs = input.purchase_price
        + input.development_costs
        + input.soft_costs
        + total_direct_costs
        + total_permit_costs;
    let contingency = base_costs * input.contingency_percentage / dec!(100);
    let capitalized_costs = base_costs + contingency;

    let financing_input = FinancingInput::from(input);
    financing::check_draws(&financing_input, warnings);
    let financing = financing::calculate(&financing_input);

    let total_costs = capitalized_costs + financing.amount;
    let profit = net_revenue - total_costs;

    // --- Timeline-derived metrics ---
    let upfront = UpfrontCosts {
        purchase_price: input.purchase_price,
        development_costs: input.development_costs,
        soft_costs: input.soft_costs,
        direct_costs: total_direct_costs,
        permit_costs: total_permit_costs,
        contingency,
    };

    let mut unlevered_irr_pct = None;
    let mut peak_capital_amount = Decimal::ZERO;
    let mut peak_capital_date = None;
    let mut reference_month = None;
    let mut monthly_cash_flows = Vec::new();

    if let Some(series) = build_timeline(input, &upfront, commission_rate, warnings) {
        unlevered_irr_pct = match time_value::solve_monthly_irr(series.flows(), PROFORMA_IRR_SEED)
        {
            Ok(solution) => Some(solution.annualized_pct),
            Err(reason) => {
                warnings.push(format!("Unlevered IRR is indeterminate: {reason}"));
                None
            }
        };

        let peak = peak_capital::analyze(series.flows());
        peak_capital_amount = peak.amount;
        peak_capital_date = peak
            .month_index
            .and_then(|t| series.month_at(t).first_day());

        reference_month = Some(series.reference_month());
        monthly_cash_flows = series.monthly();
    }

    ProformaMetrics {
        gross_revenue,
        sales_commission,
        net_revenue,
        total_direct_costs,
        total_permit_costs,
        contingency,
        financing_costs: financing.amount,
        financing_method: financing.method,
        total_costs,
        profit,
        roi_pct: pct(profit, total_costs),
        profit_margin_pct: pct(profit, gross_revenue),
        gross_margin_pct: pct(gross_revenue - total_costs, gross_revenue),
        rona_pct: pct(profit, capitalized_costs),
        unlevered_irr_pct,
        peak_capital_amount,
        peak_capital_date,
        reference_month,
        product_types: summarize_products(&input.product_types, commission_rate),
        monthly_cash_flows,
    }
}

/// `numerator / denominator * 100`, or 0 when the denominator is zero.
fn pct(numerator: Decimal, denominator: Decimal) -> Percent {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator * dec!(100)
    }
}

fn summarize_products(products: &[ProductType], commission_rate: Rate) -> Vec<ProductTypeSummary> {
    products
        .iter()
        .map(|p| {
            let gross = p.gross_revenue();
            let price_per_sqft = p
                .average_sqft
                .filter(|sqft| *sqft > Decimal::ZERO)
                .map(|sqft| p.sales_price_per_unit / sqft);
            ProductTypeSummary {
                name: p.name.clone(),
                units: p.units(),
                gross_revenue: gross,
                net_revenue: gross - gross * commission_rate,
                direct_costs: p.direct_costs(),
                permit_costs: p.permit_costs(),
                price_per_sqft,
                months_to_sell: months_to_absorb(p.units(), p.absorption_pace),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cash-flow timeline
// ---------------------------------------------------------------------------

/// Costs booked in month 0 of the timeline.
struct UpfrontCosts {
    purchase_price: Money,
    development_costs: Money,
    soft_costs: Money,
    direct_costs: Money,
    permit_costs: Money,
    contingency: Money,
}

/// Month 0: the development start, or failing that the earliest dated event.
fn reference_date(input: &ProformaInputs) -> Option<NaiveDate> {
    input.development_start_date.or_else(|| {
        input
            .purchase_takedowns
            .iter()
            .chain(input.construction_draws.iter())
            .filter_map(|d| d.date)
            .chain(input.first_home_closing)
            .min()
    })
}

fn build_timeline(
    input: &ProformaInputs,
    upfront: &UpfrontCosts,
    commission_rate: Rate,
    warnings: &mut Vec<String>,
) -> Option<CashFlowSeries> {
    let Some(reference) = reference_date(input).map(YearMonth::from_date) else {
        warnings.push(
            "No development start or event dates; cash-flow timeline, IRR and peak capital not computed"
                .into(),
        );
        return None;
    };

    let mut events: Vec<CashFlowEvent> = Vec::new();

    // --- Upfront costs (month 0) ---
    let mut month_zero = vec![
        ("development costs", upfront.development_costs),
        ("soft costs", upfront.soft_costs),
        ("direct construction costs", upfront.direct_costs),
        ("building permits", upfront.permit_costs),
        ("contingency", upfront.contingency),
    ];
    if input.purchase_takedowns.is_empty() {
        month_zero.insert(0, ("purchase price", upfront.purchase_price));
    }
    for (label, amount) in month_zero {
        if !amount.is_zero() {
            events.push(CashFlowEvent::outflow(reference, amount, label));
        }
    }

    // --- Dated outflows ---
    let mut undated = 0usize;
    for t in &input.purchase_takedowns {
        match t.month() {
            Some(month) => events.push(CashFlowEvent::outflow(
                month,
                t.amount,
                takedown_label(&t.description),
            )),
            None => undated += 1,
        }
    }
    for d in &input.construction_draws {
        match d.month() {
            Some(month) => {
                events.push(CashFlowEvent::outflow(month, d.amount, draw_label(&d.description)))
            }
            None => undated += 1,
        }
    }
    if undated > 0 {
        warnings.push(format!(
            "{undated} takedown/draw row(s) have no valid date and were left off the cash-flow timeline"
        ));
    }

    // --- Sales revenue, net of commission ---
    let selling: Vec<&ProductType> = input
        .product_types
        .iter()
        .filter(|p| p.number_of_units > 0 && p.sales_price_per_unit > Decimal::ZERO)
        .collect();

    match input.first_home_closing {
        None if !selling.is_empty() => warnings.push(
            "No first home closing date; sales revenue is excluded from the cash-flow timeline"
                .into(),
        ),
        None => {}
        Some(closing) => {
            let net_price_factor = Decimal::ONE - commission_rate;
            for p in selling {
                let capped = absorption::schedule_capped(
                    Some(closing),
                    p.units(),
                    p.absorption_pace,
                    REVENUE_MONTH_CAP,
                );
                if capped.unabsorbed > Decimal::ZERO {
                    warnings.push(format!(
                        "Product type '{}' does not sell out within {} months; {} unit(s) excluded from the timeline",
                        p.name, REVENUE_MONTH_CAP, capped.unabsorbed
                    ));
                }
                for m in capped.months {
                    let revenue = m.units * p.sales_price_per_unit * net_price_factor;
                    events.push(CashFlowEvent::inflow(
                        m.month,
                        revenue,
                        format!("{} sales", p.name),
                    ));
                }
            }
        }
    }

    let series = CashFlowSeries::build(reference, &events);
    if series.clamped_events() > 0 {
        warnings.push(format!(
            "{} dated event(s) precede the development start and were booked in month 0",
            series.clamped_events()
        ));
    }
    tracing::debug!(months = series.len(), %reference, "proforma timeline built");

    Some(series)
}

fn takedown_label(description: &str) -> String {
    if description.is_empty() {
        "purchase takedown".into()
    } else {
        description.to_string()
    }
}

fn draw_label(description: &str) -> String {
    if description.is_empty() {
        "construction draw".into()
    } else {
        description.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatedAmount;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lots(units: i64, price: Decimal, pace: Decimal) -> ProductType {
        ProductType {
            name: "Lots".into(),
            number_of_units: units,
            sales_price_per_unit: price,
            absorption_pace: pace,
            ..Default::default()
        }
    }

    #[test]
    fn test_pct_zero_guard() {
        assert_eq!(pct(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(pct(dec!(1), dec!(4)), dec!(25));
    }

    #[test]
    fn test_zero_costs_give_zero_roi() {
        let metrics = aggregate(&ProformaInputs::default());
        assert_eq!(metrics.total_costs, Decimal::ZERO);
        assert_eq!(metrics.roi_pct, Decimal::ZERO);
        assert_eq!(metrics.profit_margin_pct, Decimal::ZERO);
        assert_eq!(metrics.gross_margin_pct, Decimal::ZERO);
        assert_eq!(metrics.rona_pct, Decimal::ZERO);
        assert_eq!(metrics.unlevered_irr_pct, None);
    }

    #[test]
    fn test_takedowns_replace_lump_sum_purchase() {
        let input = ProformaInputs {
            purchase_price: dec!(900),
            development_start_date: Some(date(2025, 1, 1)),
            purchase_takedowns: vec![
                DatedAmount {
                    date: Some(date(2025, 1, 10)),
                    amount: dec!(300),
                    description: String::new(),
                },
                DatedAmount {
                    date: Some(date(2025, 4, 10)),
                    amount: dec!(600),
                    description: "Phase 2 takedown".into(),
                },
            ],
            ..Default::default()
        };
        let metrics = aggregate(&input);
        let flows: Vec<Decimal> = metrics.monthly_cash_flows.iter().map(|m| m.amount).collect();
        assert_eq!(
            flows,
            vec![dec!(-300), Decimal::ZERO, Decimal::ZERO, dec!(-600)]
        );
        // Purchase price still counts toward total costs
        assert_eq!(metrics.total_costs, dec!(900));
    }

    #[test]
    fn test_revenue_starts_at_first_closing_net_of_commission() {
        let input = ProformaInputs {
            development_costs: dec!(1000),
            sales_commission_percentage: dec!(10),
            development_start_date: Some(date(2025, 1, 1)),
            first_home_closing: Some(date(2025, 3, 20)),
            product_types: vec![lots(3, dec!(500), dec!(2))],
            ..Default::default()
        };
        let metrics = aggregate(&input);
        let flows: Vec<Decimal> = metrics.monthly_cash_flows.iter().map(|m| m.amount).collect();
        // 2 units * 500 * 0.9 in March, 1 unit in April
        assert_eq!(
            flows,
            vec![dec!(-1000), Decimal::ZERO, dec!(900), dec!(450)]
        );
        assert_eq!(metrics.peak_capital_amount, dec!(1000));
        assert_eq!(metrics.peak_capital_date, Some(date(2025, 1, 1)));
        assert!(metrics.unlevered_irr_pct.is_some());
    }

    #[test]
    fn test_draws_are_additional_outflows() {
        let input = ProformaInputs {
            development_costs: dec!(100),
            development_start_date: Some(date(2025, 1, 1)),
            construction_draws: vec![DatedAmount {
                date: Some(date(2025, 2, 15)),
                amount: dec!(40),
                description: String::new(),
            }],
            ..Default::default()
        };
        let metrics = aggregate(&input);
        let flows: Vec<Decimal> = metrics.monthly_cash_flows.iter().map(|m| m.amount).collect();
        assert_eq!(flows, vec![dec!(-100), dec!(-40)]);
        assert_eq!(metrics.peak_capital_amount, dec!(140));
        assert_eq!(metrics.peak_capital_date, Some(date(2025, 2, 1)));
    }

    #[test]
    fn test_no_dates_skips_timeline_with_warning() {
        let input = ProformaInputs {
            purchase_price: dec!(100),
            product_types: vec![lots(10, dec!(50), dec!(1))],
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let metrics = compute_metrics(&input, &mut warnings);
        assert!(metrics.monthly_cash_flows.is_empty());
        assert_eq!(metrics.reference_month, None);
        assert_eq!(metrics.peak_capital_amount, Decimal::ZERO);
        assert!(warnings.iter().any(|w| w.contains("timeline")));
    }

    #[test]
    fn test_reference_falls_back_to_earliest_event() {
        let input = ProformaInputs {
            first_home_closing: Some(date(2026, 5, 1)),
            construction_draws: vec![DatedAmount {
                date: Some(date(2025, 9, 1)),
                amount: dec!(10),
                description: String::new(),
            }],
            ..Default::default()
        };
        let metrics = aggregate(&input);
        assert_eq!(metrics.reference_month, YearMonth::new(2025, 9));
    }

    #[test]
    fn test_revenue_cap_truncates_with_warning() {
        let input = ProformaInputs {
            development_start_date: Some(date(2025, 1, 1)),
            first_home_closing: Some(date(2025, 1, 1)),
            product_types: vec![lots(300, dec!(10), dec!(1))],
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let metrics = compute_metrics(&input, &mut warnings);
        assert_eq!(metrics.monthly_cash_flows.len(), REVENUE_MONTH_CAP as usize);
        assert!(warnings.iter().any(|w| w.contains("does not sell out")));
        // The roll-up still counts every unit
        assert_eq!(metrics.gross_revenue, dec!(3000));
    }

    #[test]
    fn test_product_summary() {
        let mut p = lots(40, dec!(360000), dec!(4));
        p.average_sqft = Some(dec!(1800));
        let summaries = summarize_products(&[p], dec!(0.03));
        let s = &summaries[0];
        assert_eq!(s.gross_revenue, dec!(14400000));
        assert_eq!(s.net_revenue, dec!(13968000));
        assert_eq!(s.price_per_sqft, Some(dec!(200)));
        assert_eq!(s.months_to_sell, Some(10));
    }

    #[test]
    fn test_run_proforma_warns_on_loss() {
        let input = ProformaInputs {
            purchase_price: dec!(1000),
            ..Default::default()
        };
        let out = run_proforma(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("loss")));
        assert_eq!(out.result.profit, dec!(-1000));
    }
}
