#![cfg(feature = "proforma")]

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proforma_core::proforma::financing::FinancingMethod;
use proforma_core::proforma::{aggregate, run_proforma, ProductType, ProformaInputs};
use proforma_core::types::DatedAmount;
use proforma_core::ProformaError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

// ===========================================================================
// Proforma roll-up, timeline and envelope tests
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 100 lots at $50k, $20k direct cost, $5k permit, 5 sales a month.
fn subdivision() -> ProformaInputs {
    ProformaInputs {
        purchase_price: dec!(1000000),
        development_costs: dec!(2000000),
        soft_costs: dec!(200000),
        contingency_percentage: dec!(5),
        sales_commission_percentage: dec!(3),
        product_types: vec![ProductType {
            name: "Single family lots".into(),
            number_of_units: 100,
            sales_price_per_unit: dec!(50000),
            direct_cost_per_unit: dec!(20000),
            building_permit_cost: dec!(5000),
            absorption_pace: dec!(5),
            average_sqft: None,
        }],
        ..Default::default()
    }
}

#[test]
fn test_cost_and_revenue_rollup() {
    let m = aggregate(&subdivision());

    assert_eq!(m.gross_revenue, dec!(5000000));
    assert_eq!(m.total_direct_costs, dec!(2000000));
    assert_eq!(m.total_permit_costs, dec!(500000));
    // (1,000,000 + 2,000,000 + 200,000 + 2,000,000 + 500,000) * 5%
    assert_eq!(m.contingency, dec!(285000));
    assert_eq!(m.financing_costs, Decimal::ZERO);
    assert_eq!(m.total_costs, dec!(5985000));
    assert_eq!(m.sales_commission, dec!(150000));
    assert_eq!(m.net_revenue, dec!(4850000));
    assert_eq!(m.profit, dec!(-1135000));
}

#[test]
fn test_ratios() {
    let m = aggregate(&subdivision());

    let roi = dec!(-1135000) / dec!(5985000) * dec!(100);
    assert_eq!(m.roi_pct, roi);
    assert_eq!(m.profit_margin_pct, dec!(-22.7));
    // (5,000,000 - 5,985,000) / 5,000,000
    assert_eq!(m.gross_margin_pct, dec!(-19.7));
    // No financing, so RONA shares ROI's denominator
    assert_eq!(m.rona_pct, roi);
}

#[test]
fn test_zero_total_costs_roi_is_zero() {
    let input = ProformaInputs {
        product_types: vec![ProductType {
            name: "Gifted lots".into(),
            number_of_units: 10,
            sales_price_per_unit: dec!(1000),
            absorption_pace: dec!(1),
            ..Default::default()
        }],
        ..Default::default()
    };
    let m = aggregate(&input);
    assert_eq!(m.total_costs, Decimal::ZERO);
    assert_eq!(m.roi_pct, Decimal::ZERO);
    assert_eq!(m.rona_pct, Decimal::ZERO);
    assert_eq!(m.profit_margin_pct, dec!(100));
}

#[test]
fn test_dated_scenario_timeline() {
    let mut input = subdivision();
    input.development_start_date = Some(date(2025, 1, 15));
    input.first_home_closing = Some(date(2026, 1, 10));

    let m = aggregate(&input);

    // Month 0 carries every undated cost; 20 months of sales start in month 12.
    assert_eq!(m.monthly_cash_flows.len(), 32);
    assert_eq!(m.monthly_cash_flows[0].amount, dec!(-5985000));
    assert_eq!(m.monthly_cash_flows[12].amount, dec!(242500));
    assert_eq!(m.monthly_cash_flows[31].amount, dec!(242500));
    assert_eq!(m.monthly_cash_flows[31].cumulative, dec!(-1135000));

    assert_eq!(m.peak_capital_amount, dec!(5985000));
    assert_eq!(m.peak_capital_date, Some(date(2025, 1, 1)));

    // A loss-making project has a negative IRR
    let irr = m.unlevered_irr_pct.expect("IRR should converge");
    assert!(irr < Decimal::ZERO && irr > dec!(-50), "got {irr}");
}

#[test]
fn test_profitable_scenario_positive_irr() {
    let mut input = subdivision();
    input.product_types[0].sales_price_per_unit = dec!(90000);
    input.development_start_date = Some(date(2025, 1, 1));
    input.first_home_closing = Some(date(2025, 10, 1));

    let m = aggregate(&input);
    assert!(m.profit > Decimal::ZERO);
    let irr = m.unlevered_irr_pct.expect("IRR should converge");
    assert!(irr > Decimal::ZERO && irr < dec!(200), "got {irr}");
}

#[test]
fn test_draw_weighted_financing_in_total_costs() {
    let mut input = subdivision();
    input.loan_interest_rate = dec!(6);
    input.loan_term_months = Some(dec!(24));
    input.development_completion_date = Some(date(2026, 1, 1));
    input.construction_draws = vec![
        DatedAmount {
            date: Some(date(2025, 1, 1)),
            amount: dec!(1000000),
            description: "Draw 1".into(),
        },
        DatedAmount {
            date: Some(date(2025, 7, 1)),
            amount: dec!(1000000),
            description: "Draw 2".into(),
        },
    ];

    let m = aggregate(&input);
    // 1,000,000 * 6% * 12/12 + 1,000,000 * 6% * 6/12 (flat would be 240,000)
    assert_eq!(m.financing_method, FinancingMethod::DrawWeighted);
    assert_eq!(m.financing_costs, dec!(90000));
    assert_eq!(m.total_costs, dec!(6075000));
    // Financing is excluded from the RONA base
    assert_eq!(
        m.rona_pct,
        m.profit / dec!(5985000) * dec!(100)
    );
}

#[test]
fn test_flat_rate_financing_without_draws() {
    let mut input = subdivision();
    input.loan_interest_rate = dec!(6);
    input.loan_term_months = Some(dec!(24));

    let m = aggregate(&input);
    assert_eq!(m.financing_method, FinancingMethod::FlatRate);
    assert_eq!(m.financing_costs, dec!(240000));
}

#[test]
fn test_manual_financing_override() {
    let mut input = subdivision();
    input.financing_costs = Some(dec!(123456));

    let m = aggregate(&input);
    assert_eq!(m.financing_method, FinancingMethod::ManualOverride);
    assert_eq!(m.financing_costs, dec!(123456));
}

#[test]
fn test_tolerant_json_record() {
    let input: ProformaInputs = serde_json::from_value(json!({
        "purchase_price": "$1,000,000",
        "development_costs": "2000000",
        "soft_costs": 200000,
        "financing_costs": "",
        "loan_interest_rate": "",
        "contingency_percentage": "5",
        "sales_commission_percentage": 3,
        "product_types": [{
            "name": "Single family lots",
            "number_of_units": "100",
            "sales_price_per_unit": "50000",
            "direct_cost_per_unit": "20,000",
            "building_permit_cost": 5000,
            "absorption_pace": "5",
            "average_sqft": null
        }],
        "development_start_date": "",
        "first_home_closing": null
    }))
    .unwrap();

    assert_eq!(input, subdivision());
}

#[test]
fn test_run_proforma_envelope() {
    let out = run_proforma(&subdivision()).unwrap();
    assert_eq!(
        out.methodology,
        "Land Development Proforma (monthly unlevered cash flows)"
    );
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert!(out.warnings.iter().any(|w| w.contains("loss")));
    assert!(out.warnings.iter().any(|w| w.contains("timeline")));
    assert_eq!(out.result.total_costs, dec!(5985000));
}

#[test]
fn test_run_proforma_rejects_negative_pace() {
    let mut input = subdivision();
    input.product_types[0].absorption_pace = dec!(-5);
    match run_proforma(&input).unwrap_err() {
        ProformaError::InvalidInput { field, .. } => {
            assert_eq!(field, "product_types[0].absorption_pace");
        }
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_metrics_serialize_dates_and_months() {
    let mut input = subdivision();
    input.development_start_date = Some(date(2025, 3, 5));
    input.first_home_closing = Some(date(2025, 9, 1));
    let value = serde_json::to_value(aggregate(&input)).unwrap();
    assert_eq!(value["reference_month"], json!("2025-03"));
    assert_eq!(value["peak_capital_date"], json!("2025-03-01"));
    assert_eq!(value["financing_method"], json!("unavailable"));
}

#[test]
fn test_draw_rows_with_blank_or_timestamped_dates() {
    let input: ProformaInputs = serde_json::from_value(json!({
        "development_costs": "500",
        "development_start_date": "2025-01-01",
        "construction_draws": [
            { "date": "", "amount": "1000" },
            { "date": "2025-02-01T00:00:00Z", "amount": "250" }
        ]
    }))
    .unwrap();

    assert_eq!(input.construction_draws[0].date, None);
    assert_eq!(input.construction_draws[1].date, Some(date(2025, 2, 1)));

    let out = run_proforma(&input).unwrap();
    let flows: Vec<Decimal> = out
        .result
        .monthly_cash_flows
        .iter()
        .map(|m| m.amount)
        .collect();
    assert_eq!(flows, vec![dec!(-500), dec!(-250)]);
    assert!(out.warnings.iter().any(|w| w.contains("no valid date")));
}
