//! Tolerant numeric parsing for input records.
//!
//! Proforma records are edited by hand in forms, so numeric fields arrive as
//! numbers, numeric strings, formatted strings (`"$1,250,000"`, `"5%"`),
//! empty strings or nulls. Everything is normalised here, at the
//! deserialization boundary, so the engine only ever sees `Decimal`s.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Parse a loosely-typed value as a number. `None` if absent or unparseable.
pub fn to_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%' | '_') && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                parse_decimal(&cleaned)
            }
        }
        _ => None,
    }
}

/// Parse a loosely-typed value as a number, defaulting to zero.
pub fn to_number_or_zero(value: &Value) -> Decimal {
    to_number(value).unwrap_or(Decimal::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Parse a date from `YYYY-MM-DD`, tolerating a trailing time component.
pub fn to_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    let day_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

pub fn money_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_number_or_zero(&value))
}

pub fn opt_money<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_number(&value))
}

/// Whole counts (unit totals). Fractions are truncated; sign is preserved so
/// validation can reject negative counts.
pub fn count_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_number_or_zero(&value).trunc().to_i64().unwrap_or(0))
}

pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_date(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(to_number_or_zero(&json!(1500)), dec!(1500));
        assert_eq!(to_number_or_zero(&json!(2.5)), dec!(2.5));
        assert_eq!(to_number_or_zero(&json!(-40)), dec!(-40));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(to_number_or_zero(&json!("250000")), dec!(250000));
        assert_eq!(to_number_or_zero(&json!(" 7.25 ")), dec!(7.25));
        assert_eq!(to_number_or_zero(&json!("$1,250,000")), dec!(1250000));
        assert_eq!(to_number_or_zero(&json!("5%")), dec!(5));
        assert_eq!(to_number_or_zero(&json!("1e3")), dec!(1000));
    }

    #[test]
    fn test_junk_defaults_to_zero() {
        assert_eq!(to_number_or_zero(&json!("")), Decimal::ZERO);
        assert_eq!(to_number_or_zero(&json!("n/a")), Decimal::ZERO);
        assert_eq!(to_number_or_zero(&Value::Null), Decimal::ZERO);
        assert_eq!(to_number_or_zero(&json!(true)), Decimal::ZERO);
        assert_eq!(to_number_or_zero(&json!([1, 2])), Decimal::ZERO);
        assert_eq!(to_number(&json!("")), None);
    }

    #[test]
    fn test_dates() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(to_date(&json!("2025-06-01")), Some(d));
        assert_eq!(to_date(&json!("2025-06-01T00:00:00Z")), Some(d));
        assert_eq!(to_date(&json!("")), None);
        assert_eq!(to_date(&json!("June")), None);
        assert_eq!(to_date(&Value::Null), None);
    }

    #[derive(Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "money_or_zero")]
        price: Decimal,
        #[serde(default, deserialize_with = "opt_money")]
        rate: Option<Decimal>,
        #[serde(default, deserialize_with = "count_or_zero")]
        units: i64,
        #[serde(default, deserialize_with = "opt_date")]
        start: Option<NaiveDate>,
    }

    #[test]
    fn test_field_deserializers() {
        let r: Record = serde_json::from_value(json!({
            "price": "450,000",
            "rate": "",
            "units": "12.9",
            "start": ""
        }))
        .unwrap();
        assert_eq!(r.price, dec!(450000));
        assert_eq!(r.rate, None);
        assert_eq!(r.units, 12);
        assert_eq!(r.start, None);

        let empty: Record = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.price, Decimal::ZERO);
        assert_eq!(empty.units, 0);
    }
}
