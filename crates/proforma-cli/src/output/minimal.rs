use serde_json::Value;

use super::{cell, result_of};

/// Headline figure of each command, in priority order.
const HEADLINE_KEYS: [&str; 8] = [
    "unlevered_irr_pct",
    "irr_pct",
    "profit",
    "grand_total",
    "absorbed_units",
    "peak_capital_amount",
    "amount",
    "net_cash_flow",
];

/// Print just the headline number of a result.
///
/// A proforma with an indeterminate IRR falls through to its profit; a
/// result with none of the known keys prints its first field.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = result_of(value);
    let Value::Object(map) = result else {
        return cell(result, "null");
    };

    for key in HEADLINE_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return cell(val, "null");
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, cell(val, "null")),
        None => String::new(),
    }
}
