use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, result_of, SERIES_KEYS};

/// Print the scalar fields of a result as a Field/Value table, then every
/// month-by-month array as its own table, then warnings and methodology.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(result) => {
            print_scalars(result);
            for key in SERIES_KEYS {
                if let Some(Value::Array(rows)) = result.get(key) {
                    if !rows.is_empty() {
                        println!("\n{}", key.bold());
                        print_rows(rows);
                    }
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", cell(other, "null")),
    }

    if let Some(envelope) = value.as_object() {
        print_footer(envelope);
    }
}

fn print_scalars(result: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        if SERIES_KEYS.contains(&key.as_str()) {
            continue;
        }
        let rendered = match val {
            Value::Array(items) => items
                .iter()
                .map(|v| cell(v, "null"))
                .collect::<Vec<_>>()
                .join(", "),
            other => cell(other, "null"),
        };
        builder.push_record([key.clone(), rendered]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", cell(item, "null"));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in rows {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(|v| cell(v, "")).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
