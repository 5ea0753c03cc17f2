use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, scalar, year_rows, YEAR_HEADERS};

/// Format output as tables: a field/value summary, the monthly breakdown
/// when present, then warnings and methodology.
pub fn print_table(value: &Value) {
    if let Some(rows) = year_rows(value) {
        let mut builder = Builder::default();
        builder.push_record(YEAR_HEADERS);
        for row in rows {
            builder.push_record(row);
        }
        println!("{}", Table::from(builder));
        return;
    }

    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_field_table(result);
                if let Some(Value::Array(months)) = result.get("months") {
                    print_months(months);
                }
                print_envelope(map);
            }
            None => print_field_table(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_field_table(value: &Value) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(value) {
        builder.push_record([key, scalar(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_months(months: &[Value]) {
    if months.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Month", "Rate %", "Trading days", "Daily rate"]);
    for m in months {
        let month = match (m.pointer("/month/year"), m.pointer("/month/month")) {
            (Some(y), Some(mo)) => format!("{}-{:0>2}", scalar(y), scalar(mo)),
            _ => String::new(),
        };
        builder.push_record([
            month,
            m.get("monthly_rate_pct").map(scalar).unwrap_or_default(),
            m.get("trading_days").map(scalar).unwrap_or_default(),
            m.get("daily_rate").map(scalar).unwrap_or_default(),
        ]);
    }
    println!("\n{}", Table::from(builder));
}

fn print_envelope(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if arr.first().map_or(false, Value::is_object) {
        let headers: Vec<String> = flatten(&arr[0]).into_iter().map(|(k, _)| k).collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());
        for item in arr {
            let flat = flatten(item);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    flat.iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| scalar(v))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(row);
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar(item));
        }
    }
}
