pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted keys. Arrays of objects collapse to a
/// row count so chart points and month breakdowns do not swamp summaries.
pub(crate) fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    if let Value::Object(map) = value {
        flatten_into("", map, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten_into(&name, inner, out),
            Value::Array(items) if items.first().map_or(false, Value::is_object) => {
                out.push((name, Value::String(format!("{} rows", items.len()))));
            }
            _ => out.push((name, val.clone())),
        }
    }
}

/// Rows of a per-year comparison, if `value` is one.
pub(crate) fn year_rows(value: &Value) -> Option<Vec<Vec<String>>> {
    let items = value.as_array()?;
    let is_outcome =
        |i: &Value| i.get("year").is_some() && (i.get("output").is_some() || i.get("error").is_some());
    if items.is_empty() || !items.iter().all(is_outcome) {
        return None;
    }
    let rows = items
        .iter()
        .map(|item| {
            let cmp = item.pointer("/output/result/comparison");
            let field = |key: &str| {
                cmp.and_then(|c| c.get(key))
                    .map(scalar)
                    .unwrap_or_default()
            };
            vec![
                item.get("year").map(scalar).unwrap_or_default(),
                field("asset_return_pct"),
                field("inflation_return_pct"),
                field("difference_pct"),
                field("real_return_pct"),
                field("observations"),
                item.get("error").map(scalar).unwrap_or_default(),
            ]
        })
        .collect();
    Some(rows)
}

pub(crate) const YEAR_HEADERS: [&str; 7] = [
    "year",
    "asset_return_pct",
    "inflation_return_pct",
    "difference_pct",
    "real_return_pct",
    "observations",
    "error",
];

pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(scalar).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
