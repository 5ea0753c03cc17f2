use serde_json::Value;
use std::io;

use super::{flatten, scalar, year_rows, YEAR_HEADERS};

/// Write output as CSV to stdout.
///
/// A comparison or amortization writes its dated points (one row per trading
/// day); per-year runs write one row per year; anything else falls back to
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = year_rows(value) {
        let _ = wtr.write_record(YEAR_HEADERS);
        for row in rows {
            let _ = wtr.write_record(&row);
        }
    } else if let Some(Value::Array(points)) = value
        .pointer("/result/comparison/points")
        .or_else(|| value.pointer("/result/points"))
    {
        write_array_csv(&mut wtr, points);
    } else {
        match value {
            Value::Object(map) => {
                let body = map.get("result").unwrap_or(value);
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten(body) {
                    let _ = wtr.write_record([key, scalar(&val)]);
                }
            }
            Value::Array(arr) => write_array_csv(&mut wtr, arr),
            _ => {
                let _ = wtr.write_record([scalar(value)]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([scalar(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
