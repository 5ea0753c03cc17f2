use serde_json::Value;

use super::scalar;

/// Print just the headline number.
///
/// Looks for well-known fields in the result (and its `comparison`) in order
/// of priority, then falls back to the first field. Per-year runs print one
/// `year: difference` line each.
pub fn print_minimal(value: &Value) {
    if let Value::Array(items) = value {
        for item in items {
            if let Some(year) = item.get("year") {
                let diff = item
                    .pointer("/output/result/comparison/difference_pct")
                    .map(scalar)
                    .or_else(|| item.get("error").map(|e| format!("error: {}", scalar(e))))
                    .unwrap_or_default();
                println!("{}: {}", scalar(year), diff);
            }
        }
        return;
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "difference_pct",
        "real_return_pct",
        "asset_return_pct",
        "cumulative_inflation_pct",
        "normalized",
    ];

    let scopes = [result_obj.get("comparison"), Some(result_obj)];
    for key in &priority_keys {
        for scope in scopes.iter().flatten() {
            if let Some(val) = scope.get(*key) {
                if !val.is_null() {
                    println!("{}", scalar(val));
                    return;
                }
            }
        }
    }

    if let Some((key, val)) = result_obj.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, scalar(val));
        return;
    }

    println!("{}", scalar(result_obj));
}
