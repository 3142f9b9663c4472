use serde_json::Value;

/// Headline figures, as JSON pointers into the result, in priority order.
const PRIORITY_POINTERS: [&str; 7] = [
    "/metrics/noi",
    "/construction_loan_amount",
    "/after_refinance/monthly_payment",
    "/total_monthly",
    "/summary/operating_monthly",
    "/total_distributed",
    "/noi",
];

/// Print just the key answer value from the output.
///
/// Row lists print one compact line per row; objects print the first
/// headline figure found, falling back to their first field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(rows) => {
            for row in rows {
                println!("{}", format_row(row));
            }
        }
        Value::Object(map) => {
            let headline = PRIORITY_POINTERS
                .iter()
                .filter_map(|ptr| result.pointer(ptr))
                .find(|v| !v.is_null());
            match (headline, map.iter().next()) {
                (Some(val), _) => println!("{}", format_minimal(val)),
                (None, Some((key, val))) => println!("{}: {}", key, format_minimal(val)),
                (None, None) => {}
            }
        }
        _ => println!("{}", format_minimal(result)),
    }
}

/// First two fields of a row, space separated.
fn format_row(row: &Value) -> String {
    match row {
        Value::Object(map) => map
            .values()
            .take(2)
            .map(format_minimal)
            .collect::<Vec<_>>()
            .join(" "),
        other => format_minimal(other),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
