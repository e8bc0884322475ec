use serde_json::Value;

/// Headline answer per command, in priority order: the ceiling for
/// `ceiling`, the winner for `compare`, then the evaluation metrics.
const PRIORITY_KEYS: [&str; 4] = ["ceiling_cost", "best_scheme", "project_irr", "min_dscr"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = PRIORITY_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|val| !val.is_null())
        {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Schedule output is a bare array: print the final year
    if let Value::Array(rows) = result_obj {
        if let Some(last) = rows.last() {
            println!("{}", format_minimal(last));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
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
