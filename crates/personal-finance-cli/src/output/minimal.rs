use serde_json::Value;

use super::scalar_text;

/// The headline figure of each kernel, in lookup order.
const PRIORITY_KEYS: [&str; 9] = [
    "emi",
    "maturity_value",
    "final_value",
    "required_monthly_contribution",
    "total_tax",
    "buy_advantage",
    "xirr",
    "total_return_pct",
    "total_interest",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

/// Looks for a known headline field in the result (or one level down, for
/// nested sections such as `tax`), then falls back to the first field.
fn headline(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return scalar_text(result_obj);
    };

    let nested = map.values().filter_map(Value::as_object);
    let found = PRIORITY_KEYS.iter().find_map(|key| {
        std::iter::once(map)
            .chain(nested.clone())
            .find_map(|m| m.get(*key).filter(|v| !v.is_null()))
    });
    if let Some(val) = found {
        return scalar_text(val);
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, scalar_text(val)),
        None => String::new(),
    }
}
