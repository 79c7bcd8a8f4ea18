use serde_json::Value;

use super::{result_body, scalar_text};

/// Headline figures, most specific first
const PRIORITY_KEYS: [&str; 6] = [
    "rpmn",
    "total_payoff_amount",
    "value",
    "total_monthly_payment",
    "monthly_payment",
    "total_cost",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let body = result_body(value);
    match find_headline(body) {
        Some(val) => println!("{}", scalar_text(val)),
        None => println!("{}", scalar_text(body)),
    }
}

/// First priority key holding a scalar, searching one level into nested
/// objects so a quote resolves to its RPMN.
fn find_headline(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    for key in PRIORITY_KEYS {
        match map.get(key) {
            Some(Value::Null) | None => continue,
            Some(nested @ Value::Object(_)) => {
                if let Some(inner) = nested.get(key).filter(|v| !v.is_object()) {
                    return Some(inner);
                }
            }
            Some(val) => return Some(val),
        }
    }
    None
}
