use serde_json::Value;

use super::scalar_text;

/// Print just the headline figure of a result.
///
/// Looks for well-known result fields in priority order, then falls back to
/// the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "present_value",
        "npv",
        "payback_period",
        "wacc",
        "enterprise_value",
        "net_amount",
        "total_amount",
        "total_spent",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            match map.get(*key) {
                // An unrecovered payback is still the answer.
                Some(Value::Null) if *key == "payback_period" => {
                    println!("not recovered");
                    return;
                }
                Some(val) if !val.is_null() => {
                    match map.get("irr").and_then(|irr| irr.get("rate_rounded")) {
                        Some(irr) if *key == "npv" => {
                            println!("{} (irr {})", scalar_text(val), scalar_text(irr))
                        }
                        _ => println!("{}", scalar_text(val)),
                    }
                    return;
                }
                _ => {}
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar_text(val));
            return;
        }
    }

    println!("{}", scalar_text(result_obj));
}
