pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Result fields holding per-period or per-entry rows, in preference order.
const SCHEDULE_KEYS: [&str; 8] = [
    "detailed_flows",
    "trace",
    "yearly_flows",
    "assessments",
    "transactions",
    "daily_totals",
    "progress",
    "items",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The first schedule-like array of objects in a result, with its key.
pub(crate) fn primary_schedule(result: &Map<String, Value>) -> Option<(&str, &[Value])> {
    SCHEDULE_KEYS.iter().find_map(|key| match result.get(*key) {
        Some(Value::Array(rows)) if rows.first().is_some_and(Value::is_object) => {
            Some((*key, rows.as_slice()))
        }
        _ => None,
    })
}

/// Scalar rendering shared by the text formatters.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
