use serde_json::{Map, Value};
use std::io;

use super::{primary_schedule, scalar_text};

/// Write output as CSV to stdout.
///
/// Results with a schedule (discounted flows, payback trace, projection
/// years, transactions, ...) are written one row per entry; anything else
/// becomes a two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match primary_schedule(result) {
                Some((_, rows)) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&scalar_text(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &scalar_text(val)]);
    }
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([&scalar_text(item)]);
        }
        return;
    };

    // Nested arrays (per-year line items) do not fit a flat row.
    let headers: Vec<&str> = first
        .iter()
        .filter(|(_, v)| !v.is_array())
        .map(|(k, _)| k.as_str())
        .collect();
    let _ = wtr.write_record(&headers);

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
