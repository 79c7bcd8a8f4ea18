use serde_json::{Map, Value};
use std::io;

use super::{result_body, scalar_text, schedule_rows};

/// Write output as CSV to stdout.
///
/// Schedules become one row per instalment; anything else is written as
/// `field,value` pairs with nested keys joined by dots.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let body = result_body(value);

    if let Some(rows) = schedule_rows(body) {
        write_rows(&mut wtr, rows);
    } else if let Value::Object(map) = body {
        let _ = wtr.write_record(["field", "value"]);
        write_fields(&mut wtr, "", map);
    } else {
        let _ = wtr.write_record([scalar_text(body)]);
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for row in rows.iter().filter_map(Value::as_object) {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(scalar_text).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&cells);
    }
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, prefix: &str, map: &Map<String, Value>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => write_fields(wtr, &name, inner),
            _ => {
                let _ = wtr.write_record([name.as_str(), &scalar_text(val)]);
            }
        }
    }
}
