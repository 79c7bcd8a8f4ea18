use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{result_body, scalar_text, schedule_rows};

/// Format output as tables: headline fields first, then nested sections and
/// the instalment rows.
pub fn print_table(value: &Value) {
    let body = result_body(value);
    match body {
        Value::Object(map) => print_object(map),
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", scalar_text(body)),
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&str, &Value)> = Vec::new();
    let mut scalars = 0;
    for (key, val) in map {
        match val {
            Value::Object(_) => sections.push((key.as_str(), val)),
            Value::Array(arr) if arr.iter().any(Value::is_object) => {
                sections.push((key.as_str(), val))
            }
            _ => {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalars += 1;
            }
        }
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (title, section) in sections {
        println!("\n{}:", title);
        match section {
            Value::Array(rows) => print_rows(rows),
            Value::Object(inner) => {
                if let Some(rows) = schedule_rows(section) {
                    print_fields(inner, &["items"]);
                    print_rows(rows);
                } else {
                    print_fields(inner, &[]);
                }
            }
            _ => {}
        }
    }
}

fn print_fields(map: &Map<String, Value>, skip: &[&str]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map.iter().filter(|(k, _)| !skip.contains(&k.as_str())) {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows.iter().filter_map(Value::as_object) {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        _ => scalar_text(value),
    }
}
