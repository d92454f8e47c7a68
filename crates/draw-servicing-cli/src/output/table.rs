use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_cell, headers, result_object, row_field};

/// Format output as tables: scalar result fields first, then any row set
/// (schedule entries, dispatched rows) as its own table.
pub fn print_table(value: &Value) {
    match value {
        Value::Array(rows) => print_rows(rows),
        Value::Object(_) => {
            if let Some(result) = result_object(value) {
                print_result(result);
            }
            if let Some(envelope) = value.as_object() {
                print_notes(envelope);
            }
        }
        _ => println!("{}", format_cell(value)),
    }
}

fn print_result(result: &Map<String, Value>) {
    let rows = row_field(result);
    let skip = rows.map(|(key, _)| key);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        if Some(key.as_str()) == skip {
            continue;
        }
        // A dispatched payload is usually the interesting part
        if let Some(nested) = val.as_array().filter(|a| a.first().is_some_and(Value::is_object)) {
            builder.push_record([key.as_str(), &format!("{} row(s)", nested.len())]);
            continue;
        }
        builder.push_record([key.as_str(), &format_cell(val)]);
    }
    println!("{}", Table::from(builder));

    if let Some((key, items)) = rows {
        println!("\n{key}:");
        print_rows(items);
    } else if let Some(Value::Array(payload)) = result.get("result_payload") {
        println!("\nresult_payload:");
        print_rows(payload);
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let headers = headers(rows);
    if headers.is_empty() {
        for item in rows {
            println!("{}", format_cell(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(h.as_str()).map(format_cell).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
