use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar_text;

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into one Field/Value table; nested objects and
/// row arrays (schedules, yearly tables, lots) each get a table of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_tables(result, map);
            } else {
                print_fields(map);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Value, envelope: &Map<String, Value>) {
    let Value::Object(res_map) = result else {
        print_fields(envelope);
        return;
    };

    let scalars: Map<String, Value> = res_map
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    print_fields(&scalars);

    for (key, val) in res_map {
        match val {
            Value::Object(nested) => {
                println!("\n{}:", heading(key));
                if nested.values().all(Value::is_object) {
                    print_keyed_rows(nested);
                } else {
                    print_fields(nested);
                }
            }
            Value::Array(rows) if !rows.is_empty() => {
                println!("\n{}:", heading(key));
                print_rows(rows);
            }
            _ => {}
        }
    }

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

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &scalar_text(val)]);
    }
    println!("{}", Table::from(builder));
}

/// A map of objects, e.g. allocation by asset class: one row per key.
fn print_keyed_rows(map: &Map<String, Value>) {
    let Some(Value::Object(first)) = map.values().next() else {
        return;
    };
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(columns.iter().cloned());
    builder.push_record(header);

    for (key, val) in map {
        let mut row = vec![key.clone()];
        row.extend(
            columns
                .iter()
                .map(|c| val.get(c.as_str()).map(scalar_text).unwrap_or_default()),
        );
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr.iter().filter_map(Value::as_object) {
            let row: Vec<String> = headers
                .iter()
                .map(|h| item.get(h.as_str()).map(scalar_text).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar_text(item));
        }
    }
}

fn heading(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}
