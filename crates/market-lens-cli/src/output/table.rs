use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{is_record_list, result_of, scalar_text};

/// Render the result as tables: scalar fields in a Field/Value table, each
/// record list (distribution, white space, priorities) as its own table.
pub fn print_table(value: &Value) {
    let result = result_of(value);
    match result {
        Value::Object(map) => print_sections(map, ""),
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", scalar_text(result, "null")),
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_sections(map: &Map<String, Value>, prefix: &str) {
    let mut fields = Vec::new();
    let mut lists = Vec::new();
    flatten(map, prefix, &mut fields, &mut lists);

    if !fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &fields {
            builder.push_record([key.as_str(), val.as_str()]);
        }
        println!("{}", Table::from(builder));
    }

    for (key, records) in lists {
        println!("\n{key}:");
        print_records(records);
    }
}

/// Split an object into dotted scalar fields and named record lists.
fn flatten<'a>(
    map: &'a Map<String, Value>,
    prefix: &str,
    fields: &mut Vec<(String, String)>,
    lists: &mut Vec<(String, &'a [Value])>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(inner, &name, fields, lists),
            Value::Array(arr) if is_record_list(val) => lists.push((name, arr.as_slice())),
            _ => fields.push((name, scalar_text(val, "-"))),
        }
    }
}

fn print_records(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        // nested record lists get their own tables below
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| !is_record_list(v) && v.as_array().map_or(true, |a| !a.is_empty()))
            .map(|(k, _)| k.clone())
            .collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(|v| scalar_text(v, "-")).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));

        for item in arr {
            if let Value::Object(map) = item {
                let label = map
                    .get("label")
                    .or_else(|| map.get("entity_id"))
                    .map(|v| scalar_text(v, "-"));
                for (key, val) in map {
                    if let Value::Array(inner) = val {
                        if is_record_list(val) {
                            println!("\n{} / {key}:", label.as_deref().unwrap_or("-"));
                            print_records(inner);
                        }
                    }
                }
            }
        }
    } else {
        for item in arr {
            println!("{}", scalar_text(item, "null"));
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
