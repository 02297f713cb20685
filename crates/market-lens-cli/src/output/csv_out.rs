use serde_json::{Map, Value};
use std::io;

use super::{is_record_list, result_of, scalar_text};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write the result as CSV to stdout.
///
/// Record lists are written one row per record. An object result is written
/// through its first record list (distribution, white space...) when it has
/// one, and as `field,value` pairs otherwise.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_of(value) {
        Value::Array(arr) => write_records(&mut wtr, arr),
        Value::Object(map) => match first_record_list(map) {
            Some(records) => write_records(&mut wtr, records),
            None => write_fields(&mut wtr, map),
        },
        other => {
            let _ = wtr.write_record([scalar_text(other, "")]);
        }
    }

    let _ = wtr.flush();
}

fn first_record_list(map: &Map<String, Value>) -> Option<&[Value]> {
    map.values().find_map(|v| match v {
        Value::Array(arr) if is_record_list(v) => Some(arr.as_slice()),
        _ => None,
    })
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &scalar_text(val, "")]);
    }
}

fn write_records(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([scalar_text(item, "")]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| scalar_text(v, "")).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
