use serde_json::{Map, Value};

use super::{result_of, scalar_text};

/// Headline fields, searched in order at the top level and one level down.
const PRIORITY_KEYS: [&str; 4] = ["top3_share", "composite_score", "target_share", "situation"];

/// Print just the key answer from the output.
///
/// Record lists print one `entity_id<TAB>priority_label` (or share) line per
/// record; objects print the first headline field found.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    match result {
        Value::Array(arr) => print_ranked(arr),
        Value::Object(map) => {
            if let Some(val) = find_headline(map) {
                println!("{}", scalar_text(val, "null"));
            } else if let Some(arr) = map.values().find_map(|v| v.as_array().filter(|a| !a.is_empty())) {
                print_ranked(arr);
            } else if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, scalar_text(val, "null"));
            }
        }
        _ => println!("{}", scalar_text(result, "null")),
    }
}

fn find_headline(map: &Map<String, Value>) -> Option<&Value> {
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return Some(val);
        }
        let nested = map
            .values()
            .filter_map(Value::as_object)
            .find_map(|inner| inner.get(key).filter(|v| !v.is_null()));
        if nested.is_some() {
            return nested;
        }
    }
    None
}

fn print_ranked(arr: &[Value]) {
    for item in arr {
        let Some(map) = item.as_object() else {
            println!("{}", scalar_text(item, "null"));
            continue;
        };
        let id = map.get("entity_id").map(|v| scalar_text(v, "-")).unwrap_or_default();
        let detail = map
            .get("priority_label")
            .or_else(|| map.get("target_share"))
            .or_else(|| map.get("share"))
            .map(|v| scalar_text(v, "-"))
            .unwrap_or_default();
        println!("{id}\t{detail}");
    }
}
