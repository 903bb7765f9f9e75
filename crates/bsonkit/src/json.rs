//! Relaxed extended JSON rendering of decoded documents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Number};

use crate::values::{Document, Value};

/// Largest integer magnitude a JSON double holds exactly.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Renders `doc` as relaxed extended JSON, keeping key order.
///
/// Duplicate keys collapse to the last value, since a JSON object cannot
/// hold them.
pub fn to_relaxed_json(doc: &Document) -> serde_json::Value {
    serde_json::Value::Object(object(doc))
}

fn object(doc: &Document) -> Map<String, serde_json::Value> {
    doc.iter()
        .map(|(key, value)| (key.to_owned(), value_to_json(value)))
        .collect()
}

fn number_long(n: i64) -> serde_json::Value {
    json!({ "$numberLong": n.to_string() })
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Double(v) => match Number::from_f64(*v) {
            Some(n) => serde_json::Value::Number(n),
            None => {
                let text = if v.is_nan() {
                    "NaN"
                } else if *v > 0.0 {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                json!({ "$numberDouble": text })
            }
        },
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Document(doc) => to_relaxed_json(doc),
        Value::Array(items) => items.iter().map(value_to_json).collect(),
        Value::Binary(bin) => json!({
            "$binary": {
                "base64": STANDARD.encode(&bin.bytes),
                "subType": format!("{:02x}", bin.subtype.0),
            }
        }),
        Value::Undefined => json!({ "$undefined": true }),
        Value::ObjectId(id) => json!({ "$oid": id.to_string() }),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::UtcDateTime(dt) => json!({ "$date": number_long(dt.timestamp_millis()) }),
        Value::Null => serde_json::Value::Null,
        Value::Regex(regex) => json!({
            "$regularExpression": {
                "pattern": regex.pattern(),
                "options": regex.flags(),
            }
        }),
        Value::DbPointer(ptr) => json!({
            "$dbPointer": {
                "$ref": ptr.namespace,
                "$id": { "$oid": ptr.id.to_string() },
            }
        }),
        Value::JavaScriptCode(code) => json!({ "$code": code }),
        Value::Symbol(symbol) => json!({ "$symbol": symbol }),
        Value::JavaScriptCodeWithScope(cws) => json!({
            "$code": cws.code,
            "$scope": to_relaxed_json(&cws.scope),
        }),
        Value::Int32(v) => serde_json::Value::from(*v),
        Value::Timestamp(ts) => json!({ "$timestamp": { "t": ts.time, "i": ts.increment } }),
        Value::Int64(v) if v.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => {
            serde_json::Value::from(*v)
        }
        Value::Int64(v) => number_long(*v),
        Value::MinKey => json!({ "$minKey": 1 }),
        Value::MaxKey => json!({ "$maxKey": 1 }),
    }
}
