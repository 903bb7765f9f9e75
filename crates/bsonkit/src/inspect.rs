//! Human-readable document dump.

use std::fmt::{self, Write};

use bsonkit_buffers::print_octets;

use crate::values::{Document, Value};

/// Writes one line per element as `key (TYPE): value`, nesting documents
/// and arrays two spaces deeper per level.
pub fn dump<W: Write>(doc: &Document, indent: usize, out: &mut W) -> fmt::Result {
    for (key, value) in doc.iter() {
        dump_element(key, value, indent, out)?;
    }
    Ok(())
}

fn dump_element<W: Write>(key: &str, value: &Value, indent: usize, out: &mut W) -> fmt::Result {
    let pad = indent * 2;
    write!(out, "{:pad$}{key} ({})", "", value.element_type().name())?;
    match value {
        Value::Document(doc) => {
            writeln!(out, ":")?;
            dump(doc, indent + 1, out)
        }
        Value::Array(items) => {
            writeln!(out, ": [{}]", items.len())?;
            for (i, item) in items.iter().enumerate() {
                dump_element(&i.to_string(), item, indent + 1, out)?;
            }
            Ok(())
        }
        Value::JavaScriptCodeWithScope(cws) => {
            writeln!(out, ": {:?}", cws.code)?;
            dump(&cws.scope, indent + 1, out)
        }
        other => {
            write!(out, ": ")?;
            scalar(other, out)?;
            writeln!(out)
        }
    }
}

fn scalar<W: Write>(value: &Value, out: &mut W) -> fmt::Result {
    match value {
        Value::Double(v) => write!(out, "{v}"),
        Value::String(s) | Value::JavaScriptCode(s) | Value::Symbol(s) => write!(out, "{s:?}"),
        Value::Binary(bin) => {
            write!(out, "subtype 0x{:02x}, {} bytes", bin.subtype.0, bin.bytes.len())?;
            if !bin.bytes.is_empty() {
                write!(out, ": {}", print_octets(&bin.bytes, 16))?;
            }
            Ok(())
        }
        Value::ObjectId(id) => write!(out, "{id}"),
        Value::Bool(b) => write!(out, "{b}"),
        Value::UtcDateTime(dt) => write!(out, "{} ms", dt.timestamp_millis()),
        Value::Regex(regex) => write!(out, "{regex}"),
        Value::DbPointer(ptr) => write!(out, "{:?} {}", ptr.namespace, ptr.id),
        Value::Int32(v) => write!(out, "{v}"),
        Value::Int64(v) => write!(out, "{v}"),
        Value::Timestamp(ts) => write!(out, "time {}, increment {}", ts.time, ts.increment),
        Value::Undefined => out.write_str("undefined"),
        Value::Null => out.write_str("null"),
        Value::MinKey => out.write_str("min"),
        Value::MaxKey => out.write_str("max"),
        Value::Document(_) | Value::Array(_) | Value::JavaScriptCodeWithScope(_) => Ok(()),
    }
}
