//! BSON document encoder.
//!
//! BSON is a little-endian binary format. Every document and array is framed
//! by an `i32` byte length that counts itself and the trailing NUL; the
//! encoder reserves the slot, writes the elements, then patches the length.

use bsonkit_buffers::Writer;
use tracing::{debug, trace};

use crate::constants::ElementType;
use crate::error::EncodeError;
use crate::values::{BinarySubtype, Document, Value};

/// Encodes [`Document`]s to bytes.
///
/// The encoder is stateless; one instance can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder;

impl Encoder {
    pub fn new() -> Self {
        Self
    }

    /// Encodes a document to a fresh byte vector.
    pub fn encode(&self, doc: &Document) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::new();
        self.encode_into(&mut writer, doc)?;
        Ok(writer.flush())
    }

    /// Appends the encoding of `doc` to `writer`.
    ///
    /// On error the writer may hold a partial document; callers that reuse
    /// the writer should [`Writer::reset`] it.
    pub fn encode_into(&self, writer: &mut Writer, doc: &Document) -> Result<(), EncodeError> {
        match write_document(writer, doc) {
            Ok(()) => {
                trace!(len = writer.len(), "encoded BSON document");
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "failed to encode BSON document");
                Err(err)
            }
        }
    }
}

pub(crate) fn write_document(w: &mut Writer, doc: &Document) -> Result<(), EncodeError> {
    let start = w.reserve_i32();
    for (key, value) in doc.iter() {
        write_element(w, key, value)?;
    }
    finish_frame(w, start)
}

pub(crate) fn write_array(w: &mut Writer, items: &[Value]) -> Result<(), EncodeError> {
    let start = w.reserve_i32();
    for (i, value) in items.iter().enumerate() {
        write_element(w, &i.to_string(), value)?;
    }
    finish_frame(w, start)
}

/// Writes the terminator and patches the frame length reserved at `start`.
pub(crate) fn finish_frame(w: &mut Writer, start: usize) -> Result<(), EncodeError> {
    w.u8(0);
    let len = length_i32(w.len() - start)?;
    w.patch_i32(start, len);
    Ok(())
}

pub(crate) fn length_i32(len: usize) -> Result<i32, EncodeError> {
    i32::try_from(len).map_err(|_| EncodeError::ValueTooLarge)
}

/// Writes the tag byte and key. The key is checked before anything is written.
pub(crate) fn write_header(
    w: &mut Writer,
    element_type: ElementType,
    key: &str,
) -> Result<(), EncodeError> {
    check_cstring(key)?;
    w.u8(element_type.as_u8());
    w.cstring(key.as_bytes());
    Ok(())
}

fn check_cstring(s: &str) -> Result<(), EncodeError> {
    if s.as_bytes().contains(&0) {
        debug!(value = ?s, "rejecting C-string with embedded NUL");
        return Err(EncodeError::EmbeddedNulInKeyOrPattern(s.to_owned()));
    }
    Ok(())
}

pub(crate) fn write_element(w: &mut Writer, key: &str, value: &Value) -> Result<(), EncodeError> {
    // Regex C-strings are validated up front so a failure leaves no header behind.
    if let Value::Regex(regex) = value {
        check_cstring(regex.pattern())?;
        check_cstring(regex.flags())?;
    }
    write_header(w, value.element_type(), key)?;
    match value {
        Value::Double(v) => w.f64(*v),
        Value::String(s) | Value::JavaScriptCode(s) | Value::Symbol(s) => write_string(w, s)?,
        Value::Document(doc) => write_document(w, doc)?,
        Value::Array(items) => write_array(w, items)?,
        Value::Binary(bin) => write_binary(w, bin.subtype, &bin.bytes)?,
        Value::Undefined | Value::Null | Value::MinKey | Value::MaxKey => {}
        Value::ObjectId(id) => w.buf(&id.bytes()),
        Value::Bool(b) => w.u8(u8::from(*b)),
        Value::UtcDateTime(dt) => w.i64(dt.timestamp_millis()),
        Value::Regex(regex) => {
            w.cstring(regex.pattern().as_bytes());
            w.cstring(regex.flags().as_bytes());
        }
        Value::DbPointer(ptr) => {
            write_string(w, &ptr.namespace)?;
            w.buf(&ptr.id.bytes());
        }
        Value::JavaScriptCodeWithScope(cws) => {
            let start = w.reserve_i32();
            write_string(w, &cws.code)?;
            write_document(w, &cws.scope)?;
            let len = length_i32(w.len() - start)?;
            w.patch_i32(start, len);
        }
        Value::Int32(v) => w.i32(*v),
        Value::Timestamp(ts) => w.u64(ts.to_u64()),
        Value::Int64(v) => w.i64(*v),
    }
    Ok(())
}

/// Writes a length-prefixed string: `i32` length (bytes + NUL), bytes, NUL.
pub(crate) fn write_string(w: &mut Writer, s: &str) -> Result<(), EncodeError> {
    let len = length_i32(s.len() + 1)?;
    w.i32(len);
    w.buf(s.as_bytes());
    w.u8(0);
    Ok(())
}

/// Writes a binary payload. The legacy subtype repeats the length inside the payload.
pub(crate) fn write_binary(
    w: &mut Writer,
    subtype: BinarySubtype,
    bytes: &[u8],
) -> Result<(), EncodeError> {
    let inner = length_i32(bytes.len())?;
    if subtype == BinarySubtype::BINARY_OLD {
        let outer = inner.checked_add(4).ok_or(EncodeError::ValueTooLarge)?;
        w.i32(outer);
        w.u8(subtype.0);
        w.i32(inner);
    } else {
        w.i32(inner);
        w.u8(subtype.0);
    }
    w.buf(bytes);
    Ok(())
}

/// Validates a regex for writing outside of [`write_element`].
pub(crate) fn check_regex(pattern: &str, flags: &str) -> Result<(), EncodeError> {
    check_cstring(pattern)?;
    check_cstring(flags)
}
