//! Incremental document construction without an intermediate [`Document`].
//!
//! [`Document`]: crate::Document

use bsonkit_buffers::Writer;
use tracing::trace;

use crate::constants::ElementType;
use crate::encoder::{
    check_regex, finish_frame, length_i32, write_binary, write_document, write_element,
    write_header, write_string,
};
use crate::error::EncodeError;
use crate::raw::RawDocument;
use crate::values::{
    canonical_flags, BinarySubtype, DateTime, Document, ObjectId, Timestamp, Value,
};

/// Appends elements straight into an output buffer.
///
/// The length prefix is patched by [`DocumentBuilder::finish`], which
/// consumes the builder, so a finished document cannot be appended to.
/// A failed append leaves the buffer as it was before the call.
///
/// ```
/// use bsonkit::{Decoder, DocumentBuilder};
///
/// let mut b = DocumentBuilder::new();
/// b.append_int32("int32", 1984)?.append_string("hello", "world")?;
/// let bytes = b.finish()?;
///
/// let doc = Decoder::new().decode(&bytes)?;
/// assert_eq!(doc.get("int32").and_then(|v| v.as_i32()), Some(1984));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    writer: Writer,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut writer = Writer::with_capacity(capacity);
        writer.reserve_i32();
        Self { writer }
    }

    /// Size the document will have once finished.
    pub fn len(&self) -> usize {
        self.writer.len() + 1
    }

    /// `true` while no element has been appended.
    pub fn is_empty(&self) -> bool {
        self.writer.len() == 4
    }

    /// Drops all appended elements.
    pub fn reset(&mut self) {
        self.writer.reset();
        self.writer.reserve_i32();
    }

    /// Terminates the document and returns its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, EncodeError> {
        finish_frame(&mut self.writer, 0)?;
        trace!(len = self.writer.len(), "finished BSON document");
        Ok(self.writer.flush())
    }

    /// Runs `body` and rolls the buffer back if it fails.
    fn append(
        &mut self,
        body: impl FnOnce(&mut Writer) -> Result<(), EncodeError>,
    ) -> Result<&mut Self, EncodeError> {
        let mark = self.writer.len();
        if let Err(err) = body(&mut self.writer) {
            self.writer.uint8.truncate(mark);
            return Err(err);
        }
        Ok(self)
    }

    pub fn append_value(&mut self, key: &str, value: &Value) -> Result<&mut Self, EncodeError> {
        self.append(|w| write_element(w, key, value))
    }

    pub fn append_double(&mut self, key: &str, value: f64) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Double, key)?;
            w.f64(value);
            Ok(())
        })
    }

    pub fn append_string(&mut self, key: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::String, key)?;
            write_string(w, value)
        })
    }

    /// Appends an already encoded document.
    pub fn append_document(
        &mut self,
        key: &str,
        doc: &RawDocument<'_>,
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Document, key)?;
            w.buf(doc.as_bytes());
            Ok(())
        })
    }

    /// Appends an already encoded array (a document keyed `"0"`, `"1"`, ...).
    pub fn append_array(
        &mut self,
        key: &str,
        array: &RawDocument<'_>,
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Array, key)?;
            w.buf(array.as_bytes());
            Ok(())
        })
    }

    pub fn append_binary(
        &mut self,
        key: &str,
        subtype: BinarySubtype,
        bytes: &[u8],
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Binary, key)?;
            write_binary(w, subtype, bytes)
        })
    }

    pub fn append_object_id(&mut self, key: &str, id: ObjectId) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::ObjectId, key)?;
            w.buf(&id.bytes());
            Ok(())
        })
    }

    pub fn append_boolean(&mut self, key: &str, value: bool) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Boolean, key)?;
            w.u8(u8::from(value));
            Ok(())
        })
    }

    pub fn append_utc_datetime(
        &mut self,
        key: &str,
        value: DateTime,
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::UtcDateTime, key)?;
            w.i64(value.timestamp_millis());
            Ok(())
        })
    }

    pub fn append_null(&mut self, key: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| write_header(w, ElementType::Null, key))
    }

    pub fn append_undefined(&mut self, key: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| write_header(w, ElementType::Undefined, key))
    }

    pub fn append_min_key(&mut self, key: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| write_header(w, ElementType::MinKey, key))
    }

    pub fn append_max_key(&mut self, key: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| write_header(w, ElementType::MaxKey, key))
    }

    /// Appends a regex. Flags are written sorted and deduplicated, as
    /// [`Regex`](crate::Regex) stores them.
    pub fn append_regex(
        &mut self,
        key: &str,
        pattern: &str,
        flags: &str,
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            check_regex(pattern, flags)?;
            write_header(w, ElementType::Regex, key)?;
            w.cstring(pattern.as_bytes());
            w.cstring(canonical_flags(flags).as_bytes());
            Ok(())
        })
    }

    pub fn append_javascript(&mut self, key: &str, code: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::JavaScriptCode, key)?;
            write_string(w, code)
        })
    }

    pub fn append_symbol(&mut self, key: &str, symbol: &str) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Symbol, key)?;
            write_string(w, symbol)
        })
    }

    pub fn append_javascript_with_scope(
        &mut self,
        key: &str,
        code: &str,
        scope: &Document,
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::JavaScriptCodeWithScope, key)?;
            let start = w.reserve_i32();
            write_string(w, code)?;
            write_document(w, scope)?;
            let len = length_i32(w.len() - start)?;
            w.patch_i32(start, len);
            Ok(())
        })
    }

    pub fn append_int32(&mut self, key: &str, value: i32) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Int32, key)?;
            w.i32(value);
            Ok(())
        })
    }

    pub fn append_timestamp(
        &mut self,
        key: &str,
        value: Timestamp,
    ) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Timestamp, key)?;
            w.u64(value.to_u64());
            Ok(())
        })
    }

    pub fn append_int64(&mut self, key: &str, value: i64) -> Result<&mut Self, EncodeError> {
        self.append(|w| {
            write_header(w, ElementType::Int64, key)?;
            w.i64(value);
            Ok(())
        })
    }
}
