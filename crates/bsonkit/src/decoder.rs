//! BSON document decoder.
//!
//! Each document frame is decoded as: read the `i32` length, check it fits
//! the available bytes, check the frame ends in NUL, then read `tag, key,
//! payload` triples until the terminator. Reads are bounded by the frame, so
//! a lying inner length can never consume bytes of the enclosing document.
//! Every malformed input maps to a [`DecodeError`]; nothing here panics.

use std::str;

use bsonkit_buffers::{print_octets, Reader};
use tracing::{debug, trace};

use crate::constants::{ElementType, DEFAULT_MAX_DEPTH, MIN_DOCUMENT_SIZE};
use crate::error::DecodeError;
use crate::values::{
    Binary, BinarySubtype, DateTime, DbPointer, Document, JavaScriptCodeWithScope, ObjectId,
    Regex, Timestamp, Value,
};

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Maximum document nesting, counting the top-level document as 1.
    pub max_depth: usize,
    /// Require array keys to be exactly `"0"`, `"1"`, ... in order.
    pub strict_array_keys: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_array_keys: false,
        }
    }
}

/// Decodes bytes into [`Document`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decodes a buffer holding exactly one document.
    ///
    /// Trailing bytes after the document fail with
    /// [`DecodeError::LengthMismatch`].
    pub fn decode(&self, data: &[u8]) -> Result<Document, DecodeError> {
        let (doc, consumed) = self.decode_with_consumed(data)?;
        if consumed != data.len() {
            debug!(
                consumed,
                len = data.len(),
                "trailing bytes after BSON document"
            );
            return Err(DecodeError::LengthMismatch);
        }
        Ok(doc)
    }

    /// Decodes the document at the start of `data` and returns it together
    /// with the number of bytes it occupied.
    pub fn decode_with_consumed(&self, data: &[u8]) -> Result<(Document, usize), DecodeError> {
        let mut reader = Reader::new(data);
        match self.read_document(&mut reader, 1) {
            Ok(doc) => {
                trace!(len = reader.x, fields = doc.len(), "decoded BSON document");
                Ok((doc, reader.x))
            }
            Err(err) => {
                debug!(
                    offset = reader.x,
                    error = %err,
                    head = %print_octets(data, 16),
                    "rejected BSON input"
                );
                Err(err)
            }
        }
    }

    /// Iterates over concatenated documents in `data`.
    pub fn stream<'a>(&self, data: &'a [u8]) -> DocumentStream<'a> {
        DocumentStream {
            decoder: *self,
            data,
            offset: 0,
            failed: false,
        }
    }

    fn read_document(&self, r: &mut Reader<'_>, depth: usize) -> Result<Document, DecodeError> {
        let mut doc = Document::new();
        self.read_elements(r, depth, |key, value| {
            doc.push(key, value);
            Ok(())
        })?;
        Ok(doc)
    }

    fn read_array(&self, r: &mut Reader<'_>, depth: usize) -> Result<Vec<Value>, DecodeError> {
        let strict = self.options.strict_array_keys;
        let mut items = Vec::new();
        self.read_elements(r, depth, |key, value| {
            if strict && key != items.len().to_string() {
                return Err(DecodeError::InvalidArrayKey(key));
            }
            items.push(value);
            Ok(())
        })?;
        Ok(items)
    }

    /// Reads one document frame, handing each element to `sink`.
    fn read_elements<F>(
        &self,
        r: &mut Reader<'_>,
        depth: usize,
        mut sink: F,
    ) -> Result<(), DecodeError>
    where
        F: FnMut(String, Value) -> Result<(), DecodeError>,
    {
        if depth > self.options.max_depth {
            return Err(DecodeError::NestingTooDeep(self.options.max_depth));
        }
        let outer_end = open_frame(r)?;
        loop {
            if r.is_empty() {
                // Declared bytes used up before the terminator.
                return Err(DecodeError::LengthMismatch);
            }
            let tag = r.u8()?;
            if tag == 0 {
                if !r.is_empty() {
                    return Err(DecodeError::LengthMismatch);
                }
                break;
            }
            let element_type = ElementType::try_from(tag)?;
            let key = read_key(r)?.to_owned();
            let value = self.read_value(r, element_type, depth)?;
            sink(key, value)?;
        }
        r.restore(outer_end);
        Ok(())
    }

    /// Reads one element payload of the given type.
    pub(crate) fn read_value(
        &self,
        r: &mut Reader<'_>,
        element_type: ElementType,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        let value = match element_type {
            ElementType::Double => Value::Double(r.f64()?),
            ElementType::String => Value::String(read_string(r)?.to_owned()),
            ElementType::Document => Value::Document(self.read_document(r, depth + 1)?),
            ElementType::Array => Value::Array(self.read_array(r, depth + 1)?),
            ElementType::Binary => {
                let (subtype, bytes) = read_binary(r)?;
                Value::Binary(Binary::new(subtype, bytes))
            }
            ElementType::Undefined => Value::Undefined,
            ElementType::ObjectId => Value::ObjectId(read_object_id(r)?),
            ElementType::Boolean => Value::Bool(read_bool(r)?),
            ElementType::UtcDateTime => Value::UtcDateTime(DateTime::from_millis(r.i64()?)),
            ElementType::Null => Value::Null,
            ElementType::Regex => {
                let pattern = read_key(r)?;
                let flags = read_key(r)?;
                Value::Regex(Regex::new(pattern, flags))
            }
            ElementType::DbPointer => {
                let namespace = read_string(r)?.to_owned();
                let id = read_object_id(r)?;
                Value::DbPointer(DbPointer { namespace, id })
            }
            ElementType::JavaScriptCode => Value::JavaScriptCode(read_string(r)?.to_owned()),
            ElementType::Symbol => Value::Symbol(read_string(r)?.to_owned()),
            ElementType::JavaScriptCodeWithScope => {
                let outer_end = open_code_with_scope(r)?;
                let code = read_string(r).map_err(total_mismatch)?.to_owned();
                check_scope_fills_total(r)?;
                let scope = self.read_document(r, depth + 1)?;
                if !r.is_empty() {
                    return Err(DecodeError::LengthMismatch);
                }
                r.restore(outer_end);
                Value::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope })
            }
            ElementType::Int32 => Value::Int32(r.i32()?),
            ElementType::Timestamp => Value::Timestamp(Timestamp::from_u64(r.u64()?)),
            ElementType::Int64 => Value::Int64(r.i64()?),
            ElementType::MinKey => Value::MinKey,
            ElementType::MaxKey => Value::MaxKey,
        };
        Ok(value)
    }
}

/// Reads a document length prefix and narrows `r` to the frame body.
///
/// Returns the previous end bound. The frame must be at least
/// [`MIN_DOCUMENT_SIZE`] bytes, fit in the remaining input and end in NUL.
pub(crate) fn open_frame(r: &mut Reader<'_>) -> Result<usize, DecodeError> {
    let declared = r.i32()?;
    let declared = usize::try_from(declared).map_err(|_| DecodeError::LengthMismatch)?;
    if declared < MIN_DOCUMENT_SIZE {
        return Err(DecodeError::LengthMismatch);
    }
    let outer_end = r.limit(declared - 4)?;
    if r.uint8[r.end - 1] != 0 {
        return Err(DecodeError::LengthMismatch);
    }
    Ok(outer_end)
}

/// Reads the code-with-scope total length and narrows `r` to its body.
pub(crate) fn open_code_with_scope(r: &mut Reader<'_>) -> Result<usize, DecodeError> {
    let total = r.i32()?;
    let total = usize::try_from(total).map_err(|_| DecodeError::LengthMismatch)?;
    // i32 total + minimal string (4 + 1) + minimal document.
    if total < 4 + 5 + MIN_DOCUMENT_SIZE {
        return Err(DecodeError::LengthMismatch);
    }
    Ok(r.limit(total - 4)?)
}

/// The code-with-scope window is backed by real input, so running off its
/// end means the declared total is wrong.
fn total_mismatch(err: DecodeError) -> DecodeError {
    match err {
        DecodeError::TruncatedInput => DecodeError::LengthMismatch,
        other => other,
    }
}

/// Requires the scope's declared length to cover exactly the rest of the
/// code-with-scope total.
fn check_scope_fills_total(r: &Reader<'_>) -> Result<(), DecodeError> {
    let declared = r.clone().i32().map_err(|_| DecodeError::LengthMismatch)?;
    if usize::try_from(declared).ok() != Some(r.size()) {
        return Err(DecodeError::LengthMismatch);
    }
    Ok(())
}

/// Reads a NUL-terminated UTF-8 key (also used for regex pattern and flags).
pub(crate) fn read_key<'a>(r: &mut Reader<'a>) -> Result<&'a str, DecodeError> {
    let bytes = r.cstring()?;
    str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
}

/// Reads a length-prefixed string. The length counts the trailing NUL.
pub(crate) fn read_string<'a>(r: &mut Reader<'a>) -> Result<&'a str, DecodeError> {
    let len = r.i32()?;
    let len = usize::try_from(len).map_err(|_| DecodeError::LengthMismatch)?;
    if len == 0 {
        return Err(DecodeError::LengthMismatch);
    }
    let bytes = r.buf(len)?;
    let (text, terminator) = bytes.split_at(len - 1);
    if terminator != [0] {
        return Err(DecodeError::LengthMismatch);
    }
    str::from_utf8(text).map_err(|_| DecodeError::InvalidUtf8)
}

/// Reads a binary payload, stripping the inner length of the legacy subtype.
pub(crate) fn read_binary<'a>(
    r: &mut Reader<'a>,
) -> Result<(BinarySubtype, &'a [u8]), DecodeError> {
    let len = r.i32()?;
    let len = usize::try_from(len).map_err(|_| DecodeError::LengthMismatch)?;
    let subtype = BinarySubtype(r.u8()?);
    let bytes = r.buf(len)?;
    if subtype != BinarySubtype::BINARY_OLD {
        return Ok((subtype, bytes));
    }
    let Some((inner, payload)) = bytes.split_first_chunk::<4>() else {
        return Err(DecodeError::LengthMismatch);
    };
    let inner = i32::from_le_bytes(*inner);
    if usize::try_from(inner).ok() != Some(payload.len()) {
        return Err(DecodeError::LengthMismatch);
    }
    Ok((subtype, payload))
}

pub(crate) fn read_object_id(r: &mut Reader<'_>) -> Result<ObjectId, DecodeError> {
    let bytes = r.buf(12)?;
    let mut out = [0u8; 12];
    out.copy_from_slice(bytes);
    Ok(ObjectId::from_bytes(out))
}

pub(crate) fn read_bool(r: &mut Reader<'_>) -> Result<bool, DecodeError> {
    match r.u8()? {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(DecodeError::InvalidBoolean(b)),
    }
}

/// Iterator over concatenated documents, as produced by [`Decoder::stream`].
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct DocumentStream<'a> {
    decoder: Decoder,
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl DocumentStream<'_> {
    /// Byte offset of the next document.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for DocumentStream<'_> {
    type Item = Result<Document, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        match self.decoder.decode_with_consumed(&self.data[self.offset..]) {
            Ok((doc, consumed)) => {
                self.offset += consumed;
                Some(Ok(doc))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &[u8]) -> Result<Document, DecodeError> {
        Decoder::new().decode(data)
    }

    #[test]
    fn empty_document() {
        assert_eq!(decode(&[5, 0, 0, 0, 0]), Ok(Document::new()));
    }

    #[test]
    fn short_length_prefix_is_truncated() {
        assert_eq!(decode(&[]), Err(DecodeError::TruncatedInput));
        assert_eq!(decode(&[5, 0, 0]), Err(DecodeError::TruncatedInput));
        assert_eq!(decode(&[6, 0, 0, 0, 0]), Err(DecodeError::TruncatedInput));
    }

    #[test]
    fn bogus_lengths_are_mismatches() {
        assert_eq!(decode(&[4, 0, 0, 0, 0]), Err(DecodeError::LengthMismatch));
        assert_eq!(
            decode(&[0xff, 0xff, 0xff, 0xff, 0]),
            Err(DecodeError::LengthMismatch)
        );
        // Missing terminator.
        assert_eq!(decode(&[5, 0, 0, 0, 1]), Err(DecodeError::LengthMismatch));
        // Early terminator.
        assert_eq!(decode(&[6, 0, 0, 0, 0, 0]), Err(DecodeError::LengthMismatch));
        // Trailing bytes.
        assert_eq!(decode(&[5, 0, 0, 0, 0, 0]), Err(DecodeError::LengthMismatch));
    }

    #[test]
    fn unknown_tag() {
        let data = [8, 0, 0, 0, 0x13, b'a', 0, 0];
        assert_eq!(decode(&data), Err(DecodeError::UnknownType(0x13)));
    }

    #[test]
    fn invalid_boolean() {
        let data = [9, 0, 0, 0, 0x08, b'b', 0, 2, 0];
        assert_eq!(decode(&data), Err(DecodeError::InvalidBoolean(2)));
    }

    #[test]
    fn invalid_utf8_key() {
        let data = [8, 0, 0, 0, 0x0a, 0xff, 0, 0];
        assert_eq!(decode(&data), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn string_without_terminator() {
        // {"s": "ab"} with the string NUL replaced.
        let data = b"\x0f\0\0\0\x02s\0\x03\0\0\0abX\0";
        assert_eq!(decode(data), Err(DecodeError::LengthMismatch));
    }

    #[test]
    fn string_length_past_frame() {
        let data = b"\x0f\0\0\0\x02s\0\x30\0\0\0ab\0\0";
        assert_eq!(decode(data), Err(DecodeError::TruncatedInput));
    }

    #[test]
    fn nesting_limit() {
        // {"a": {"a": {}}}
        let inner = [5u8, 0, 0, 0, 0];
        let mut mid = vec![0u8; 4];
        mid.extend_from_slice(&[0x03, b'a', 0]);
        mid.extend_from_slice(&inner);
        mid.push(0);
        let len = mid.len() as i32;
        mid[..4].copy_from_slice(&len.to_le_bytes());
        let mut outer = vec![0u8; 4];
        outer.extend_from_slice(&[0x03, b'a', 0]);
        outer.extend_from_slice(&mid);
        outer.push(0);
        let len = outer.len() as i32;
        outer[..4].copy_from_slice(&len.to_le_bytes());

        let options = DecoderOptions {
            max_depth: 2,
            ..DecoderOptions::default()
        };
        assert_eq!(
            Decoder::with_options(options).decode(&outer),
            Err(DecodeError::NestingTooDeep(2))
        );
        let options = DecoderOptions {
            max_depth: 3,
            ..DecoderOptions::default()
        };
        assert!(Decoder::with_options(options).decode(&outer).is_ok());
    }

    #[test]
    fn old_binary_inner_length_must_agree() {
        let good = b"\x14\0\0\0\x05b\0\x07\0\0\0\x02\x03\0\0\0abc\0";
        let doc = decode(good).unwrap();
        assert_eq!(
            doc.get("b"),
            Some(&Value::Binary(Binary::new(
                BinarySubtype::BINARY_OLD,
                b"abc".to_vec()
            )))
        );
        let bad = b"\x14\0\0\0\x05b\0\x07\0\0\0\x02\x02\0\0\0abc\0";
        assert_eq!(decode(bad), Err(DecodeError::LengthMismatch));
        let short = b"\x10\0\0\0\x05b\0\x03\0\0\0\x02abc\0";
        assert_eq!(decode(short), Err(DecodeError::LengthMismatch));
    }

    #[test]
    fn code_with_scope_total_must_match() {
        // {"j": CWS("f", {})}
        let good = b"\x17\0\0\0\x0fj\0\x0f\0\0\0\x02\0\0\0f\0\x05\0\0\0\0\0";
        let doc = decode(good).unwrap();
        assert_eq!(
            doc.get("j"),
            Some(&Value::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code: "f".into(),
                scope: Document::new(),
            }))
        );
        for total in [0x0du8, 0x0e, 0x10] {
            let mut bad = good.to_vec();
            bad[7] = total;
            assert_eq!(decode(&bad), Err(DecodeError::LengthMismatch), "total {total}");
        }
    }

    #[test]
    fn strict_array_keys() {
        // {"a": [null, null]} keyed "1", "2"
        let data = b"\x13\0\0\0\x04a\0\x0b\0\0\0\x0a1\0\x0a2\0\0\0";
        let decoder = Decoder::new();
        let doc = decoder.decode(data).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::Array(vec![Value::Null, Value::Null])));

        let strict = Decoder::with_options(DecoderOptions {
            strict_array_keys: true,
            ..DecoderOptions::default()
        });
        assert_eq!(
            strict.decode(data),
            Err(DecodeError::InvalidArrayKey("1".into()))
        );
    }

    #[test]
    fn stream_yields_each_document() {
        let mut data = vec![5, 0, 0, 0, 0];
        data.extend_from_slice(&[12, 0, 0, 0, 0x10, b'i', 0, 7, 0, 0, 0, 0]);
        let docs: Vec<_> = Decoder::new().stream(&data).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], Ok(Document::new()));
        assert_eq!(docs[1], Ok(Document::new().with("i", 7)));
    }

    #[test]
    fn stream_stops_after_error() {
        let data = [5, 0, 0, 0, 0, 9, 0, 0];
        let mut stream = Decoder::new().stream(&data);
        assert!(matches!(stream.next(), Some(Ok(_))));
        assert_eq!(stream.offset(), 5);
        assert_eq!(stream.next(), Some(Err(DecodeError::TruncatedInput)));
        assert_eq!(stream.next(), None);
    }
}
