//! Zero-copy access to encoded documents.
//!
//! [`RawDocument`] walks the element list of an encoded document without
//! building a [`Document`]. Elements are located by skipping payloads, so
//! finding a key late in a large document touches only the element headers
//! in front of it.

use bsonkit_buffers::Reader;

use crate::constants::{ElementType, MIN_DOCUMENT_SIZE};
use crate::decoder::{
    open_code_with_scope, open_frame, read_binary, read_bool, read_key, read_object_id,
    read_string, Decoder,
};
use crate::error::DecodeError;
use crate::values::{BinarySubtype, DateTime, Document, ObjectId, Timestamp, Value};

/// A borrowed, frame-validated encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDocument<'a> {
    data: &'a [u8],
}

impl<'a> RawDocument<'a> {
    /// Validates the outer frame of the document at the start of `data`.
    ///
    /// Only the length prefix and terminator are checked here; element
    /// errors surface while iterating.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(data);
        open_frame(&mut reader)?;
        Ok(Self {
            data: &data[..reader.end],
        })
    }

    /// The encoded bytes, exactly one document long.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` for a document without elements.
    pub fn is_empty(&self) -> bool {
        self.data.len() == MIN_DOCUMENT_SIZE
    }

    pub fn iter(&self) -> RawIter<'a> {
        RawIter {
            reader: Reader::from_slice(self.data, 4, self.data.len() - 1),
            failed: false,
        }
    }

    /// The first element named `key`.
    pub fn get(&self, key: &str) -> Result<Option<RawElement<'a>>, DecodeError> {
        for element in self.iter() {
            let element = element?;
            if element.key == key {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Fully decodes the document.
    pub fn to_document(&self) -> Result<Document, DecodeError> {
        Decoder::new().decode(self.data)
    }
}

impl<'a> IntoIterator for RawDocument<'a> {
    type Item = Result<RawElement<'a>, DecodeError>;
    type IntoIter = RawIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Element cursor over a [`RawDocument`]. Stops after the first error.
#[derive(Debug, Clone)]
pub struct RawIter<'a> {
    reader: Reader<'a>,
    failed: bool,
}

impl<'a> RawIter<'a> {
    fn next_element(&mut self) -> Result<RawElement<'a>, DecodeError> {
        let tag = self.reader.u8()?;
        if tag == 0 {
            return Err(DecodeError::LengthMismatch);
        }
        let element_type = ElementType::try_from(tag)?;
        let key = read_key(&mut self.reader)?;
        let len = payload_len(&self.reader, element_type)?;
        let value = self.reader.buf(len)?;
        Ok(RawElement {
            key,
            element_type,
            value,
        })
    }
}

impl<'a> Iterator for RawIter<'a> {
    type Item = Result<RawElement<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }
        let item = self.next_element();
        self.failed = item.is_err();
        Some(item)
    }
}

/// Size of the payload at the reader's cursor, without consuming it.
fn payload_len(reader: &Reader<'_>, element_type: ElementType) -> Result<usize, DecodeError> {
    let mut r = reader.clone();
    let start = r.x;
    let fixed = match element_type {
        ElementType::Undefined | ElementType::Null | ElementType::MinKey | ElementType::MaxKey => 0,
        ElementType::Boolean => 1,
        ElementType::Int32 => 4,
        ElementType::Double
        | ElementType::UtcDateTime
        | ElementType::Timestamp
        | ElementType::Int64 => 8,
        ElementType::ObjectId => 12,
        ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
            read_string(&mut r)?;
            return Ok(r.x - start);
        }
        ElementType::Document | ElementType::Array => {
            open_frame(&mut r)?;
            return Ok(r.end - start);
        }
        ElementType::JavaScriptCodeWithScope => {
            open_code_with_scope(&mut r)?;
            return Ok(r.end - start);
        }
        ElementType::Binary => {
            read_binary(&mut r)?;
            return Ok(r.x - start);
        }
        ElementType::Regex => {
            read_key(&mut r)?;
            read_key(&mut r)?;
            return Ok(r.x - start);
        }
        ElementType::DbPointer => {
            read_string(&mut r)?;
            r.skip(12)?;
            return Ok(r.x - start);
        }
    };
    if fixed > r.size() {
        return Err(DecodeError::TruncatedInput);
    }
    Ok(fixed)
}

/// Binary payload view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBinary<'a> {
    pub subtype: BinarySubtype,
    pub bytes: &'a [u8],
}

/// Regex view. `flags` is as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRegex<'a> {
    pub pattern: &'a str,
    pub flags: &'a str,
}

/// One element of a [`RawDocument`]: key, type and undecoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawElement<'a> {
    key: &'a str,
    element_type: ElementType,
    value: &'a [u8],
}

impl<'a> RawElement<'a> {
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The payload bytes following the key.
    pub fn value_bytes(&self) -> &'a [u8] {
        self.value
    }

    fn reader(&self) -> Reader<'a> {
        Reader::new(self.value)
    }

    fn when(&self, element_type: ElementType) -> Option<Reader<'a>> {
        (self.element_type == element_type).then(|| self.reader())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.when(ElementType::Double)?.f64().ok()
    }

    pub fn as_str(&self) -> Option<&'a str> {
        read_string(&mut self.when(ElementType::String)?).ok()
    }

    pub fn as_javascript(&self) -> Option<&'a str> {
        read_string(&mut self.when(ElementType::JavaScriptCode)?).ok()
    }

    pub fn as_symbol(&self) -> Option<&'a str> {
        read_string(&mut self.when(ElementType::Symbol)?).ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        read_bool(&mut self.when(ElementType::Boolean)?).ok()
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.when(ElementType::Int32)?.i32().ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.when(ElementType::Int64)?.i64().ok()
    }

    pub fn as_datetime(&self) -> Option<DateTime> {
        let millis = self.when(ElementType::UtcDateTime)?.i64().ok()?;
        Some(DateTime::from_millis(millis))
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        let raw = self.when(ElementType::Timestamp)?.u64().ok()?;
        Some(Timestamp::from_u64(raw))
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        read_object_id(&mut self.when(ElementType::ObjectId)?).ok()
    }

    pub fn as_document(&self) -> Option<RawDocument<'a>> {
        self.when(ElementType::Document)?;
        RawDocument::from_bytes(self.value).ok()
    }

    /// The array as its underlying document (keys `"0"`, `"1"`, ...).
    pub fn as_array(&self) -> Option<RawDocument<'a>> {
        self.when(ElementType::Array)?;
        RawDocument::from_bytes(self.value).ok()
    }

    pub fn as_binary(&self) -> Option<RawBinary<'a>> {
        let (subtype, bytes) = read_binary(&mut self.when(ElementType::Binary)?).ok()?;
        Some(RawBinary { subtype, bytes })
    }

    pub fn as_regex(&self) -> Option<RawRegex<'a>> {
        let mut r = self.when(ElementType::Regex)?;
        let pattern = read_key(&mut r).ok()?;
        let flags = read_key(&mut r).ok()?;
        Some(RawRegex { pattern, flags })
    }

    /// Fully decodes this element's value.
    pub fn to_value(&self) -> Result<Value, DecodeError> {
        let mut r = self.reader();
        Decoder::new().read_value(&mut r, self.element_type, 1)
    }
}
