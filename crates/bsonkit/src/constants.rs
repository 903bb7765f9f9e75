//! Wire-level constants: element type tags and size bounds.

use crate::error::DecodeError;

/// Smallest possible encoded document: 4-byte length plus the terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Default bound on document nesting accepted by the decoder.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// The element type tag that precedes every key in an encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    /// Deprecated.
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    UtcDateTime = 0x09,
    Null = 0x0a,
    Regex = 0x0b,
    /// Deprecated.
    DbPointer = 0x0c,
    JavaScriptCode = 0x0d,
    Symbol = 0x0e,
    JavaScriptCodeWithScope = 0x0f,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7f,
    MinKey = 0xff,
}

impl ElementType {
    /// Maps a tag byte to its element type.
    pub fn from_u8(tag: u8) -> Option<Self> {
        let t = match tag {
            0x01 => Self::Double,
            0x02 => Self::String,
            0x03 => Self::Document,
            0x04 => Self::Array,
            0x05 => Self::Binary,
            0x06 => Self::Undefined,
            0x07 => Self::ObjectId,
            0x08 => Self::Boolean,
            0x09 => Self::UtcDateTime,
            0x0a => Self::Null,
            0x0b => Self::Regex,
            0x0c => Self::DbPointer,
            0x0d => Self::JavaScriptCode,
            0x0e => Self::Symbol,
            0x0f => Self::JavaScriptCodeWithScope,
            0x10 => Self::Int32,
            0x11 => Self::Timestamp,
            0x12 => Self::Int64,
            0x7f => Self::MaxKey,
            0xff => Self::MinKey,
            _ => return None,
        };
        Some(t)
    }

    /// The tag byte written on the wire.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short upper-case name, as printed by `bson-inspect`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Document => "DOCUMENT",
            Self::Array => "ARRAY",
            Self::Binary => "BINARY",
            Self::Undefined => "UNDEFINED",
            Self::ObjectId => "OID",
            Self::Boolean => "BOOLEAN",
            Self::UtcDateTime => "UTC_DATETIME",
            Self::Null => "NULL",
            Self::Regex => "REGEXP",
            Self::DbPointer => "DBPOINTER",
            Self::JavaScriptCode => "JS_CODE",
            Self::Symbol => "SYMBOL",
            Self::JavaScriptCodeWithScope => "JS_CODE_W_SCOPE",
            Self::Int32 => "INT32",
            Self::Timestamp => "TIMESTAMP",
            Self::Int64 => "INT64",
            Self::MaxKey => "MAX",
            Self::MinKey => "MIN",
        }
    }
}

impl TryFrom<u8> for ElementType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_u8(tag).ok_or(DecodeError::UnknownType(tag))
    }
}
