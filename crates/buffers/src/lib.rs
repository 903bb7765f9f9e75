//! Little-endian binary buffer utilities for bsonkit.
//!
//! This crate provides the byte-level primitives the BSON codec is built on:
//! a bounds-checked cursor for reading and an auto-growing buffer for writing,
//! both fixed to little-endian byte order.
//!
//! # Overview
//!
//! - [`Reader`] - Reads binary data from a byte slice with cursor tracking
//! - [`Writer`] - Writes binary data to a growable buffer, with back-patching
//!   of length prefixes
//!
//! # Example
//!
//! ```
//! use bsonkit_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! let at = writer.reserve_i32();
//! writer.u8(0x01);
//! writer.cstring(b"hello");
//! writer.patch_i32(at, 11);
//! let data = writer.flush();
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.i32().unwrap(), 11);
//! assert_eq!(reader.u8().unwrap(), 0x01);
//! assert_eq!(reader.cstring().unwrap(), b"hello");
//! ```

mod print_octets;
mod reader;
mod writer;

pub use print_octets::{print_octets, print_octets_default};
pub use reader::Reader;
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer,
    /// Invalid UTF-8 sequence.
    InvalidUtf8,
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::EndOfBuffer => write!(f, "end of buffer"),
            BufferError::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
        }
    }
}

impl std::error::Error for BufferError {}
