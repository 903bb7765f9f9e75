//! BSON documents and a round-trip-safe binary codec.
//!
//! - [`Document`] / [`Value`]: the in-memory model, an ordered list of
//!   `(key, value)` pairs.
//! - [`Encoder`]: model to bytes. Output is deterministic; the same document
//!   always encodes to the same bytes.
//! - [`Decoder`]: bytes to model. Every malformed input is reported as a
//!   [`DecodeError`]; the decoder never panics and never reads outside a
//!   declared length.
//! - [`DocumentBuilder`] and [`RawDocument`]: append-style writing and
//!   zero-copy reading for callers that do not need the full model.
//!
//! ```
//! use bsonkit::{decode, encode, Document, Value};
//!
//! let doc = Document::new()
//!     .with("hello", "world")
//!     .with("n", Value::int(9_876_543_210));
//! let bytes = encode(&doc)?;
//! assert_eq!(decode(&bytes)?, doc);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod constants;
mod decoder;
mod encoder;
mod error;
mod inspect;
mod json;
mod raw;
mod values;

pub use builder::DocumentBuilder;
pub use constants::{ElementType, DEFAULT_MAX_DEPTH, MIN_DOCUMENT_SIZE};
pub use decoder::{Decoder, DecoderOptions, DocumentStream};
pub use encoder::Encoder;
pub use error::{DecodeError, EncodeError};
pub use inspect::dump;
pub use json::to_relaxed_json;
pub use raw::{RawBinary, RawDocument, RawElement, RawIter, RawRegex};
pub use values::{
    Binary, BinarySubtype, DateTime, DbPointer, Document, JavaScriptCodeWithScope, ObjectId,
    Regex, Timestamp, Value,
};

/// Encodes `doc` with a default [`Encoder`].
pub fn encode(doc: &Document) -> Result<Vec<u8>, EncodeError> {
    Encoder::new().encode(doc)
}

/// Decodes a buffer holding exactly one document with default options.
pub fn decode(data: &[u8]) -> Result<Document, DecodeError> {
    Decoder::new().decode(data)
}

/// Decodes the document at the start of `data`, returning it with the
/// number of bytes it occupied.
pub fn decode_with_consumed(data: &[u8]) -> Result<(Document, usize), DecodeError> {
    Decoder::new().decode_with_consumed(data)
}
