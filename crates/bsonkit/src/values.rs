//! The BSON value model.
//!
//! A [`Document`] is an ordered list of `(key, Value)` pairs. Keys are not
//! deduplicated: the encoder writes exactly what the document holds, and
//! [`Document::get`] returns the first match.

use std::fmt;

use crate::constants::ElementType;

/// Binary payload subtype byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinarySubtype(pub u8);

impl BinarySubtype {
    pub const GENERIC: Self = Self(0x00);
    pub const FUNCTION: Self = Self(0x01);
    /// Legacy binary: the payload carries a second, inner length prefix.
    pub const BINARY_OLD: Self = Self(0x02);
    pub const UUID_OLD: Self = Self(0x03);
    pub const UUID: Self = Self(0x04);
    pub const MD5: Self = Self(0x05);

    /// Subtypes `0x80..=0xff` are reserved for applications.
    pub fn is_user_defined(self) -> bool {
        self.0 >= 0x80
    }
}

impl From<u8> for BinarySubtype {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<BinarySubtype> for u8 {
    fn from(value: BinarySubtype) -> Self {
        value.0
    }
}

/// BSON binary data (subtype + raw bytes).
///
/// For [`BinarySubtype::BINARY_OLD`], `bytes` holds the payload without the
/// inner length prefix; the encoder adds it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub fn new(subtype: impl Into<BinarySubtype>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: subtype.into(),
            bytes: bytes.into(),
        }
    }

    /// Generic (subtype 0) binary.
    pub fn generic(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(BinarySubtype::GENERIC, bytes)
    }
}

/// A regular expression: pattern plus option flags.
///
/// Flags are stored in canonical form (sorted, duplicates removed), so two
/// regexes built from the same flag set compare equal and encode to the same
/// bytes regardless of the order the flags were given in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    pattern: String,
    flags: String,
}

impl Regex {
    pub fn new(pattern: impl Into<String>, flags: &str) -> Self {
        Self {
            pattern: pattern.into(),
            flags: canonical_flags(flags),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Flags in canonical (sorted) order, e.g. `"imx"`.
    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}

/// Sorts and deduplicates regex flag letters.
pub(crate) fn canonical_flags(flags: &str) -> String {
    let mut chars: Vec<char> = flags.chars().collect();
    chars.sort_unstable();
    chars.dedup();
    chars.into_iter().collect()
}

/// UTC datetime as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTime(i64);

impl DateTime {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Whole seconds since the epoch; saturates at the `i64` range.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }
}

/// Opaque 12-byte ObjectId. This crate carries them, it never generates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses 24 hex digits.
    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 24 || !s.is_ascii() {
            return None;
        }
        let mut out = [0u8; 12];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Replication timestamp. On the wire this is a little-endian `u64` with
/// `increment` in the low and `time` in the high 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    pub time: u32,
    pub increment: u32,
}

impl Timestamp {
    pub const fn from_u64(raw: u64) -> Self {
        Self {
            time: (raw >> 32) as u32,
            increment: raw as u32,
        }
    }

    pub const fn to_u64(self) -> u64 {
        ((self.time as u64) << 32) | self.increment as u64
    }
}

/// DBPointer (deprecated): namespace plus ObjectId.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}

/// JavaScript code with a scope document (deprecated).
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: String,
    pub scope: Document,
}

/// A BSON value that can appear as a document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    /// Length-prefixed UTF-8; may contain NUL.
    String(String),
    Document(Document),
    /// Encoded as a document keyed `"0"`, `"1"`, ...
    Array(Vec<Value>),
    Binary(Binary),
    Undefined,
    ObjectId(ObjectId),
    Bool(bool),
    UtcDateTime(DateTime),
    Null,
    Regex(Regex),
    DbPointer(DbPointer),
    JavaScriptCode(String),
    Symbol(String),
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    MinKey,
    MaxKey,
}

impl Value {
    /// Smallest integer representation: `Int32` when the value fits, else `Int64`.
    pub fn int(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(v) => Value::Int32(v),
            Err(_) => Value::Int64(value),
        }
    }

    /// The tag this value is encoded with.
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Double(_) => ElementType::Double,
            Value::String(_) => ElementType::String,
            Value::Document(_) => ElementType::Document,
            Value::Array(_) => ElementType::Array,
            Value::Binary(_) => ElementType::Binary,
            Value::Undefined => ElementType::Undefined,
            Value::ObjectId(_) => ElementType::ObjectId,
            Value::Bool(_) => ElementType::Boolean,
            Value::UtcDateTime(_) => ElementType::UtcDateTime,
            Value::Null => ElementType::Null,
            Value::Regex(_) => ElementType::Regex,
            Value::DbPointer(_) => ElementType::DbPointer,
            Value::JavaScriptCode(_) => ElementType::JavaScriptCode,
            Value::Symbol(_) => ElementType::Symbol,
            Value::JavaScriptCodeWithScope(_) => ElementType::JavaScriptCodeWithScope,
            Value::Int32(_) => ElementType::Int32,
            Value::Timestamp(_) => ElementType::Timestamp,
            Value::Int64(_) => ElementType::Int64,
            Value::MinKey => ElementType::MinKey,
            Value::MaxKey => ElementType::MaxKey,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Either integer width, widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Value::UtcDateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Value::Regex(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Value::Binary(v)
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Self {
        Value::Regex(v)
    }
}

impl From<DateTime> for Value {
    fn from(v: DateTime) -> Self {
        Value::UtcDateTime(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

/// An ordered BSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends a pair. Existing pairs with the same key are kept.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder-style [`Document::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    /// Value of the first pair with `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

impl From<Vec<(String, Value)>> for Document {
    fn from(entries: Vec<(String, Value)>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_flags_are_canonical() {
        let a = Regex::new("foo.*bar", "xmi");
        let b = Regex::new("foo.*bar", "imxx");
        assert_eq!(a.flags(), "imx");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/foo.*bar/imx");
    }

    #[test]
    fn int_selects_narrowest_width() {
        assert_eq!(Value::int(1984), Value::Int32(1984));
        assert_eq!(Value::int(9_876_543_210), Value::Int64(9_876_543_210));
        assert_eq!(Value::int(i64::from(i32::MIN)), Value::Int32(i32::MIN));
        assert_eq!(
            Value::int(i64::from(i32::MAX) + 1),
            Value::Int64(2_147_483_648)
        );
    }

    #[test]
    fn document_preserves_order_and_duplicates() {
        let doc = Document::new()
            .with("b", 1)
            .with("a", 2)
            .with("b", 3);
        assert_eq!(doc.keys().collect::<Vec<_>>(), ["b", "a", "b"]);
        assert_eq!(doc.get("b"), Some(&Value::Int32(1)));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn document_equality_is_ordered() {
        let a = Document::new().with("x", 1).with("y", 2);
        let b = Document::new().with("y", 2).with("x", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn timestamp_wire_layout() {
        let ts = Timestamp {
            time: 0x0102_0304,
            increment: 0x0a0b_0c0d,
        };
        assert_eq!(ts.to_u64(), 0x0102_0304_0a0b_0c0d);
        assert_eq!(Timestamp::from_u64(ts.to_u64()), ts);
    }

    #[test]
    fn object_id_hex() {
        let oid = ObjectId::from_bytes([
            0x4d, 0x2d, 0x2a, 0xa5, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        ]);
        let hex = oid.to_string();
        assert_eq!(hex, "4d2d2aa50001020304050607");
        assert_eq!(ObjectId::parse_hex(&hex), Some(oid));
        assert_eq!(ObjectId::parse_hex("zz"), None);
    }

    #[test]
    fn datetime_from_secs() {
        assert_eq!(
            DateTime::from_secs(1_294_860_709).timestamp_millis(),
            1_294_860_709_000
        );
        assert_eq!(DateTime::from_secs(i64::MAX).timestamp_millis(), i64::MAX);
    }

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Value::from(3.5).as_f64(), Some(3.5));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Int32(7).as_i64(), Some(7));
        assert_eq!(Value::Int64(7).as_i32(), None);
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).element_type(), ElementType::Boolean);
    }

    #[test]
    fn binary_subtypes() {
        assert!(BinarySubtype(0x80).is_user_defined());
        assert!(!BinarySubtype::BINARY_OLD.is_user_defined());
        assert_eq!(u8::from(BinarySubtype::UUID), 4);
    }
}
