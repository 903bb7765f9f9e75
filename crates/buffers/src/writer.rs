//! Growable little-endian writer with length back-patching.

/// A binary buffer writer that grows automatically as needed.
///
/// Length-prefixed formats write a placeholder first, encode the body, then
/// fill the placeholder in. [`Writer::reserve_i32`] returns the offset of a
/// zeroed 4-byte slot and [`Writer::patch_i32`] overwrites it.
///
/// # Example
///
/// ```
/// use bsonkit_buffers::Writer;
///
/// let mut writer = Writer::new();
/// let at = writer.reserve_i32();
/// writer.u8(0x00);
/// let len = writer.len() as i32;
/// writer.patch_i32(at, len);
/// assert_eq!(writer.flush(), [0x05, 0x00, 0x00, 0x00, 0x00]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
}

impl Writer {
    /// Creates a new empty writer.
    pub fn new() -> Self {
        Self { uint8: Vec::new() }
    }

    /// Creates a new writer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Discards everything written so far, keeping the allocation.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Returns the written data and leaves the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    /// Returns a view of the written data.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes raw bytes.
    pub fn buf(&mut self, bytes: &[u8]) {
        self.uint8.extend_from_slice(bytes);
    }

    /// Writes bytes followed by a NUL terminator.
    ///
    /// The caller is responsible for ensuring `bytes` has no interior NUL.
    pub fn cstring(&mut self, bytes: &[u8]) {
        self.uint8.extend_from_slice(bytes);
        self.uint8.push(0);
    }

    /// Writes a zeroed 4-byte placeholder and returns its offset.
    pub fn reserve_i32(&mut self) -> usize {
        let at = self.uint8.len();
        self.uint8.extend_from_slice(&[0u8; 4]);
        at
    }

    /// Overwrites the 4 bytes at `at` with `val` (little-endian).
    ///
    /// # Panics
    ///
    /// Panics if `at` was not returned by [`Writer::reserve_i32`] on this
    /// writer (i.e. fewer than 4 bytes exist at that offset).
    pub fn patch_i32(&mut self, at: usize, val: i32) {
        self.uint8[at..at + 4].copy_from_slice(&val.to_le_bytes());
    }
}
