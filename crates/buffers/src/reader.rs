//! Bounds-checked little-endian reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader over a byte slice.
///
/// The reader maintains a cursor position `x` and an exclusive `end` bound.
/// Every read is checked against `end`, so a reader restricted with
/// [`Reader::limit`] can never consume bytes belonging to an enclosing frame.
///
/// # Example
///
/// ```
/// use bsonkit_buffers::Reader;
///
/// let data = [0x04, 0x03, 0x02, 0x01];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.i32().unwrap(), 0x01020304);
/// assert!(reader.u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    /// Creates a reader from a slice with custom start and end positions.
    ///
    /// `end` is clamped to the slice length and `x` to `end`.
    pub fn from_slice(uint8: &'a [u8], x: usize, end: usize) -> Self {
        let end = end.min(uint8.len());
        let x = x.min(end);
        Self { uint8, x, end }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end.saturating_sub(self.x)
    }

    /// Returns `true` when no bytes remain.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        if self.x < self.end {
            Ok(self.uint8[self.x])
        } else {
            Err(BufferError::EndOfBuffer)
        }
    }

    /// Narrows the readable window to the next `size` bytes.
    ///
    /// Returns the previous end so the caller can restore it with
    /// [`Reader::restore`].
    pub fn limit(&mut self, size: usize) -> Result<usize, BufferError> {
        self.check(size)?;
        let prev = self.end;
        self.end = self.x + size;
        Ok(prev)
    }

    /// Restores an end bound previously returned by [`Reader::limit`].
    pub fn restore(&mut self, end: usize) {
        self.end = end.min(self.uint8.len());
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if n > self.size() {
            Err(BufferError::EndOfBuffer)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.uint8[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.check(length)?;
        self.x += length;
        Ok(())
    }

    /// Returns a subarray of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..x + size])
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        let [b] = self.array::<1>()?;
        Ok(b)
    }

    /// Reads a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Reads a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// Reads a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Reads a NUL-terminated byte string and consumes the terminator.
    ///
    /// The returned slice excludes the terminator. Fails with
    /// [`BufferError::EndOfBuffer`] if no NUL occurs before `end`.
    pub fn cstring(&mut self) -> Result<&'a [u8], BufferError> {
        let start = self.x;
        let window = &self.uint8[start..self.end.max(start)];
        let len = window
            .iter()
            .position(|&b| b == 0)
            .ok_or(BufferError::EndOfBuffer)?;
        self.x += len + 1;
        Ok(&self.uint8[start..start + len])
    }

    /// Reads a UTF-8 string of the given size.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bytes = self.buf(size)?;
        str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let data = [0x01, 0x02];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.u8(), Ok(0x01));
        assert_eq!(reader.u8(), Ok(0x02));
        assert_eq!(reader.u8(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn test_i32_little_endian() {
        let data = [0x05, 0x00, 0x00, 0x00];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.i32(), Ok(5));
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = Reader::new(&data);
        assert!(reader.i32().is_err());
        assert_eq!(reader.x, 0);
    }

    #[test]
    fn test_cstring() {
        let data = b"abc\0de\0";
        let mut reader = Reader::new(data);
        assert_eq!(reader.cstring(), Ok(&b"abc"[..]));
        assert_eq!(reader.cstring(), Ok(&b"de"[..]));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_cstring_unterminated() {
        let data = b"abc";
        let mut reader = Reader::new(data);
        assert_eq!(reader.cstring(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn test_limit_and_restore() {
        let data = [1, 2, 3, 4, 5];
        let mut reader = Reader::new(&data);
        reader.u8().unwrap();
        let prev = reader.limit(2).unwrap();
        assert_eq!(reader.u8(), Ok(2));
        assert_eq!(reader.u8(), Ok(3));
        assert_eq!(reader.u8(), Err(BufferError::EndOfBuffer));
        reader.restore(prev);
        assert_eq!(reader.u8(), Ok(4));
    }

    #[test]
    fn test_limit_beyond_end() {
        let data = [1, 2];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.limit(3), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn test_utf8() {
        let data = b"hello world";
        let mut reader = Reader::new(data);
        assert_eq!(reader.utf8(5), Ok("hello"));
        assert_eq!(reader.utf8(6), Ok(" world"));
    }

    #[test]
    fn test_utf8_invalid() {
        let data = [0xff, 0xfe];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.utf8(2), Err(BufferError::InvalidUtf8));
    }
}
