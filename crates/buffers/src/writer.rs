//! Binary buffer writer over a fixed-size, caller-owned buffer.

use crate::BufferError;

/// A little-endian binary writer into a caller-owned byte buffer.
///
/// Unlike a growable writer, this one never reallocates: the caller sizes
/// the buffer up front (BSON encoding precomputes its exact output size)
/// and a write that would run past the end fails with
/// [`BufferError::Overflow`].
///
/// The cursor is public so callers can record positions for in-place
/// back-patching of length prefixes via [`Writer::patch_i32`].
///
/// # Example
///
/// ```
/// use bson_pack_buffers::Writer;
///
/// let mut buf = [0u8; 5];
/// let mut writer = Writer::new(&mut buf);
/// writer.i32(5).unwrap();
/// writer.u8(0).unwrap();
/// assert_eq!(buf, [0x05, 0x00, 0x00, 0x00, 0x00]);
/// ```
pub struct Writer<'a> {
    /// The underlying byte buffer.
    pub uint8: &'a mut [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Writer<'a> {
    /// Creates a new writer over the given buffer, cursor at zero.
    pub fn new(uint8: &'a mut [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Creates a writer with the cursor at the given offset.
    pub fn with_offset(uint8: &'a mut [u8], x: usize) -> Self {
        Self { uint8, x }
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if self.x + n > self.uint8.len() {
            Err(BufferError::Overflow)
        } else {
            Ok(())
        }
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) -> Result<(), BufferError> {
        self.check(1)?;
        self.uint8[self.x] = val;
        self.x += 1;
        Ok(())
    }

    /// Writes a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32(&mut self, val: i32) -> Result<(), BufferError> {
        self.check(4)?;
        self.uint8[self.x..self.x + 4].copy_from_slice(&val.to_le_bytes());
        self.x += 4;
        Ok(())
    }

    /// Writes a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64(&mut self, val: i64) -> Result<(), BufferError> {
        self.check(8)?;
        self.uint8[self.x..self.x + 8].copy_from_slice(&val.to_le_bytes());
        self.x += 8;
        Ok(())
    }

    /// Writes a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64(&mut self, val: f64) -> Result<(), BufferError> {
        self.check(8)?;
        self.uint8[self.x..self.x + 8].copy_from_slice(&val.to_le_bytes());
        self.x += 8;
        Ok(())
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) -> Result<(), BufferError> {
        let length = buf.len();
        self.check(length)?;
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
        Ok(())
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> Result<usize, BufferError> {
        let bytes = s.as_bytes();
        self.buf(bytes)?;
        Ok(bytes.len())
    }

    /// Overwrites a previously-reserved 32-bit slot (little-endian)
    /// without moving the cursor.
    pub fn patch_i32(&mut self, offset: usize, val: i32) -> Result<(), BufferError> {
        if offset + 4 > self.uint8.len() {
            return Err(BufferError::Overflow);
        }
        self.uint8[offset..offset + 4].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}
