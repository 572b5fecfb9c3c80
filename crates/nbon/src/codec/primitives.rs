//! Primitive encoding/decoding for the NBON binary format.
//!
//! Implements the byte-level cursor over a caller-supplied source or sink,
//! LEB128 varints, little-endian floats and NUL-terminated byte runs.

use std::io::{self, BufRead, Write};

use crate::error::{DecodeError, EncodeError};
use crate::limits::MAX_VARINT_BYTES;

// =============================================================================
// DECODING
// =============================================================================

/// Forward-only byte cursor over a buffered source.
///
/// Any [`BufRead`] works, including `&[u8]`. The source's own buffer is
/// used for peeking, so nothing beyond it is ever held in memory.
#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    pos: u64,
}

impl<R: BufRead> ByteSource<R> {
    /// Creates a cursor at the current position of `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Returns the number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Returns the next buffered chunk; empty means end of input.
    fn chunk(&mut self) -> Result<&[u8], DecodeError> {
        loop {
            match self.inner.fill_buf() {
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }
        // Already filled, so this returns the buffer without further I/O.
        Ok(self.inner.fill_buf()?)
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.inner.consume(n);
        self.pos += n as u64;
    }

    /// Returns the next byte without consuming it, or `None` at end of input.
    #[inline]
    pub fn peek(&mut self) -> Result<Option<u8>, DecodeError> {
        Ok(self.chunk()?.first().copied())
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = self.peek()?.ok_or(DecodeError::UnexpectedEof { context })?;
        self.advance(1);
        Ok(byte)
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(
        &mut self,
        context: &'static str,
    ) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        let mut filled = 0;
        while filled < N {
            let buf = self.chunk()?;
            if buf.is_empty() {
                return Err(DecodeError::UnexpectedEof { context });
            }
            let take = buf.len().min(N - filled);
            out[filled..filled + take].copy_from_slice(&buf[..take]);
            self.advance(take);
            filled += take;
        }
        Ok(out)
    }

    /// Appends exactly `len` bytes to `out`.
    ///
    /// Grows `out` as data arrives rather than trusting `len` up front.
    pub fn read_exact_into(
        &mut self,
        len: u64,
        out: &mut Vec<u8>,
        context: &'static str,
    ) -> Result<(), DecodeError> {
        let mut remaining = len;
        while remaining > 0 {
            let buf = self.chunk()?;
            if buf.is_empty() {
                return Err(DecodeError::UnexpectedEof { context });
            }
            let take = clamp(buf.len(), remaining);
            out.extend_from_slice(&buf[..take]);
            self.advance(take);
            remaining -= take as u64;
        }
        Ok(())
    }

    /// Discards exactly `len` bytes.
    pub fn skip_exact(&mut self, len: u64, context: &'static str) -> Result<(), DecodeError> {
        let mut remaining = len;
        while remaining > 0 {
            let available = self.chunk()?.len();
            if available == 0 {
                return Err(DecodeError::UnexpectedEof { context });
            }
            let take = clamp(available, remaining);
            self.advance(take);
            remaining -= take as u64;
        }
        Ok(())
    }

    /// Reads bytes up to and including the next NUL.
    ///
    /// The NUL is consumed but not stored. When `out` is `None` the bytes are
    /// discarded. Runs longer than `max_len` are rejected.
    pub fn read_until_nul(
        &mut self,
        mut out: Option<&mut Vec<u8>>,
        max_len: usize,
        field: &'static str,
    ) -> Result<(), DecodeError> {
        let mut len = 0usize;
        loop {
            let buf = self.chunk()?;
            if buf.is_empty() {
                return Err(DecodeError::UnexpectedEof { context: field });
            }
            let (take, done) = match buf.iter().position(|&b| b == 0) {
                Some(i) => (i, true),
                None => (buf.len(), false),
            };
            len += take;
            if len > max_len {
                tracing::debug!(field, len, max_len, "NUL-terminated run exceeds limit");
                return Err(DecodeError::LengthExceedsLimit {
                    field,
                    len: len as u64,
                    max: max_len,
                });
            }
            if let Some(out) = out.as_deref_mut() {
                out.extend_from_slice(&buf[..take]);
            }
            if done {
                self.advance(take + 1);
                return Ok(());
            }
            self.advance(take);
        }
    }

    /// Reads an unsigned varint (LEB128).
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = u64::from(byte & 0x7F);

            // The tenth group may only contribute the top bit.
            if shift == 63 && value > 1 {
                return Err(DecodeError::VarintOverflow);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }

        Err(DecodeError::VarintTooLong)
    }

    /// Reads a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian f64.
    #[inline]
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array(context)?))
    }
}

/// Returns `min(available, remaining)` as a `usize`.
#[inline]
fn clamp(available: usize, remaining: u64) -> usize {
    usize::try_from(remaining).map_or(available, |r| r.min(available))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Byte cursor over a caller-supplied sink.
#[derive(Debug)]
pub struct ByteSink<W> {
    inner: W,
    pos: u64,
}

impl<W: Write> ByteSink<W> {
    /// Creates a sink writing to `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        Ok(self.inner.flush()?)
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> Result<(), EncodeError> {
        self.write_bytes(&[byte])
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    /// Writes a tag byte followed by raw bytes in one call to the sink.
    #[inline]
    pub fn write_tagged(&mut self, tag: u8, payload: &[u8]) -> Result<(), EncodeError> {
        self.write_byte(tag)?;
        self.write_bytes(payload)
    }

    /// Writes an unsigned varint (LEB128).
    #[inline]
    pub fn write_varint(&mut self, value: u64) -> Result<(), EncodeError> {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let len = encode_varint(value, &mut buf);
        self.write_bytes(&buf[..len])
    }

    /// Writes a little-endian f32.
    pub fn write_f32(&mut self, value: f32) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes a little-endian f64.
    pub fn write_f64(&mut self, value: f64) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }
}

/// Encodes `value` as LEB128 into `buf`, returning the number of bytes used.
#[inline]
pub fn encode_varint(mut value: u64, buf: &mut [u8; MAX_VARINT_BYTES]) -> usize {
    let mut len = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf[len] = byte;
        len += 1;
        if value == 0 {
            return len;
        }
    }
}

/// Returns the number of bytes `value` occupies as a varint.
#[inline]
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}
