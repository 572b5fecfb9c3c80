//! Streaming NBON writer.
//!
//! [`Writer`] emits values straight into a caller-supplied [`Write`] sink.
//! Containers are written through scope handles:
//!
//! - [`ArrayWriter`] dereferences to the [`Writer`] and writes the `]`
//!   closer on [`finish`](ArrayWriter::finish) (or on drop).
//! - [`ObjectWriter`] hands out one [`ValueWriter`] per key; the value
//!   writer must be used exactly once before the next key.
//!
//! A handle mutably borrows its parent for as long as it lives, so the
//! parent cannot be written to while a child scope is open:
//!
//! ```compile_fail
//! use nbon::Writer;
//!
//! let mut writer = Writer::new(Vec::new());
//! let array = writer.begin_array().unwrap();
//! writer.write_i64(10).unwrap(); // the array scope is still open
//! array.finish().unwrap();
//! ```

use std::io::Write;
use std::ops::{Deref, DerefMut};

use crate::codec::primitives::ByteSink;
use crate::codec::scope::ScopeState;
use crate::codec::tag;
use crate::codec::value::encode_value;
use crate::error::{EncodeError, UsageError};
use crate::model::Value;

/// Writer for encoding NBON values.
#[derive(Debug)]
pub struct Writer<W: Write> {
    sink: ByteSink<W>,
    depth: usize,
    state: ScopeState,
}

impl<W: Write> Writer<W> {
    /// Creates a writer over `sink`. Pass `&mut sink` to keep ownership.
    pub fn new(sink: W) -> Self {
        Self {
            sink: ByteSink::new(sink),
            depth: 0,
            state: ScopeState::Ready,
        }
    }

    /// Returns the number of bytes written.
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// Returns the number of containers currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Returns the sink.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    /// Flushes the sink.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.sink.flush()
    }

    #[inline]
    fn check_ready(&self) -> Result<(), EncodeError> {
        Ok(self.state.check()?)
    }

    pub fn write_true(&mut self) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::TRUE)
    }

    pub fn write_false(&mut self) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::FALSE)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        if value {
            self.write_true()
        } else {
            self.write_false()
        }
    }

    pub fn write_null(&mut self) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::NULL)
    }

    /// Writes a string value. The bytes must not contain NUL.
    pub fn write_string(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.check_ready()?;
        check_no_nul(value, "string")?;
        self.sink.write_tagged(tag::STRING, value)?;
        self.sink.write_byte(tag::NUL)
    }

    /// Writes a UTF-8 string value. The text must not contain `'\0'`.
    pub fn write_str(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_string(value.as_bytes())
    }

    /// Writes a binary value. Any byte, including NUL, is allowed.
    pub fn write_binary(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::BINARY)?;
        self.sink.write_varint(value.len() as u64)?;
        self.sink.write_bytes(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::FLOAT32)?;
        self.sink.write_f32(value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::FLOAT64)?;
        self.sink.write_f64(value)
    }

    /// Writes a signed integer.
    ///
    /// `i64::MIN` has no positive counterpart in `i64`; `unsigned_abs` yields
    /// its magnitude (2^63) directly in `u64`.
    pub fn write_i64(&mut self, value: i64) -> Result<(), EncodeError> {
        self.check_ready()?;
        if value < 0 {
            self.sink.write_byte(tag::NEGATIVE)?;
            self.sink.write_varint(value.unsigned_abs())
        } else {
            self.write_magnitude(value.unsigned_abs())
        }
    }

    /// Writes an unsigned integer.
    pub fn write_u64(&mut self, value: u64) -> Result<(), EncodeError> {
        self.check_ready()?;
        self.write_magnitude(value)
    }

    fn write_magnitude(&mut self, value: u64) -> Result<(), EncodeError> {
        match tag::digit(value) {
            Some(digit) => self.sink.write_byte(digit),
            None => {
                self.sink.write_byte(tag::POSITIVE)?;
                self.sink.write_varint(value)
            }
        }
    }

    /// Writes any owned value, recursing into containers.
    pub fn write_value(&mut self, value: &Value) -> Result<(), EncodeError> {
        encode_value(self, value)
    }

    /// Opens an array. Elements are written through the returned handle.
    pub fn begin_array(&mut self) -> Result<ArrayWriter<'_, W>, EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::ARRAY_START)?;
        self.depth += 1;
        tracing::trace!(depth = self.depth, offset = self.position(), "array opened");
        Ok(ArrayWriter {
            writer: self,
            closed: false,
        })
    }

    /// Writes an array whose elements are produced by `f`.
    ///
    /// The closer is written even if `f` returns early with an error.
    pub fn write_array<T, F>(&mut self, f: F) -> Result<T, EncodeError>
    where
        F: FnOnce(&mut ArrayWriter<'_, W>) -> Result<T, EncodeError>,
    {
        let mut array = self.begin_array()?;
        let out = f(&mut array)?;
        array.finish()?;
        Ok(out)
    }

    /// Opens an object. Entries are written through the returned handle.
    pub fn begin_object(&mut self) -> Result<ObjectWriter<'_, W>, EncodeError> {
        self.check_ready()?;
        self.sink.write_byte(tag::OBJECT_START)?;
        self.depth += 1;
        tracing::trace!(depth = self.depth, offset = self.position(), "object opened");
        Ok(ObjectWriter {
            writer: self,
            pending: false,
            closed: false,
        })
    }

    /// Writes an object whose entries are produced by `f`.
    pub fn write_object<T, F>(&mut self, f: F) -> Result<T, EncodeError>
    where
        F: FnOnce(&mut ObjectWriter<'_, W>) -> Result<T, EncodeError>,
    {
        let mut object = self.begin_object()?;
        let out = f(&mut object)?;
        object.finish()?;
        Ok(out)
    }

    fn close_container(&mut self, closer: u8) -> Result<(), EncodeError> {
        self.depth -= 1;
        self.sink.write_byte(closer)?;
        tracing::trace!(depth = self.depth, offset = self.position(), "container closed");
        Ok(())
    }
}

fn check_no_nul(bytes: &[u8], field: &'static str) -> Result<(), EncodeError> {
    match bytes.iter().position(|&b| b == tag::NUL) {
        Some(offset) => Err(EncodeError::InteriorNul { field, offset }),
        None => Ok(()),
    }
}

// =============================================================================
// ARRAYS
// =============================================================================

/// An open array scope. Every value written through it becomes an element.
#[derive(Debug)]
pub struct ArrayWriter<'w, W: Write> {
    writer: &'w mut Writer<W>,
    closed: bool,
}

impl<W: Write> ArrayWriter<'_, W> {
    /// Writes the `]` closer and hands control back to the parent.
    pub fn finish(mut self) -> Result<(), EncodeError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), EncodeError> {
        self.writer.check_ready()?;
        self.closed = true;
        self.writer.close_container(tag::ARRAY_END)
    }
}

impl<W: Write> Deref for ArrayWriter<'_, W> {
    type Target = Writer<W>;

    fn deref(&self) -> &Writer<W> {
        self.writer
    }
}

impl<W: Write> DerefMut for ArrayWriter<'_, W> {
    fn deref_mut(&mut self) -> &mut Writer<W> {
        self.writer
    }
}

impl<W: Write> Drop for ArrayWriter<'_, W> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(depth = self.writer.depth, "array writer dropped without finish; closing");
            // Errors cannot be reported from drop; a failing sink has
            // already surfaced one to the caller.
            let _ = self.close();
        }
    }
}

// =============================================================================
// OBJECTS
// =============================================================================

/// An open object scope.
#[derive(Debug)]
pub struct ObjectWriter<'w, W: Write> {
    writer: &'w mut Writer<W>,
    pending: bool,
    closed: bool,
}

impl<W: Write> ObjectWriter<'_, W> {
    /// Writes an entry key and returns the writer for its value.
    ///
    /// The key must not contain NUL and must not begin with `}`.
    pub fn key(&mut self, key: &[u8]) -> Result<ValueWriter<'_, W>, EncodeError> {
        self.writer.check_ready()?;
        if self.pending {
            return Err(UsageError::ValuePending.into());
        }
        check_no_nul(key, "object key")?;
        if key.first() == Some(&tag::OBJECT_END) {
            return Err(EncodeError::KeyStartsWithTerminator);
        }
        self.writer.sink.write_bytes(key)?;
        self.writer.sink.write_byte(tag::NUL)?;
        self.pending = true;
        Ok(ValueWriter {
            writer: &mut *self.writer,
            pending: &mut self.pending,
        })
    }

    pub fn key_str(&mut self, key: &str) -> Result<ValueWriter<'_, W>, EncodeError> {
        self.key(key.as_bytes())
    }

    /// Writes a complete entry from an owned value.
    pub fn entry(&mut self, key: &[u8], value: &Value) -> Result<(), EncodeError> {
        self.key(key)?.write_value(value)
    }

    /// Writes the `}` closer and hands control back to the parent.
    pub fn finish(mut self) -> Result<(), EncodeError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), EncodeError> {
        self.writer.check_ready()?;
        if self.pending {
            return Err(UsageError::ValuePending.into());
        }
        self.closed = true;
        self.writer.close_container(tag::OBJECT_END)
    }
}

impl<W: Write> Drop for ObjectWriter<'_, W> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.pending {
            // A key without a value cannot be repaired.
            tracing::warn!(depth = self.writer.depth, "object writer dropped with a key awaiting its value");
            self.writer.state = ScopeState::Abandoned;
        } else {
            tracing::debug!(depth = self.writer.depth, "object writer dropped without finish; closing");
            let _ = self.close();
        }
    }
}

/// Writes the value of exactly one object entry.
///
/// Every method consumes the handle. Dropping it unused leaves the object
/// with a dangling key, which the object reports as
/// [`UsageError::ValuePending`].
#[derive(Debug)]
pub struct ValueWriter<'a, W: Write> {
    writer: &'a mut Writer<W>,
    pending: &'a mut bool,
}

impl<W: Write> ValueWriter<'_, W> {
    fn emit<T>(
        self,
        f: impl FnOnce(&mut Writer<W>) -> Result<T, EncodeError>,
    ) -> Result<T, EncodeError> {
        let out = f(self.writer)?;
        *self.pending = false;
        Ok(out)
    }

    pub fn write_bool(self, value: bool) -> Result<(), EncodeError> {
        self.emit(|w| w.write_bool(value))
    }

    pub fn write_null(self) -> Result<(), EncodeError> {
        self.emit(Writer::write_null)
    }

    pub fn write_string(self, value: &[u8]) -> Result<(), EncodeError> {
        self.emit(|w| w.write_string(value))
    }

    pub fn write_str(self, value: &str) -> Result<(), EncodeError> {
        self.emit(|w| w.write_str(value))
    }

    pub fn write_binary(self, value: &[u8]) -> Result<(), EncodeError> {
        self.emit(|w| w.write_binary(value))
    }

    pub fn write_f32(self, value: f32) -> Result<(), EncodeError> {
        self.emit(|w| w.write_f32(value))
    }

    pub fn write_f64(self, value: f64) -> Result<(), EncodeError> {
        self.emit(|w| w.write_f64(value))
    }

    pub fn write_i64(self, value: i64) -> Result<(), EncodeError> {
        self.emit(|w| w.write_i64(value))
    }

    pub fn write_u64(self, value: u64) -> Result<(), EncodeError> {
        self.emit(|w| w.write_u64(value))
    }

    pub fn write_value(self, value: &Value) -> Result<(), EncodeError> {
        self.emit(|w| w.write_value(value))
    }

    pub fn write_array<T, F>(self, f: F) -> Result<T, EncodeError>
    where
        F: FnOnce(&mut ArrayWriter<'_, W>) -> Result<T, EncodeError>,
    {
        self.emit(|w| w.write_array(f))
    }

    pub fn write_object<T, F>(self, f: F) -> Result<T, EncodeError>
    where
        F: FnOnce(&mut ObjectWriter<'_, W>) -> Result<T, EncodeError>,
    {
        self.emit(|w| w.write_object(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut Writer<&mut Vec<u8>>) -> Result<(), EncodeError>) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf);
        f(&mut writer).unwrap();
        buf
    }

    #[test]
    fn test_arrays() {
        let bytes = written(|w| {
            w.write_array(|a| {
                a.write_true()?;
                a.write_false()?;
                a.write_array(|a| {
                    a.write_bool(false)?;
                    a.write_bool(true)
                })?;
                a.write_null()
            })
        });
        assert_eq!(bytes, b"[TF[FT]N]");
    }

    #[test]
    fn test_single_entry_object() {
        let bytes = written(|w| w.write_object(|o| o.key(b"x")?.write_i64(2)));
        assert_eq!(bytes, b"{x\x002}");
    }

    #[test]
    fn test_objects() {
        let bytes = written(|w| {
            w.write_object(|o| {
                o.key_str("Hello")?.write_bool(true)?;
                o.key_str("Goodbye")?.write_bool(false)?;
                o.key_str("SubObj")?.write_object(|o| o.key_str("hello world")?.write_i64(3))?;
                o.key_str("x")?.write_i64(2)?;
                o.key_str("y")?.write_i64(4)
            })
        });
        assert_eq!(
            bytes,
            b"{Hello\0TGoodbye\0FSubObj\0{hello world\x003}x\x002y\x004}".as_slice()
        );
    }

    #[test]
    fn test_single_byte_integers() {
        let bytes = written(|w| {
            for v in [0u8, 1, 2, 8, 9] {
                w.write_i64(i64::from(v))?;
                w.write_u64(u64::from(v))?;
            }
            for v in [10u8, 33, 127] {
                w.write_i64(i64::from(v))?;
                w.write_u64(u64::from(v))?;
            }
            w.write_i64(-1)?;
            w.write_i64(-66)?;
            w.write_i64(-127)
        });
        assert_eq!(
            bytes,
            b"0011228899+\x0a+\x0a+\x21+\x21+\x7f+\x7f-\x01-\x42-\x7f".as_slice()
        );
    }

    #[test]
    fn test_multi_byte_integers() {
        let bytes = written(|w| {
            w.write_i64(128)?;
            w.write_u64(128)?;
            w.write_u64(0xffff_ffff)?;
            w.write_i64(-0x7fff_ffff_ffff_ffff)?;
            w.write_u64(u64::MAX)
        });
        let mut expected = Vec::new();
        expected.extend_from_slice(b"+\x80\x01");
        expected.extend_from_slice(b"+\x80\x01");
        expected.extend_from_slice(b"+\xff\xff\xff\xff\x0f");
        expected.extend_from_slice(b"-\xff\xff\xff\xff\xff\xff\xff\xff\x7f");
        expected.extend_from_slice(b"+\xff\xff\xff\xff\xff\xff\xff\xff\xff\x01");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_min_i64() {
        let bytes = written(|w| w.write_i64(i64::MIN));
        assert_eq!(bytes, b"-\x80\x80\x80\x80\x80\x80\x80\x80\x80\x01".as_slice());
    }

    #[test]
    fn test_floats() {
        let bytes = written(|w| {
            w.write_f32(10.0)?;
            w.write_f32(10040.33f64 as f32)?;
            w.write_f32(0.1f64 as f32)?;
            w.write_f32(-11.0)?;
            w.write_f32(f32::INFINITY)
        });
        assert_eq!(
            bytes,
            b"f\x00\x00\x20\x41f\x52\xe1\x1c\x46f\xcd\xcc\xcc\x3df\x00\x00\x30\xc1f\x00\x00\x80\x7f"
                .as_slice()
        );
    }

    #[test]
    fn test_doubles() {
        let bytes = written(|w| {
            w.write_f64(10.0)?;
            w.write_f64(10040.33)?;
            w.write_f64(0.1)?;
            w.write_f64(-11.0)?;
            w.write_f64(f64::INFINITY)
        });
        let mut expected = Vec::new();
        expected.extend_from_slice(b"d\x00\x00\x00\x00\x00\x00\x24\x40");
        expected.extend_from_slice(b"d\xd7\xa3\x70\x3d\x2a\x9c\xc3\x40");
        expected.extend_from_slice(b"d\x9a\x99\x99\x99\x99\x99\xb9\x3f");
        expected.extend_from_slice(b"d\x00\x00\x00\x00\x00\x00\x26\xc0");
        expected.extend_from_slice(b"d\x00\x00\x00\x00\x00\x00\xf0\x7f");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_string_and_binary() {
        let bytes = written(|w| {
            w.write_str("hi")?;
            w.write_binary(b"a\0b")
        });
        assert_eq!(bytes, b"Shi\0B\x03a\0b".as_slice());
    }

    #[test]
    fn test_string_with_nul_rejected() {
        let mut writer = Writer::new(Vec::new());
        let result = writer.write_string(b"a\0b");
        assert!(matches!(
            result,
            Err(EncodeError::InteriorNul { field: "string", offset: 1 })
        ));
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let mut writer = Writer::new(Vec::new());
        let mut object = writer.begin_object().unwrap();
        assert!(matches!(
            object.key(b"a\0"),
            Err(EncodeError::InteriorNul { field: "object key", .. })
        ));
        assert!(matches!(
            object.key(b"}x"),
            Err(EncodeError::KeyStartsWithTerminator)
        ));
        // An empty key and keys containing '}' later on are fine.
        object.key(b"").unwrap().write_null().unwrap();
        object.key(b"a}").unwrap().write_null().unwrap();
        object.finish().unwrap();
        assert_eq!(writer.into_inner(), b"{\0Na}\0N}".as_slice());
    }

    #[test]
    fn test_key_without_value_is_usage_error() {
        let mut writer = Writer::new(Vec::new());
        let mut object = writer.begin_object().unwrap();
        drop(object.key(b"a").unwrap());

        let err = object.key(b"b").err().unwrap();
        assert!(err.is_usage());
        assert!(matches!(err, EncodeError::Usage(UsageError::ValuePending)));

        let err = object.finish().unwrap_err();
        assert!(matches!(err, EncodeError::Usage(UsageError::ValuePending)));

        // The dangling key poisoned the parent writer.
        let err = writer.write_i64(10).unwrap_err();
        assert!(matches!(err, EncodeError::Usage(UsageError::ScopeAbandoned)));
    }

    #[test]
    fn test_dropped_array_still_closes() {
        let mut writer = Writer::new(Vec::new());
        {
            let mut array = writer.begin_array().unwrap();
            array.write_u64(1).unwrap();
        }
        writer.write_null().unwrap();
        assert_eq!(writer.depth(), 0);
        assert_eq!(writer.into_inner(), b"[1]N".as_slice());
    }

    #[test]
    fn test_early_exit_closes_scope() {
        let mut writer = Writer::new(Vec::new());
        let result = writer.write_array(|a| {
            a.write_u64(1)?;
            a.write_string(b"bad\0")?;
            a.write_u64(2)
        });
        assert!(result.is_err());
        assert_eq!(writer.into_inner(), b"[1]".as_slice());
    }

    #[test]
    fn test_guard_api_matches_closure_api() {
        let mut writer = Writer::new(Vec::new());
        let mut array = writer.begin_array().unwrap();
        array.write_u64(5).unwrap();
        let mut object = array.begin_object().unwrap();
        object.key(b"k").unwrap().write_str("v").unwrap();
        object.finish().unwrap();
        assert_eq!(array.depth(), 1);
        array.finish().unwrap();
        assert_eq!(writer.position(), 10);
        assert_eq!(writer.into_inner(), b"[5{k\0Sv\0}]".as_slice());
    }
}
