//! Streaming NBON reader.
//!
//! [`Reader`] decodes values from any [`BufRead`] source one at a time,
//! peeking at most one byte ahead. Containers are read through scope
//! handles that mirror the writer side:
//!
//! - [`ArrayReader`]: `has_next` / `next`, yielding one [`ValueReader`] per
//!   element.
//! - [`ObjectReader`]: `has_next` / `next`, yielding the key and a
//!   [`ValueReader`] for its value.
//!
//! Each [`ValueReader`] must be consumed (read or skipped) before the
//! container will hand out the next one.

use std::io::BufRead;

use crate::codec::primitives::ByteSource;
use crate::codec::scope::ScopeState;
use crate::codec::tag;
use crate::codec::value::decode_value;
use crate::error::{DecodeError, UsageError};
use crate::limits::{DEFAULT_MAX_BINARY_LEN, DEFAULT_MAX_DEPTH, DEFAULT_MAX_STRING_LEN};
use crate::model::{Type, Value};

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum number of simultaneously open containers.
    pub max_depth: usize,
    /// Maximum length of a string value or object key.
    pub max_string_len: usize,
    /// Maximum declared length of a binary value.
    pub max_binary_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_binary_len: DEFAULT_MAX_BINARY_LEN,
        }
    }
}

impl DecodeOptions {
    /// Creates the default decode options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with no string or binary length limits, for trusted input.
    ///
    /// Nesting depth stays bounded since recursive decoding uses the stack.
    pub fn unbounded() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_len: usize::MAX,
            max_binary_len: usize::MAX,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_string_len(mut self, max_string_len: usize) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    pub fn with_max_binary_len(mut self, max_binary_len: usize) -> Self {
        self.max_binary_len = max_binary_len;
        self
    }
}

/// Reader for decoding NBON values.
#[derive(Debug)]
pub struct Reader<R: BufRead> {
    source: ByteSource<R>,
    options: DecodeOptions,
    depth: usize,
    state: ScopeState,
}

impl<R: BufRead> Reader<R> {
    /// Creates a reader with default limits. Pass `&mut source` to keep ownership.
    pub fn new(source: R) -> Self {
        Self::with_options(source, DecodeOptions::default())
    }

    pub fn with_options(source: R, options: DecodeOptions) -> Self {
        Self {
            source: ByteSource::new(source),
            options,
            depth: 0,
            state: ScopeState::Ready,
        }
    }

    /// Returns the number of bytes consumed.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Returns the number of containers currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn get_ref(&self) -> &R {
        self.source.get_ref()
    }

    /// Returns the source, positioned just after the last consumed byte.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    #[inline]
    fn check_ready(&self) -> Result<(), DecodeError> {
        Ok(self.state.check()?)
    }

    /// Returns true if another top-level value follows.
    ///
    /// A document is any number of concatenated values; this is false only
    /// at end of input.
    pub fn has_next(&mut self) -> Result<bool, DecodeError> {
        self.check_ready()?;
        Ok(self.source.peek()?.is_some())
    }

    /// Returns the next raw byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        self.check_ready()?;
        self.source.peek()
    }

    /// Returns the type of the next value without consuming anything.
    pub fn peek_type(&mut self) -> Result<Type, DecodeError> {
        self.check_ready()?;
        let tag = self
            .source
            .peek()?
            .ok_or(DecodeError::UnexpectedEof { context: "value" })?;
        Type::from_tag(tag).ok_or(DecodeError::InvalidTag {
            tag,
            position: self.source.position(),
        })
    }

    /// Consumes a tag byte, failing unless it equals `expected`.
    fn expect_tag(&mut self, expected: u8, context: &'static str) -> Result<(), DecodeError> {
        let position = self.source.position();
        let found = self.source.read_byte(context)?;
        if found != expected {
            return Err(DecodeError::UnexpectedTag {
                context,
                found,
                position,
            });
        }
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.check_ready()?;
        let position = self.source.position();
        match self.source.read_byte("bool")? {
            tag::TRUE => Ok(true),
            tag::FALSE => Ok(false),
            found => Err(DecodeError::UnexpectedTag {
                context: "bool",
                found,
                position,
            }),
        }
    }

    pub fn read_null(&mut self) -> Result<(), DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::NULL, "null")
    }

    /// Reads a string value into `out`, replacing its contents.
    pub fn read_string_into(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::STRING, "string")?;
        out.clear();
        self.source
            .read_until_nul(Some(out), self.options.max_string_len, "string")
    }

    /// Reads a string value as raw bytes.
    pub fn read_string(&mut self) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        self.read_string_into(&mut out)?;
        Ok(out)
    }

    /// Reads a string value that must be valid UTF-8.
    pub fn read_str(&mut self) -> Result<String, DecodeError> {
        String::from_utf8(self.read_string()?)
            .map_err(|_| DecodeError::InvalidUtf8 { field: "string" })
    }

    /// Discards a string value without buffering it.
    pub fn skip_string(&mut self) -> Result<(), DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::STRING, "string")?;
        self.source.read_until_nul(None, usize::MAX, "string")
    }

    fn read_binary_len(&mut self) -> Result<u64, DecodeError> {
        self.expect_tag(tag::BINARY, "binary")?;
        self.source.read_varint("binary length")
    }

    /// Reads a binary value into `out`, replacing its contents.
    pub fn read_binary_into(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        self.check_ready()?;
        let len = self.read_binary_len()?;
        let max = self.options.max_binary_len;
        if len > max as u64 {
            tracing::debug!(len, max, "binary value exceeds limit");
            return Err(DecodeError::LengthExceedsLimit {
                field: "binary",
                len,
                max,
            });
        }
        out.clear();
        self.source.read_exact_into(len, out, "binary")
    }

    pub fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        self.read_binary_into(&mut out)?;
        Ok(out)
    }

    /// Discards a binary value without buffering it.
    pub fn skip_binary(&mut self) -> Result<(), DecodeError> {
        self.check_ready()?;
        let len = self.read_binary_len()?;
        self.source.skip_exact(len, "binary")
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::FLOAT32, "float32")?;
        self.source.read_f32("float32")
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::FLOAT64, "float64")?;
        self.source.read_f64("float64")
    }

    /// Reads a signed integer (digit, `+` or `-` tag).
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.check_ready()?;
        let position = self.source.position();
        let found = self.source.read_byte("int")?;
        if let Some(value) = tag::digit_value(found) {
            return Ok(value as i64);
        }
        match found {
            tag::POSITIVE => {
                let magnitude = self.source.read_varint("int")?;
                i64::try_from(magnitude).map_err(|_| DecodeError::IntegerOverflow {
                    context: "int",
                    magnitude,
                })
            }
            tag::NEGATIVE => {
                let magnitude = self.source.read_varint("int")?;
                negate_magnitude(magnitude).ok_or(DecodeError::IntegerOverflow {
                    context: "int",
                    magnitude,
                })
            }
            _ => Err(DecodeError::UnexpectedTag {
                context: "int",
                found,
                position,
            }),
        }
    }

    /// Reads an unsigned integer (digit or `+` tag).
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.check_ready()?;
        let position = self.source.position();
        let found = self.source.read_byte("uint")?;
        if let Some(value) = tag::digit_value(found) {
            return Ok(value);
        }
        match found {
            tag::POSITIVE => self.source.read_varint("uint"),
            _ => Err(DecodeError::UnexpectedTag {
                context: "uint",
                found,
                position,
            }),
        }
    }

    /// Discards an integer of either sign without range checks.
    fn skip_integer(&mut self) -> Result<(), DecodeError> {
        let position = self.source.position();
        let found = self.source.read_byte("int")?;
        match found {
            b'0'..=b'9' => Ok(()),
            tag::POSITIVE | tag::NEGATIVE => self.source.read_varint("int").map(drop),
            _ => Err(DecodeError::UnexpectedTag {
                context: "int",
                found,
                position,
            }),
        }
    }

    fn enter(&mut self, kind: &'static str) -> Result<(), DecodeError> {
        let max = self.options.max_depth;
        if self.depth >= max {
            tracing::debug!(max, offset = self.position(), "container nesting limit reached");
            return Err(DecodeError::DepthLimitExceeded { max });
        }
        self.depth += 1;
        tracing::trace!(depth = self.depth, offset = self.position(), "{kind} opened");
        Ok(())
    }

    fn leave(&mut self, closer: u8, context: &'static str) -> Result<(), DecodeError> {
        self.expect_tag(closer, context)?;
        self.depth -= 1;
        tracing::trace!(depth = self.depth, offset = self.position(), "container closed");
        Ok(())
    }

    /// Opens an array. Elements are read through the returned handle.
    pub fn begin_array(&mut self) -> Result<ArrayReader<'_, R>, DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::ARRAY_START, "array")?;
        self.enter("array")?;
        Ok(ArrayReader {
            reader: self,
            pending: false,
            closed: false,
        })
    }

    /// Reads an array through `f`, then consumes the closer.
    ///
    /// `f` must leave the array positioned at its closer, i.e. read or skip
    /// every element (see [`ArrayReader::skip_rest`]).
    pub fn read_array<T, F>(&mut self, f: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut ArrayReader<'_, R>) -> Result<T, DecodeError>,
    {
        let mut array = self.begin_array()?;
        let out = f(&mut array)?;
        array.finish()?;
        Ok(out)
    }

    /// Opens an object. Entries are read through the returned handle.
    pub fn begin_object(&mut self) -> Result<ObjectReader<'_, R>, DecodeError> {
        self.check_ready()?;
        self.expect_tag(tag::OBJECT_START, "object")?;
        self.enter("object")?;
        Ok(ObjectReader {
            reader: self,
            pending: false,
            closed: false,
        })
    }

    /// Reads an object through `f`, then consumes the closer.
    pub fn read_object<T, F>(&mut self, f: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut ObjectReader<'_, R>) -> Result<T, DecodeError>,
    {
        let mut object = self.begin_object()?;
        let out = f(&mut object)?;
        object.finish()?;
        Ok(out)
    }

    /// Discards the next value of any type.
    ///
    /// Leaves the cursor exactly where fully decoding the value would.
    pub fn skip(&mut self) -> Result<(), DecodeError> {
        match self.peek_type()? {
            Type::Bool => self.read_bool().map(drop),
            Type::Null => self.read_null(),
            Type::String => self.skip_string(),
            Type::Binary => self.skip_binary(),
            Type::Float32 => self.read_f32().map(drop),
            Type::Float64 => self.read_f64().map(drop),
            Type::Int | Type::UInt => self.skip_integer(),
            Type::Array => self.read_array(|array| array.skip_rest()),
            Type::Object => self.read_object(|object| object.skip_rest()),
        }
    }

    /// Decodes the next value into an owned [`Value`].
    pub fn read_value(&mut self) -> Result<Value, DecodeError> {
        decode_value(self)
    }
}

/// Negates a `-` magnitude. 2^63 is the one magnitude without an `i64`
/// counterpart and maps to `i64::MIN`.
fn negate_magnitude(magnitude: u64) -> Option<i64> {
    const MIN_MAGNITUDE: u64 = i64::MIN.unsigned_abs();
    if magnitude == MIN_MAGNITUDE {
        Some(i64::MIN)
    } else {
        i64::try_from(magnitude).ok().map(|v| -v)
    }
}

// =============================================================================
// ARRAYS
// =============================================================================

/// An open array scope.
#[derive(Debug)]
pub struct ArrayReader<'r, R: BufRead> {
    reader: &'r mut Reader<R>,
    pending: bool,
    closed: bool,
}

impl<R: BufRead> ArrayReader<'_, R> {
    fn check_ready(&self) -> Result<(), DecodeError> {
        self.reader.check_ready()?;
        if self.pending {
            return Err(UsageError::ValuePending.into());
        }
        Ok(())
    }

    /// Returns true if another element follows, false at the closer.
    pub fn has_next(&mut self) -> Result<bool, DecodeError> {
        self.check_ready()?;
        match self.reader.source.peek()? {
            None => Err(DecodeError::UnexpectedEof {
                context: "array element or ']'",
            }),
            Some(tag::ARRAY_END) => Ok(false),
            Some(_) => Ok(true),
        }
    }

    /// Returns a reader for the next element.
    pub fn next(&mut self) -> Result<ValueReader<'_, R>, DecodeError> {
        self.check_ready()?;
        self.pending = true;
        Ok(ValueReader {
            reader: &mut *self.reader,
            pending: &mut self.pending,
        })
    }

    /// Calls `f` for every remaining element.
    pub fn for_each<F>(&mut self, mut f: F) -> Result<(), DecodeError>
    where
        F: FnMut(ValueReader<'_, R>) -> Result<(), DecodeError>,
    {
        while self.has_next()? {
            f(self.next()?)?;
        }
        Ok(())
    }

    /// Skips every remaining element.
    pub fn skip_rest(&mut self) -> Result<(), DecodeError> {
        self.for_each(|value| value.skip())
    }

    /// Consumes the `]` closer and hands control back to the parent.
    pub fn finish(mut self) -> Result<(), DecodeError> {
        self.check_ready()?;
        self.reader.leave(tag::ARRAY_END, "array end")?;
        self.closed = true;
        Ok(())
    }
}

impl<R: BufRead> Drop for ArrayReader<'_, R> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                depth = self.reader.depth,
                offset = self.reader.position(),
                "array reader dropped before its closer"
            );
            self.reader.state = ScopeState::Abandoned;
        }
    }
}

// =============================================================================
// OBJECTS
// =============================================================================

/// An open object scope.
#[derive(Debug)]
pub struct ObjectReader<'r, R: BufRead> {
    reader: &'r mut Reader<R>,
    pending: bool,
    closed: bool,
}

impl<R: BufRead> ObjectReader<'_, R> {
    fn check_ready(&self) -> Result<(), DecodeError> {
        self.reader.check_ready()?;
        if self.pending {
            return Err(UsageError::ValuePending.into());
        }
        Ok(())
    }

    /// Returns true if another entry follows, false at the closer.
    pub fn has_next(&mut self) -> Result<bool, DecodeError> {
        self.check_ready()?;
        match self.reader.source.peek()? {
            None => Err(DecodeError::UnexpectedEof {
                context: "object key or '}'",
            }),
            Some(tag::OBJECT_END) => Ok(false),
            Some(_) => Ok(true),
        }
    }

    /// Reads the next key into `key` and returns a reader for its value.
    pub fn next_into(&mut self, key: &mut Vec<u8>) -> Result<ValueReader<'_, R>, DecodeError> {
        self.check_ready()?;
        let position = self.reader.position();
        if self.reader.source.peek()? == Some(tag::OBJECT_END) {
            return Err(DecodeError::UnexpectedTag {
                context: "object key",
                found: tag::OBJECT_END,
                position,
            });
        }
        key.clear();
        let max = self.reader.options.max_string_len;
        self.reader.source.read_until_nul(Some(key), max, "object key")?;
        self.pending = true;
        Ok(ValueReader {
            reader: &mut *self.reader,
            pending: &mut self.pending,
        })
    }

    /// Reads the next key and returns it with a reader for its value.
    pub fn next(&mut self) -> Result<(Vec<u8>, ValueReader<'_, R>), DecodeError> {
        let mut key = Vec::new();
        let value = self.next_into(&mut key)?;
        Ok((key, value))
    }

    /// Calls `f` with every remaining key and its value reader.
    pub fn for_each<F>(&mut self, mut f: F) -> Result<(), DecodeError>
    where
        F: FnMut(&[u8], ValueReader<'_, R>) -> Result<(), DecodeError>,
    {
        let mut key = Vec::new();
        while self.has_next()? {
            let value = self.next_into(&mut key)?;
            f(&key, value)?;
        }
        Ok(())
    }

    /// Skips every remaining entry.
    pub fn skip_rest(&mut self) -> Result<(), DecodeError> {
        self.for_each(|_, value| value.skip())
    }

    /// Consumes the `}` closer and hands control back to the parent.
    pub fn finish(mut self) -> Result<(), DecodeError> {
        self.check_ready()?;
        self.reader.leave(tag::OBJECT_END, "object end")?;
        self.closed = true;
        Ok(())
    }
}

impl<R: BufRead> Drop for ObjectReader<'_, R> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                depth = self.reader.depth,
                offset = self.reader.position(),
                "object reader dropped before its closer"
            );
            self.reader.state = ScopeState::Abandoned;
        }
    }
}

// =============================================================================
// VALUES
// =============================================================================

/// Reads exactly one array element or object value.
///
/// Every read method consumes the handle. Dropping it unused makes the
/// enclosing container report [`UsageError::ValuePending`].
#[derive(Debug)]
pub struct ValueReader<'a, R: BufRead> {
    reader: &'a mut Reader<R>,
    pending: &'a mut bool,
}

impl<R: BufRead> ValueReader<'_, R> {
    fn consume<T>(
        self,
        f: impl FnOnce(&mut Reader<R>) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let out = f(self.reader)?;
        *self.pending = false;
        Ok(out)
    }

    /// Returns the type of the value without consuming it.
    pub fn peek_type(&mut self) -> Result<Type, DecodeError> {
        self.reader.peek_type()
    }

    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn read_bool(self) -> Result<bool, DecodeError> {
        self.consume(Reader::read_bool)
    }

    pub fn read_null(self) -> Result<(), DecodeError> {
        self.consume(Reader::read_null)
    }

    pub fn read_string(self) -> Result<Vec<u8>, DecodeError> {
        self.consume(Reader::read_string)
    }

    pub fn read_string_into(self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        self.consume(|r| r.read_string_into(out))
    }

    pub fn read_str(self) -> Result<String, DecodeError> {
        self.consume(Reader::read_str)
    }

    pub fn read_binary(self) -> Result<Vec<u8>, DecodeError> {
        self.consume(Reader::read_binary)
    }

    pub fn read_binary_into(self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        self.consume(|r| r.read_binary_into(out))
    }

    pub fn read_f32(self) -> Result<f32, DecodeError> {
        self.consume(Reader::read_f32)
    }

    pub fn read_f64(self) -> Result<f64, DecodeError> {
        self.consume(Reader::read_f64)
    }

    pub fn read_i64(self) -> Result<i64, DecodeError> {
        self.consume(Reader::read_i64)
    }

    pub fn read_u64(self) -> Result<u64, DecodeError> {
        self.consume(Reader::read_u64)
    }

    pub fn read_value(self) -> Result<Value, DecodeError> {
        self.consume(Reader::read_value)
    }

    pub fn skip(self) -> Result<(), DecodeError> {
        self.consume(Reader::skip)
    }

    pub fn read_array<T, F>(self, f: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut ArrayReader<'_, R>) -> Result<T, DecodeError>,
    {
        self.consume(|r| r.read_array(f))
    }

    pub fn read_object<T, F>(self, f: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut ObjectReader<'_, R>) -> Result<T, DecodeError>,
    {
        self.consume(|r| r.read_object(f))
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_read_nested_arrays() {
        let mut reader = Reader::new(&b"[TF[FT]N]"[..]);
        let collected = reader
            .read_array(|a| {
                assert!(a.has_next()?);
                let first = a.next()?.read_bool()?;
                let second = a.next()?.read_bool()?;
                let inner = a.next()?.read_array(|inner| {
                    let mut out = Vec::new();
                    inner.for_each(|v| {
                        out.push(v.read_bool()?);
                        Ok(())
                    })?;
                    Ok(out)
                })?;
                a.next()?.read_null()?;
                assert!(!a.has_next()?);
                Ok((first, second, inner))
            })
            .unwrap();
        assert_eq!(collected, (true, false, vec![false, true]));
        assert!(!reader.has_next().unwrap());
        assert_eq!(reader.position(), 9);
    }

    #[test]
    fn test_read_object_entries() {
        let data = b"{Hello\0TGoodbye\0FSubObj\0{hello world\x003}x\x002y\x004}";
        let mut reader = Reader::new(&data[..]);
        let mut keys = Vec::new();
        reader
            .read_object(|o| {
                o.for_each(|key, value| {
                    keys.push(String::from_utf8_lossy(key).into_owned());
                    match key {
                        b"SubObj" => value.read_object(|sub| {
                            let (k, v) = sub.next()?;
                            assert_eq!(k, b"hello world");
                            assert_eq!(v.read_i64()?, 3);
                            Ok(())
                        }),
                        _ => value.skip(),
                    }
                })
            })
            .unwrap();
        assert_eq!(keys, ["Hello", "Goodbye", "SubObj", "x", "y"]);
        assert_eq!(reader.position(), data.len() as u64);
    }

    #[test]
    fn test_integers() {
        let data = b"0+\x0a-\x42+\x80\x01-\x80\x80\x80\x80\x80\x80\x80\x80\x80\x01";
        let mut reader = Reader::new(&data[..]);
        assert_eq!(reader.read_u64().unwrap(), 0);
        assert_eq!(reader.read_i64().unwrap(), 10);
        assert_eq!(reader.read_i64().unwrap(), -66);
        assert_eq!(reader.read_u64().unwrap(), 128);
        assert_eq!(reader.read_i64().unwrap(), i64::MIN);
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_integer_range_errors() {
        // u64::MAX read as signed
        let data = b"+\xff\xff\xff\xff\xff\xff\xff\xff\xff\x01";
        let result = Reader::new(&data[..]).read_i64();
        assert!(matches!(result, Err(DecodeError::IntegerOverflow { magnitude: u64::MAX, .. })));

        // 2^63 + 1 as a negative magnitude
        let data = b"-\x81\x80\x80\x80\x80\x80\x80\x80\x80\x01";
        let result = Reader::new(&data[..]).read_i64();
        assert!(matches!(result, Err(DecodeError::IntegerOverflow { .. })));

        // negative read as unsigned
        let result = Reader::new(&b"-\x01"[..]).read_u64();
        assert!(matches!(
            result,
            Err(DecodeError::UnexpectedTag { context: "uint", found: b'-', position: 0 })
        ));
    }

    #[test]
    fn test_string_and_binary() {
        let data = b"Shi\0B\x03a\0bSignored\0B\x02zz";
        let mut reader = Reader::new(&data[..]);
        assert_eq!(reader.read_str().unwrap(), "hi");
        assert_eq!(reader.read_binary().unwrap(), b"a\0b");
        reader.skip_string().unwrap();
        reader.skip_binary().unwrap();
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_invalid_utf8() {
        let result = Reader::new(&b"S\xff\xfe\0"[..]).read_str();
        assert!(matches!(result, Err(DecodeError::InvalidUtf8 { .. })));
        // the raw form accepts any bytes
        assert_eq!(Reader::new(&b"S\xff\xfe\0"[..]).read_string().unwrap(), [0xff, 0xfe]);
    }

    #[test]
    fn test_peek_type_does_not_consume() {
        let mut reader = Reader::new(&b"d\0\0\0\0\0\0\xf0\x7f"[..]);
        assert_eq!(reader.peek_type().unwrap(), Type::Float64);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_f64().unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_type_mismatch() {
        let mut reader = Reader::new(&b"N"[..]);
        let result = reader.read_bool();
        assert!(matches!(
            result,
            Err(DecodeError::UnexpectedTag { context: "bool", found: b'N', position: 0 })
        ));
    }

    #[test]
    fn test_invalid_tag() {
        let mut reader = Reader::new(&b"?"[..]);
        let err = reader.peek_type().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTag { tag: b'?', position: 0 }));
        assert_eq!(err.code(), ErrorCode::MalformedEncoding);
        assert!(matches!(reader.skip(), Err(DecodeError::InvalidTag { .. })));
    }

    #[test]
    fn test_truncated_after_array_open() {
        let mut reader = Reader::new(&b"["[..]);
        let result = reader.read_array(|a| a.skip_rest());
        let err = result.unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
        assert!(!err.is_usage());

        // Reading the element directly fails the same way.
        let mut reader = Reader::new(&b"["[..]);
        let mut array = reader.begin_array().unwrap();
        let result = array.next().unwrap().read_bool();
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { .. })));

        // As does going straight for the closer.
        let mut reader = Reader::new(&b"["[..]);
        let array = reader.begin_array().unwrap();
        assert!(matches!(array.finish(), Err(DecodeError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_missing_closer() {
        let mut reader = Reader::new(&b"[TN"[..]);
        let result = reader.read_array(|a| {
            a.next()?.read_bool()?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(DecodeError::UnexpectedTag { context: "array end", found: b'N', position: 2 })
        ));
    }

    #[test]
    fn test_closer_where_key_expected() {
        let mut reader = Reader::new(&b"{}"[..]);
        let mut object = reader.begin_object().unwrap();
        assert!(!object.has_next().unwrap());
        assert!(matches!(
            object.next(),
            Err(DecodeError::UnexpectedTag { context: "object key", .. })
        ));
        object.finish().unwrap();
    }

    #[test]
    fn test_unconsumed_value_is_usage_error() {
        let mut reader = Reader::new(&b"[TT]"[..]);
        let mut array = reader.begin_array().unwrap();
        drop(array.next().unwrap());
        let err = array.has_next().unwrap_err();
        assert!(matches!(err, DecodeError::Usage(UsageError::ValuePending)));
        assert_eq!(err.code(), ErrorCode::Usage);
    }

    #[test]
    fn test_abandoned_scope_poisons_parent() {
        let mut reader = Reader::new(&b"[TT]N"[..]);
        {
            let mut array = reader.begin_array().unwrap();
            array.next().unwrap().read_bool().unwrap();
        }
        let err = reader.read_null().unwrap_err();
        assert!(matches!(err, DecodeError::Usage(UsageError::ScopeAbandoned)));
        assert!(reader.has_next().unwrap_err().is_usage());
    }

    #[test]
    fn test_depth_limit() {
        let options = DecodeOptions::new().with_max_depth(2);
        let mut reader = Reader::with_options(&b"[[]]"[..], options);
        assert!(reader.skip().is_ok());

        let mut reader = Reader::with_options(&b"[[[]]]"[..], options);
        assert!(matches!(reader.skip(), Err(DecodeError::DepthLimitExceeded { max: 2 })));

        let mut reader = Reader::with_options(&b"{a\0{b\0{}}}"[..], options);
        let err = reader.read_value().unwrap_err();
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
    }

    #[test]
    fn test_length_limits() {
        let options = DecodeOptions::new()
            .with_max_string_len(3)
            .with_max_binary_len(2);

        let mut reader = Reader::with_options(&b"Sabcd\0"[..], options);
        assert!(matches!(
            reader.read_string(),
            Err(DecodeError::LengthExceedsLimit { field: "string", max: 3, .. })
        ));

        // Skipping does not allocate, so it is not limited.
        let mut reader = Reader::with_options(&b"Sabcd\0"[..], options);
        assert!(reader.skip().is_ok());

        let mut reader = Reader::with_options(&b"B\x03abc"[..], options);
        assert!(matches!(
            reader.read_binary(),
            Err(DecodeError::LengthExceedsLimit { field: "binary", len: 3, max: 2 })
        ));

        let mut reader = Reader::with_options(&b"{long\0N}"[..], options);
        let result = reader.read_object(|o| o.skip_rest());
        assert!(matches!(
            result,
            Err(DecodeError::LengthExceedsLimit { field: "object key", .. })
        ));
    }

    #[test]
    fn test_huge_declared_binary_length_is_eof_not_oom() {
        let data = b"B\xff\xff\xff\xff\x0fab";
        let mut reader = Reader::with_options(&data[..], DecodeOptions::unbounded());
        assert!(matches!(reader.read_binary(), Err(DecodeError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_top_level_sequence() {
        let mut reader = Reader::new(&b"1S\0[]"[..]);
        let mut types = Vec::new();
        while reader.has_next().unwrap() {
            types.push(reader.peek_type().unwrap());
            reader.skip().unwrap();
        }
        assert_eq!(types, [Type::UInt, Type::String, Type::Array]);
    }

    #[test]
    fn test_buffered_source() {
        let data = b"{key\0[S0123456789\0B\x04\0\0\0\0]}";
        let mut reader = Reader::new(BufReader::with_capacity(2, &data[..]));
        let value = reader.read_value().unwrap();
        assert_eq!(
            value,
            Value::Object(vec![(
                b"key".to_vec(),
                Value::Array(vec![
                    Value::String(b"0123456789".to_vec()),
                    Value::Binary(vec![0; 4]),
                ]),
            )])
        );
        assert_eq!(reader.position(), data.len() as u64);
    }

    #[test]
    fn test_read_into_reuses_buffers() {
        let mut reader = Reader::new(&b"Sfirst\0Sx\0B\x01z"[..]);
        let mut buf = Vec::new();
        reader.read_string_into(&mut buf).unwrap();
        assert_eq!(buf, b"first");
        reader.read_string_into(&mut buf).unwrap();
        assert_eq!(buf, b"x");
        reader.read_binary_into(&mut buf).unwrap();
        assert_eq!(buf, b"z");
    }
}
