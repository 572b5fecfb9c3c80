//! Conversion between owned [`Value`] trees and the wire format.
//!
//! Built entirely on the streaming [`Writer`] and [`Reader`], so the same
//! scope and limit checks apply.

use std::io::{BufRead, Write};

use crate::codec::reader::{DecodeOptions, Reader};
use crate::codec::writer::Writer;
use crate::error::{DecodeError, EncodeError};
use crate::model::{Type, Value};

// =============================================================================
// ENCODING
// =============================================================================

/// Writes `value` and everything nested inside it.
pub fn encode_value<W: Write>(writer: &mut Writer<W>, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Bool(v) => writer.write_bool(*v),
        Value::Null => writer.write_null(),
        Value::String(bytes) => writer.write_string(bytes),
        Value::Binary(bytes) => writer.write_binary(bytes),
        Value::Float32(v) => writer.write_f32(*v),
        Value::Float64(v) => writer.write_f64(*v),
        Value::Int64(v) => writer.write_i64(*v),
        Value::UInt64(v) => writer.write_u64(*v),
        Value::Array(items) => writer.write_array(|array| {
            for item in items {
                array.write_value(item)?;
            }
            Ok(())
        }),
        Value::Object(entries) => writer.write_object(|object| {
            for (key, item) in entries {
                object.key(key)?.write_value(item)?;
            }
            Ok(())
        }),
    }
}

/// Encodes a single value into a new buffer.
pub fn to_vec(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_value(value)?;
    Ok(writer.into_inner())
}

// =============================================================================
// DECODING
// =============================================================================

/// Reads the next value and everything nested inside it.
///
/// Non-negative integers decode as [`Value::UInt64`] whether or not the
/// writer used the signed call; negative ones as [`Value::Int64`].
pub fn decode_value<R: BufRead>(reader: &mut Reader<R>) -> Result<Value, DecodeError> {
    let value = match reader.peek_type()? {
        Type::Bool => Value::Bool(reader.read_bool()?),
        Type::Null => {
            reader.read_null()?;
            Value::Null
        }
        Type::String => Value::String(reader.read_string()?),
        Type::Binary => Value::Binary(reader.read_binary()?),
        Type::Float32 => Value::Float32(reader.read_f32()?),
        Type::Float64 => Value::Float64(reader.read_f64()?),
        Type::Int => Value::Int64(reader.read_i64()?),
        Type::UInt => Value::UInt64(reader.read_u64()?),
        Type::Array => Value::Array(reader.read_array(|array| {
            let mut items = Vec::new();
            array.for_each(|item| {
                items.push(item.read_value()?);
                Ok(())
            })?;
            Ok(items)
        })?),
        Type::Object => Value::Object(reader.read_object(|object| {
            let mut entries = Vec::new();
            while object.has_next()? {
                let (key, item) = object.next()?;
                entries.push((key, item.read_value()?));
            }
            Ok(entries)
        })?),
    };
    Ok(value)
}

/// Decodes a buffer holding exactly one value.
pub fn from_slice(data: &[u8]) -> Result<Value, DecodeError> {
    from_slice_with_options(data, DecodeOptions::default())
}

/// Decodes a buffer holding exactly one value, with custom limits.
///
/// Bytes left over after the value are an error.
pub fn from_slice_with_options(data: &[u8], options: DecodeOptions) -> Result<Value, DecodeError> {
    let mut reader = Reader::with_options(data, options);
    let value = reader.read_value()?;
    if let Some(found) = reader.peek_byte()? {
        return Err(DecodeError::UnexpectedTag {
            context: "end of document",
            found,
            position: reader.position(),
        });
    }
    Ok(value)
}

/// Decodes every top-level value in `source` until end of input.
pub fn decode_all<R: BufRead>(source: R) -> Result<Vec<Value>, DecodeError> {
    let mut reader = Reader::new(source);
    let mut values = Vec::new();
    while reader.has_next()? {
        values.push(reader.read_value()?);
    }
    tracing::debug!(count = values.len(), bytes = reader.position(), "decoded document");
    Ok(values)
}
