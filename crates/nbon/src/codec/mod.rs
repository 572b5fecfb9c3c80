//! Binary encoding/decoding for NBON.
//!
//! - [`writer`]: streaming [`Writer`] with array/object scope handles
//! - [`reader`]: streaming [`Reader`] with the matching read-side handles
//! - [`value`]: owned [`Value`](crate::Value) trees on top of both
//! - [`primitives`]: byte-level cursors, varints and floats
//! - [`tag`]: the tag byte table

pub mod primitives;
pub mod reader;
pub mod tag;
pub mod value;
pub mod writer;

mod scope;

pub use primitives::{ByteSink, ByteSource, encode_varint, varint_len};
pub use reader::{ArrayReader, DecodeOptions, ObjectReader, Reader, ValueReader};
pub use value::{decode_all, decode_value, encode_value, from_slice, from_slice_with_options, to_vec};
pub use writer::{ArrayWriter, ObjectWriter, ValueWriter, Writer};
