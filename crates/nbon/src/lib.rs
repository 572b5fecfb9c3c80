//! NBON: a compact, self-describing binary value format.
//!
//! This crate provides streaming encoding and decoding of NBON documents,
//! plus an owned [`Value`] tree for callers that prefer to work with whole
//! documents.
//!
//! # Overview
//!
//! NBON encodes the JSON data model (plus binary blobs and distinct
//! float widths) with a one-byte tag in front of every value:
//! - **Self-describing**: any value can be skipped without knowing its type
//! - **Streaming**: readers and writers work over `BufRead` / `Write`
//! - **Small**: integers 0-9 take a single byte, containers have no length prefix
//!
//! # Quick Start
//!
//! ```rust
//! use nbon::{Reader, Writer};
//!
//! let mut writer = Writer::new(Vec::new());
//! writer
//!     .write_object(|obj| {
//!         obj.key_str("name")?.write_str("Alice")?;
//!         obj.key_str("scores")?.write_array(|scores| {
//!             scores.write_u64(7)?;
//!             scores.write_i64(-300)
//!         })
//!     })
//!     .unwrap();
//! let bytes = writer.into_inner();
//!
//! let mut reader = Reader::new(&bytes[..]);
//! let name = reader
//!     .read_object(|obj| {
//!         let (key, value) = obj.next()?;
//!         assert_eq!(key, b"name");
//!         let name = value.read_str()?;
//!         obj.skip_rest()?;
//!         Ok(name)
//!     })
//!     .unwrap();
//! assert_eq!(name, "Alice");
//!
//! // Or decode the whole thing at once.
//! let value = nbon::from_slice(&bytes).unwrap();
//! assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```
//!
//! # Modules
//!
//! - [`codec`]: Streaming reader/writer and value conversion
//! - [`model`]: Core data types (Type, Value)
//! - [`error`]: Error types
//! - [`limits`]: Default decode limits
//!
//! # Security
//!
//! The reader is designed to safely handle untrusted input:
//! - String, key and binary lengths are bounded by [`DecodeOptions`]
//! - Nesting depth is bounded, so recursive decoding cannot overflow the stack
//! - Varints are limited to 10 bytes and checked for overflow
//! - Declared binary lengths are never trusted for allocation up front
//!
//! # Wire Format
//!
//! | Tag | Value |
//! |-----|-------|
//! | `T` / `F` | true / false |
//! | `N` | null |
//! | `0`-`9` | integer 0-9 |
//! | `+` varint | non-negative integer |
//! | `-` varint | negative integer (magnitude) |
//! | `f` 4 bytes | float32, little-endian |
//! | `d` 8 bytes | float64, little-endian |
//! | `S` bytes NUL | string |
//! | `B` varint bytes | binary |
//! | `[` values `]` | array |
//! | `{` (key NUL value)* `}` | object |
//!
//! A document is zero or more values written back to back.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{
    ArrayReader, ArrayWriter, DecodeOptions, ObjectReader, ObjectWriter, Reader, ValueReader,
    ValueWriter, Writer, decode_all, from_slice, from_slice_with_options, to_vec,
};
pub use error::{DecodeError, EncodeError, ErrorCode, UsageError};
pub use model::{Type, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
