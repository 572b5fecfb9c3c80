//! Format constants and default decode limits.
//!
//! The wire format itself places no bound on string, binary or nesting
//! sizes. Readers facing untrusted input apply the defaults below unless the
//! caller configures [`DecodeOptions`](crate::codec::DecodeOptions)
//! differently.

/// Maximum encoded length of a 64-bit varint (ceil(64 / 7)).
pub const MAX_VARINT_BYTES: usize = 10;

/// Default maximum container nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum length of a string value or object key (16 MiB).
pub const DEFAULT_MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Default maximum length of a binary value (64 MiB).
pub const DEFAULT_MAX_BINARY_LEN: usize = 64 * 1024 * 1024;
