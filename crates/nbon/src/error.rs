//! Error types for NBON encoding and decoding.

use thiserror::Error;

/// Broad error classes.
///
/// Format, limit and UTF-8 errors come from the bytes being decoded. Usage
/// errors come from the calling code breaking the scope discipline and
/// indicate a bug in the caller rather than bad data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Malformed or truncated encoding
    MalformedEncoding,
    /// E002: Configured decode limit exceeded
    LimitExceeded,
    /// E003: Invalid UTF-8 where text was requested
    InvalidUtf8,
    /// E004: Scope discipline violated by the caller
    Usage,
    /// E005: Underlying sink/source failed
    Io,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MalformedEncoding => "E001",
            ErrorCode::LimitExceeded => "E002",
            ErrorCode::InvalidUtf8 => "E003",
            ErrorCode::Usage => "E004",
            ErrorCode::Io => "E005",
        }
    }
}

/// Violations of the scope discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A nested array/object handle was dropped before it was closed, so
    /// the cursor position of the enclosing scope is no longer known.
    #[error("a nested container scope was dropped without being closed")]
    ScopeAbandoned,

    /// An object key (or array element) was handed out, but its value was
    /// never written or read.
    #[error("the value for the previous entry has not been consumed")]
    ValuePending,
}

/// Error during decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    // === E001: Malformed encoding ===
    #[error("[E001] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E001] byte {} at offset {position} does not start a value", describe_byte(.tag))]
    InvalidTag { tag: u8, position: u64 },

    #[error("[E001] {context}: unexpected byte {} at offset {position}", describe_byte(.found))]
    UnexpectedTag {
        context: &'static str,
        found: u8,
        position: u64,
    },

    #[error("[E001] varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("[E001] varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("[E001] {context}: magnitude {magnitude} does not fit the requested integer type")]
    IntegerOverflow {
        context: &'static str,
        magnitude: u64,
    },

    // === E002: Limits ===
    #[error("[E002] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: u64,
        max: usize,
    },

    #[error("[E002] container nesting exceeds maximum depth {max}")]
    DepthLimitExceeded { max: usize },

    // === E003: Invalid UTF-8 ===
    #[error("[E003] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    // === E004: Usage ===
    #[error("[E004] {0}")]
    Usage(#[from] UsageError),

    // === E005: I/O ===
    #[error("[E005] I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::LengthExceedsLimit { .. } | DecodeError::DepthLimitExceeded { .. } => {
                ErrorCode::LimitExceeded
            }
            DecodeError::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
            DecodeError::Usage(_) => ErrorCode::Usage,
            DecodeError::Io(_) => ErrorCode::Io,
            _ => ErrorCode::MalformedEncoding,
        }
    }

    /// Returns true if the error was caused by the caller rather than the input.
    pub fn is_usage(&self) -> bool {
        matches!(self, DecodeError::Usage(_))
    }
}

/// Error during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("[E001] {field} contains a NUL byte at offset {offset}")]
    InteriorNul { field: &'static str, offset: usize },

    #[error("[E001] object key must not begin with '}}'")]
    KeyStartsWithTerminator,

    #[error("[E004] {0}")]
    Usage(#[from] UsageError),

    #[error("[E005] I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EncodeError::InteriorNul { .. } | EncodeError::KeyStartsWithTerminator => {
                ErrorCode::MalformedEncoding
            }
            EncodeError::Usage(_) => ErrorCode::Usage,
            EncodeError::Io(_) => ErrorCode::Io,
        }
    }

    /// Returns true if the error was caused by the caller breaking scope rules.
    pub fn is_usage(&self) -> bool {
        matches!(self, EncodeError::Usage(_))
    }
}

/// Renders a byte for error messages: printable ASCII as `'x'`, others as hex.
fn describe_byte(byte: &u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", *byte as char)
    } else {
        format!("0x{byte:02x}")
    }
}
