//! Tag byte vocabulary.
//!
//! Every encoded value starts with one of these bytes. [`Type::from_tag`]
//! is the only place that classifies them.

use crate::model::Type;

pub const TRUE: u8 = b'T';
pub const FALSE: u8 = b'F';
pub const NULL: u8 = b'N';
pub const FLOAT32: u8 = b'f';
pub const FLOAT64: u8 = b'd';
pub const STRING: u8 = b'S';
pub const BINARY: u8 = b'B';
pub const POSITIVE: u8 = b'+';
pub const NEGATIVE: u8 = b'-';
pub const ARRAY_START: u8 = b'[';
pub const ARRAY_END: u8 = b']';
pub const OBJECT_START: u8 = b'{';
pub const OBJECT_END: u8 = b'}';

/// Terminates strings and object keys.
pub const NUL: u8 = 0x00;

/// Largest integer stored directly in its tag byte.
pub const MAX_DIGIT_VALUE: u64 = 9;

/// Returns the single-byte tag for `value` if it is small enough to be
/// encoded as an ASCII digit.
#[inline]
pub fn digit(value: u64) -> Option<u8> {
    if value <= MAX_DIGIT_VALUE {
        Some(b'0' + value as u8)
    } else {
        None
    }
}

/// Returns the value of an ASCII digit tag.
#[inline]
pub fn digit_value(tag: u8) -> Option<u64> {
    tag.is_ascii_digit().then(|| u64::from(tag - b'0'))
}

impl Type {
    /// Classifies a tag byte, or returns `None` if it cannot start a value.
    ///
    /// Container closers are deliberately absent: a reader peeking `]` or
    /// `}` knows the enclosing container has ended.
    pub fn from_tag(tag: u8) -> Option<Type> {
        match tag {
            TRUE | FALSE => Some(Type::Bool),
            NULL => Some(Type::Null),
            FLOAT32 => Some(Type::Float32),
            FLOAT64 => Some(Type::Float64),
            STRING => Some(Type::String),
            BINARY => Some(Type::Binary),
            POSITIVE | b'0'..=b'9' => Some(Type::UInt),
            NEGATIVE => Some(Type::Int),
            ARRAY_START => Some(Type::Array),
            OBJECT_START => Some(Type::Object),
            _ => None,
        }
    }
}
