//! Value types for NBON documents.
//!
//! The codec itself streams values and never needs a tree. [`Value`] is an
//! owned tree for callers that want to materialize whole values.

/// The type of an encoded value, as determined by its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Null,
    String,
    Binary,
    Float32,
    Float64,
    /// Negative integer (`-` tag). Only readable as signed.
    Int,
    /// Non-negative integer (digit or `+` tag). Readable as signed or unsigned.
    UInt,
    Array,
    Object,
}

impl Type {
    /// Returns a lowercase name for the type.
    pub fn name(self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::Null => "null",
            Type::String => "string",
            Type::Binary => "binary",
            Type::Float32 => "float32",
            Type::Float64 => "float64",
            Type::Int => "int",
            Type::UInt => "uint",
            Type::Array => "array",
            Type::Object => "object",
        }
    }

    /// Returns true for arrays and objects.
    pub fn is_container(self) -> bool {
        matches!(self, Type::Array | Type::Object)
    }
}

/// An owned NBON value.
///
/// Non-negative integers always decode as [`Value::UInt64`] and negative
/// ones as [`Value::Int64`]; the wire format does not record which of the
/// two was written. Use [`Value::as_i64`] / [`Value::as_u64`] to read either.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Null,
    /// Text bytes; must not contain NUL.
    String(Vec<u8>),
    /// Arbitrary bytes.
    Binary(Vec<u8>),
    Float32(f32),
    Float64(f64),
    Int64(i64),
    UInt64(u64),
    Array(Vec<Value>),
    /// Entries in write order. Keys may repeat and must not contain NUL.
    Object(Vec<(Vec<u8>, Value)>),
}

impl Value {
    /// Returns the wire type this value encodes as.
    pub fn value_type(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Null => Type::Null,
            Value::String(_) => Type::String,
            Value::Binary(_) => Type::Binary,
            Value::Float32(_) => Type::Float32,
            Value::Float64(_) => Type::Float64,
            Value::Int64(v) if *v < 0 => Type::Int,
            Value::Int64(_) | Value::UInt64(_) => Type::UInt,
            Value::Array(_) => Type::Array,
            Value::Object(_) => Type::Object,
        }
    }

    /// Creates an empty object.
    pub fn object() -> Self {
        Value::Object(Vec::new())
    }

    /// Appends an entry to an object value. Does nothing for other variants.
    pub fn push_entry(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Value>) {
        if let Value::Object(entries) = self {
            entries.push((key.into(), value.into()));
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt64(v) => Some(*v),
            Value::Int64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns float values widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the raw bytes of a string or binary value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(b) | Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Returns a string value as `&str` if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(Vec<u8>, Value)]> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up the first entry with the given key in an object value.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Value> {
        let key = key.as_ref();
        self.as_object()?
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt64(u64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
