//! Data model types for NBON.
//!
//! - [`Type`]: what a tag byte announces
//! - [`Value`]: an owned value tree

pub mod value;

pub use value::{Type, Value};
