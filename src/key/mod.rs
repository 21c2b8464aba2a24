//! Key Module
//!
//! Turns the arguments of a call into a normalized, hashable cache key.

mod args;
mod value;

pub use args::{CallArgs, CallKey};
pub use value::{ArgValue, KeyPart};
