//! Argument Values
//!
//! Defines the values a caller may pass to a memoized computation and the
//! hashable form they take inside a cache key.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MemoError, Result};

// == Arg Value ==
/// A single argument passed to a memoized computation.
///
/// `List` and `Map` are mutable containers and are never usable as key
/// parts; neither is a NaN float, since NaN does not equal itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<ArgValue>),
    List(Vec<ArgValue>),
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::None => "none",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Str(_) => "str",
            ArgValue::Bytes(_) => "bytes",
            ArgValue::Tuple(_) => "tuple",
            ArgValue::List(_) => "list",
            ArgValue::Map(_) => "map",
        }
    }

    // == Key Conversion ==
    /// Converts the value into its canonical hashable form.
    ///
    /// Tuples are converted element by element, so a tuple holding a list is
    /// rejected as a whole.
    pub fn to_key_part(&self) -> Result<KeyPart> {
        match self {
            ArgValue::None => Ok(KeyPart::None),
            ArgValue::Bool(b) => Ok(KeyPart::Bool(*b)),
            ArgValue::Int(i) => Ok(KeyPart::Int(*i)),
            ArgValue::Float(f) => KeyPart::float(*f),
            ArgValue::Str(s) => Ok(KeyPart::Str(s.clone())),
            ArgValue::Bytes(b) => Ok(KeyPart::Bytes(b.clone())),
            ArgValue::Tuple(items) => items
                .iter()
                .map(ArgValue::to_key_part)
                .collect::<Result<Vec<_>>>()
                .map(KeyPart::Tuple),
            ArgValue::List(_) | ArgValue::Map(_) => Err(MemoError::UnhashableKey(format!(
                "values of type '{}' cannot be part of a cache key",
                self.type_name()
            ))),
        }
    }

    // == Accessors ==
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(f) => Some(*f),
            ArgValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

// == Conversions ==
impl From<()> for ArgValue {
    fn from(_: ()) -> Self {
        ArgValue::None
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

impl From<&[u8]> for ArgValue {
    fn from(value: &[u8]) -> Self {
        ArgValue::Bytes(value.to_vec())
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::None, Into::into)
    }
}

// == Key Part ==
/// Hashable, comparable form of an [`ArgValue`].
///
/// Floats are held as their bit pattern with `-0.0` folded onto `0.0`, so
/// equality and hashing agree. Values of different variants never compare
/// equal: `Int(1)` and `Float(1.0)` are distinct key parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    None,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<KeyPart>),
    /// A keyword argument; only ever produced by key normalization
    Keyword(String, Box<KeyPart>),
}

impl KeyPart {
    /// Builds a float key part, rejecting NaN.
    pub fn float(value: f64) -> Result<Self> {
        if value.is_nan() {
            return Err(MemoError::UnhashableKey(
                "NaN is not equal to itself and cannot be part of a cache key".to_string(),
            ));
        }
        // -0.0 == 0.0, so both must hash alike
        let canonical = if value == 0.0 { 0.0 } else { value };
        Ok(KeyPart::Float(canonical.to_bits()))
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::None => write!(f, "None"),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            KeyPart::Str(s) => write!(f, "{:?}", s),
            KeyPart::Bytes(b) => write!(f, "b{:?}", b),
            KeyPart::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            KeyPart::Keyword(name, value) => write!(f, "{}={}", name, value),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(ArgValue::from(3).to_key_part().unwrap(), KeyPart::Int(3));
        assert_eq!(
            ArgValue::from("abc").to_key_part().unwrap(),
            KeyPart::Str("abc".to_string())
        );
        assert_eq!(ArgValue::from(()).to_key_part().unwrap(), KeyPart::None);
        assert_eq!(ArgValue::from(None::<i64>), ArgValue::None);
        assert_eq!(ArgValue::from(Some(true)), ArgValue::Bool(true));
    }

    #[test]
    fn test_list_is_unhashable() {
        let value = ArgValue::List(vec![ArgValue::Int(1)]);
        assert!(matches!(
            value.to_key_part(),
            Err(MemoError::UnhashableKey(_))
        ));
    }

    #[test]
    fn test_map_is_unhashable() {
        let value = ArgValue::Map(BTreeMap::new());
        assert!(matches!(
            value.to_key_part(),
            Err(MemoError::UnhashableKey(_))
        ));
    }

    #[test]
    fn test_tuple_containing_list_is_unhashable() {
        let value = ArgValue::Tuple(vec![ArgValue::Int(1), ArgValue::List(vec![])]);
        assert!(value.to_key_part().is_err());
    }

    #[test]
    fn test_nested_tuple_is_hashable() {
        let value = ArgValue::Tuple(vec![
            ArgValue::Int(1),
            ArgValue::Tuple(vec![ArgValue::from("x")]),
        ]);
        let part = value.to_key_part().unwrap();
        assert_eq!(part.to_string(), "(1, (\"x\",))");
    }

    #[test]
    fn test_nan_is_unhashable() {
        assert!(matches!(
            ArgValue::Float(f64::NAN).to_key_part(),
            Err(MemoError::UnhashableKey(_))
        ));
    }

    #[test]
    fn test_signed_zero_folds() {
        let pos = ArgValue::Float(0.0).to_key_part().unwrap();
        let neg = ArgValue::Float(-0.0).to_key_part().unwrap();
        assert_eq!(pos, neg);
    }

    #[test]
    fn test_int_and_float_are_distinct() {
        let int = ArgValue::Int(1).to_key_part().unwrap();
        let float = ArgValue::Float(1.0).to_key_part().unwrap();
        assert_ne!(int, float);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ArgValue::Int(4).as_int(), Some(4));
        assert_eq!(ArgValue::Int(4).as_float(), Some(4.0));
        assert_eq!(ArgValue::from("s").as_str(), Some("s"));
        assert_eq!(ArgValue::Bool(false).as_bool(), Some(false));
        assert_eq!(ArgValue::None.as_int(), None);
    }
}
