//! Values carried by constraint declarations.
//!
//! A constraint keyword receives either a single value, bound positionally to
//! the check constructor, or a map of named parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value passed to a check constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Unsigned integer above `i64::MAX`
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// List value, used by membership constraints
    List(Vec<CheckValue>),
}

impl CheckValue {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, CheckValue::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CheckValue::Null => "null",
            CheckValue::Bool(_) => "boolean",
            CheckValue::Int(_) => "int64",
            CheckValue::UInt(_) => "uint64",
            CheckValue::Float(_) => "float64",
            CheckValue::String(_) => "string",
            CheckValue::List(_) => "list",
        }
    }

    /// Attempts to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CheckValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CheckValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a non-negative integer.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            CheckValue::Int(i) => u64::try_from(*i).ok(),
            CheckValue::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// Attempts to get this value as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CheckValue::Float(f) => Some(*f),
            CheckValue::Int(i) => Some(*i as f64),
            CheckValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CheckValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a list.
    pub fn as_list(&self) -> Option<&[CheckValue]> {
        match self {
            CheckValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckValue::Null => f.write_str("null"),
            CheckValue::Bool(b) => write!(f, "{b}"),
            CheckValue::Int(i) => write!(f, "{i}"),
            CheckValue::UInt(u) => write!(f, "{u}"),
            CheckValue::Float(v) => write!(f, "{v}"),
            CheckValue::String(s) => write!(f, "'{s}'"),
            CheckValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for CheckValue {
    fn from(b: bool) -> Self {
        CheckValue::Bool(b)
    }
}

impl From<i32> for CheckValue {
    fn from(i: i32) -> Self {
        CheckValue::Int(i64::from(i))
    }
}

impl From<i64> for CheckValue {
    fn from(i: i64) -> Self {
        CheckValue::Int(i)
    }
}

impl From<u32> for CheckValue {
    fn from(i: u32) -> Self {
        CheckValue::Int(i64::from(i))
    }
}

impl From<u64> for CheckValue {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(CheckValue::UInt(u), CheckValue::Int)
    }
}

impl From<f64> for CheckValue {
    fn from(f: f64) -> Self {
        CheckValue::Float(f)
    }
}

impl From<String> for CheckValue {
    fn from(s: String) -> Self {
        CheckValue::String(s)
    }
}

impl From<&str> for CheckValue {
    fn from(s: &str) -> Self {
        CheckValue::String(s.to_string())
    }
}

impl<T: Into<CheckValue>> From<Vec<T>> for CheckValue {
    fn from(items: Vec<T>) -> Self {
        CheckValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CheckValue>, const N: usize> From<[T; N]> for CheckValue {
    fn from(items: [T; N]) -> Self {
        CheckValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CheckValue>> From<Option<T>> for CheckValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CheckValue::Null, Into::into)
    }
}

/// The argument given to a constraint keyword.
///
/// A map is forwarded as named parameters; anything else is bound to the
/// constructor's first parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintArg {
    /// Named parameters
    Named(BTreeMap<String, CheckValue>),
    /// Single positional value
    Value(CheckValue),
}

impl ConstraintArg {
    /// Builds a named-parameter argument.
    ///
    /// ```rust
    /// use fieldspec_core::ConstraintArg;
    ///
    /// let arg = ConstraintArg::named([("min_value", 0), ("max_value", 10)]);
    /// assert!(matches!(arg, ConstraintArg::Named(_)));
    /// ```
    pub fn named<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CheckValue>,
    {
        ConstraintArg::Named(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// An argument is absent when it is a bare null; such keywords produce no check.
    pub fn is_absent(&self) -> bool {
        matches!(self, ConstraintArg::Value(CheckValue::Null))
    }
}

impl From<CheckValue> for ConstraintArg {
    fn from(value: CheckValue) -> Self {
        ConstraintArg::Value(value)
    }
}

impl From<BTreeMap<String, CheckValue>> for ConstraintArg {
    fn from(params: BTreeMap<String, CheckValue>) -> Self {
        ConstraintArg::Named(params)
    }
}

macro_rules! positional_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ConstraintArg {
                fn from(value: $ty) -> Self {
                    ConstraintArg::Value(value.into())
                }
            }
        )*
    };
}

positional_from!(bool, i32, i64, u32, u64, f64, String, &str);

impl<T: Into<CheckValue>> From<Vec<T>> for ConstraintArg {
    fn from(items: Vec<T>) -> Self {
        ConstraintArg::Value(items.into())
    }
}

impl<T: Into<CheckValue>, const N: usize> From<[T; N]> for ConstraintArg {
    fn from(items: [T; N]) -> Self {
        ConstraintArg::Value(items.into())
    }
}
