//! RPC parameter assembly
//!
//! Facade operations describe their arguments as `name => value` pairs. Values that
//! were not supplied, and empty strings, are dropped so they never reach the wire.
//! Everything else (including `0`, `false` and empty lists) is sent as given.

use serde_json::{Map, Value};

/// Wire parameter mapping
pub type Params = Map<String, Value>;

/// A single argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl From<ParamValue> for Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Str(s) => Value::String(s),
            ParamValue::Int(n) => Value::from(n),
            ParamValue::Float(f) => Value::from(f),
            ParamValue::Bool(b) => Value::Bool(b),
            ParamValue::List(items) => Value::from(items),
        }
    }
}

/// Conversion from plain Rust values into an optional [`ParamValue`]
///
/// `None` means "not supplied" and is always omitted.
pub trait IntoParam {
    fn into_param(self) -> Option<ParamValue>;
}

impl IntoParam for ParamValue {
    fn into_param(self) -> Option<ParamValue> {
        Some(self)
    }
}

impl IntoParam for String {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Str(self))
    }
}

impl IntoParam for &str {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Str(self.to_string()))
    }
}

impl IntoParam for &String {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Str(self.clone()))
    }
}

impl IntoParam for bool {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Bool(self))
    }
}

impl IntoParam for f64 {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Float(self))
    }
}

impl IntoParam for Vec<String> {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::List(self))
    }
}

impl IntoParam for &[String] {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::List(self.to_vec()))
    }
}

macro_rules! int_into_param {
    ($($t:ty),*) => {
        $(
            impl IntoParam for $t {
                fn into_param(self) -> Option<ParamValue> {
                    Some(ParamValue::Int(self as i64))
                }
            }
        )*
    };
}

int_into_param!(i32, i64, u32);

impl IntoParam for u64 {
    fn into_param(self) -> Option<ParamValue> {
        // Values past i64::MAX keep their magnitude as a float rather than wrapping.
        match i64::try_from(self) {
            Ok(n) => Some(ParamValue::Int(n)),
            Err(_) => Some(ParamValue::Float(self as f64)),
        }
    }
}

impl<T: IntoParam> IntoParam for Option<T> {
    fn into_param(self) -> Option<ParamValue> {
        self.and_then(IntoParam::into_param)
    }
}

/// Build the wire parameter mapping from named arguments.
///
/// Absent values and empty strings are omitted; all other values are kept unchanged.
pub fn build_params<'a, I>(args: I) -> Params
where
    I: IntoIterator<Item = (&'a str, Option<ParamValue>)>,
{
    let mut params = Params::new();
    for (name, value) in args {
        match value {
            None => continue,
            Some(ParamValue::Str(s)) if s.is_empty() => continue,
            Some(value) => {
                params.insert(name.to_string(), value.into());
            }
        }
    }
    params
}

/// Build a [`Params`] mapping from `"name" => value` pairs.
///
/// Each value goes through [`IntoParam`], then [`build_params`] applies the omission rule.
///
/// # Example
///
/// ```
/// use mimo_rpc::params;
///
/// let name = "";
/// let p = params! { "name" => name, "timeout_ms" => 0u64 };
/// assert!(!p.contains_key("name"));
/// assert_eq!(p["timeout_ms"], 0);
/// ```
#[macro_export]
macro_rules! params {
    ($($name:literal => $value:expr),* $(,)?) => {
        $crate::params::build_params([
            $(($name, $crate::params::IntoParam::into_param($value))),*
        ])
    };
}
