//! Parameter values, parameter combinations and typed configurations.

use core::fmt;

use crate::error::{Error, Result};

/// A single hyper-parameter value.
///
/// Grids and distributions produce these; estimators read them back through
/// [`Params`] or a typed configuration implementing [`FromParams`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParamValue {
    /// A boolean switch.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A named option, e.g. a solver or penalty kind.
    Str(String),
}

impl ParamValue {
    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
        }
    }

    /// Returns the value as `f64`, widening integers.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the value as `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// One parameter combination: an ordered mapping from name to value.
///
/// The order follows the grid or distribution declaration order, so two
/// combinations produced by the same space compare equal exactly when they
/// select the same values.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// Creates an empty combination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Returns the float value for `name`, widening integers.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    /// Returns the integer value for `name`.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_i64)
    }

    /// Returns the string value for `name`.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Iterates over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates over parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of parameters in the combination.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the combination has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks every name against `allowed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] for the first name not in `allowed`.
    pub fn check_names(&self, allowed: &[&'static str]) -> Result<()> {
        check_names(self.names(), allowed)
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

pub(crate) fn check_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    allowed: &[&'static str],
) -> Result<()> {
    for name in names {
        if !allowed.contains(&name) {
            return Err(Error::UnknownParameter {
                name: name.to_owned(),
                allowed: allowed.to_vec(),
            });
        }
    }
    Ok(())
}

/// Conversion from a [`ParamValue`] into a concrete field type.
///
/// Implemented for the primitive types a configuration struct usually
/// holds. Used by `#[derive(FromParams)]`.
pub trait FromParamValue: Sized {
    /// Converts `value`, reporting `name` on mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterType`] if the variant does not fit.
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self>;
}

fn type_error(name: &str, expected: &'static str, value: &ParamValue) -> Error {
    Error::ParameterType {
        name: name.to_owned(),
        expected,
        got: format!("{} {value}", value.kind()),
    }
}

impl FromParamValue for f64 {
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self> {
        value.as_f64().ok_or_else(|| type_error(name, "float", value))
    }
}

impl FromParamValue for i64 {
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self> {
        value.as_i64().ok_or_else(|| type_error(name, "int", value))
    }
}

impl FromParamValue for usize {
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self> {
        value
            .as_i64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| type_error(name, "non-negative int", value))
    }
}

impl FromParamValue for bool {
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self> {
        value.as_bool().ok_or_else(|| type_error(name, "bool", value))
    }
}

impl FromParamValue for String {
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| type_error(name, "string", value))
    }
}

impl<T: FromParamValue> FromParamValue for Option<T> {
    fn from_param_value(name: &str, value: &ParamValue) -> Result<Self> {
        T::from_param_value(name, value).map(Some)
    }
}

/// A typed estimator configuration built from a [`Params`] combination.
///
/// `PARAM_NAMES` is the declared schema: a search rejects any grid or
/// distribution key that is not listed. Fields missing from the
/// combination keep their default.
///
/// Usually derived:
///
/// ```
/// # #[cfg(feature = "derive")]
/// # {
/// use hypertune::{FromParams, Params};
///
/// #[derive(Debug, Default, FromParams)]
/// struct LogisticConfig {
///     c: f64,
///     max_iter: i64,
/// }
///
/// let cfg = LogisticConfig::from_params(&Params::new().with("c", 0.5)).unwrap();
/// assert_eq!(cfg.c, 0.5);
/// assert_eq!(cfg.max_iter, 0);
/// # }
/// ```
pub trait FromParams: Sized {
    /// Names of the parameters this configuration accepts.
    const PARAM_NAMES: &'static [&'static str];

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] for keys outside `PARAM_NAMES` and
    /// [`Error::ParameterType`] for values of the wrong kind.
    fn from_params(params: &Params) -> Result<Self>;
}
