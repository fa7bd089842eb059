//! Request-parameter lookup and lenient conversions.
//!
//! Request handlers hand the extractors whatever map they decoded the query
//! string or body into; [`ParameterSource`] is the narrow lookup capability
//! the extractors need from it.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, TimeWindowError};

/// Longest string [`require_parameter_string`] accepts unless told otherwise.
pub const DEFAULT_MAXIMUM_LENGTH: usize = 3000;

/// A map of request parameters.
pub trait ParameterSource {
    /// The raw text stored under `key`, or `None` if the key is absent.
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl<S: BuildHasher> ParameterSource for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl ParameterSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

/// JSON strings are returned as-is; numbers and every other value as their JSON text.
impl ParameterSource for Map<String, Value> {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(value_text)
    }
}

/// Only JSON objects carry parameters; any other value has no keys.
impl ParameterSource for Value {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.as_object()?.lookup(key)
    }
}

impl<T: ParameterSource + ?Sized> ParameterSource for &T {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        (**self).lookup(key)
    }
}

fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Fetch a trimmed string parameter, falling back to `default` when absent.
pub fn parameter_string<P>(source: &P, key: &str, default: &str) -> String
where
    P: ParameterSource + ?Sized,
{
    match source.lookup(key) {
        Some(value) => value.trim().to_string(),
        None => default.to_string(),
    }
}

/// Fetch a trimmed string parameter, failing if it is absent or longer than
/// `maximum_length` characters.
///
/// # Errors
///
/// [`TimeWindowError::MissingParameter`] if `key` is absent,
/// [`TimeWindowError::ParameterTooLong`] if the trimmed value is too long.
pub fn require_parameter_string<P>(source: &P, key: &str, maximum_length: usize) -> Result<String>
where
    P: ParameterSource + ?Sized,
{
    let value = source
        .lookup(key)
        .ok_or_else(|| TimeWindowError::MissingParameter(key.to_string()))?;
    let value = value.trim();
    let length = value.chars().count();
    if length > maximum_length {
        return Err(TimeWindowError::ParameterTooLong {
            key: key.to_string(),
            length,
            maximum: maximum_length,
        });
    }
    Ok(value.to_string())
}

/// Convert `value` to an integer, returning `default_upon_failure` on any problem.
///
/// This is the one conversion in the crate that swallows its error.
pub fn quiet_int(value: impl AsRef<str>, default_upon_failure: i64) -> i64 {
    let raw = value.as_ref();
    match raw.trim().parse::<i64>() {
        Ok(n) => n,
        Err(e) => {
            warn!(value = raw, error = %e, default = default_upon_failure, "quiet_int fallback");
            default_upon_failure
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
