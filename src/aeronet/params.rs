//! Request parameters collected while translating a filter.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::FilterError;

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(i) => write!(f, "{}", i),
            // Whole values keep their decimal point: `2.0`, not `2`.
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Accumulator of `name -> value` pairs for one translation.
///
/// Every key may be written once; the query string carries exactly one
/// fragment per key, so a second write is rejected instead of overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryParameters(BTreeMap<String, ParamValue>);

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key=value` and return the matching fragment.
    ///
    /// The map keeps the raw value; the fragment is percent-encoded so that
    /// `&`, `=` and non-ASCII text cannot change how the query splits.
    pub fn insert(&mut self, key: &str, value: ParamValue) -> Result<String, FilterError> {
        if self.0.contains_key(key) {
            return Err(FilterError::ConflictingParameter(key.to_string()));
        }
        let fragment = format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(&value.to_string())
        );
        self.0.insert(key.to_string(), value);
        Ok(fragment)
    }

    /// Record several pairs, returning their `&`-joined fragments.
    pub fn insert_all(&mut self, pairs: Vec<(String, ParamValue)>) -> Result<String, FilterError> {
        if let Some((key, _)) = pairs.iter().find(|(key, _)| self.0.contains_key(key)) {
            return Err(FilterError::ConflictingParameter(key.clone()));
        }
        let fragments = pairs
            .into_iter()
            .map(|(key, value)| self.insert(&key, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fragments.join("&"))
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}
