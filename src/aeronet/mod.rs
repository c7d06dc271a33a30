//! Translation of CQL2 filters into AERONET web service requests.
//!
//! The AERONET service takes flat query-string parameters:
//!   site=GSFC                         - equality on a queryable
//!   aod15=1                           - data type flags
//!   if_no_html=1 / avg=20             - output and aggregation selectors
//!   year=..&month=..&day=..&hour=..   - start of the date range (`2`-suffixed for the end)
//!   lon1=..&lat1=..&lon2=..&lat2=..   - bounding box
//!
//! Only `=`, `AND`, `T_AFTER`, `T_BEFORE` and `S_INTERSECTS` can be expressed.

mod attributes;
mod evaluator;
mod params;
mod vocabulary;

pub use attributes::AttributeMap;
pub use evaluator::Evaluator;
pub use params::QueryParameters;
pub use vocabulary::Vocabulary;

use serde::Serialize;

use crate::cql2::{self, Expr, FilterLang, ParseError};

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("no parameter mapping for attribute '{0}'")]
    UnknownAttribute(String),

    #[error("'{value}' is not a supported value for '{attribute}', expected one of {expected:?}")]
    InvalidValue {
        attribute: String,
        value: String,
        expected: Vec<String>,
    },

    #[error("malformed timestamp '{value}': {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("geometry conversion failed: {0}")]
    GeometryConversion(String),

    #[error("parameter '{0}' is set more than once")]
    ConflictingParameter(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Query string and the parameters it was built from; only valid together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub query: String,
    pub parameters: QueryParameters,
}

impl Translation {
    /// Browsable URL for the translated request.
    pub fn url(&self, base_url: &str, endpoint: &str) -> String {
        format!(
            "{}/{}?{}",
            base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/'),
            self.query
        )
    }
}

/// Translate an already parsed filter.
pub fn translate_expr(
    root: &Expr,
    attributes: AttributeMap,
    vocabulary: &Vocabulary,
) -> Result<Translation, FilterError> {
    Evaluator::new(attributes, vocabulary).evaluate(root)
}

/// Parse `filter` and translate it with a fresh evaluator.
pub fn translate(
    filter: &str,
    lang: FilterLang,
    attributes: AttributeMap,
    vocabulary: &Vocabulary,
) -> Result<Translation, TranslateError> {
    let root = cql2::parse(filter, lang)?;
    tracing::debug!("Parsed filter: {:?}", root);
    Ok(translate_expr(&root, attributes, vocabulary)?)
}
