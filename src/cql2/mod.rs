//! CQL2 filter AST and parsers.
//!
//! Two encodings are accepted:
//!   cql2-json   - `{"op": "=", "args": [{"property": "site"}, "GSFC"]}`
//!   cql2-text   - `site = 'GSFC' AND T_AFTER(datetime, TIMESTAMP('2020-01-01T00:00:00Z'))`
//!
//! Both produce the same [`Expr`] tree.

mod ast;
mod json;
mod lexer;
mod text;

pub use ast::*;
pub use json::{parse_json, parse_json_value};
pub use text::parse_text;

use clap::ValueEnum;
use geo_types::{Geometry, Rect, coord};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Filter encoding accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FilterLang {
    #[value(name = "cql2-json")]
    Cql2Json,
    #[value(name = "cql2-text")]
    Cql2Text,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid CQL2-JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Parse a filter in the given encoding.
pub fn parse(filter: &str, lang: FilterLang) -> Result<Expr, ParseError> {
    match lang {
        FilterLang::Cql2Json => parse_json(filter),
        FilterLang::Cql2Text => parse_text(filter),
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<OffsetDateTime, ParseError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| ParseError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_date(value: &str) -> Result<Date, ParseError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        ParseError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Build the polygon covered by a `[minx, miny, maxx, maxy]` box.
pub(crate) fn bbox_geometry(values: &[f64]) -> Result<Geometry<f64>, ParseError> {
    // 3D boxes carry six values: minx, miny, minz, maxx, maxy, maxz
    let (min_x, min_y, max_x, max_y) = match values {
        [a, b, c, d] => (*a, *b, *c, *d),
        [a, b, _, d, e, _] => (*a, *b, *d, *e),
        _ => {
            return Err(ParseError::InvalidGeometry(format!(
                "bbox needs 4 or 6 numbers, got {}",
                values.len()
            )));
        }
    };

    let rect = Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y });
    Ok(Geometry::Polygon(rect.to_polygon()))
}
