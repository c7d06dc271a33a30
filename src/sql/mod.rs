//! CQL2 to SQL predicate translation for archived GeoParquet data.
//!
//! The generated predicate targets DuckDB with the spatial extension loaded.
//! Unlike the web service translation every node kind is expressible here.

use geozero::ToWkt;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

use crate::aeronet::{AttributeMap, FilterError};
use crate::cql2::{Expr, Literal, SpatialOp, TemporalOp};

/// Renders a filter as a SQL `WHERE` predicate.
pub struct SqlTranslator {
    fields: AttributeMap,
}

impl SqlTranslator {
    pub fn new(fields: AttributeMap) -> Self {
        Self { fields }
    }

    pub fn translate(&mut self, node: &Expr) -> Result<String, FilterError> {
        let sql = match node {
            Expr::Attribute(name) => quote_identifier(&self.fields.resolve(name)?),
            Expr::Literal(literal) => literal_sql(literal)?,
            Expr::Compare { op, lhs, rhs } => {
                format!("({} {} {})", self.translate(lhs)?, op, self.translate(rhs)?)
            }
            Expr::And(lhs, rhs) => {
                format!("({} AND {})", self.translate(lhs)?, self.translate(rhs)?)
            }
            Expr::Or(lhs, rhs) => {
                format!("({} OR {})", self.translate(lhs)?, self.translate(rhs)?)
            }
            Expr::Not(inner) => format!("NOT {}", self.translate(inner)?),
            Expr::Temporal { op, lhs, rhs } => {
                let cmp = match op {
                    TemporalOp::After => ">",
                    TemporalOp::Before => "<",
                };
                format!("({} {} {})", self.translate(lhs)?, cmp, self.translate(rhs)?)
            }
            Expr::Spatial { op, lhs, rhs } => {
                let function = match op {
                    SpatialOp::Intersects => "ST_Intersects",
                    SpatialOp::Within => "ST_Within",
                    SpatialOp::Contains => "ST_Contains",
                    SpatialOp::Disjoint => "ST_Disjoint",
                };
                format!(
                    "{}({}, {})",
                    function,
                    self.translate(lhs)?,
                    self.translate(rhs)?
                )
            }
            Expr::IsNull(inner) => format!("({} IS NULL)", self.translate(inner)?),
            Expr::Like { lhs, pattern } => {
                format!("({} LIKE {})", self.translate(lhs)?, quote_string(pattern))
            }
        };
        Ok(sql)
    }
}

/// Translate `root` into a `WHERE` predicate.
pub fn to_sql_where(root: &Expr, fields: AttributeMap) -> Result<String, FilterError> {
    SqlTranslator::new(fields).translate(root)
}

/// Full query over a GeoParquet file, returning geometries as WKB.
pub fn select_statement(path: &Path, where_clause: &str) -> String {
    format!(
        "SELECT * EXCLUDE(geometry), ST_AsWKB(geometry) as geometry FROM {} WHERE {}",
        quote_string(&path.display().to_string()),
        where_clause
    )
}

fn literal_sql(literal: &Literal) -> Result<String, FilterError> {
    let sql = match literal {
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::String(s) => quote_string(s),
        Literal::Boolean(true) => "TRUE".to_string(),
        Literal::Boolean(false) => "FALSE".to_string(),
        Literal::Timestamp(ts) => {
            let rendered = ts
                .format(&Rfc3339)
                .map_err(|e| FilterError::MalformedTimestamp {
                    value: ts.to_string(),
                    reason: e.to_string(),
                })?;
            format!("TIMESTAMPTZ {}", quote_string(&rendered))
        }
        Literal::Date(date) => format!("DATE '{}'", date),
        Literal::Geometry(geometry) => {
            let wkt = geometry
                .to_wkt()
                .map_err(|e| FilterError::GeometryConversion(e.to_string()))?;
            format!("ST_GeomFromText({})", quote_string(&wkt))
        }
    };
    Ok(sql)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql2::{parse_json, parse_text};
    use std::collections::HashMap;

    fn sql(filter: &str) -> String {
        to_sql_where(&parse_text(filter).unwrap(), AttributeMap::identity()).unwrap()
    }

    #[test]
    fn test_equality() {
        assert_eq!(sql("site = 'GSFC'"), "(\"site\" = 'GSFC')");
    }

    #[test]
    fn test_boolean_logic() {
        assert_eq!(
            sql("NOT (a = 1 OR b <> 2.5) AND c IS NULL"),
            "(NOT ((\"a\" = 1) OR (\"b\" <> 2.5)) AND (\"c\" IS NULL))"
        );
    }

    #[test]
    fn test_like_escapes_quotes() {
        assert_eq!(sql("name LIKE 'O''Hare%'"), "(\"name\" LIKE 'O''Hare%')");
    }

    #[test]
    fn test_temporal() {
        assert_eq!(
            sql("T_AFTER(start_datetime, TIMESTAMP('2020-01-01T00:00:00Z'))"),
            "(\"start_datetime\" > TIMESTAMPTZ '2020-01-01T00:00:00Z')"
        );
        assert_eq!(
            sql("T_BEFORE(end_datetime, DATE('2021-12-31'))"),
            "(\"end_datetime\" < DATE '2021-12-31')"
        );
    }

    #[test]
    fn test_spatial() {
        let where_clause = to_sql_where(
            &parse_json(
                r#"{"op": "s_intersects", "args": [{"property": "geometry"}, {"type": "Point", "coordinates": [1.5, 2]}]}"#,
            )
            .unwrap(),
            AttributeMap::identity(),
        )
        .unwrap();
        assert!(where_clause.starts_with("ST_Intersects(\"geometry\", ST_GeomFromText('POINT"));
        assert!(where_clause.contains("1.5"));
    }

    #[test]
    fn test_field_mapping() {
        let fields = AttributeMap::new(
            HashMap::from([("site".to_string(), "aeronet:site_name".to_string())]),
            false,
        );
        let where_clause = to_sql_where(&parse_text("site = 'GSFC'").unwrap(), fields).unwrap();
        assert_eq!(where_clause, "(\"aeronet:site_name\" = 'GSFC')");
    }

    #[test]
    fn test_unknown_field() {
        let fields = AttributeMap::new(HashMap::new(), false);
        assert!(matches!(
            to_sql_where(&parse_text("site = 'GSFC'").unwrap(), fields),
            Err(FilterError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_select_statement() {
        assert_eq!(
            select_statement(Path::new("/data/stations.parquet"), "(\"site\" = 'GSFC')"),
            "SELECT * EXCLUDE(geometry), ST_AsWKB(geometry) as geometry \
             FROM '/data/stations.parquet' WHERE (\"site\" = 'GSFC')"
        );
    }
}
