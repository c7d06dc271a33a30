//! Reduces a CQL2 AST to AERONET web service parameters.

use geo::BoundingRect;
use geo_types::Geometry;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use super::attributes::AttributeMap;
use super::params::{ParamValue, QueryParameters};
use super::vocabulary::{DATA_FORMAT_ATTRIBUTE, FORMAT_ATTRIBUTE, Vocabulary};
use super::{FilterError, Translation};
use crate::cql2::{CompareOp, Expr, Literal, SpatialOp, TemporalOp};

/// Flag parameter switching the service between CSV (1) and HTML (0).
pub const FORMAT_FLAG_PARAMETER: &str = "if_no_html";
/// Parameter carrying the [`AvgMode`] code.
pub const AVG_PARAMETER: &str = "avg";

/// Record aggregation requested through `data_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvgMode {
    AllPoints,
    DailyAverage,
}

impl AvgMode {
    pub fn from_value(value: &str) -> Self {
        if value == "daily-average" {
            AvgMode::DailyAverage
        } else {
            AvgMode::AllPoints
        }
    }

    pub fn code(self) -> i64 {
        match self {
            AvgMode::AllPoints => 10,
            AvgMode::DailyAverage => 20,
        }
    }
}

/// Axis-aligned envelope of a geometry literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn of(geometry: &Geometry<f64>) -> Result<Self, FilterError> {
        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| FilterError::GeometryConversion("geometry is empty".to_string()))?;
        let (min, max) = (rect.min(), rect.max());
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return Err(FilterError::GeometryConversion(
                "geometry has non-finite coordinates".to_string(),
            ));
        }
        Ok(Self {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        })
    }
}

/// Result of visiting one node.
#[derive(Debug, Clone, PartialEq)]
enum Evaluated {
    Attribute { logical: String, physical: String },
    Value(ParamValue),
    BoundingBox(BoundingBox),
    Fragment(String),
}

/// Single-use visitor turning a filter into a query string and parameter map.
pub struct Evaluator<'v> {
    attributes: AttributeMap,
    vocabulary: &'v Vocabulary,
    parameters: QueryParameters,
}

impl<'v> Evaluator<'v> {
    pub fn new(attributes: AttributeMap, vocabulary: &'v Vocabulary) -> Self {
        Self {
            attributes,
            vocabulary,
            parameters: QueryParameters::new(),
        }
    }

    /// Walk `root` and hand back the query string with its parameters.
    ///
    /// Unsupported nodes are rejected before anything is recorded, and any
    /// failure discards the partial parameters along with the evaluator.
    pub fn evaluate(mut self, root: &Expr) -> Result<Translation, FilterError> {
        check_supported(root)?;

        match self.visit(root)? {
            Evaluated::Fragment(query) => Ok(Translation {
                query,
                parameters: self.parameters,
            }),
            _ => Err(FilterError::UnsupportedExpression(format!(
                "filter root must be a predicate, got {}",
                root.kind()
            ))),
        }
    }

    fn visit(&mut self, node: &Expr) -> Result<Evaluated, FilterError> {
        let evaluated = match node {
            Expr::Attribute(name) => self.attribute(name)?,
            Expr::Literal(literal) => literal_value(literal)?,
            Expr::Compare {
                op: CompareOp::Eq,
                lhs,
                rhs,
            } => {
                let lhs = self.visit(lhs)?;
                let rhs = self.visit(rhs)?;
                self.equal(lhs, rhs)?
            }
            Expr::And(lhs, rhs) => {
                let lhs = self.visit(lhs)?;
                let rhs = self.visit(rhs)?;
                combination(lhs, rhs)?
            }
            Expr::Temporal { op, lhs, rhs } => {
                let lhs = self.visit(lhs)?;
                let rhs = self.visit(rhs)?;
                self.temporal(*op, lhs, rhs)?
            }
            Expr::Spatial {
                op: SpatialOp::Intersects,
                lhs,
                rhs,
            } => {
                let lhs = self.visit(lhs)?;
                let rhs = self.visit(rhs)?;
                self.intersects(lhs, rhs)?
            }
            Expr::Compare { .. }
            | Expr::Or(..)
            | Expr::Not(_)
            | Expr::Spatial { .. }
            | Expr::IsNull(_)
            | Expr::Like { .. } => return Err(unsupported(node)),
        };

        tracing::debug!("Evaluator: {} -> {:?}", node.kind(), evaluated);
        Ok(evaluated)
    }

    fn attribute(&mut self, name: &str) -> Result<Evaluated, FilterError> {
        Ok(Evaluated::Attribute {
            logical: name.to_string(),
            physical: self.attributes.resolve(name)?,
        })
    }

    /// Exactly one rule applies, in this order: vocabulary check, format
    /// selector, mode selector, flag value, plain `attribute=value`.
    fn equal(&mut self, lhs: Evaluated, rhs: Evaluated) -> Result<Evaluated, FilterError> {
        let Evaluated::Attribute { logical, physical } = lhs else {
            return Err(FilterError::UnsupportedExpression(
                "left side of '=' must be a property".to_string(),
            ));
        };
        let Evaluated::Value(value) = rhs else {
            return Err(FilterError::UnsupportedExpression(format!(
                "right side of '=' on '{}' must be a scalar literal",
                logical
            )));
        };

        if let Some(accepted) = self.vocabulary.accepted(&logical) {
            let is_accepted =
                matches!(&value, ParamValue::Text(text) if accepted.iter().any(|a| a == text));
            if !is_accepted {
                return Err(FilterError::InvalidValue {
                    attribute: logical,
                    value: value.to_string(),
                    expected: accepted.to_vec(),
                });
            }
        }

        let text = match &value {
            ParamValue::Text(text) => Some(text.as_str()),
            _ => None,
        };

        let fragment = if logical == FORMAT_ATTRIBUTE {
            let flag = i64::from(text == Some("csv"));
            self.parameters
                .insert(FORMAT_FLAG_PARAMETER, ParamValue::Integer(flag))?
        } else if logical == DATA_FORMAT_ATTRIBUTE {
            let mode = AvgMode::from_value(text.unwrap_or_default());
            self.parameters
                .insert(AVG_PARAMETER, ParamValue::Integer(mode.code()))?
        } else if let Some(flag) = text.filter(|t| self.vocabulary.is_flag(t)) {
            self.parameters
                .insert(&flag.to_lowercase(), ParamValue::Integer(1))?
        } else {
            self.parameters.insert(&physical.to_lowercase(), value)?
        };

        Ok(Evaluated::Fragment(fragment))
    }

    /// The compared property is resolved but not sent: the service range
    /// parameters are not tied to a property name.
    fn temporal(
        &mut self,
        op: TemporalOp,
        lhs: Evaluated,
        rhs: Evaluated,
    ) -> Result<Evaluated, FilterError> {
        if let Evaluated::Attribute { logical, .. } = &lhs {
            tracing::debug!("Evaluator: {} on '{}' maps to the service date range", op, logical);
        }

        let text = match rhs {
            Evaluated::Value(ParamValue::Text(text)) => text,
            other => {
                return Err(FilterError::MalformedTimestamp {
                    value: format!("{:?}", other),
                    reason: format!("{} expects a timestamp", op),
                });
            }
        };
        let datetime = PrimitiveDateTime::parse(
            &text,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"),
        ).map_err(|e| {
            FilterError::MalformedTimestamp {
                value: text.clone(),
                reason: e.to_string(),
            }
        })?;

        let suffix = match op {
            TemporalOp::After => "",
            TemporalOp::Before => "2",
        };
        let fragment = self.parameters.insert_all(vec![
            (format!("year{suffix}"), ParamValue::Integer(i64::from(datetime.year()))),
            (
                format!("month{suffix}"),
                ParamValue::Integer(i64::from(u8::from(datetime.month()))),
            ),
            (format!("day{suffix}"), ParamValue::Integer(i64::from(datetime.day()))),
            (format!("hour{suffix}"), ParamValue::Integer(i64::from(datetime.hour()))),
        ])?;

        Ok(Evaluated::Fragment(fragment))
    }

    /// Only the envelope is sent; the service may return matches outside the
    /// exact geometry.
    fn intersects(&mut self, _lhs: Evaluated, rhs: Evaluated) -> Result<Evaluated, FilterError> {
        let Evaluated::BoundingBox(bbox) = rhs else {
            return Err(FilterError::GeometryConversion(format!(
                "S_INTERSECTS expects a geometry literal, got {:?}",
                rhs
            )));
        };

        let fragment = self.parameters.insert_all(vec![
            ("lon1".to_string(), ParamValue::Float(bbox.min_x)),
            ("lat1".to_string(), ParamValue::Float(bbox.min_y)),
            ("lon2".to_string(), ParamValue::Float(bbox.max_x)),
            ("lat2".to_string(), ParamValue::Float(bbox.max_y)),
        ])?;

        Ok(Evaluated::Fragment(fragment))
    }
}

fn literal_value(literal: &Literal) -> Result<Evaluated, FilterError> {
    let value = match literal {
        Literal::Integer(i) => ParamValue::Integer(*i),
        Literal::Float(f) => ParamValue::Float(*f),
        Literal::String(s) => ParamValue::Text(s.clone()),
        Literal::Boolean(b) => ParamValue::Text(b.to_string()),
        Literal::Timestamp(ts) => ParamValue::Text(render_timestamp(*ts)?),
        Literal::Date(date) => {
            ParamValue::Text(render_timestamp(date.with_time(Time::MIDNIGHT).assume_utc())?)
        }
        Literal::Geometry(geometry) => return Ok(Evaluated::BoundingBox(BoundingBox::of(geometry)?)),
    };
    Ok(Evaluated::Value(value))
}

/// Render as `YYYY-MM-DDTHH:MM:SSZ`; the service has no notion of offsets.
fn render_timestamp(ts: OffsetDateTime) -> Result<String, FilterError> {
    if ts.offset() != UtcOffset::UTC {
        return Err(FilterError::MalformedTimestamp {
            value: ts.to_string(),
            reason: "only UTC timestamps are supported".to_string(),
        });
    }
    ts.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
    ))
    .map_err(|e| FilterError::MalformedTimestamp {
        value: ts.to_string(),
        reason: e.to_string(),
    })
}

fn combination(lhs: Evaluated, rhs: Evaluated) -> Result<Evaluated, FilterError> {
    match (lhs, rhs) {
        (Evaluated::Fragment(lhs), Evaluated::Fragment(rhs)) => {
            Ok(Evaluated::Fragment(format!("{}&{}", lhs, rhs)))
        }
        _ => Err(FilterError::UnsupportedExpression(
            "AND operands must be predicates".to_string(),
        )),
    }
}

fn unsupported(node: &Expr) -> FilterError {
    FilterError::UnsupportedExpression(format!(
        "{} is not supported by the AERONET service",
        node.kind()
    ))
}

/// Reject the whole tree up front if any node has no handler.
fn check_supported(node: &Expr) -> Result<(), FilterError> {
    match node {
        Expr::Attribute(_) | Expr::Literal(_) => Ok(()),
        Expr::Compare {
            op: CompareOp::Eq,
            lhs,
            rhs,
        }
        | Expr::And(lhs, rhs)
        | Expr::Temporal { lhs, rhs, .. }
        | Expr::Spatial {
            op: SpatialOp::Intersects,
            lhs,
            rhs,
        } => {
            check_supported(lhs)?;
            check_supported(rhs)
        }
        Expr::Compare { .. }
        | Expr::Or(..)
        | Expr::Not(_)
        | Expr::Spatial { .. }
        | Expr::IsNull(_)
        | Expr::Like { .. } => Err(unsupported(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql2::{parse_json, parse_text};
    use geo_types::{MultiPoint, Point, polygon};
    use std::collections::{BTreeMap, HashMap};
    use time::macros::datetime;

    fn vocabulary() -> Vocabulary {
        Vocabulary::with_sites(vec!["GSFC".to_string(), "Cuiaba".to_string()])
    }

    fn run(expr: &Expr) -> Result<Translation, FilterError> {
        let vocabulary = vocabulary();
        Evaluator::new(AttributeMap::identity(), &vocabulary).evaluate(expr)
    }

    fn eq(attr: &str, value: &str) -> Expr {
        Expr::compare(CompareOp::Eq, Expr::attribute(attr), Expr::string(value))
    }

    fn after(value: &str) -> Expr {
        Expr::temporal(
            TemporalOp::After,
            Expr::attribute("datetime"),
            Expr::string(value),
        )
    }

    fn intersects(geometry: Geometry<f64>) -> Expr {
        Expr::spatial(
            SpatialOp::Intersects,
            Expr::attribute("geometry"),
            Expr::Literal(Literal::Geometry(geometry)),
        )
    }

    /// Split `k=v&k=v` back into a map, comparing values by their rendered form.
    fn split_query(query: &str) -> BTreeMap<String, String> {
        query
            .split('&')
            .map(|fragment| {
                let (key, value) = fragment.split_once('=').unwrap();
                (
                    urlencoding::decode(key).unwrap().into_owned(),
                    urlencoding::decode(value).unwrap().into_owned(),
                )
            })
            .collect()
    }

    fn rendered(params: &QueryParameters) -> BTreeMap<String, String> {
        params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_equality_lowercases_attribute() {
        let vocabulary = vocabulary();
        let attributes = AttributeMap::new(
            HashMap::from([("station_level".to_string(), "Level".to_string())]),
            true,
        );
        let expr = eq("station_level", "2");
        let result = Evaluator::new(attributes, &vocabulary).evaluate(&expr).unwrap();
        assert_eq!(result.query, "level=2");
        assert_eq!(result.parameters.get("level"), Some(&ParamValue::Text("2".into())));
    }

    #[test]
    fn test_site_equality() {
        let result = run(&eq("site", "GSFC")).unwrap();
        assert_eq!(result.query, "site=GSFC");
        assert_eq!(result.parameters.len(), 1);
    }

    #[test]
    fn test_invalid_site_value() {
        let err = run(&eq("site", "Atlantis")).unwrap_err();
        match err {
            FilterError::InvalidValue {
                attribute,
                value,
                expected,
            } => {
                assert_eq!(attribute, "site");
                assert_eq!(value, "Atlantis");
                assert_eq!(expected, vec!["GSFC".to_string(), "Cuiaba".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_numeric_value_on_constrained_attribute() {
        let expr = Expr::compare(
            CompareOp::Eq,
            Expr::attribute("data_type"),
            Expr::Literal(Literal::Integer(15)),
        );
        assert!(matches!(run(&expr), Err(FilterError::InvalidValue { .. })));
    }

    #[test]
    fn test_format_selector() {
        let csv = run(&eq("format", "csv")).unwrap();
        assert_eq!(csv.query, "if_no_html=1");
        assert_eq!(csv.parameters.get("if_no_html"), Some(&ParamValue::Integer(1)));

        let html = run(&eq("format", "html")).unwrap();
        assert_eq!(html.query, "if_no_html=0");
        assert_eq!(html.parameters.get("if_no_html"), Some(&ParamValue::Integer(0)));
    }

    #[test]
    fn test_invalid_format() {
        assert!(matches!(
            run(&eq("format", "xml")),
            Err(FilterError::InvalidValue { attribute, .. }) if attribute == "format"
        ));
    }

    #[test]
    fn test_mode_selector() {
        let daily = run(&eq("data_format", "daily-average")).unwrap();
        assert_eq!(daily.query, "avg=20");
        assert_eq!(daily.parameters.get("avg"), Some(&ParamValue::Integer(20)));

        let all = run(&eq("data_format", "all-points")).unwrap();
        assert_eq!(all.query, "avg=10");
    }

    #[test]
    fn test_flag_value() {
        let result = run(&eq("data_type", "AOD15")).unwrap();
        assert_eq!(result.query, "aod15=1");
        assert_eq!(result.parameters.get("aod15"), Some(&ParamValue::Integer(1)));
        assert!(result.parameters.get("data_type").is_none());
    }

    #[test]
    fn test_unconstrained_flag_value() {
        let result = run(&eq("lunar", "lunar_merge")).unwrap();
        assert_eq!(result.query, "lunar_merge=1");
    }

    #[test]
    fn test_site_and_time_after() {
        let expr = Expr::and(eq("site", "GSFC"), after("2020-01-01T00:00:00Z"));
        let result = run(&expr).unwrap();
        assert_eq!(result.query, "site=GSFC&year=2020&month=1&day=1&hour=0");
        assert_eq!(result.parameters.len(), 5);
    }

    #[test]
    fn test_time_before_uses_suffix() {
        let expr = Expr::temporal(
            TemporalOp::Before,
            Expr::attribute("datetime"),
            Expr::Literal(Literal::Timestamp(datetime!(2021-06-30 13:45:10 UTC))),
        );
        let result = run(&expr).unwrap();
        assert_eq!(result.query, "year2=2021&month2=6&day2=30&hour2=13");
        assert_eq!(result.parameters.get("hour2"), Some(&ParamValue::Integer(13)));
        assert!(result.parameters.get("year").is_none());
    }

    #[test]
    fn test_time_range() {
        let expr = parse_text(
            "T_AFTER(datetime, TIMESTAMP('2020-01-01T06:00:00Z')) \
             AND T_BEFORE(datetime, DATE('2020-02-01'))",
        )
        .unwrap();
        let result = run(&expr).unwrap();
        assert_eq!(
            result.query,
            "year=2020&month=1&day=1&hour=6&year2=2020&month2=2&day2=1&hour2=0"
        );
    }

    #[test]
    fn test_malformed_timestamp() {
        assert!(matches!(
            run(&after("01/01/2020")),
            Err(FilterError::MalformedTimestamp { value, .. }) if value == "01/01/2020"
        ));
    }

    #[test]
    fn test_non_utc_timestamp_rejected() {
        let expr = Expr::temporal(
            TemporalOp::After,
            Expr::attribute("datetime"),
            Expr::Literal(Literal::Timestamp(datetime!(2020-01-01 00:00:00 +02:00))),
        );
        assert!(matches!(
            run(&expr),
            Err(FilterError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_bbox_of_polygon() {
        let square = polygon![
            (x: -10.0, y: -5.0),
            (x: 10.0, y: -5.0),
            (x: 10.0, y: 5.0),
            (x: -10.0, y: 5.0),
            (x: -10.0, y: -5.0),
        ];
        let result = run(&intersects(Geometry::Polygon(square))).unwrap();
        assert_eq!(result.query, "lon1=-10.0&lat1=-5.0&lon2=10.0&lat2=5.0");
        assert_eq!(result.parameters.get("lon1"), Some(&ParamValue::Float(-10.0)));
        assert_eq!(result.parameters.get("lat2"), Some(&ParamValue::Float(5.0)));
    }

    #[test]
    fn test_bbox_is_shape_independent() {
        let triangle = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 2.0, y: 3.0),
            (x: 0.0, y: 0.0),
        ];
        let corners = MultiPoint::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 3.0),
            Point::new(0.0, 3.0),
        ]);
        let a = run(&intersects(Geometry::Polygon(triangle))).unwrap();
        let b = run(&intersects(Geometry::MultiPoint(corners))).unwrap();
        assert_eq!(a.parameters, b.parameters);
        assert_eq!(a.query, b.query);
    }

    #[test]
    fn test_empty_geometry() {
        let empty = Geometry::MultiPoint(MultiPoint::<f64>::new(vec![]));
        assert!(matches!(
            run(&intersects(empty)),
            Err(FilterError::GeometryConversion(_))
        ));
    }

    #[test]
    fn test_or_rejected_before_any_write() {
        let expr = Expr::and(eq("site", "GSFC"), Expr::or(eq("format", "csv"), eq("format", "html")));
        assert!(matches!(
            run(&expr),
            Err(FilterError::UnsupportedExpression(msg)) if msg.contains("OR")
        ));
    }

    #[test]
    fn test_not_rejected() {
        let expr = Expr::Not(Box::new(eq("site", "GSFC")));
        assert!(matches!(
            run(&expr),
            Err(FilterError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_other_comparisons_rejected() {
        let expr = Expr::compare(
            CompareOp::Gt,
            Expr::attribute("hour"),
            Expr::Literal(Literal::Integer(3)),
        );
        assert!(matches!(
            run(&expr),
            Err(FilterError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_root_must_be_predicate() {
        assert!(matches!(
            run(&Expr::attribute("site")),
            Err(FilterError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_unknown_attribute() {
        let vocabulary = vocabulary();
        let attributes = AttributeMap::new(
            HashMap::from([("site".to_string(), "site".to_string())]),
            false,
        );
        let expr = Expr::and(eq("site", "GSFC"), eq("station", "x"));
        let err = Evaluator::new(attributes, &vocabulary)
            .evaluate(&expr)
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownAttribute(name) if name == "station"));
    }

    #[test]
    fn test_unknown_attribute_in_time_comparison() {
        let vocabulary = vocabulary();
        let attributes = AttributeMap::new(
            HashMap::from([("datetime".to_string(), "datetime".to_string())]),
            false,
        );
        let expr = Expr::temporal(
            TemporalOp::After,
            Expr::attribute("updated"),
            Expr::string("2020-01-01T00:00:00Z"),
        );
        let err = Evaluator::new(attributes, &vocabulary)
            .evaluate(&expr)
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownAttribute(name) if name == "updated"));
    }

    #[test]
    fn test_two_time_after_clauses_conflict() {
        let expr = Expr::and(
            after("2020-01-01T00:00:00Z"),
            after("2021-01-01T00:00:00Z"),
        );
        assert!(matches!(
            run(&expr),
            Err(FilterError::ConflictingParameter(key)) if key == "year"
        ));
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        let expr = parse_text("level = 'a&b=c' AND note = 'x y é'").unwrap();
        let result = run(&expr).unwrap();
        assert_eq!(result.query, "level=a%26b%3Dc&note=x%20y%20%C3%A9");
        assert!(result.query.is_ascii());
        assert_eq!(result.query.split('&').count(), result.parameters.len());
        assert_eq!(split_query(&result.query), rendered(&result.parameters));
        assert_eq!(
            result.parameters.get("level"),
            Some(&ParamValue::Text("a&b=c".into()))
        );
    }

    #[test]
    fn test_conflicting_parameters() {
        let expr = Expr::and(eq("format", "csv"), eq("format", "html"));
        assert!(matches!(
            run(&expr),
            Err(FilterError::ConflictingParameter(key)) if key == "if_no_html"
        ));
    }

    #[test]
    fn test_query_string_matches_parameters() {
        let expr = parse_json(
            r#"{"op": "and", "args": [
                {"op": "=", "args": [{"property": "site"}, "Cuiaba"]},
                {"op": "=", "args": [{"property": "data_type"}, "SDA20"]},
                {"op": "=", "args": [{"property": "format"}, "csv"]},
                {"op": "=", "args": [{"property": "data_format"}, "daily-average"]},
                {"op": "t_after", "args": [{"property": "datetime"}, {"timestamp": "2019-07-04T08:00:00Z"}]},
                {"op": "t_before", "args": [{"property": "datetime"}, {"timestamp": "2019-08-01T00:00:00Z"}]},
                {"op": "s_intersects", "args": [{"property": "geometry"}, {"bbox": [-60.5, -20, -50, -10.25]}]}
            ]}"#,
        )
        .unwrap();

        let result = run(&expr).unwrap();
        assert_eq!(result.query.split('&').count(), result.parameters.len());
        assert_eq!(split_query(&result.query), rendered(&result.parameters));
        assert_eq!(result.parameters.len(), 16);
    }

    #[test]
    fn test_fresh_evaluations_are_identical() {
        let filter = r#"{"op": "and", "args": [
            {"op": "=", "args": [{"property": "site"}, "GSFC"]},
            {"op": "s_intersects", "args": [{"property": "geometry"}, {"type": "Point", "coordinates": [-76.84, 38.99]}]}
        ]}"#;
        let first = run(&parse_json(filter).unwrap()).unwrap();
        let second = run(&parse_json(filter).unwrap()).unwrap();
        assert_eq!(first.query, second.query);
        assert_eq!(first.parameters, second.parameters);
    }
}
