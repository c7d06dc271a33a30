//! CQL2-JSON decoder.

use super::ast::{CompareOp, Expr, Literal, SpatialOp, TemporalOp};
use super::{ParseError, bbox_geometry, parse_date, parse_timestamp};
use geo_types::Geometry;
use serde_json::{Map, Value};

/// Parse a CQL2-JSON document into an AST.
pub fn parse_json(input: &str) -> Result<Expr, ParseError> {
    let value: Value = serde_json::from_str(input)?;
    parse_json_value(&value)
}

/// Parse an already decoded CQL2-JSON document into an AST.
pub fn parse_json_value(value: &Value) -> Result<Expr, ParseError> {
    match value {
        Value::Object(object) => parse_object(object),
        Value::String(s) => Ok(Expr::Literal(Literal::String(s.clone()))),
        Value::Bool(b) => Ok(Expr::Literal(Literal::Boolean(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Expr::Literal(Literal::Integer(i))),
            None => n
                .as_f64()
                .map(|f| Expr::Literal(Literal::Float(f)))
                .ok_or_else(|| ParseError::InvalidOperand(format!("unrepresentable number {n}"))),
        },
        Value::Null => Err(ParseError::InvalidOperand("null".to_string())),
        Value::Array(_) => Err(ParseError::InvalidOperand(
            "bare arrays are not valid operands".to_string(),
        )),
    }
}

fn parse_object(object: &Map<String, Value>) -> Result<Expr, ParseError> {
    if let Some(op) = object.get("op") {
        let op = op
            .as_str()
            .ok_or_else(|| ParseError::InvalidOperand("'op' must be a string".to_string()))?;
        let args = match object.get("args") {
            Some(Value::Array(args)) => args.as_slice(),
            Some(other) => std::slice::from_ref(other),
            None => &[],
        };
        return parse_operation(op, args);
    }

    if let Some(name) = object.get("property") {
        return name
            .as_str()
            .map(Expr::attribute)
            .ok_or_else(|| ParseError::InvalidOperand("'property' must be a string".to_string()));
    }

    if let Some(value) = object.get("timestamp") {
        let value = expect_str(value, "timestamp")?;
        return Ok(Expr::Literal(Literal::Timestamp(parse_timestamp(value)?)));
    }

    if let Some(value) = object.get("date") {
        let value = expect_str(value, "date")?;
        return Ok(Expr::Literal(Literal::Date(parse_date(value)?)));
    }

    if let Some(value) = object.get("bbox") {
        let numbers = value
            .as_array()
            .ok_or_else(|| ParseError::InvalidGeometry("'bbox' must be an array".to_string()))?
            .iter()
            .map(|item| {
                item.as_f64().ok_or_else(|| {
                    ParseError::InvalidGeometry(format!("'bbox' entry {} is not a number", item))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::Literal(Literal::Geometry(bbox_geometry(&numbers)?)));
    }

    if object.contains_key("type") {
        return parse_geojson(object).map(|g| Expr::Literal(Literal::Geometry(g)));
    }

    Err(ParseError::InvalidOperand(format!(
        "unrecognized object {}",
        Value::Object(object.clone())
    )))
}

fn parse_operation(op: &str, args: &[Value]) -> Result<Expr, ParseError> {
    let lowered = op.to_ascii_lowercase();
    match lowered.as_str() {
        "and" | "or" => {
            let (first, rest) = match args {
                [first, rest @ ..] if !rest.is_empty() => (first, rest),
                _ => {
                    return Err(ParseError::Syntax(format!(
                        "'{op}' needs at least 2 arguments, got {}",
                        args.len()
                    )));
                }
            };
            rest.iter().try_fold(parse_json_value(first)?, |acc, next| {
                let next = parse_json_value(next)?;
                Ok(if lowered == "and" {
                    Expr::and(acc, next)
                } else {
                    Expr::or(acc, next)
                })
            })
        }
        "not" => {
            let [inner] = args else {
                return Err(arity_error(op, 1, args.len()));
            };
            Ok(Expr::Not(Box::new(parse_json_value(inner)?)))
        }
        "isnull" => {
            let [inner] = args else {
                return Err(arity_error(op, 1, args.len()));
            };
            Ok(Expr::IsNull(Box::new(parse_json_value(inner)?)))
        }
        "like" => {
            let (lhs, rhs) = binary_args(op, args)?;
            match rhs {
                Expr::Literal(Literal::String(pattern)) => Ok(Expr::Like {
                    lhs: Box::new(lhs),
                    pattern,
                }),
                other => Err(ParseError::InvalidOperand(format!(
                    "LIKE pattern must be a string, got {}",
                    other.kind()
                ))),
            }
        }
        _ => {
            if let Some(cmp) = compare_op(&lowered) {
                let (lhs, rhs) = binary_args(op, args)?;
                return Ok(Expr::compare(cmp, lhs, rhs));
            }
            if let Some(temporal) = temporal_op(&lowered) {
                let (lhs, rhs) = binary_args(op, args)?;
                return Ok(Expr::temporal(temporal, lhs, rhs));
            }
            if let Some(spatial) = spatial_op(&lowered) {
                let (lhs, rhs) = binary_args(op, args)?;
                return Ok(Expr::spatial(spatial, lhs, rhs));
            }
            Err(ParseError::UnknownOperator(op.to_string()))
        }
    }
}

pub(super) fn compare_op(op: &str) -> Option<CompareOp> {
    match op {
        "=" => Some(CompareOp::Eq),
        "<>" => Some(CompareOp::Ne),
        "<" => Some(CompareOp::Lt),
        "<=" => Some(CompareOp::Le),
        ">" => Some(CompareOp::Gt),
        ">=" => Some(CompareOp::Ge),
        _ => None,
    }
}

pub(super) fn temporal_op(op: &str) -> Option<TemporalOp> {
    match op {
        "t_after" => Some(TemporalOp::After),
        "t_before" => Some(TemporalOp::Before),
        _ => None,
    }
}

pub(super) fn spatial_op(op: &str) -> Option<SpatialOp> {
    match op {
        "s_intersects" => Some(SpatialOp::Intersects),
        "s_within" => Some(SpatialOp::Within),
        "s_contains" => Some(SpatialOp::Contains),
        "s_disjoint" => Some(SpatialOp::Disjoint),
        _ => None,
    }
}

fn binary_args(op: &str, args: &[Value]) -> Result<(Expr, Expr), ParseError> {
    let [lhs, rhs] = args else {
        return Err(arity_error(op, 2, args.len()));
    };
    Ok((parse_json_value(lhs)?, parse_json_value(rhs)?))
}

fn arity_error(op: &str, expected: usize, got: usize) -> ParseError {
    ParseError::Syntax(format!("'{op}' expects {expected} argument(s), got {got}"))
}

fn expect_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, ParseError> {
    value
        .as_str()
        .ok_or_else(|| ParseError::InvalidOperand(format!("'{field}' must be a string")))
}

fn parse_geojson(object: &Map<String, Value>) -> Result<Geometry<f64>, ParseError> {
    let geometry: geojson::Geometry = serde_json::from_value(Value::Object(object.clone()))
        .map_err(|e| ParseError::InvalidGeometry(e.to_string()))?;
    Geometry::<f64>::try_from(geometry).map_err(|e| ParseError::InvalidGeometry(e.to_string()))
}
