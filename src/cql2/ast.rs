//! AST types for CQL2 filters.

use geo_types::Geometry;
use std::fmt;
use time::{Date, OffsetDateTime};

/// Root filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Queryable reference: `{"property": "site"}` or `site`
    Attribute(String),

    /// Scalar, temporal or spatial literal
    Literal(Literal),

    /// Binary comparison: `site = 'GSFC'`, `count >= 2`
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Boolean AND: `a AND b`
    And(Box<Expr>, Box<Expr>),

    /// Boolean OR: `a OR b`
    Or(Box<Expr>, Box<Expr>),

    /// Boolean NOT: `NOT a`
    Not(Box<Expr>),

    /// Temporal predicate: `T_AFTER(datetime, TIMESTAMP('...'))`
    Temporal {
        op: TemporalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Spatial predicate: `S_INTERSECTS(geometry, POLYGON(...))`
    Spatial {
        op: SpatialOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `attr IS NULL`
    IsNull(Box<Expr>),

    /// `attr LIKE 'pattern'`
    Like { lhs: Box<Expr>, pattern: String },
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Timestamp(OffsetDateTime),
    Date(Date),
    Geometry(Geometry<f64>),
}

/// Scalar comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, // =
    Ne, // <>
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "<>"),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalOp {
    After,
    Before,
}

impl fmt::Display for TemporalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalOp::After => write!(f, "T_AFTER"),
            TemporalOp::Before => write!(f, "T_BEFORE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialOp {
    Intersects,
    Within,
    Contains,
    Disjoint,
}

impl fmt::Display for SpatialOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialOp::Intersects => write!(f, "S_INTERSECTS"),
            SpatialOp::Within => write!(f, "S_WITHIN"),
            SpatialOp::Contains => write!(f, "S_CONTAINS"),
            SpatialOp::Disjoint => write!(f, "S_DISJOINT"),
        }
    }
}

impl Expr {
    pub fn attribute(name: impl Into<String>) -> Self {
        Expr::Attribute(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn temporal(op: TemporalOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Temporal {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn spatial(op: SpatialOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Spatial {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> String {
        match self {
            Expr::Attribute(_) => "property".to_string(),
            Expr::Literal(_) => "literal".to_string(),
            Expr::Compare { op, .. } => format!("comparison '{}'", op),
            Expr::And(..) => "AND".to_string(),
            Expr::Or(..) => "OR".to_string(),
            Expr::Not(_) => "NOT".to_string(),
            Expr::Temporal { op, .. } => op.to_string(),
            Expr::Spatial { op, .. } => op.to_string(),
            Expr::IsNull(_) => "IS NULL".to_string(),
            Expr::Like { .. } => "LIKE".to_string(),
        }
    }
}
