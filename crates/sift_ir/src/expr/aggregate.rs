use std::fmt;

use super::Expr;

/// Aggregate function kinds understood by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Count,
    Sum,
    Min,
    Max,
    Avg,
    BoolAnd,
    BoolOr,
}

impl AggregateOp {
    /// Reduction operator applied when partial results from a distributed
    /// map phase are recombined. `None` means partial results cannot be
    /// recombined and the aggregate is not splittable.
    pub fn combiner(self) -> Option<AggregateOp> {
        match self {
            AggregateOp::Count | AggregateOp::Sum => Some(AggregateOp::Sum),
            AggregateOp::Min => Some(AggregateOp::Min),
            AggregateOp::Max => Some(AggregateOp::Max),
            AggregateOp::BoolAnd => Some(AggregateOp::BoolAnd),
            AggregateOp::BoolOr => Some(AggregateOp::BoolOr),
            AggregateOp::Avg => None,
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateOp::Count => write!(f, "COUNT"),
            AggregateOp::Sum => write!(f, "SUM"),
            AggregateOp::Min => write!(f, "MIN"),
            AggregateOp::Max => write!(f, "MAX"),
            AggregateOp::Avg => write!(f, "AVG"),
            AggregateOp::BoolAnd => write!(f, "BOOL_AND"),
            AggregateOp::BoolOr => write!(f, "BOOL_OR"),
        }
    }
}

/// A single aggregate expression, e.g. `SUM(v)`, possibly with a per-row
/// filter.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub op: AggregateOp,
    pub inner: Expr,
    pub filter: Option<Expr>,
}

impl AggregateExpr {
    pub fn new(op: AggregateOp, inner: Expr) -> AggregateExpr {
        AggregateExpr {
            op,
            inner,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Expr) -> AggregateExpr {
        self.filter = Some(filter);
        self
    }

    /// True for a bare `COUNT(*)` with no per-row filter.
    pub fn is_count_star(&self) -> bool {
        self.op == AggregateOp::Count
            && matches!(self.inner, Expr::Star)
            && self.filter.is_none()
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.inner)?;
        if let Some(filter) = &self.filter {
            write!(f, " FILTER (WHERE {filter})")?;
        }
        Ok(())
    }
}

/// An aggregate expression bound to its output name.
#[derive(Debug, Clone, PartialEq)]
pub struct AggBinding {
    pub agg: AggregateExpr,
    pub result: String,
}

impl AggBinding {
    pub fn new(agg: AggregateExpr, result: impl Into<String>) -> AggBinding {
        AggBinding {
            agg,
            result: result.into(),
        }
    }
}

impl fmt::Display for AggBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.agg, self.result)
    }
}

/// An ordered aggregate list; one output column per entry.
pub type Aggregation = Vec<AggBinding>;
