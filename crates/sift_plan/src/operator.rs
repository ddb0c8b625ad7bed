//! Physical operators produced by lowering.

use std::fmt;

use sift_ir::expr::aggregate::Aggregation;
use sift_ir::expr::binding::{Binding, Selection};
use sift_ir::expr::{Expr, Path};

use crate::env::{SigningKey, UploaderRef};
use crate::splitter::Subtables;

/// Reads rows of an interned table input.
#[derive(Debug)]
pub struct Leaf {
    /// Index into the input list of the nearest enclosing plan node.
    pub input: usize,
}

#[derive(Debug)]
pub struct Filter {
    pub from: Box<PhysicalOperator>,
    pub expr: Expr,
}

#[derive(Debug)]
pub struct Project {
    pub from: Box<PhysicalOperator>,
    pub using: Selection,
}

#[derive(Debug)]
pub struct Distinct {
    pub from: Box<PhysicalOperator>,
    pub fields: Vec<Expr>,
    /// Bound on distinct rows emitted, fused from a downstream limit.
    pub limit: Option<u64>,
}

/// Aggregation with no grouping; emits exactly one row.
#[derive(Debug)]
pub struct SimpleAggregate {
    pub from: Box<PhysicalOperator>,
    pub outputs: Aggregation,
}

/// Bare `COUNT(*)`; cheaper than a general aggregate.
#[derive(Debug)]
pub struct CountStar {
    pub from: Box<PhysicalOperator>,
    pub result: String,
}

/// Ordering applied to hash aggregate output, by output column position.
/// Aggregate columns come before group columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOrder {
    pub column: usize,
    pub desc: bool,
    pub nulls_last: bool,
}

#[derive(Debug)]
pub struct HashAggregate {
    pub from: Box<PhysicalOperator>,
    pub agg: Aggregation,
    pub by: Vec<Binding>,
    /// Output ordering fused from a downstream ORDER BY.
    pub order_by: Vec<HashOrder>,
    /// Bound on groups emitted, fused from a downstream limit.
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByColumn {
    pub expr: Expr,
    pub desc: bool,
    pub nulls_last: bool,
}

#[derive(Debug)]
pub struct OrderBy {
    pub from: Box<PhysicalOperator>,
    pub columns: Vec<OrderByColumn>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug)]
pub struct Limit {
    pub from: Box<PhysicalOperator>,
    pub count: u64,
}

/// Cross-join against a path expression: one output row per element of the
/// pivot field, per outer row.
#[derive(Debug)]
pub struct Unnest {
    pub from: Box<PhysicalOperator>,
    pub pivot: Path,
    pub inner_project: Selection,
    pub outer_project: Selection,
    pub inner_match: Option<Expr>,
}

/// Distributed map: runs `from` once per subtable and unions the results.
#[derive(Debug)]
pub struct UnionMap {
    pub from: Box<PhysicalOperator>,
    /// Index of the original table input within the enclosing node.
    pub orig: usize,
    pub sub: Box<dyn Subtables>,
}

/// Writes result rows as a packed object under `basename`.
#[derive(Debug)]
pub struct OutputPart {
    pub from: Box<PhysicalOperator>,
    pub basename: String,
    pub store: UploaderRef,
}

/// Writes result rows and signs an index entry for `table`.
#[derive(Debug)]
pub struct OutputIndex {
    pub from: Box<PhysicalOperator>,
    pub table: Path,
    pub basename: String,
    pub store: UploaderRef,
    pub key: SigningKey,
}

/// One node of the physical operator tree.
#[derive(Debug)]
pub enum PhysicalOperator {
    Leaf(Leaf),
    Filter(Filter),
    Project(Project),
    Distinct(Distinct),
    SimpleAggregate(SimpleAggregate),
    CountStar(CountStar),
    HashAggregate(HashAggregate),
    OrderBy(OrderBy),
    Limit(Limit),
    Unnest(Unnest),
    UnionMap(UnionMap),
    OutputPart(OutputPart),
    OutputIndex(OutputIndex),
    NoOutput,
    DummyOutput,
}

impl PhysicalOperator {
    /// Upstream operator, when there is one.
    pub fn from_op(&self) -> Option<&PhysicalOperator> {
        match self {
            PhysicalOperator::Filter(o) => Some(&o.from),
            PhysicalOperator::Project(o) => Some(&o.from),
            PhysicalOperator::Distinct(o) => Some(&o.from),
            PhysicalOperator::SimpleAggregate(o) => Some(&o.from),
            PhysicalOperator::CountStar(o) => Some(&o.from),
            PhysicalOperator::HashAggregate(o) => Some(&o.from),
            PhysicalOperator::OrderBy(o) => Some(&o.from),
            PhysicalOperator::Limit(o) => Some(&o.from),
            PhysicalOperator::Unnest(o) => Some(&o.from),
            PhysicalOperator::UnionMap(o) => Some(&o.from),
            PhysicalOperator::OutputPart(o) => Some(&o.from),
            PhysicalOperator::OutputIndex(o) => Some(&o.from),
            PhysicalOperator::Leaf(_)
            | PhysicalOperator::NoOutput
            | PhysicalOperator::DummyOutput => None,
        }
    }

    /// One-line description of this operator, upstream excluded.
    pub(crate) fn describe(&self) -> String {
        match self {
            PhysicalOperator::Leaf(o) => format!("LEAF input={}", o.input),
            PhysicalOperator::Filter(o) => format!("FILTER {}", o.expr),
            PhysicalOperator::Project(o) => format!("PROJECT {}", join_bindings(&o.using)),
            PhysicalOperator::Distinct(o) => {
                let mut out = format!("DISTINCT {}", join_exprs(&o.fields));
                if let Some(limit) = o.limit {
                    out.push_str(&format!(" LIMIT {limit}"));
                }
                out
            }
            PhysicalOperator::SimpleAggregate(o) => {
                format!("AGGREGATE {}", join_aggs(&o.outputs))
            }
            PhysicalOperator::CountStar(o) => format!("COUNT(*) AS {}", o.result),
            PhysicalOperator::HashAggregate(o) => {
                let mut out = format!(
                    "HASH AGGREGATE {} BY {}",
                    join_aggs(&o.agg),
                    join_bindings(&o.by)
                );
                if !o.order_by.is_empty() {
                    out.push_str(" ORDER BY");
                    for (i, ord) in o.order_by.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        out.push_str(&format!(" [{}]", ord.column));
                        if ord.desc {
                            out.push_str(" DESC");
                        }
                        if ord.nulls_last {
                            out.push_str(" NULLS LAST");
                        }
                    }
                }
                if let Some(limit) = o.limit {
                    out.push_str(&format!(" LIMIT {limit}"));
                }
                out
            }
            PhysicalOperator::OrderBy(o) => {
                let mut out = String::from("ORDER BY");
                for (i, col) in o.columns.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&format!(" {}", col.expr));
                    if col.desc {
                        out.push_str(" DESC");
                    }
                    if col.nulls_last {
                        out.push_str(" NULLS LAST");
                    }
                }
                if let Some(limit) = o.limit {
                    out.push_str(&format!(" LIMIT {limit}"));
                }
                if let Some(offset) = o.offset {
                    out.push_str(&format!(" OFFSET {offset}"));
                }
                out
            }
            PhysicalOperator::Limit(o) => format!("LIMIT {}", o.count),
            PhysicalOperator::Unnest(o) => format!("UNNEST {}", o.pivot),
            PhysicalOperator::UnionMap(o) => {
                format!("UNION MAP orig={} subtables={}", o.orig, o.sub.len())
            }
            PhysicalOperator::OutputPart(o) => format!("OUTPUT PART {}", o.basename),
            PhysicalOperator::OutputIndex(o) => {
                format!("OUTPUT INDEX {} {}", o.table, o.basename)
            }
            PhysicalOperator::NoOutput => "NO OUTPUT".to_string(),
            PhysicalOperator::DummyOutput => "DUMMY OUTPUT".to_string(),
        }
    }

    pub(crate) fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(f, "{:width$}{}", "", self.describe(), width = indent * 2)?;
        if let Some(from) = self.from_op() {
            from.fmt_indent(f, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PhysicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

fn join_bindings(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_aggs(aggs: &Aggregation) -> String {
    aggs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_exprs(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
