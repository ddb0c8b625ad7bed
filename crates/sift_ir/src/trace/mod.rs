mod split;

pub use split::split;

use crate::expr::aggregate::Aggregation;
use crate::expr::binding::{Binding, Selection};
use crate::expr::typeset::TypeSet;
use crate::expr::{Expr, Literal, Path, TableExpr};

/// Terminal table iteration step.
#[derive(Debug, Clone, PartialEq)]
pub struct IterTable {
    pub table: TableExpr,
    /// Filter already pushed into the scan by the optimizer.
    pub filter: Option<Expr>,
    /// Paths referenced from this table; ignored when `wildcard` is set.
    pub fields: Vec<String>,
    pub wildcard: bool,
}

impl IterTable {
    pub fn new(table: TableExpr) -> IterTable {
        IterTable {
            table,
            filter: None,
            fields: Vec::new(),
            wildcard: false,
        }
    }

    pub fn with_filter(mut self, filter: Expr) -> IterTable {
        self.filter = Some(filter);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> IterTable
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn wildcard(mut self) -> IterTable {
        self.wildcard = true;
        self
    }
}

/// Cross-join step: iterate a value computed per row of the upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct IterValue {
    pub input: Box<Step>,
    pub value: Expr,
    pub inner_bind: Selection,
    pub outer_bind: Selection,
    pub filter: Option<Expr>,
    pub wildcard: bool,
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderColumn {
    pub column: Expr,
    pub desc: bool,
    pub nulls_last: bool,
}

impl OrderColumn {
    pub fn new(column: Expr) -> OrderColumn {
        OrderColumn {
            column,
            desc: false,
            nulls_last: false,
        }
    }

    pub fn descending(mut self) -> OrderColumn {
        self.desc = true;
        self
    }

    pub fn nulls_last(mut self) -> OrderColumn {
        self.nulls_last = true;
        self
    }
}

/// One logical relational step.
///
/// `IterTable`, `UnionMap`, `NoOutput`, and `DummyOutput` are terminal;
/// every other step owns exactly one upstream step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    IterTable(IterTable),
    IterValue(IterValue),
    Filter {
        input: Box<Step>,
        expr: Expr,
    },
    Distinct {
        input: Box<Step>,
        columns: Vec<Expr>,
    },
    Bind {
        input: Box<Step>,
        bindings: Selection,
    },
    Aggregate {
        input: Box<Step>,
        agg: Aggregation,
        group_by: Option<Vec<Binding>>,
    },
    Limit {
        input: Box<Step>,
        count: u64,
        offset: u64,
    },
    Order {
        input: Box<Step>,
        columns: Vec<OrderColumn>,
    },
    OutputPart {
        input: Box<Step>,
        basename: String,
    },
    OutputIndex {
        input: Box<Step>,
        table: Path,
        basename: String,
    },
    /// Distributed map step: the map-side trace runs once per subtable of
    /// `inner`, and the parent steps reduce the concatenated results.
    UnionMap {
        inner: IterTable,
        child: Box<Trace>,
    },
    NoOutput,
    DummyOutput,
}

impl Step {
    /// Upstream step of a non-terminal; `None` for terminals.
    pub fn input(&self) -> Option<&Step> {
        match self {
            Step::IterValue(iv) => Some(&iv.input),
            Step::Filter { input, .. }
            | Step::Distinct { input, .. }
            | Step::Bind { input, .. }
            | Step::Aggregate { input, .. }
            | Step::Limit { input, .. }
            | Step::Order { input, .. }
            | Step::OutputPart { input, .. }
            | Step::OutputIndex { input, .. } => Some(input),
            Step::IterTable(_) | Step::UnionMap { .. } | Step::NoOutput | Step::DummyOutput => None,
        }
    }
}

/// A linear pipeline of logical steps plus its correlated sub-traces.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    final_step: Step,
    replacements: Vec<Trace>,
}

impl Trace {
    pub fn new(final_step: Step) -> Trace {
        Trace {
            final_step,
            replacements: Vec::new(),
        }
    }

    pub fn with_replacements(final_step: Step, replacements: Vec<Trace>) -> Trace {
        Trace {
            final_step,
            replacements,
        }
    }

    /// Outermost step of the pipeline.
    pub fn final_step(&self) -> &Step {
        &self.final_step
    }

    /// Correlated sub-traces, in replacement order.
    pub fn replacements(&self) -> &[Trace] {
        &self.replacements
    }

    /// The visible output bindings of the pipeline: the outermost projection
    /// or aggregation, looked up through steps that preserve bindings.
    pub fn final_bindings(&self) -> Vec<Binding> {
        bindings_of(&self.final_step)
    }

    /// The set of types `expr` may evaluate to in this trace's output.
    pub fn type_of(&self, expr: &Expr) -> TypeSet {
        use crate::expr::aggregate::AggregateOp;

        match expr {
            Expr::Literal(Literal::Bool(_)) => TypeSet::BOOL,
            Expr::Literal(Literal::Integer(_)) => TypeSet::INT,
            Expr::Literal(Literal::Rational { .. }) | Expr::Literal(Literal::Float(_)) => {
                TypeSet::FLOAT
            }
            Expr::Literal(Literal::String(_)) => TypeSet::STRING,
            Expr::Unary { op, .. } => match op {
                crate::expr::UnaryOperator::Not => TypeSet::BOOL | TypeSet::MISSING,
                crate::expr::UnaryOperator::Negate => TypeSet::NUMERIC | TypeSet::MISSING,
            },
            Expr::Binary { op, .. } => {
                if op.is_comparison() || op.is_logic() {
                    TypeSet::BOOL | TypeSet::MISSING
                } else {
                    TypeSet::NUMERIC | TypeSet::MISSING
                }
            }
            Expr::Aggregate(agg) => match agg.op {
                AggregateOp::Count => TypeSet::INT,
                AggregateOp::Sum => TypeSet::NUMERIC | TypeSet::NULL,
                AggregateOp::Avg => TypeSet::FLOAT | TypeSet::NULL,
                AggregateOp::BoolAnd | AggregateOp::BoolOr => TypeSet::BOOL | TypeSet::NULL,
                AggregateOp::Min | AggregateOp::Max => TypeSet::ANY,
            },
            Expr::Ident(_) | Expr::Path(_) | Expr::Star | Expr::Unpivot(_) => TypeSet::ANY,
        }
    }
}

fn bindings_of(step: &Step) -> Vec<Binding> {
    match step {
        Step::Bind { bindings, .. } => bindings.clone(),
        Step::Aggregate { agg, group_by, .. } => {
            // Aggregate columns come before group columns, matching the
            // output layout of the hash aggregate operator.
            let mut out: Vec<Binding> = agg
                .iter()
                .map(|a| {
                    Binding::new(
                        Expr::Aggregate(Box::new(a.agg.clone())),
                        a.result.clone(),
                    )
                })
                .collect();
            if let Some(by) = group_by {
                out.extend(by.iter().cloned());
            }
            out
        }
        Step::IterValue(iv) => {
            let mut out = iv.outer_bind.clone();
            out.extend(iv.inner_bind.iter().cloned());
            out
        }
        Step::UnionMap { child, .. } => child.final_bindings(),
        Step::Filter { input, .. }
        | Step::Distinct { input, .. }
        | Step::Limit { input, .. }
        | Step::Order { input, .. }
        | Step::OutputPart { input, .. }
        | Step::OutputIndex { input, .. } => bindings_of(input),
        Step::IterTable(_) | Step::NoOutput | Step::DummyOutput => Vec::new(),
    }
}

/// Fluent construction of linear traces.
#[derive(Debug)]
pub struct TraceBuilder {
    step: Step,
}

impl TraceBuilder {
    /// Start a pipeline from a table scan.
    pub fn scan(table: IterTable) -> TraceBuilder {
        TraceBuilder {
            step: Step::IterTable(table),
        }
    }

    /// Start a pipeline from an arbitrary terminal step.
    pub fn from_step(step: Step) -> TraceBuilder {
        TraceBuilder { step }
    }

    pub fn filter(self, expr: Expr) -> TraceBuilder {
        TraceBuilder {
            step: Step::Filter {
                input: Box::new(self.step),
                expr,
            },
        }
    }

    pub fn distinct(self, columns: Vec<Expr>) -> TraceBuilder {
        TraceBuilder {
            step: Step::Distinct {
                input: Box::new(self.step),
                columns,
            },
        }
    }

    pub fn bind(self, bindings: Selection) -> TraceBuilder {
        TraceBuilder {
            step: Step::Bind {
                input: Box::new(self.step),
                bindings,
            },
        }
    }

    pub fn aggregate(self, agg: Aggregation, group_by: Option<Vec<Binding>>) -> TraceBuilder {
        TraceBuilder {
            step: Step::Aggregate {
                input: Box::new(self.step),
                agg,
                group_by,
            },
        }
    }

    pub fn limit(self, count: u64, offset: u64) -> TraceBuilder {
        TraceBuilder {
            step: Step::Limit {
                input: Box::new(self.step),
                count,
                offset,
            },
        }
    }

    pub fn order(self, columns: Vec<OrderColumn>) -> TraceBuilder {
        TraceBuilder {
            step: Step::Order {
                input: Box::new(self.step),
                columns,
            },
        }
    }

    pub fn output_part(self, basename: impl Into<String>) -> TraceBuilder {
        TraceBuilder {
            step: Step::OutputPart {
                input: Box::new(self.step),
                basename: basename.into(),
            },
        }
    }

    pub fn output_index(self, table: Path, basename: impl Into<String>) -> TraceBuilder {
        TraceBuilder {
            step: Step::OutputIndex {
                input: Box::new(self.step),
                table,
                basename: basename.into(),
            },
        }
    }

    pub fn into_step(self) -> Step {
        self.step
    }

    pub fn build(self) -> Trace {
        Trace::new(self.step)
    }

    pub fn build_with_replacements(self, replacements: Vec<Trace>) -> Trace {
        Trace::with_replacements(self.step, replacements)
    }
}
