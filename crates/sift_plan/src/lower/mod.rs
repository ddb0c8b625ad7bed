//! Lowering of logical steps to physical operators.
//!
//! [`PlanState`] is one walker scope: it owns the interned input list for a
//! single trace and its direct step tree. Correlated sub-traces get their
//! own scopes, so input indices never cross node boundaries.

mod plan_aggregate;
mod plan_limit;
mod plan_order;
mod plan_output;
mod plan_scan;
mod plan_union_map;
mod plan_unnest;

pub(crate) use plan_aggregate::plan_aggregate;
pub(crate) use plan_limit::plan_limit;
pub(crate) use plan_order::plan_order;
pub(crate) use plan_output::{plan_output_index, plan_output_part};
pub(crate) use plan_unnest::plan_iter_value;

use sift_ir::trace::{IterTable, Step};

use crate::env::Env;
use crate::errors::{unsupported, Result};
use crate::input::{Input, InternedInput};
use crate::operator::{Distinct, Filter, PhysicalOperator, Project};
use crate::splitter::Splitter;

/// Per-trace lowering state: one walker scope.
pub(crate) struct PlanState<'a> {
    pub env: &'a dyn Env,
    pub splitter: Option<&'a dyn Splitter>,
    pub inputs: Vec<InternedInput>,
}

impl<'a> PlanState<'a> {
    pub fn new(env: &'a dyn Env, splitter: Option<&'a dyn Splitter>) -> PlanState<'a> {
        PlanState {
            env,
            splitter,
            inputs: Vec::new(),
        }
    }

    /// Intern a table scan, merging with an existing input when the table
    /// and scan filter match. Returns the input's position in first-use
    /// order.
    pub fn put(&mut self, it: &IterTable) -> usize {
        let fresh = InternedInput::new(it);
        for (i, existing) in self.inputs.iter_mut().enumerate() {
            if existing.merge(&fresh) {
                return i;
            }
        }
        self.inputs.push(fresh);
        self.inputs.len() - 1
    }

    /// Lower one logical step, recursing through its upstream first.
    pub fn plan_step(&mut self, step: &Step) -> Result<PhysicalOperator> {
        match step {
            Step::IterTable(it) => return self.plan_iter_table(it),
            Step::NoOutput => return Ok(PhysicalOperator::NoOutput),
            Step::DummyOutput => return Ok(PhysicalOperator::DummyOutput),
            Step::UnionMap { inner, child } => return self.plan_union_map(inner, child),
            _ => {}
        }

        let upstream = match step.input() {
            Some(upstream) => upstream,
            None => return Err(unsupported!("don't know how to lower {step:?}")),
        };
        let from = self.plan_step(upstream)?;

        // An empty upstream yields no rows through every row-preserving
        // step; only ungrouped aggregates still emit a row, and outputs
        // still record the (empty) result.
        if matches!(from, PhysicalOperator::NoOutput) && collapses_over_empty(step) {
            return Ok(PhysicalOperator::NoOutput);
        }

        match step {
            Step::IterValue(iv) => plan_iter_value(iv, from),
            Step::Filter { expr, .. } => Ok(PhysicalOperator::Filter(Filter {
                from: Box::new(from),
                expr: expr.clone(),
            })),
            Step::Distinct { columns, .. } => Ok(PhysicalOperator::Distinct(Distinct {
                from: Box::new(from),
                fields: columns.clone(),
                limit: None,
            })),
            Step::Bind { bindings, .. } => Ok(PhysicalOperator::Project(Project {
                from: Box::new(from),
                using: bindings.clone(),
            })),
            Step::Aggregate { agg, group_by, .. } => {
                plan_aggregate(agg, group_by.as_deref(), from)
            }
            Step::Limit { count, offset, .. } => plan_limit(*count, *offset, from),
            Step::Order { columns, .. } => plan_order(columns, from),
            Step::OutputPart { basename, .. } => plan_output_part(self.env, basename, from),
            Step::OutputIndex {
                table, basename, ..
            } => plan_output_index(self.env, table, basename, from),
            Step::IterTable(_) | Step::UnionMap { .. } | Step::NoOutput | Step::DummyOutput => {
                Err(unsupported!("don't know how to lower {step:?}"))
            }
        }
    }

    /// Finalize the scope: stat every interned input in first-use order.
    pub fn finish(&mut self) -> Result<Vec<Input>> {
        let env = self.env;
        self.inputs.iter_mut().map(|i| i.finish(env)).collect()
    }
}

fn collapses_over_empty(step: &Step) -> bool {
    match step {
        Step::Aggregate { group_by, .. } => group_by.is_some(),
        Step::IterValue(_)
        | Step::Filter { .. }
        | Step::Distinct { .. }
        | Step::Bind { .. }
        | Step::Limit { .. }
        | Step::Order { .. } => true,
        Step::OutputPart { .. }
        | Step::OutputIndex { .. }
        | Step::IterTable(_)
        | Step::UnionMap { .. }
        | Step::NoOutput
        | Step::DummyOutput => false,
    }
}
