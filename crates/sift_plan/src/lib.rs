//! Physical query planning for the sift analytical engine.
//!
//! The planner accepts an optimized logical [`Trace`], the hand-off from
//! the SQL front-end and logical optimizer, and lowers it into a [`Tree`]
//! of physical operators. Each node of the tree carries the operator, the
//! result schema of its sub-plan, plans for correlated sub-traces, and a
//! deduplicated list of table inputs paired with statted handles from the
//! hosting [`Env`].
//!
//! Lowering recognizes the fusions the execution engine implements
//! natively (limits into hash aggregates, orderings, and dedup; orderings
//! into hash aggregates) and gates SELECT INTO on the environment's upload
//! capability. Distributed plans are produced by [`plan_split`], which
//! rewrites the trace into a map/reduce pair and partitions table handles
//! through a caller-supplied [`Splitter`].
//!
//! The pass is single-threaded and synchronous; it emits no diagnostics
//! beyond the returned error value.

pub mod env;
pub mod errors;
pub mod input;
pub mod operator;
pub mod splitter;
pub mod testutil;
pub mod tree;

mod lower;

use sift_ir::trace::Trace;

pub use env::{Env, Hints, TableHandle, TableHandleRef};
pub use errors::{PlanError, Result};
pub use input::Input;
pub use operator::PhysicalOperator;
pub use splitter::{Splitter, Subtables};
pub use tree::{Node, ResultColumn, ResultSet, Tree};

/// Lower `trace` into a single-machine plan.
pub fn plan(trace: &Trace, env: &dyn Env) -> Result<Tree> {
    plan_split(trace, env, None)
}

/// Lower `trace` into a distributed plan, partitioning table inputs through
/// `splitter`. With no splitter this behaves exactly like [`plan`].
pub fn plan_split(
    trace: &Trace,
    env: &dyn Env,
    splitter: Option<&dyn Splitter>,
) -> Result<Tree> {
    tracing::trace!(split = splitter.is_some(), "lowering logical trace");
    match splitter {
        Some(_) => {
            let reduced =
                sift_ir::trace::split(trace).map_err(|e| PlanError::Unsupported(e.to_string()))?;
            tree::to_tree(&reduced, env, splitter)
        }
        None => tree::to_tree(trace, env, splitter),
    }
}
