//! Plan trees: one node per trace, with per-scope table inputs.

use std::fmt;

use sift_ir::expr::typeset::TypeSet;
use sift_ir::trace::Trace;

use crate::env::Env;
use crate::errors::Result;
use crate::input::Input;
use crate::lower::PlanState;
use crate::operator::PhysicalOperator;
use crate::splitter::Splitter;

/// A `(name, types)` pair describing one output column of a sub-plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub name: String,
    pub types: TypeSet,
}

/// Ordered output schema of a sub-plan; empty when the trace projects no
/// explicit column list.
pub type ResultSet = Vec<ResultColumn>;

fn results(trace: &Trace) -> ResultSet {
    trace
        .final_bindings()
        .iter()
        .map(|b| ResultColumn {
            name: b.result.clone(),
            types: trace.type_of(&b.expr),
        })
        .collect()
}

/// One node of the plan tree.
#[derive(Debug)]
pub struct Node {
    pub op: PhysicalOperator,
    /// Output schema of this sub-plan.
    pub result_schema: ResultSet,
    /// Plans for correlated sub-traces, in replacement order.
    pub children: Vec<Node>,
    /// Table inputs interned while lowering this node's trace, in first-use
    /// order. `Leaf` operators in `op` index into this list.
    pub inputs: Vec<Input>,
}

/// A fully lowered plan.
#[derive(Debug)]
pub struct Tree {
    pub root: Node,
}

impl Tree {
    /// Top-level table inputs: the root scope's interned inputs.
    pub fn inputs(&self) -> &[Input] {
        &self.root.inputs
    }
}

pub(crate) fn to_node(
    trace: &Trace,
    env: &dyn Env,
    splitter: Option<&dyn Splitter>,
) -> Result<Node> {
    let mut state = PlanState::new(env, splitter);
    let op = state.plan_step(trace.final_step())?;
    // Correlated sub-traces intern their inputs in their own scopes.
    let children = trace
        .replacements()
        .iter()
        .map(|t| to_node(t, env, splitter))
        .collect::<Result<Vec<_>>>()?;
    let inputs = state.finish()?;
    Ok(Node {
        op,
        result_schema: results(trace),
        children,
        inputs,
    })
}

pub(crate) fn to_tree(
    trace: &Trace,
    env: &dyn Env,
    splitter: Option<&dyn Splitter>,
) -> Result<Tree> {
    Ok(Tree {
        root: to_node(trace, env, splitter)?,
    })
}

impl Node {
    fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        self.op.fmt_indent(f, indent)?;
        for (i, child) in self.children.iter().enumerate() {
            writeln!(f, "{:width$}SUBQUERY {i}", "", width = indent * 2)?;
            child.fmt_indent(f, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}
