use sift_ir::expr::TableExpr;
use sift_ir::trace::{IterTable, Trace};

use super::PlanState;
use crate::env::TableHandleRef;
use crate::errors::{unsupported, PlanError, Result};
use crate::operator::{PhysicalOperator, UnionMap};
use crate::splitter::{Splitter, Subtables};

impl PlanState<'_> {
    /// Distributed map step: lower the map-side trace in this scope, split
    /// the scanned table's handle into subtables, and wrap the result. An
    /// empty split means the query can produce no rows at all.
    pub(crate) fn plan_union_map(
        &mut self,
        inner: &IterTable,
        child: &Trace,
    ) -> Result<PhysicalOperator> {
        let input = self.put(inner);
        let sub = self.plan_step(child.final_step())?;
        let handle = self.inputs[input].stat(self.env)?;
        let Some(splitter) = self.splitter else {
            return Err(unsupported!("split query requires a splitter"));
        };
        let subtables = do_split(splitter, &inner.table, &handle)?;
        match subtables {
            Some(subtables) if !subtables.is_empty() => {
                Ok(PhysicalOperator::UnionMap(UnionMap {
                    from: Box::new(sub),
                    orig: input,
                    sub: subtables,
                }))
            }
            _ => Ok(PhysicalOperator::NoOutput),
        }
    }
}

/// Split `handle`, splitting compound handles member-wise and concatenating
/// the results in order. `None` means the handle had no members to split.
fn do_split(
    splitter: &dyn Splitter,
    table: &TableExpr,
    handle: &TableHandleRef,
) -> Result<Option<Box<dyn Subtables>>> {
    let members = match handle.subhandles() {
        None => {
            let sub = splitter
                .split(table, handle)
                .map_err(PlanError::Environment)?;
            return Ok(Some(sub));
        }
        Some(members) => members,
    };
    let mut out: Option<Box<dyn Subtables>> = None;
    for member in members {
        let Some(part) = do_split(splitter, table, member)? else {
            continue;
        };
        match &mut out {
            None => out = Some(part),
            Some(acc) => acc.append(part),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlanError;
    use crate::testutil::{scan, TestEnv, TestSplitter};
    use sift_ir::trace::TraceBuilder;

    fn child(table: &str) -> Trace {
        TraceBuilder::scan(scan(table)).build()
    }

    #[test]
    fn plain_handles_split_once() {
        let env = TestEnv::default();
        let splitter = TestSplitter::new(3);
        let mut state = PlanState::new(&env, Some(&splitter));
        let op = state.plan_union_map(&scan("t"), &child("t")).unwrap();
        let PhysicalOperator::UnionMap(map) = &op else {
            panic!("expected a union map, got {op:?}");
        };
        assert_eq!(map.orig, 0);
        assert_eq!(map.sub.len(), 3);
        assert_eq!(splitter.calls.get(), 1);
        assert!(matches!(*map.from, PhysicalOperator::Leaf(_)));
    }

    #[test]
    fn compound_handles_split_member_wise() {
        let env = TestEnv {
            compound_parts: 4,
            ..TestEnv::default()
        };
        let splitter = TestSplitter::new(2);
        let mut state = PlanState::new(&env, Some(&splitter));
        let op = state.plan_union_map(&scan("t"), &child("t")).unwrap();
        let PhysicalOperator::UnionMap(map) = &op else {
            panic!("expected a union map, got {op:?}");
        };
        assert_eq!(splitter.calls.get(), 4);
        assert_eq!(map.sub.len(), 8);
    }

    #[test]
    fn empty_splits_produce_no_output() {
        let env = TestEnv::default();
        let splitter = TestSplitter::new(0);
        let mut state = PlanState::new(&env, Some(&splitter));
        let op = state.plan_union_map(&scan("t"), &child("t")).unwrap();
        assert!(matches!(op, PhysicalOperator::NoOutput));
    }

    #[test]
    fn splitter_errors_propagate() {
        let env = TestEnv::default();
        let splitter = TestSplitter {
            fail: true,
            ..TestSplitter::new(1)
        };
        let mut state = PlanState::new(&env, Some(&splitter));
        let err = state.plan_union_map(&scan("t"), &child("t")).unwrap_err();
        assert!(matches!(err, PlanError::Environment(_)));
    }

    #[test]
    fn missing_splitter_is_rejected() {
        let env = TestEnv::default();
        let mut state = PlanState::new(&env, None);
        let err = state.plan_union_map(&scan("t"), &child("t")).unwrap_err();
        assert!(matches!(err, PlanError::Unsupported(_)));
    }

    #[test]
    fn map_side_scan_shares_the_interned_input() {
        let env = TestEnv::default();
        let splitter = TestSplitter::new(2);
        let mut state = PlanState::new(&env, Some(&splitter));
        state.plan_union_map(&scan("t"), &child("t")).unwrap();
        assert_eq!(state.inputs.len(), 1);
    }
}
