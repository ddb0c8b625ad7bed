//! Interned table inputs and hint merging.

use sift_ir::expr::TableExpr;
use sift_ir::trace::IterTable;

use crate::env::{self, Env, Hints, TableHandleRef};
use crate::errors::Result;

/// A finalized `(table, handle)` pair attached to a plan node.
#[derive(Debug, Clone)]
pub struct Input {
    pub table: TableExpr,
    pub handle: TableHandleRef,
}

/// A table input being interned within one walker scope.
#[derive(Debug)]
pub(crate) struct InternedInput {
    pub table: TableExpr,
    pub hints: Hints,
    handle: Option<TableHandleRef>,
}

impl InternedInput {
    pub fn new(it: &IterTable) -> InternedInput {
        InternedInput {
            table: it.table.clone(),
            hints: Hints::for_scan(it),
            handle: None,
        }
    }

    /// Merge `other` into `self` when both reference the same table with the
    /// same scan filter. A cached handle is dropped because the projected
    /// field set may have widened.
    pub fn merge(&mut self, other: &InternedInput) -> bool {
        if self.table != other.table {
            return false;
        }
        if self.hints.filter != other.hints.filter {
            return false;
        }
        self.handle = None;
        if self.hints.all_fields {
            return true;
        }
        if other.hints.all_fields {
            self.hints.fields.clear();
            self.hints.all_fields = true;
            return true;
        }
        self.hints.fields.extend(other.hints.fields.iter().cloned());
        self.hints.fields.sort();
        self.hints.fields.dedup();
        true
    }

    /// Cached-or-fresh table handle.
    pub fn stat(&mut self, env: &dyn Env) -> Result<TableHandleRef> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }
        let handle = env::stat(env, &self.table, &self.hints)?;
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    pub fn finish(&mut self, env: &dyn Env) -> Result<Input> {
        let handle = self.stat(env)?;
        Ok(Input {
            table: self.table.clone(),
            handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestEnv;
    use sift_ir::expr::{binop, ident, lit, BinaryOperator};

    fn scan(name: &str) -> IterTable {
        IterTable::new(TableExpr::new(name))
    }

    #[test]
    fn merge_requires_equal_table_and_filter() {
        let mut a = InternedInput::new(&scan("t").with_fields(["x"]));
        assert!(!a.merge(&InternedInput::new(&scan("u"))));

        let filtered = scan("t").with_filter(binop(BinaryOperator::Gt, ident("y"), lit(5)));
        let b = InternedInput::new(&filtered);
        assert!(!a.merge(&b));

        let c = InternedInput::new(&scan("t").with_fields(["y"]));
        assert!(a.merge(&c));
        assert_eq!(a.hints.fields, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn field_union_is_sorted_and_deduplicated() {
        let mut a = InternedInput::new(&scan("t").with_fields(["c", "a"]));
        let b = InternedInput::new(&scan("t").with_fields(["b", "a"]));
        assert!(a.merge(&b));
        assert_eq!(
            a.hints.fields,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(!a.hints.all_fields);
    }

    #[test]
    fn wildcard_absorbs_field_lists() {
        let mut a = InternedInput::new(&scan("t").with_fields(["x"]));
        let b = InternedInput::new(&scan("t").wildcard());
        assert!(a.merge(&b));
        assert!(a.hints.all_fields);
        assert!(a.hints.fields.is_empty());

        let mut c = InternedInput::new(&scan("t").wildcard());
        let d = InternedInput::new(&scan("t").with_fields(["x"]));
        assert!(c.merge(&d));
        assert!(c.hints.all_fields);
    }

    #[test]
    fn merge_invalidates_the_cached_handle() {
        let env = TestEnv::default();
        let mut a = InternedInput::new(&scan("t").with_fields(["x"]));
        a.stat(&env).unwrap();
        assert_eq!(env.stat_calls(), 1);

        // cached
        a.stat(&env).unwrap();
        assert_eq!(env.stat_calls(), 1);

        let b = InternedInput::new(&scan("t").with_fields(["y"]));
        assert!(a.merge(&b));
        a.stat(&env).unwrap();
        assert_eq!(env.stat_calls(), 2);
    }
}
