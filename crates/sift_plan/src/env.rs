//! Environment interfaces probed while lowering.
//!
//! `stat` is the one required capability; everything else is optional and
//! probed through accessor methods with `None` defaults, so environments
//! declare exactly the surfaces they support.

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use sift_ir::expr::{Expr, TableExpr};
use sift_ir::trace::IterTable;

use crate::errors::{EnvError, PlanError, Result};

/// Scan-narrowing information passed along with a stat request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hints {
    /// Filter applied to rows of the table, if any.
    pub filter: Option<Expr>,
    /// Paths referenced from the table; ignored when `all_fields` is set.
    pub fields: Vec<String>,
    pub all_fields: bool,
}

impl Hints {
    /// Hints for a single table scan.
    pub fn for_scan(it: &IterTable) -> Hints {
        Hints {
            filter: it.filter.clone(),
            fields: it.fields.clone(),
            all_fields: it.wildcard,
        }
    }
}

/// Opaque handle for a statted table.
///
/// A handle may be compound, wrapping an ordered sequence of sub-handles;
/// the split driver partitions compound handles member-wise.
pub trait TableHandle: Debug + Send + Sync {
    /// Sub-handles of a compound handle; `None` for plain handles.
    fn subhandles(&self) -> Option<&[TableHandleRef]> {
        None
    }
}

pub type TableHandleRef = Arc<dyn TableHandle>;

/// Schema hint for a table, consumed by the logical front-end.
pub trait SchemaHint: Debug + Send + Sync {}

pub type SchemaHintRef = Arc<dyn SchemaHint>;

/// Secondary-index data for a table, consumed by the logical optimizer.
pub trait TableIndex: Debug + Send + Sync {}

pub type TableIndexRef = Arc<dyn TableIndex>;

/// Sink for objects written by SELECT INTO operators.
pub trait Uploader: Debug + Send + Sync {}

pub type UploaderRef = Arc<dyn Uploader>;

/// Key used to sign uploaded index objects.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    pub fn new(bytes: [u8; 32]) -> SigningKey {
        SigningKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    // key material stays out of debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(..)")
    }
}

/// Schema capability.
pub trait Schemer {
    fn schema(&self, table: &TableExpr) -> Option<SchemaHintRef>;
}

/// Secondary-index capability.
pub trait Indexer {
    fn index(&self, table: &TableExpr) -> std::result::Result<Option<TableIndexRef>, EnvError>;
}

/// Upload capability: an uploader plus the key used to sign indexes.
pub trait UploadEnv {
    /// Uploader for generated objects. Implementations may return `None`
    /// even when the capability itself is declared.
    fn uploader(&self) -> Option<UploaderRef>;

    /// Key used to sign an output index.
    fn key(&self) -> Option<SigningKey>;
}

/// Hosting environment for planning.
pub trait Env {
    /// Resolve a table expression to an opaque handle, narrowed by `hints`.
    fn stat(
        &self,
        table: &TableExpr,
        hints: &Hints,
    ) -> std::result::Result<TableHandleRef, EnvError>;

    fn schemer(&self) -> Option<&dyn Schemer> {
        None
    }

    fn indexer(&self) -> Option<&dyn Indexer> {
        None
    }

    fn upload_env(&self) -> Option<&dyn UploadEnv> {
        None
    }
}

/// Stat `table` against `env`, wrapping environment failures.
pub fn stat(env: &dyn Env, table: &TableExpr, hints: &Hints) -> Result<TableHandleRef> {
    env.stat(table, hints).map_err(PlanError::Environment)
}

/// Optional schema hints for `table`.
pub fn schema(env: &dyn Env, table: &TableExpr) -> Option<SchemaHintRef> {
    env.schemer().and_then(|s| s.schema(table))
}

/// Optional secondary-index data for `table`.
pub fn index(env: &dyn Env, table: &TableExpr) -> Result<Option<TableIndexRef>> {
    match env.indexer() {
        Some(ix) => ix.index(table).map_err(PlanError::Environment),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestEnv;

    #[test]
    fn capabilities_default_to_absent() {
        let env = TestEnv::default();
        let table = TableExpr::new("t");
        assert!(schema(&env, &table).is_none());
        assert!(index(&env, &table).unwrap().is_none());
        assert!(env.upload_env().is_none());
    }

    #[test]
    fn declared_capabilities_are_forwarded() {
        let env = TestEnv {
            with_schema: true,
            with_index: true,
            ..TestEnv::default()
        };
        let table = TableExpr::new("t");
        assert!(schema(&env, &table).is_some());
        assert!(index(&env, &table).unwrap().is_some());
    }

    #[test]
    fn stat_errors_are_wrapped() {
        let env = TestEnv {
            fail_stat: true,
            ..TestEnv::default()
        };
        let err = stat(&env, &TableExpr::new("t"), &Hints::default()).unwrap_err();
        assert!(matches!(err, PlanError::Environment(_)));
        assert!(err.to_string().contains("backing store offline"));
    }
}
