//! Environments, handles, and splitters shared by the test suite.

use std::cell::Cell;
use std::sync::Arc;

use sift_ir::expr::TableExpr;
use sift_ir::trace::IterTable;

use crate::env::{
    Env, Hints, Indexer, SchemaHintRef, Schemer, SigningKey, TableHandle, TableHandleRef,
    TableIndex, TableIndexRef, UploadEnv, Uploader, UploaderRef,
};
use crate::errors::EnvError;
use crate::splitter::{Splitter, SubtableVec, Subtables};

/// A wildcard scan of `name`.
pub fn scan(name: &str) -> IterTable {
    IterTable::new(TableExpr::new(name)).wildcard()
}

/// Handle recording the table expression and hints it was statted with.
#[derive(Debug)]
pub struct TestHandle {
    pub table: TableExpr,
    pub hints: Hints,
}

impl TableHandle for TestHandle {}

/// Compound handle wrapping a fixed set of sub-handles.
#[derive(Debug)]
pub struct CompoundHandle {
    pub parts: Vec<TableHandleRef>,
}

impl TableHandle for CompoundHandle {
    fn subhandles(&self) -> Option<&[TableHandleRef]> {
        Some(&self.parts)
    }
}

#[derive(Debug)]
pub struct TestSchema;

impl crate::env::SchemaHint for TestSchema {}

#[derive(Debug)]
pub struct TestIndex;

impl TableIndex for TestIndex {}

#[derive(Debug)]
pub struct TestUploader;

impl Uploader for TestUploader {}

/// Environment used by most planner tests.
#[derive(Debug, Default)]
pub struct TestEnv {
    /// When non-zero, tables stat as compound handles with this many
    /// members.
    pub compound_parts: usize,
    pub declare_upload: bool,
    pub with_uploader: bool,
    pub with_key: bool,
    pub with_schema: bool,
    pub with_index: bool,
    pub fail_stat: bool,
    pub stats: Cell<usize>,
}

impl TestEnv {
    /// Number of stat calls served so far.
    pub fn stat_calls(&self) -> usize {
        self.stats.get()
    }
}

impl Env for TestEnv {
    fn stat(
        &self,
        table: &TableExpr,
        hints: &Hints,
    ) -> std::result::Result<TableHandleRef, EnvError> {
        if self.fail_stat {
            return Err("backing store offline".into());
        }
        self.stats.set(self.stats.get() + 1);
        if self.compound_parts > 0 {
            let parts = (0..self.compound_parts)
                .map(|_| {
                    Arc::new(TestHandle {
                        table: table.clone(),
                        hints: hints.clone(),
                    }) as TableHandleRef
                })
                .collect();
            return Ok(Arc::new(CompoundHandle { parts }));
        }
        Ok(Arc::new(TestHandle {
            table: table.clone(),
            hints: hints.clone(),
        }))
    }

    fn schemer(&self) -> Option<&dyn Schemer> {
        self.with_schema.then_some(self as &dyn Schemer)
    }

    fn indexer(&self) -> Option<&dyn Indexer> {
        self.with_index.then_some(self as &dyn Indexer)
    }

    fn upload_env(&self) -> Option<&dyn UploadEnv> {
        (self.declare_upload || self.with_uploader || self.with_key)
            .then_some(self as &dyn UploadEnv)
    }
}

impl Schemer for TestEnv {
    fn schema(&self, _table: &TableExpr) -> Option<SchemaHintRef> {
        Some(Arc::new(TestSchema))
    }
}

impl Indexer for TestEnv {
    fn index(&self, _table: &TableExpr) -> std::result::Result<Option<TableIndexRef>, EnvError> {
        Ok(Some(Arc::new(TestIndex)))
    }
}

impl UploadEnv for TestEnv {
    fn uploader(&self) -> Option<UploaderRef> {
        self.with_uploader
            .then(|| Arc::new(TestUploader) as UploaderRef)
    }

    fn key(&self) -> Option<SigningKey> {
        self.with_key.then(|| SigningKey::new([7; 32]))
    }
}

/// Splitter producing a fixed number of subtables per (sub-)handle.
#[derive(Debug)]
pub struct TestSplitter {
    pub per_handle: usize,
    pub fail: bool,
    pub calls: Cell<usize>,
}

impl TestSplitter {
    pub fn new(per_handle: usize) -> TestSplitter {
        TestSplitter {
            per_handle,
            fail: false,
            calls: Cell::new(0),
        }
    }
}

impl Splitter for TestSplitter {
    fn split(
        &self,
        table: &TableExpr,
        _handle: &TableHandleRef,
    ) -> std::result::Result<Box<dyn Subtables>, EnvError> {
        if self.fail {
            return Err("cannot partition table".into());
        }
        let call = self.calls.get();
        self.calls.set(call + 1);
        let items = (0..self.per_handle)
            .map(|i| format!("{table}:{call}:{i}"))
            .collect();
        Ok(Box::new(SubtableVec::<String>::new(items)))
    }
}
