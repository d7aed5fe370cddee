//! Fault-injecting client for tests.
//!
//! [`FlakyClient`] wraps an [`InMemoryObjectClient`], counts every call per
//! operation, and fails operations on demand so error propagation and
//! partial-failure behavior can be exercised.

use std::collections::HashMap;
use std::sync::Mutex;

use bucketfs_store::{
    ChunkStream, InMemoryObjectClient, ListedObject, ObjectClient, ObjectMeta, StoreError,
    StoreResult,
};
use bytes::Bytes;

/// Client operations that can be counted and failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Put,
    Get,
    Delete,
    Stat,
    List,
    Copy,
}

impl Op {
    fn label(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Get => "get",
            Self::Delete => "delete",
            Self::Stat => "stat",
            Self::List => "list",
            Self::Copy => "copy",
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// Remaining successful calls per operation. Zero means fail.
    budgets: HashMap<Op, usize>,
    calls: HashMap<Op, usize>,
}

#[derive(Debug, Default)]
pub struct FlakyClient {
    inner: InMemoryObjectClient,
    faults: Mutex<Faults>,
}

impl FlakyClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped bucket, for inspecting state without counting calls.
    pub fn inner(&self) -> &InMemoryObjectClient {
        &self.inner
    }

    /// Fail every subsequent call of `op`.
    pub fn fail(&self, op: Op) {
        self.allow(op, 0);
    }

    /// Let `n` more calls of `op` succeed, then fail the rest.
    pub fn allow(&self, op: Op, n: usize) {
        self.faults.lock().unwrap().budgets.insert(op, n);
    }

    /// Stop failing `op`.
    pub fn heal(&self, op: Op) {
        self.faults.lock().unwrap().budgets.remove(&op);
    }

    /// Number of calls of `op` seen so far, failed ones included.
    pub fn calls(&self, op: Op) -> usize {
        self.faults.lock().unwrap().calls.get(&op).copied().unwrap_or(0)
    }

    fn check(&self, op: Op) -> StoreResult<()> {
        let mut faults = self.faults.lock().unwrap();
        *faults.calls.entry(op).or_default() += 1;
        match faults.budgets.get_mut(&op) {
            Some(0) => Err(StoreError::Backend(format!("injected {} failure", op.label()))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ObjectClient for FlakyClient {
    fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StoreResult<()> {
        self.check(Op::Put)?;
        self.inner.put_object(key, data, content_type)
    }

    fn get_chunks(&self, key: &str, chunk_size: usize) -> StoreResult<ChunkStream> {
        self.check(Op::Get)?;
        self.inner.get_chunks(key, chunk_size)
    }

    fn delete_object(&self, key: &str) -> StoreResult<bool> {
        self.check(Op::Delete)?;
        self.inner.delete_object(key)
    }

    fn stat_object(&self, key: &str) -> StoreResult<Option<ObjectMeta>> {
        self.check(Op::Stat)?;
        self.inner.stat_object(key)
    }

    fn list_objects(&self, prefix: &str) -> StoreResult<Vec<ListedObject>> {
        self.check(Op::List)?;
        self.inner.list_objects(prefix)
    }

    fn generate_url(&self, key: &str) -> String {
        self.inner.generate_url(key)
    }

    fn copy_object(&self, from: &str, to: &str) -> StoreResult<()> {
        self.check(Op::Copy)?;
        self.inner.copy_object(from, to)
    }
}
