//! In-memory coordination tree.
//!
//! Stands in for a ZooKeeper ensemble: nodes live in a shared map, every
//! connection reads the same tree, and failures can be injected to exercise
//! retry and error paths. Counters expose how much "network" activity a
//! caller produced.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;
use zk_config::SessionOptions;

use crate::client::{Connector, Coordinator};
use crate::error::{ZkError, ZkResult};
use crate::path::{SEPARATOR, build_path};

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<String, Vec<u8>>,
    broken: HashSet<String>,
    connect_failures: u32,
    read_failures: u32,
    connects: u32,
    open_sessions: u32,
    reads: u64,
}

/// A shared in-memory tree. Clones refer to the same tree.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Create a tree holding only the root node.
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.nodes.insert("/".to_owned(), Vec::new());
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Create or overwrite the node at `path`, creating empty parents as needed.
    pub fn create(&self, path: &str, data: impl Into<Vec<u8>>) -> &Self {
        let path = build_path(path, "");
        let mut inner = self.inner.lock();
        let mut parent = String::new();
        for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
            parent = build_path(&parent, segment);
            inner.nodes.entry(parent.clone()).or_default();
        }
        inner.nodes.insert(path, data.into());
        self
    }

    /// Make every read of `path` fail with a non-retryable error.
    pub fn break_node(&self, path: &str) -> &Self {
        self.inner.lock().broken.insert(build_path(path, ""));
        self
    }

    /// Fail the next `n` connection attempts.
    pub fn fail_connects(&self, n: u32) -> &Self {
        self.inner.lock().connect_failures = n;
        self
    }

    /// Fail the next `n` reads with a connection loss.
    pub fn fail_reads(&self, n: u32) -> &Self {
        self.inner.lock().read_failures = n;
        self
    }

    /// Connection attempts seen so far, failed ones included.
    pub fn connects(&self) -> u32 {
        self.inner.lock().connects
    }

    /// Connections currently open.
    pub fn open_sessions(&self) -> u32 {
        self.inner.lock().open_sessions
    }

    /// Read operations attempted so far, failed ones included.
    pub fn reads(&self) -> u64 {
        self.inner.lock().reads
    }

    fn read<T>(&self, path: &str, f: impl FnOnce(&Inner) -> ZkResult<T>) -> ZkResult<T> {
        let mut inner = self.inner.lock();
        inner.reads += 1;
        if inner.read_failures > 0 {
            inner.read_failures -= 1;
            return Err(ZkError::Connection(format!("connection loss reading '{path}'")));
        }
        if inner.broken.contains(path) {
            return Err(ZkError::resolution(path, "node is unreadable"));
        }
        if !inner.nodes.contains_key(path) {
            return Err(ZkError::resolution(path, "node does not exist"));
        }
        f(&inner)
    }
}

#[async_trait]
impl Connector for MemoryTree {
    type Conn = MemoryConnection;

    async fn connect(&self, endpoint: &str, _options: &SessionOptions) -> ZkResult<MemoryConnection> {
        let mut inner = self.inner.lock();
        inner.connects += 1;
        if inner.connect_failures > 0 {
            inner.connect_failures -= 1;
            return Err(ZkError::Connection(format!(
                "failed to connect to '{endpoint}': connection refused"
            )));
        }
        inner.open_sessions += 1;
        trace!(endpoint, "memory session opened");
        Ok(MemoryConnection { tree: self.clone() })
    }
}

/// An open connection to a [`MemoryTree`]; released on drop.
#[derive(Debug)]
pub struct MemoryConnection {
    tree: MemoryTree,
}

#[async_trait]
impl Coordinator for MemoryConnection {
    async fn list_children(&self, path: &str) -> ZkResult<Vec<String>> {
        self.tree.read(path, |inner| {
            let prefix = if path == "/" {
                "/".to_owned()
            } else {
                format!("{path}/")
            };
            Ok(inner
                .nodes
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| &k[prefix.len()..])
                .filter(|rest| !rest.is_empty() && !rest.contains(SEPARATOR))
                .map(str::to_owned)
                .collect())
        })
    }

    async fn get_data(&self, path: &str) -> ZkResult<Vec<u8>> {
        self.tree
            .read(path, |inner| Ok(inner.nodes.get(path).cloned().unwrap_or_default()))
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut inner = self.tree.inner.lock();
        inner.open_sessions = inner.open_sessions.saturating_sub(1);
    }
}
