//! Run-scoped execution context.
//!
//! One context is created empty at the start of an executor run and
//! dropped at the end; it is never persisted or shared across runs.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, StackError};
use crate::provisioner::ResourceHandle;

/// Shared mutable state threaded through every handler of one run.
///
/// Read/write contract:
/// - `results`: a handler may read the handle of any *predecessor* node
///   (guaranteed present by the execution order) and writes exactly one
///   entry keyed by its own node id.
/// - `env_vars`: handlers may append derived configuration (e.g.
///   `BUCKET_ARN`); the terminal service handler reads the accumulated
///   map. Keys are ordered so the derived env list is deterministic.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    results: HashMap<String, ResourceHandle>,
    env_vars: BTreeMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the handle produced for a node.
    pub fn record_result(&mut self, node_id: impl Into<String>, handle: ResourceHandle) {
        self.results.insert(node_id.into(), handle);
    }

    /// Handle recorded for a node, if any.
    pub fn result(&self, node_id: &str) -> Option<&ResourceHandle> {
        self.results.get(node_id)
    }

    /// Handle recorded for a node; fails with `MissingHandle` when the
    /// node has not been materialized.
    pub fn require_result(&self, node_id: &str) -> Result<&ResourceHandle> {
        self.results
            .get(node_id)
            .ok_or_else(|| StackError::MissingHandle(node_id.to_string()))
    }

    pub fn results(&self) -> &HashMap<String, ResourceHandle> {
        &self.results
    }

    /// Appends a derived environment variable.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }

    pub fn env(&self, key: &str) -> Option<&str> {
        self.env_vars.get(key).map(String::as_str)
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }
}
