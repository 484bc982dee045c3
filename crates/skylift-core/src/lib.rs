//! Skylift core.
//!
//! Turns a declarative workload request into a dependency graph of
//! typed resource nodes, orders it deterministically, and drives
//! per-type handlers against a provisioner capability while threading
//! shared run state (handles, derived environment variables) between
//! nodes.
//!
//! # Architecture
//!
//! ```text
//! WorkloadRequest ──▶ GraphBuilder ──▶ DependencyGraph
//!                                          │ topological order
//!                                          ▼
//!                     HandlerRegistry ◀─ TopologicalExecutor ──▶ Provisioner
//!                                          │
//!                                          ▼
//!                                    ExecutionContext ──▶ ServiceOutputs
//! ```
//!
//! The provisioner is an opaque capability (`skylift-cloud-aws` in
//! production); new resource types are added by registering a handler,
//! with no change to the builder or the executor.

pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod handlers;
pub mod model;
pub mod orchestrator;
pub mod provisioner;

// Re-exports
pub use context::ExecutionContext;
pub use error::{Result, RunPhase, StackError, StackFailure};
pub use executor::TopologicalExecutor;
pub use graph::{
    DependencyGraph, GraphBuilder, GraphEdge, GraphNode, UnknownTypePolicy, NODE_ECR_REPO,
    NODE_ROLE, NODE_SERVICE, TYPE_ECR_REPO, TYPE_ROLE, TYPE_SERVICE, TYPE_STORAGE,
};
pub use handlers::{HandlerRegistry, ResourceHandler};
pub use model::{
    ResourceSpec, RunParams, ServiceOutputs, StackOutcome, WorkloadAction, WorkloadRequest,
};
pub use provisioner::{
    AppServiceSpec, Encryption, Provisioner, RemovalPolicy, ResourceHandle, StorageProps,
};
