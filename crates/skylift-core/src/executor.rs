//! Topological executor.
//!
//! Computes one valid execution order for a dependency graph and drives
//! the per-type handlers over it, strictly sequentially: no two handlers
//! ever run concurrently, and the first failure aborts the remaining
//! sequence. Every node is visited exactly once, and a node's handler
//! observes the post-state of every transitive predecessor.

use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::error::{Result, StackError};
use crate::graph::DependencyGraph;
use crate::handlers::HandlerRegistry;
use crate::model::RunParams;
use crate::provisioner::Provisioner;

pub struct TopologicalExecutor<'a> {
    registry: &'a HandlerRegistry,
}

impl<'a> TopologicalExecutor<'a> {
    pub fn new(registry: &'a HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Runs every node of `graph` in topological order, recording
    /// handles and derived configuration into `ctx`.
    pub async fn run(
        &self,
        env: &dyn Provisioner,
        graph: &DependencyGraph,
        params: &RunParams,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        let order = graph.topological_order()?;
        debug!(
            order = ?order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            "computed execution order"
        );

        for node in order {
            let handler = self
                .registry
                .get(&node.node_type)
                .ok_or_else(|| StackError::UnknownResourceType(node.node_type.clone()))?;

            info!(node = %node.id, node_type = %node.node_type, "materializing node");
            handler.materialize(env, node, params, ctx).await?;
        }

        Ok(())
    }
}
