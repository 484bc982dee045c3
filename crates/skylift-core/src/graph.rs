//! Resource dependency graph.
//!
//! Turns the unordered resource list of a deploy request into a directed
//! acyclic graph of typed nodes, with a deterministic topological order
//! for execution.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, StackError};
use crate::model::ResourceSpec;

/// Node id of the terminal App Runner service node.
pub const NODE_SERVICE: &str = "apprunner_service";
/// Node id of the ECR repository reference node.
pub const NODE_ECR_REPO: &str = "ecr_repo";
/// Node id of the App Runner execution role node.
pub const NODE_ROLE: &str = "apprunner_role";

/// Type tag for user-declared storage buckets.
pub const TYPE_STORAGE: &str = "storage";
/// Type tag for the image repository reference backbone node.
pub const TYPE_ECR_REPO: &str = "ecr-repo";
/// Type tag for the execution role backbone node.
pub const TYPE_ROLE: &str = "apprunner-role";
/// Type tag for the managed service backbone node.
pub const TYPE_SERVICE: &str = "apprunner-service";

/// A single resource node in the dependency graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Unique node id within the graph
    pub id: String,
    /// Resource type tag, resolved against the handler registry
    pub node_type: String,
    /// Properties carried over from the declaring spec
    pub properties: HashMap<String, serde_json::Value>,
}

/// Ordering constraint: `from` must be materialized before `to`.
/// Duplicate edges are harmless (in-degrees are counted per edge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Policy for resource spec types the builder does not recognize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Ignore the spec entirely (forward-compatible template fields).
    #[default]
    Skip,
    /// Fail the build with `UnknownSpecType`.
    Reject,
}

/// A directed acyclic graph of resource nodes and ordering edges.
///
/// Nodes are kept in insertion order; the topological sort breaks ties
/// by that order, so identical input always yields an identical order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    /// Builds the graph for a deploy request with the default
    /// unknown-type policy (silently skip).
    pub fn from_resources(resources: &[ResourceSpec]) -> Result<Self> {
        GraphBuilder::new().build(resources)
    }

    /// Adds a node, rejecting duplicate ids.
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(StackError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Adds an ordering edge. Endpoints are not validated here; edges
    /// naming unknown nodes simply never constrain anything.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.push(GraphEdge {
            from: from.into(),
            to: to.into(),
        });
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the nodes in a valid execution order (Kahn's algorithm).
    ///
    /// When several nodes are ready at once the earliest-inserted one is
    /// picked, which makes the order reproducible across runs. A cycle
    /// fails with `CyclicDependency` naming every unconsumed node.
    pub fn topological_order(&self) -> Result<Vec<&GraphNode>> {
        let mut in_degree: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        for edge in &self.edges {
            if let Some(degree) = in_degree.get_mut(edge.to.as_str()) {
                *degree += 1;
            }
        }

        let mut order: Vec<&GraphNode> = Vec::with_capacity(self.nodes.len());
        let mut remaining: Vec<usize> = (0..self.nodes.len()).collect();

        while !remaining.is_empty() {
            // Earliest inserted node among those with no open dependencies.
            let next = remaining
                .iter()
                .position(|&i| in_degree[self.nodes[i].id.as_str()] == 0);

            let Some(pos) = next else {
                let unconsumed: Vec<String> = remaining
                    .iter()
                    .map(|&i| self.nodes[i].id.clone())
                    .collect();
                return Err(StackError::CyclicDependency(unconsumed));
            };

            let node = &self.nodes[remaining.remove(pos)];
            for edge in self.edges.iter().filter(|e| e.from == node.id) {
                if let Some(degree) = in_degree.get_mut(edge.to.as_str()) {
                    *degree -= 1;
                }
            }
            order.push(node);
        }

        Ok(order)
    }
}

/// Builder producing a `DependencyGraph` from declared resources plus
/// the fixed backbone (image reference, execution role, managed service).
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    unknown_types: UnknownTypePolicy,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy for unrecognized resource spec types.
    pub fn unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }

    pub fn build(&self, resources: &[ResourceSpec]) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::default();

        for spec in resources {
            match spec.resource_type.as_str() {
                TYPE_STORAGE => {
                    let name = spec.name.clone().ok_or_else(|| {
                        StackError::MissingResourceName(spec.resource_type.clone())
                    })?;
                    graph.add_node(GraphNode {
                        id: name.clone(),
                        node_type: TYPE_STORAGE.to_string(),
                        properties: spec.properties.clone(),
                    })?;
                    graph.add_edge(name, NODE_SERVICE);
                }
                other => match self.unknown_types {
                    UnknownTypePolicy::Skip => {
                        debug!(resource_type = %other, "skipping unrecognized resource type");
                    }
                    UnknownTypePolicy::Reject => {
                        return Err(StackError::UnknownSpecType(other.to_string()));
                    }
                },
            }
        }

        graph.add_node(GraphNode {
            id: NODE_ECR_REPO.to_string(),
            node_type: TYPE_ECR_REPO.to_string(),
            properties: HashMap::new(),
        })?;
        graph.add_node(GraphNode {
            id: NODE_ROLE.to_string(),
            node_type: TYPE_ROLE.to_string(),
            properties: HashMap::new(),
        })?;
        graph.add_node(GraphNode {
            id: NODE_SERVICE.to_string(),
            node_type: TYPE_SERVICE.to_string(),
            properties: HashMap::new(),
        })?;

        graph.add_edge(NODE_ECR_REPO, NODE_SERVICE);
        graph.add_edge(NODE_ROLE, NODE_SERVICE);

        Ok(graph)
    }
}
