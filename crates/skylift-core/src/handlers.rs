//! Resource handler registry and built-in handlers.
//!
//! Each resource type tag maps to one handler; the executor looks the
//! handler up per node and invokes it against the provisioner. New
//! resource types are added purely by registering a handler; neither
//! the graph builder nor the executor changes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::graph::{GraphNode, NODE_ECR_REPO, NODE_ROLE, TYPE_ECR_REPO, TYPE_ROLE, TYPE_SERVICE, TYPE_STORAGE};
use crate::model::RunParams;
use crate::provisioner::{AppServiceSpec, Provisioner, StorageProps};

/// Container port every deployed service listens on.
const SERVICE_PORT: u16 = 8080;

/// Creation routine for one resource type.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Materializes `node` against the target environment.
    ///
    /// The handler may read handles and env vars recorded by the node's
    /// predecessors and records its own handle under `node.id`.
    async fn materialize(
        &self,
        env: &dyn Provisioner,
        node: &GraphNode,
        params: &RunParams,
        ctx: &mut ExecutionContext,
    ) -> Result<()>;
}

/// Maps resource type tags to handlers.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with every built-in handler registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TYPE_STORAGE, Arc::new(StorageHandler));
        registry.register(TYPE_ECR_REPO, Arc::new(EcrRepoHandler));
        registry.register(TYPE_ROLE, Arc::new(ExecutionRoleHandler));
        registry.register(TYPE_SERVICE, Arc::new(AppServiceHandler));
        registry
    }

    pub fn register(&mut self, node_type: impl Into<String>, handler: Arc<dyn ResourceHandler>) {
        self.handlers.insert(node_type.into(), handler);
    }

    pub fn get(&self, node_type: &str) -> Option<&Arc<dyn ResourceHandler>> {
        self.handlers.get(node_type)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// `{name}-{6 char suffix}`, so repeated deployments of the same
/// template never collide on globally unique resource names.
fn unique_resource_name(name: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", name, &uuid[..6])
}

/// Provisions one object-storage bucket.
pub struct StorageHandler;

#[async_trait]
impl ResourceHandler for StorageHandler {
    async fn materialize(
        &self,
        env: &dyn Provisioner,
        node: &GraphNode,
        _params: &RunParams,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        // Validation happens before any backend call.
        let props = StorageProps::from_properties(&node.properties)?;
        let bucket_name = unique_resource_name(&node.id);

        info!(node = %node.id, bucket = %bucket_name, "creating storage bucket");
        let handle = env.create_bucket(&bucket_name, &props).await?;
        debug!(node = %node.id, address = %handle.address, "bucket created");

        ctx.set_env("BUCKET_ARN", handle.address.clone());
        ctx.record_result(node.id.clone(), handle);
        Ok(())
    }
}

/// Resolves the existing image repository named by the run parameters.
pub struct EcrRepoHandler;

#[async_trait]
impl ResourceHandler for EcrRepoHandler {
    async fn materialize(
        &self,
        env: &dyn Provisioner,
        node: &GraphNode,
        params: &RunParams,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        info!(repository = %params.image_repo, "resolving image repository");
        let handle = env.resolve_image_repo(&params.image_repo).await?;
        ctx.record_result(node.id.clone(), handle);
        Ok(())
    }
}

/// Provisions the execution role the service pulls images with.
pub struct ExecutionRoleHandler;

#[async_trait]
impl ResourceHandler for ExecutionRoleHandler {
    async fn materialize(
        &self,
        env: &dyn Provisioner,
        node: &GraphNode,
        params: &RunParams,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        info!(service = %params.service_name, "creating execution role");
        let handle = env.create_service_role(&params.service_name).await?;
        ctx.record_result(node.id.clone(), handle);
        Ok(())
    }
}

/// Terminal node: provisions the managed compute service from the
/// accumulated handles and environment variables.
pub struct AppServiceHandler;

#[async_trait]
impl ResourceHandler for AppServiceHandler {
    async fn materialize(
        &self,
        env: &dyn Provisioner,
        node: &GraphNode,
        params: &RunParams,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        let repo = ctx.require_result(NODE_ECR_REPO)?;
        let repository_uri: String = repo.require_attribute(NODE_ECR_REPO, "repository_uri")?;
        let role = ctx.require_result(NODE_ROLE)?;

        let spec = AppServiceSpec {
            service_name: params.service_name.clone(),
            image_identifier: format!("{}:{}", repository_uri, params.image_tag),
            access_role_arn: role.address.clone(),
            port: SERVICE_PORT,
            auto_deployments: true,
            env_vars: ctx.env_vars().clone(),
        };

        info!(service = %spec.service_name, image = %spec.image_identifier, "creating managed service");
        let handle = env.create_app_service(&spec).await?;
        ctx.record_result(node.id.clone(), handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_resource_name_format() {
        let name = unique_resource_name("assets");
        assert!(name.starts_with("assets-"));
        let suffix = name.strip_prefix("assets-").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unique_resource_name_varies() {
        assert_ne!(unique_resource_name("assets"), unique_resource_name("assets"));
    }

    #[test]
    fn test_builtin_registry_covers_all_node_types() {
        let registry = HandlerRegistry::with_builtins();
        for node_type in [TYPE_STORAGE, TYPE_ECR_REPO, TYPE_ROLE, TYPE_SERVICE] {
            assert!(registry.get(node_type).is_some(), "missing handler for {node_type}");
        }
        assert!(registry.get("queue").is_none());
    }
}
