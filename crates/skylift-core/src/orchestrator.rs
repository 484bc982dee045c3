//! Stack orchestrator.
//!
//! Thin composition layer: resolves the requested template, builds the
//! dependency graph, runs the executor against the provisioner, and
//! surfaces the managed service's outputs. Destroy is delegated
//! wholesale to the backend: there is no tracked record of what a past
//! deploy created, so teardown relies on the backend's own
//! dependency-aware cleanup.

use tracing::info;

use skylift_templates::TemplateCatalog;

use crate::context::ExecutionContext;
use crate::error::{RunPhase, StackError, StackFailure};
use crate::executor::TopologicalExecutor;
use crate::graph::{DependencyGraph, NODE_SERVICE};
use crate::handlers::HandlerRegistry;
use crate::model::{RunParams, ServiceOutputs, StackOutcome, WorkloadAction, WorkloadRequest};
use crate::provisioner::Provisioner;

pub struct StackOrchestrator<P> {
    provisioner: P,
    registry: HandlerRegistry,
}

impl<P: Provisioner> StackOrchestrator<P> {
    /// Orchestrator with the built-in handler set.
    pub fn new(provisioner: P) -> Self {
        Self {
            provisioner,
            registry: HandlerRegistry::with_builtins(),
        }
    }

    /// Orchestrator with a caller-assembled registry, the extension
    /// point for new resource types.
    pub fn with_registry(provisioner: P, registry: HandlerRegistry) -> Self {
        Self {
            provisioner,
            registry,
        }
    }

    /// Runs one deploy or destroy request.
    pub async fn run(
        &self,
        request: &WorkloadRequest,
        catalog: &TemplateCatalog,
    ) -> std::result::Result<StackOutcome, StackFailure> {
        match request.action {
            WorkloadAction::Deploy => self.deploy(request, catalog).await,
            WorkloadAction::Destroy => {
                let service_name = request.service_name.clone().ok_or_else(|| {
                    StackFailure::new(
                        "<unknown>",
                        RunPhase::Build,
                        StackError::MissingField("service_name".to_string()),
                    )
                })?;
                self.destroy(&service_name).await?;
                Ok(StackOutcome::Destroyed { service_name })
            }
        }
    }

    async fn deploy(
        &self,
        request: &WorkloadRequest,
        catalog: &TemplateCatalog,
    ) -> std::result::Result<StackOutcome, StackFailure> {
        let service_name = request
            .resolved_service_name()
            .map_err(|e| StackFailure::new("<unknown>", RunPhase::Build, e))?;
        let build_failure =
            |e: StackError| StackFailure::new(service_name.clone(), RunPhase::Build, e);

        let template_name = request
            .template_name
            .as_deref()
            .ok_or_else(|| build_failure(StackError::MissingField("template_name".to_string())))?;
        let template = catalog
            .get(template_name)
            .map_err(|e| build_failure(e.into()))?;

        for input in &template.required_inputs {
            if !request.provides(input) {
                return Err(build_failure(StackError::MissingInput {
                    template: template.template_name.clone(),
                    input: input.clone(),
                }));
            }
        }

        let params = RunParams {
            image_repo: request
                .image_repo
                .clone()
                .ok_or_else(|| build_failure(StackError::MissingField("image_repo".to_string())))?,
            image_tag: request
                .image_tag
                .clone()
                .ok_or_else(|| build_failure(StackError::MissingField("image_tag".to_string())))?,
            service_name: service_name.clone(),
        };

        let graph = DependencyGraph::from_resources(&request.resources).map_err(&build_failure)?;
        info!(
            service = %service_name,
            template = %template.template_name,
            nodes = graph.nodes.len(),
            "deploying stack"
        );

        let mut ctx = ExecutionContext::new();
        let executor = TopologicalExecutor::new(&self.registry);
        executor
            .run(&self.provisioner, &graph, &params, &mut ctx)
            .await
            .map_err(|e| StackFailure::new(service_name.clone(), phase_of(&e), e))?;

        let execute_failure =
            |e: StackError| StackFailure::new(service_name.clone(), RunPhase::Execute, e);
        let service = ctx.require_result(NODE_SERVICE).map_err(&execute_failure)?;
        let outputs = ServiceOutputs {
            service_name: service_name.clone(),
            service_url: service
                .require_attribute(NODE_SERVICE, "service_url")
                .map_err(&execute_failure)?,
            service_status: service
                .require_attribute(NODE_SERVICE, "status")
                .map_err(&execute_failure)?,
        };

        info!(service = %outputs.service_name, url = %outputs.service_url, "stack deployed");
        Ok(StackOutcome::Deployed(outputs))
    }

    /// Requests removal of the deployment registered under
    /// `service_name`. Auxiliary resources created by past deploys are
    /// not tracked and are left in place.
    pub async fn destroy(&self, service_name: &str) -> std::result::Result<(), StackFailure> {
        info!(service = %service_name, "destroying stack");
        self.provisioner
            .destroy_service(service_name)
            .await
            .map_err(|e| StackFailure::new(service_name, RunPhase::Execute, e))
    }
}

/// Failures from the executor split into the sort phase (cycle
/// detection) and the execute phase (everything past ordering).
fn phase_of(error: &StackError) -> RunPhase {
    match error {
        StackError::CyclicDependency(_) => RunPhase::Sort,
        _ => RunPhase::Execute,
    }
}
