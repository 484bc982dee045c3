//! End-to-end orchestration tests against a recording provisioner.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use skylift_core::orchestrator::StackOrchestrator;
use skylift_core::{
    AppServiceSpec, DependencyGraph, ExecutionContext, HandlerRegistry, Provisioner,
    ResourceHandle, ResourceSpec, Result, RunParams, RunPhase, StackError, StackOutcome,
    StorageProps, TopologicalExecutor, WorkloadAction, WorkloadRequest,
};
use skylift_templates::TemplateCatalog;

/// Provisioner that records every call and returns plausible handles.
#[derive(Default)]
struct RecordingProvisioner {
    calls: Mutex<Vec<String>>,
    service_specs: Mutex<Vec<AppServiceSpec>>,
    fail_on: Option<&'static str>,
}

impl RecordingProvisioner {
    fn failing_on(call: &'static str) -> Self {
        Self {
            fail_on: Some(call),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) -> Result<()> {
        let call = call.into();
        let kind = call.split(':').next().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(kind.as_str()) {
            return Err(StackError::Backend {
                code: "InternalFailure".to_string(),
                message: format!("injected failure in {kind}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    async fn create_bucket(&self, name: &str, _props: &StorageProps) -> Result<ResourceHandle> {
        self.record(format!("create_bucket:{name}"))?;
        Ok(ResourceHandle::new(format!("arn:aws:s3:::{name}"))
            .with_attribute("bucket_name", json!(name)))
    }

    async fn resolve_image_repo(&self, repository_name: &str) -> Result<ResourceHandle> {
        self.record(format!("resolve_image_repo:{repository_name}"))?;
        Ok(ResourceHandle::new(format!(
            "arn:aws:ecr:us-east-1:123456789012:repository/{repository_name}"
        ))
        .with_attribute(
            "repository_uri",
            json!(format!(
                "123456789012.dkr.ecr.us-east-1.amazonaws.com/{repository_name}"
            )),
        ))
    }

    async fn create_service_role(&self, service_name: &str) -> Result<ResourceHandle> {
        self.record(format!("create_service_role:{service_name}"))?;
        Ok(ResourceHandle::new(format!(
            "arn:aws:iam::123456789012:role/{service_name}-apprunner-ecr-access"
        )))
    }

    async fn create_app_service(&self, spec: &AppServiceSpec) -> Result<ResourceHandle> {
        self.record(format!("create_app_service:{}", spec.service_name))?;
        self.service_specs.lock().unwrap().push(spec.clone());
        Ok(ResourceHandle::new(format!(
            "arn:aws:apprunner:us-east-1:123456789012:service/{}",
            spec.service_name
        ))
        .with_attribute("service_url", json!(format!("https://{}.awsapprunner.com", spec.service_name)))
        .with_attribute("status", json!("RUNNING")))
    }

    async fn destroy_service(&self, service_name: &str) -> Result<()> {
        self.record(format!("destroy_service:{service_name}"))?;
        Ok(())
    }
}

fn write_api_template(dir: &Path) {
    std::fs::write(
        dir.join("api_container.yaml"),
        "template_name: api_container\n\
         description: Container API behind App Runner\n\
         required_inputs:\n  - image_repo\n  - image_tag\n\
         optional_inputs:\n  - service_name\n  - resources\n\
         outputs:\n  - service_url\n  - service_status\n",
    )
    .unwrap();
}

fn catalog() -> TemplateCatalog {
    let dir = tempfile::tempdir().unwrap();
    write_api_template(dir.path());
    TemplateCatalog::load(dir.path()).unwrap()
}

fn deploy_request(resources: Vec<ResourceSpec>) -> WorkloadRequest {
    WorkloadRequest {
        action: WorkloadAction::Deploy,
        template_name: Some("api_container".to_string()),
        service_name: Some("svc-a".to_string()),
        image_repo: Some("r".to_string()),
        image_tag: Some("1.0".to_string()),
        resources,
    }
}

fn storage_spec(name: &str, properties: HashMap<String, serde_json::Value>) -> ResourceSpec {
    ResourceSpec {
        resource_type: "storage".to_string(),
        name: Some(name.to_string()),
        properties,
    }
}

#[tokio::test]
async fn test_deploy_end_to_end() {
    let orchestrator = StackOrchestrator::new(RecordingProvisioner::default());
    let request = deploy_request(vec![storage_spec("assets", HashMap::new())]);

    let outcome = orchestrator.run(&request, &catalog()).await.unwrap();
    let StackOutcome::Deployed(outputs) = outcome else {
        panic!("expected a deployed outcome");
    };

    assert_eq!(outputs.service_name, "svc-a");
    assert_eq!(outputs.service_url, "https://svc-a.awsapprunner.com");
    assert_eq!(outputs.service_status, "RUNNING");
}

#[tokio::test]
async fn test_deploy_call_order_and_context() {
    let request = deploy_request(vec![storage_spec("assets", HashMap::new())]);

    // Run through the executor directly so the context is observable.
    let graph = DependencyGraph::from_resources(&request.resources).unwrap();
    let params = RunParams {
        image_repo: "r".to_string(),
        image_tag: "1.0".to_string(),
        service_name: "svc-a".to_string(),
    };
    let registry = HandlerRegistry::with_builtins();
    let executor = TopologicalExecutor::new(&registry);
    let provisioner = RecordingProvisioner::default();
    let mut ctx = ExecutionContext::new();
    executor
        .run(&provisioner, &graph, &params, &mut ctx)
        .await
        .unwrap();

    // The service is created last, after every other node.
    let calls = provisioner.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].starts_with("create_bucket:assets-"));
    assert_eq!(calls[1], "resolve_image_repo:r");
    assert_eq!(calls[2], "create_service_role:svc-a");
    assert_eq!(calls[3], "create_app_service:svc-a");

    // Results are populated for all four nodes, env vars accumulated.
    for id in ["assets", "ecr_repo", "apprunner_role", "apprunner_service"] {
        assert!(ctx.result(id).is_some(), "missing result for {id}");
    }
    let bucket_arn = ctx.env("BUCKET_ARN").unwrap();
    assert!(bucket_arn.starts_with("arn:aws:s3:::assets-"));

    // The terminal handler saw every predecessor's output.
    let specs = provisioner.service_specs.lock().unwrap();
    let spec = specs.first().unwrap();
    assert_eq!(
        spec.image_identifier,
        "123456789012.dkr.ecr.us-east-1.amazonaws.com/r:1.0"
    );
    assert_eq!(
        spec.access_role_arn,
        "arn:aws:iam::123456789012:role/svc-a-apprunner-ecr-access"
    );
    assert_eq!(spec.env_vars.get("BUCKET_ARN"), Some(&bucket_arn.to_string()));
    assert_eq!(spec.port, 8080);
    assert!(spec.auto_deployments);
}

#[tokio::test]
async fn test_unsupported_property_fails_before_backend() {
    let provisioner = RecordingProvisioner::default();
    let registry = HandlerRegistry::with_builtins();
    let executor = TopologicalExecutor::new(&registry);

    let mut properties = HashMap::new();
    properties.insert("versioned".to_string(), json!(true));
    properties.insert("nope".to_string(), json!(1));
    let graph =
        DependencyGraph::from_resources(&[storage_spec("assets", properties)]).unwrap();
    let params = RunParams {
        image_repo: "r".to_string(),
        image_tag: "1.0".to_string(),
        service_name: "svc-a".to_string(),
    };

    let mut ctx = ExecutionContext::new();
    let err = executor
        .run(&provisioner, &graph, &params, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, StackError::UnsupportedProperty(key) if key == "nope"));
    assert!(provisioner.calls().is_empty(), "no backend call may happen");
}

#[tokio::test]
async fn test_backend_failure_aborts_sequence() {
    let provisioner = RecordingProvisioner::failing_on("create_service_role");
    let orchestrator = StackOrchestrator::new(provisioner);
    let request = deploy_request(Vec::new());

    let failure = orchestrator.run(&request, &catalog()).await.unwrap_err();
    assert_eq!(failure.service_name, "svc-a");
    assert_eq!(failure.phase, RunPhase::Execute);
    assert!(matches!(failure.source, StackError::Backend { .. }));
}

#[tokio::test]
async fn test_unregistered_type_fails_at_execute() {
    let provisioner = RecordingProvisioner::default();
    let registry = HandlerRegistry::new();
    let executor = TopologicalExecutor::new(&registry);
    let graph = DependencyGraph::from_resources(&[]).unwrap();
    let params = RunParams {
        image_repo: "r".to_string(),
        image_tag: "1.0".to_string(),
        service_name: "svc-a".to_string(),
    };

    let mut ctx = ExecutionContext::new();
    let err = executor
        .run(&provisioner, &graph, &params, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, StackError::UnknownResourceType(t) if t == "ecr-repo"));
    assert!(provisioner.calls().is_empty());
}

#[tokio::test]
async fn test_missing_required_input() {
    let orchestrator = StackOrchestrator::new(RecordingProvisioner::default());
    let mut request = deploy_request(Vec::new());
    request.image_tag = None;

    let failure = orchestrator.run(&request, &catalog()).await.unwrap_err();
    assert_eq!(failure.phase, RunPhase::Build);
    assert!(matches!(
        failure.source,
        StackError::MissingInput { input, .. } if input == "image_tag"
    ));
}

#[tokio::test]
async fn test_unknown_template() {
    let orchestrator = StackOrchestrator::new(RecordingProvisioner::default());
    let mut request = deploy_request(Vec::new());
    request.template_name = Some("nope".to_string());

    let failure = orchestrator.run(&request, &catalog()).await.unwrap_err();
    assert_eq!(failure.phase, RunPhase::Build);
    assert!(matches!(failure.source, StackError::Template(_)));
}

#[tokio::test]
async fn test_destroy_delegates_to_backend() {
    let provisioner = RecordingProvisioner::default();
    let orchestrator = StackOrchestrator::new(provisioner);
    let request = WorkloadRequest {
        action: WorkloadAction::Destroy,
        template_name: None,
        service_name: Some("svc-a".to_string()),
        image_repo: None,
        image_tag: None,
        resources: Vec::new(),
    };

    let outcome = orchestrator.run(&request, &catalog()).await.unwrap();
    assert!(matches!(
        outcome,
        StackOutcome::Destroyed { service_name } if service_name == "svc-a"
    ));
}

#[tokio::test]
async fn test_destroy_requires_service_name() {
    let orchestrator = StackOrchestrator::new(RecordingProvisioner::default());
    let request = WorkloadRequest {
        action: WorkloadAction::Destroy,
        template_name: None,
        service_name: None,
        image_repo: None,
        image_tag: None,
        resources: Vec::new(),
    };

    let failure = orchestrator.run(&request, &catalog()).await.unwrap_err();
    assert!(matches!(failure.source, StackError::MissingField(f) if f == "service_name"));
}
