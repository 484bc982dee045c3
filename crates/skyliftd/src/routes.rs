//! HTTP routes.
//!
//! Thin glue over the orchestrator; response shapes mirror what the
//! deploy tooling around this service already consumes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use skylift_core::orchestrator::StackOrchestrator;
use skylift_core::{
    Provisioner, ResourceSpec, StackFailure, StackOutcome, WorkloadAction, WorkloadRequest,
};
use skylift_templates::TemplateCatalog;

pub struct AppState<P> {
    orchestrator: Arc<StackOrchestrator<P>>,
    catalog: Arc<TemplateCatalog>,
    /// Deploys are serialized so same-name requests cannot race the
    /// backend into conflicting-operation errors.
    deploy_lock: Arc<Mutex<()>>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            catalog: Arc::clone(&self.catalog),
            deploy_lock: Arc::clone(&self.deploy_lock),
        }
    }
}

impl<P: Provisioner> AppState<P> {
    pub fn new(provisioner: P, catalog: TemplateCatalog) -> Self {
        Self {
            orchestrator: Arc::new(StackOrchestrator::new(provisioner)),
            catalog: Arc::new(catalog),
            deploy_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router<P: Provisioner + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/deploy", post(deploy::<P>))
        .route("/destroy", post(destroy::<P>))
        .route("/workload-templates", get(list_templates::<P>))
        .with_state(state)
}

#[derive(Deserialize)]
struct DeployBody {
    template_name: String,
    image_repo: String,
    image_tag: String,
    #[serde(default)]
    service_name: Option<String>,
    #[serde(default)]
    resources: Vec<ResourceSpec>,
}

async fn deploy<P: Provisioner>(
    State(state): State<AppState<P>>,
    Json(body): Json<DeployBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let request = WorkloadRequest {
        action: WorkloadAction::Deploy,
        template_name: Some(body.template_name),
        service_name: body.service_name,
        image_repo: Some(body.image_repo),
        image_tag: Some(body.image_tag),
        resources: body.resources,
    };

    let _guard = state.deploy_lock.lock().await;
    match state.orchestrator.run(&request, &state.catalog).await {
        Ok(StackOutcome::Deployed(outputs)) => (
            StatusCode::OK,
            Json(json!({
                "request_status": "deployed",
                "service_name": outputs.service_name,
                "service_url": outputs.service_url,
                "service_status": outputs.service_status,
            })),
        ),
        Ok(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "request_status": "error",
                "error_kind": "internal",
                "error": "deploy produced an unexpected outcome",
            })),
        ),
        Err(failure) => failure_response("request_status", failure),
    }
}

#[derive(Deserialize)]
struct DestroyBody {
    service_name: String,
}

async fn destroy<P: Provisioner>(
    State(state): State<AppState<P>>,
    Json(body): Json<DestroyBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.orchestrator.destroy(&body.service_name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "destroyed",
                "service_name": body.service_name,
            })),
        ),
        Err(failure) => failure_response("status", failure),
    }
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    long: bool,
}

async fn list_templates<P: Provisioner>(
    State(state): State<AppState<P>>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    if query.long {
        Json(json!(state.catalog.templates()))
    } else {
        Json(json!(state.catalog.summaries()))
    }
}

fn failure_response(
    status_field: &str,
    failure: StackFailure,
) -> (StatusCode, Json<serde_json::Value>) {
    warn!(service = %failure.service_name, phase = %failure.phase, error = %failure.source, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            status_field: "error",
            "service_name": failure.service_name,
            "phase": failure.phase.to_string(),
            "error_kind": failure.source.kind(),
            "error": failure.source.to_string(),
        })),
    )
}
