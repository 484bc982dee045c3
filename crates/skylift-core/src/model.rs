//! Request and resource models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, StackError};

/// One declared auxiliary resource in a deploy request.
///
/// Immutable once parsed. `name` is required for types with a
/// user-addressable identity (storage); backbone resources are never
/// declared by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource type tag (e.g. "storage")
    #[serde(rename = "type")]
    pub resource_type: String,

    /// User-chosen resource name, unique within the request
    #[serde(default)]
    pub name: Option<String>,

    /// Type-specific property bag
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

/// Requested stack operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadAction {
    Deploy,
    Destroy,
}

/// A deploy/destroy request for one named workload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadRequest {
    pub action: WorkloadAction,

    #[serde(default)]
    pub template_name: Option<String>,

    #[serde(default)]
    pub service_name: Option<String>,

    #[serde(default)]
    pub image_repo: Option<String>,

    #[serde(default)]
    pub image_tag: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

impl WorkloadRequest {
    /// Service name for this request. Falls back to
    /// `{image_repo}-{image_tag}` (dots replaced with dashes) when the
    /// caller did not pick one.
    pub fn resolved_service_name(&self) -> Result<String> {
        if let Some(name) = &self.service_name {
            return Ok(name.clone());
        }
        let repo = self
            .image_repo
            .as_deref()
            .ok_or_else(|| StackError::MissingField("service_name".to_string()))?;
        let tag = self
            .image_tag
            .as_deref()
            .ok_or_else(|| StackError::MissingField("service_name".to_string()))?;
        Ok(format!("{}-{}", repo, tag.replace('.', "-")))
    }

    /// Whether the request carries a value for a template input field.
    /// Unknown field names are reported as not provided.
    pub fn provides(&self, input: &str) -> bool {
        match input {
            "template_name" => self.template_name.is_some(),
            "service_name" => self.service_name.is_some(),
            "image_repo" => self.image_repo.is_some(),
            "image_tag" => self.image_tag.is_some(),
            "resources" => !self.resources.is_empty(),
            _ => false,
        }
    }
}

/// Caller-supplied run parameters, forwarded opaquely to handlers.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub image_repo: String,
    pub image_tag: String,
    pub service_name: String,
}

/// Outputs of a successful deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOutputs {
    pub service_name: String,
    pub service_url: String,
    pub service_status: String,
}

/// Result of one orchestrated stack run.
#[derive(Debug, Clone)]
pub enum StackOutcome {
    Deployed(ServiceOutputs),
    Destroyed { service_name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_defaults_from_image() {
        let request = WorkloadRequest {
            action: WorkloadAction::Deploy,
            template_name: Some("api_container".to_string()),
            service_name: None,
            image_repo: Some("orders-api".to_string()),
            image_tag: Some("1.2.0".to_string()),
            resources: Vec::new(),
        };
        assert_eq!(request.resolved_service_name().unwrap(), "orders-api-1-2-0");
    }

    #[test]
    fn test_explicit_service_name_wins() {
        let request = WorkloadRequest {
            action: WorkloadAction::Deploy,
            template_name: None,
            service_name: Some("svc-a".to_string()),
            image_repo: Some("r".to_string()),
            image_tag: Some("1.0".to_string()),
            resources: Vec::new(),
        };
        assert_eq!(request.resolved_service_name().unwrap(), "svc-a");
    }

    #[test]
    fn test_resource_spec_wire_format() {
        let spec: ResourceSpec = serde_json::from_value(serde_json::json!({
            "type": "storage",
            "name": "assets",
            "properties": {"versioned": true}
        }))
        .unwrap();
        assert_eq!(spec.resource_type, "storage");
        assert_eq!(spec.name.as_deref(), Some("assets"));
        assert_eq!(spec.properties["versioned"], serde_json::json!(true));
    }
}
