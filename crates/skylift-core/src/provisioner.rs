//! Provisioner capability.
//!
//! The target environment the executor materializes resources into is an
//! opaque capability: the core only knows the narrow calls below and
//! never inspects the backend's internals. `skylift-cloud-aws` provides
//! the AWS implementation; tests substitute a recording mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, StackError};

/// Opaque handle to a materialized or resolved backend resource.
///
/// Exposes at minimum an address (ARN-equivalent); backends attach
/// further attributes (repository URI, service URL, status).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// ARN-equivalent address of the resource
    pub address: String,

    /// Backend-specific attributes
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceHandle {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Attribute value deserialized as `T`.
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Like [`attribute`](Self::attribute) but fails when the backend
    /// did not supply the attribute.
    pub fn require_attribute<T: serde::de::DeserializeOwned>(
        &self,
        id: &str,
        key: &str,
    ) -> Result<T> {
        self.attribute(key)
            .ok_or_else(|| StackError::MissingHandleAttribute {
                id: id.to_string(),
                attribute: key.to_string(),
            })
    }
}

/// Lifecycle applied to a storage bucket when its stack goes away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    Retain,
    #[default]
    Destroy,
}

impl std::fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalPolicy::Retain => write!(f, "retain"),
            RemovalPolicy::Destroy => write!(f, "destroy"),
        }
    }
}

/// Server-side encryption mode for a storage bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encryption {
    #[default]
    ProviderManaged,
    Kms,
}

/// Validated storage properties.
///
/// Only the keys below are accepted; anything else fails the run with
/// `UnsupportedProperty` before the backend is called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageProps {
    pub versioned: bool,
    pub removal_policy: RemovalPolicy,
    pub object_lock_enabled: bool,
    pub auto_delete_objects: bool,
    pub encryption: Encryption,
    pub public_read_access: bool,
}

impl StorageProps {
    /// Parses a raw property bag against the allow-list.
    pub fn from_properties(properties: &HashMap<String, serde_json::Value>) -> Result<Self> {
        let mut props = StorageProps::default();

        for (key, value) in properties {
            match key.as_str() {
                "versioned" => props.versioned = bool_prop(key, value)?,
                "object_lock_enabled" => props.object_lock_enabled = bool_prop(key, value)?,
                "auto_delete_objects" => props.auto_delete_objects = bool_prop(key, value)?,
                "public_read_access" => props.public_read_access = bool_prop(key, value)?,
                "removal_policy" => {
                    props.removal_policy = match value.as_str() {
                        Some("retain") => RemovalPolicy::Retain,
                        Some("destroy") => RemovalPolicy::Destroy,
                        _ => {
                            return Err(StackError::InvalidPropertyValue {
                                key: key.clone(),
                                expected: "\"retain\" or \"destroy\"".to_string(),
                            });
                        }
                    }
                }
                "encryption" => {
                    props.encryption = match value.as_str() {
                        Some("provider-managed") => Encryption::ProviderManaged,
                        Some("kms") => Encryption::Kms,
                        _ => {
                            return Err(StackError::InvalidPropertyValue {
                                key: key.clone(),
                                expected: "\"provider-managed\" or \"kms\"".to_string(),
                            });
                        }
                    }
                }
                other => return Err(StackError::UnsupportedProperty(other.to_string())),
            }
        }

        Ok(props)
    }
}

fn bool_prop(key: &str, value: &serde_json::Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| StackError::InvalidPropertyValue {
        key: key.to_string(),
        expected: "boolean".to_string(),
    })
}

/// Everything the backend needs to create the managed compute service.
#[derive(Debug, Clone)]
pub struct AppServiceSpec {
    pub service_name: String,
    /// Full image identifier, `{repository_uri}:{tag}`
    pub image_identifier: String,
    /// ARN of the role granting the service registry access
    pub access_role_arn: String,
    /// Container port the service listens on
    pub port: u16,
    /// Redeploy automatically when the image changes
    pub auto_deployments: bool,
    /// Runtime environment variables, deterministically ordered
    pub env_vars: BTreeMap<String, String>,
}

/// The target environment resources are created in.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Creates an object-storage bucket. The handle address is the
    /// bucket's ARN.
    async fn create_bucket(&self, name: &str, props: &StorageProps) -> Result<ResourceHandle>;

    /// Resolves (never creates) an existing image repository. The handle
    /// carries a `repository_uri` attribute.
    async fn resolve_image_repo(&self, repository_name: &str) -> Result<ResourceHandle>;

    /// Creates the execution role the managed service pulls images with.
    async fn create_service_role(&self, service_name: &str) -> Result<ResourceHandle>;

    /// Creates the managed compute service. The handle carries
    /// `service_url` and `status` attributes.
    async fn create_app_service(&self, spec: &AppServiceSpec) -> Result<ResourceHandle>;

    /// Tears down the managed service registered under `service_name`,
    /// delegating dependent-resource cleanup to the backend.
    async fn destroy_service(&self, service_name: &str) -> Result<()>;
}
