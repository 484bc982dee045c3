//! Stack error types

use thiserror::Error;

/// Errors raised while building, ordering or executing a stack
#[derive(Error, Debug)]
pub enum StackError {
    #[error("duplicate node id in dependency graph: {0}")]
    DuplicateNode(String),

    #[error("cyclic dependency among nodes: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    #[error("no handler registered for resource type '{0}'")]
    UnknownResourceType(String),

    #[error("unrecognized resource type in request: {0}")]
    UnknownSpecType(String),

    #[error("resource of type '{0}' requires a name")]
    MissingResourceName(String),

    #[error("unsupported storage property: {0}")]
    UnsupportedProperty(String),

    #[error("invalid value for storage property '{key}': expected {expected}")]
    InvalidPropertyValue { key: String, expected: String },

    #[error("missing request field: {0}")]
    MissingField(String),

    #[error("template '{template}' requires input '{input}'")]
    MissingInput { template: String, input: String },

    #[error("no handle recorded for node '{0}'")]
    MissingHandle(String),

    #[error("handle for '{id}' is missing attribute '{attribute}'")]
    MissingHandleAttribute { id: String, attribute: String },

    #[error("backend operation failed ({code}): {message}")]
    Backend { code: String, message: String },

    #[error("template error: {0}")]
    Template(#[from] skylift_templates::TemplateError),
}

impl StackError {
    /// Stable machine-readable kind, surfaced in failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            StackError::DuplicateNode(_) => "duplicate_node",
            StackError::CyclicDependency(_) => "cyclic_dependency",
            StackError::UnknownResourceType(_) => "unknown_resource_type",
            StackError::UnknownSpecType(_) => "unknown_spec_type",
            StackError::MissingResourceName(_) => "missing_resource_name",
            StackError::UnsupportedProperty(_) => "unsupported_property",
            StackError::InvalidPropertyValue { .. } => "invalid_property_value",
            StackError::MissingField(_) => "missing_field",
            StackError::MissingInput { .. } => "missing_input",
            StackError::MissingHandle(_) | StackError::MissingHandleAttribute { .. } => {
                "missing_handle"
            }
            StackError::Backend { .. } => "backend_operation",
            StackError::Template(_) => "template",
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;

/// Phase of a stack run, reported with every user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Request validation and graph construction
    Build,
    /// Topological ordering
    Sort,
    /// Handler execution against the backend
    Execute,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Build => write!(f, "build"),
            RunPhase::Sort => write!(f, "sort"),
            RunPhase::Execute => write!(f, "execute"),
        }
    }
}

/// A failed stack run, carrying the service name and the phase that failed.
#[derive(Error, Debug)]
#[error("stack '{service_name}' failed during {phase}: {source}")]
pub struct StackFailure {
    pub service_name: String,
    pub phase: RunPhase,
    #[source]
    pub source: StackError,
}

impl StackFailure {
    pub fn new(service_name: impl Into<String>, phase: RunPhase, source: StackError) -> Self {
        Self {
            service_name: service_name.into(),
            phase,
            source,
        }
    }
}
