//! Template catalog error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("unknown template: {0}")]
    NotFound(String),

    #[error("duplicate template name '{name}' in {file}")]
    DuplicateName { name: String, file: PathBuf },

    #[error("failed to parse template {file}: {source}")]
    Parse {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid template pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read template file: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
