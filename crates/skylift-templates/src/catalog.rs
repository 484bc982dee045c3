//! Template discovery and lookup.
//!
//! Templates live as individual YAML files in one directory; the catalog
//! loads them all up front and is consumed read-only afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TemplateError};
use crate::model::{TemplateSummary, WorkloadTemplate};

/// Read-only catalog of available workload templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, WorkloadTemplate>,
}

impl TemplateCatalog {
    /// Loads every `*.yaml` file in `dir`. Template names must be
    /// unique across the directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TemplateError::DirectoryNotFound(dir.to_path_buf()));
        }

        let pattern = dir.join("*.yaml");
        let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .collect::<std::result::Result<_, _>>()?;
        files.sort();

        let mut templates = HashMap::new();
        for file in files {
            let content = std::fs::read_to_string(&file)?;
            let template: WorkloadTemplate =
                serde_yaml::from_str(&content).map_err(|source| TemplateError::Parse {
                    file: file.clone(),
                    source,
                })?;

            debug!(template = %template.template_name, file = %file.display(), "loaded template");
            if templates.contains_key(&template.template_name) {
                return Err(TemplateError::DuplicateName {
                    name: template.template_name,
                    file,
                });
            }
            templates.insert(template.template_name.clone(), template);
        }

        info!(count = templates.len(), dir = %dir.display(), "template catalog loaded");
        Ok(Self { templates })
    }

    /// Template by name.
    pub fn get(&self, name: &str) -> Result<&WorkloadTemplate> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// All templates, sorted by name for stable listings.
    pub fn templates(&self) -> Vec<&WorkloadTemplate> {
        let mut all: Vec<&WorkloadTemplate> = self.templates.values().collect();
        all.sort_by(|a, b| a.template_name.cmp(&b.template_name));
        all
    }

    /// Short listing entries, sorted by name.
    pub fn summaries(&self) -> Vec<TemplateSummary> {
        self.templates().into_iter().map(|t| t.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
