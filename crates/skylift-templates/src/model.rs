//! Workload template data model

use serde::{Deserialize, Serialize};

/// One workload template, parsed from a YAML file in the templates
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadTemplate {
    /// Name the template is requested by
    pub template_name: String,

    /// One-line description
    #[serde(default)]
    pub description: Option<String>,

    /// Extended description shown in long listings
    #[serde(default)]
    pub long_description: String,

    /// Request fields a deploy of this template must provide
    #[serde(default)]
    pub required_inputs: Vec<String>,

    /// Request fields a deploy of this template may provide
    #[serde(default)]
    pub optional_inputs: Vec<String>,

    /// Names of the outputs a successful deploy surfaces
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl WorkloadTemplate {
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            template_name: self.template_name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Short listing entry for a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub template_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_minimal_yaml() {
        let template: WorkloadTemplate =
            serde_yaml::from_str("template_name: api_container\n").unwrap();
        assert_eq!(template.template_name, "api_container");
        assert!(template.description.is_none());
        assert!(template.required_inputs.is_empty());
    }

    #[test]
    fn test_template_full_yaml() {
        let yaml = r#"
template_name: api_container
description: Container API behind App Runner
long_description: |
  Deploys a container image from ECR to App Runner with optional
  auxiliary resources.
required_inputs:
  - image_repo
  - image_tag
optional_inputs:
  - service_name
  - resources
outputs:
  - service_url
  - service_status
"#;
        let template: WorkloadTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(template.required_inputs, vec!["image_repo", "image_tag"]);
        assert_eq!(template.outputs.len(), 2);
        assert!(template.long_description.contains("App Runner"));
    }
}
