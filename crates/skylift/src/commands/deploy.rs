use anyhow::Context;
use colored::Colorize;
use std::path::Path;

use skylift_cloud_aws::AwsProvisioner;
use skylift_core::orchestrator::StackOrchestrator;
use skylift_core::{ResourceSpec, StackOutcome, WorkloadAction, WorkloadRequest};
use skylift_templates::TemplateCatalog;

pub async fn handle(
    templates_dir: &Path,
    template: String,
    image_repo: String,
    image_tag: String,
    service_name: Option<String>,
    resources: Option<String>,
) -> anyhow::Result<()> {
    let catalog = TemplateCatalog::load(templates_dir)
        .with_context(|| format!("loading templates from {}", templates_dir.display()))?;
    // Resolve the template before touching AWS so typos fail fast.
    catalog.get(&template)?;

    let resources: Vec<ResourceSpec> = match resources {
        Some(json) => serde_json::from_str(&json).context("invalid --resources JSON")?,
        None => Vec::new(),
    };

    let request = WorkloadRequest {
        action: WorkloadAction::Deploy,
        template_name: Some(template),
        service_name,
        image_repo: Some(image_repo),
        image_tag: Some(image_tag),
        resources,
    };

    println!("{}", "Deploying workload...".blue().bold());
    println!(
        "Template: {}",
        request.template_name.as_deref().unwrap_or_default().cyan()
    );
    println!(
        "Service:  {}",
        request.resolved_service_name().unwrap_or_default().cyan()
    );
    if !request.resources.is_empty() {
        println!("Resources ({}):", request.resources.len());
        for resource in &request.resources {
            println!(
                "  • {} ({})",
                resource.name.as_deref().unwrap_or("<unnamed>").cyan(),
                resource.resource_type
            );
        }
    }

    let provisioner = AwsProvisioner::from_env().await;
    let orchestrator = StackOrchestrator::new(provisioner);
    let outcome = orchestrator.run(&request, &catalog).await?;

    let StackOutcome::Deployed(outputs) = outcome else {
        anyhow::bail!("deploy produced an unexpected outcome");
    };

    println!();
    println!("{}", "✓ Deployment complete".green().bold());
    println!("  Service: {}", outputs.service_name.cyan());
    println!("  URL:     {}", outputs.service_url);
    println!("  Status:  {}", outputs.service_status);
    Ok(())
}
