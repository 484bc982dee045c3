use colored::Colorize;

use skylift_cloud_aws::AwsProvisioner;
use skylift_core::orchestrator::StackOrchestrator;

pub async fn handle(service_name: String, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!(
            "{}",
            format!(
                "Warning: this deletes the App Runner service '{service_name}'. \
                 Auxiliary resources created by past deploys are not removed."
            )
            .yellow()
        );
        println!("Re-run with --yes to proceed");
        return Ok(());
    }

    println!("{}", format!("Destroying '{service_name}'...").blue().bold());

    let provisioner = AwsProvisioner::from_env().await;
    let orchestrator = StackOrchestrator::new(provisioner);
    orchestrator.destroy(&service_name).await?;

    println!("{}", format!("✓ Service '{service_name}' destroyed").green());
    Ok(())
}
