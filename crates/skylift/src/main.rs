mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skylift")]
#[command(about = "Deploy containerized workloads to AWS App Runner from declarative templates", long_about = None)]
struct Cli {
    /// Directory containing workload template definitions
    #[arg(
        long,
        env = "SKYLIFT_TEMPLATES_DIR",
        default_value = "workload-templates",
        global = true
    )]
    templates_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a workload from a template
    Deploy {
        /// Template name
        #[arg(short, long)]
        template: String,
        /// ECR repository holding the container image
        #[arg(long)]
        image_repo: String,
        /// Image tag to deploy
        #[arg(long)]
        image_tag: String,
        /// Service name (defaults to {image_repo}-{image_tag})
        #[arg(short, long)]
        service_name: Option<String>,
        /// Auxiliary resources as inline JSON, e.g.
        /// '[{"type":"storage","name":"assets","properties":{}}]'
        #[arg(short, long)]
        resources: Option<String>,
    },
    /// Destroy a deployed workload
    Destroy {
        /// Service name of the deployment to remove
        #[arg(short, long)]
        service_name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List available workload templates
    Templates {
        /// Show inputs and outputs for each template
        #[arg(short, long)]
        long: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Deploy {
            template,
            image_repo,
            image_tag,
            service_name,
            resources,
        } => {
            commands::deploy::handle(
                &cli.templates_dir,
                template,
                image_repo,
                image_tag,
                service_name,
                resources,
            )
            .await
        }
        Commands::Destroy { service_name, yes } => {
            commands::destroy::handle(service_name, yes).await
        }
        Commands::Templates { long } => commands::templates::handle(&cli.templates_dir, long),
    }
}
