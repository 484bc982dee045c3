mod routes;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use routes::AppState;
use skylift_cloud_aws::AwsProvisioner;
use skylift_templates::TemplateCatalog;

#[derive(Parser)]
#[command(name = "skyliftd")]
#[command(about = "HTTP front end for Skylift workload deployments", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "SKYLIFTD_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Directory containing workload template definitions
    #[arg(
        long,
        env = "SKYLIFT_TEMPLATES_DIR",
        default_value = "workload-templates"
    )]
    templates_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let catalog = TemplateCatalog::load(&args.templates_dir)?;
    info!(templates = catalog.len(), dir = %args.templates_dir.display(), "catalog loaded");

    let provisioner = AwsProvisioner::from_env().await;
    let app = routes::router(AppState::new(provisioner, catalog));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(addr = %args.bind, "skyliftd listening");
    axum::serve(listener, app).await?;
    Ok(())
}
