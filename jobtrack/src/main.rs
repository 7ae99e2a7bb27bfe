use anyhow::Result;
use clap::Parser;

use jobtrack::cli::Cli;
use jobtrack::{logging, App};
use jobtrack_auth::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (log_path, _log_guard) = logging::init_logging(cli.verbose)?;

    let settings = Settings::new().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("\nCreate a config.toml (or set JOBTRACK_CONFIG) with, for example:");
        eprintln!("\napi_url = \"http://localhost:8000/api\"");
        eprintln!("google_client_id = \"<your OAuth client id>\"");
        e
    })?;
    settings.validate().map_err(|e| {
        eprintln!("Configuration validation failed: {}", e);
        anyhow::anyhow!(e)
    })?;

    tracing::info!(log = %log_path.display(), api_url = %settings.api_url, "Starting jobtrack");

    let app = App::new(settings)?;
    app.run(cli.command).await
}
