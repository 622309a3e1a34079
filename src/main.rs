use clap::Parser;
use opsdesk::app::{handle_fatal_error, initialize_app, AppConfig};
use opsdesk::cli::{execute_command, Cli};
use tracing::debug;

#[tokio::main]
async fn main() {
    let Cli {
        verbose,
        config,
        command,
    } = Cli::parse();

    let result = async move {
        let app = AppConfig::new(verbose)?.with_config_path(config);
        let config = initialize_app(&app).await?;
        execute_command(command, config).await
    }
    .await;

    match result {
        Ok(()) => debug!("opsdesk finished"),
        Err(e) => handle_fatal_error(e, verbose),
    }
}
