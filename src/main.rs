use panel_sheets::app;
use panel_sheets::config::Config;

/// Main entry point for the dashboard backend
///
/// Reads configuration from the environment (spreadsheet id, tab names,
/// credentials path, cache duration, port) and runs the web server until
/// the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "proxying spreadsheet {} (agents tab {:?})",
        config.spreadsheet_id,
        config.agents_sheet
    );

    app::run(config).await
}
