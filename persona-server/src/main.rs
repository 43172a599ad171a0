use anyhow::Context;
use persona_server::{AppConfig, AppState, init_telemetry, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let state = AppState::from_config(&config).await?;

    run_server(config.server, state).await
}
