use anyhow::Context;
use std::path::Path;

// Entry point for `cargo run -p web-server`. Reads `config.toml` from the
// working directory and serves the API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = configuration::load_config(Path::new(configuration::DEFAULT_CONFIG_PATH))
        .context("Failed to load configuration")?;
    let _log_guard = configuration::init_tracing(&config.logging).context("Failed to initialize logging")?;

    web_server::run_server(config).await
}
