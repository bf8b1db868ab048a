use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use tracing_appender::non_blocking::WorkerGuard;
pub use settings::{
    AnalysisConfig, Config, DEFAULT_WINDOW_DAYS, DataConfig, LogFormat, LoggingConfig, ServerConfig, SyntheticConfig,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `OIL__SERVER__PORT=8080` or `OIL__ANALYSIS__WINDOW_DAYS=14`.
pub const ENV_PREFIX: &str = "OIL";

/// Configuration file read by the binaries when no other path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Loads the application configuration.
///
/// Layers, lowest priority first: built-in defaults, the TOML file at `path`
/// (optional, silently skipped when absent) and `OIL__*` environment
/// variables. The merged result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("data.price_paths")
                .with_list_parse_key("data.event_paths")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
