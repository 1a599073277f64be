// Configuration loading
// Layers: built-in defaults <- TOML file <- IMOBILE_* environment
use config::{Config, Environment, File};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

use imobile_core::{AppError, ClientConfig, Result};

pub const ENV_PREFIX: &str = "IMOBILE";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Per-user config file, e.g. `~/.config/imobile/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "imobile").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load client configuration.
///
/// An explicit `path` must exist; the per-user default file is optional.
/// Environment keys use `__` for nesting: `IMOBILE_TOOLS__SYSLOG=/opt/bin/idevicesyslog`.
///
/// # Errors
/// - AppError::Config if a source cannot be read or does not fit the schema
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    load_config_from(path, None)
}

fn load_config_from(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<ClientConfig> {
    let mut builder = Config::builder();

    let file = match path {
        Some(p) => Some((p.to_path_buf(), true)),
        None => default_config_path().map(|p| (p, false)),
    };
    if let Some((file, required)) = file {
        debug!(path = %file.display(), required = required, "Config file source");
        builder = builder.add_source(File::from(file).required(required));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let config = builder
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?
        .try_deserialize::<ClientConfig>()
        .map_err(|e| AppError::Config(e.to_string()))?;

    // Surface bad bounds at load time rather than on first call
    config.run_options()?;
    Ok(config)
}
