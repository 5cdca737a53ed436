use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
#[cfg(feature = "clap")]
pub mod overrides;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use overrides::ReportOverrides;
pub use settings::Settings;

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tradebook";
/// Prefix of the environment overrides, e.g. `TRADEBOOK__REPORT__BUCKET=month`.
pub const ENV_PREFIX: &str = "TRADEBOOK";

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads `path` if given (it must exist), otherwise an optional `tradebook.toml`.
/// 2. Merges settings from `TRADEBOOK__*` environment variables.
///
/// Anything left unset keeps its default.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("report.dimensions")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    tracing::debug!(?settings, "Loaded settings.");
    settings.validate()
}

/// Parses settings from a TOML document, without consulting the environment.
pub fn settings_from_toml(toml: &str) -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize::<Settings>()?;
    settings.validate()
}
