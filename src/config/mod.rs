mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{FilterSettings, LoggingSettings, ServerSettings, Settings};

/// Environment variable prefix, e.g. `EDGE_FILTER_FILTER__OUTPUT_ROUTE`.
pub const ENV_PREFIX: &str = "EDGE_FILTER";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server, filter and logging configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();
    let server = partial.server;
    let filter = partial.filter;
    let logging = partial.logging;

    Ok(Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        filter: FilterSettings {
            input_route: filter
                .as_ref()
                .and_then(|f| f.input_route.clone())
                .unwrap_or(default.filter.input_route),
            output_route: filter
                .as_ref()
                .and_then(|f| f.output_route.clone())
                .unwrap_or(default.filter.output_route),
            temperature_threshold: filter
                .as_ref()
                .and_then(|f| f.temperature_threshold)
                .unwrap_or(default.filter.temperature_threshold),
            max_in_flight: filter
                .as_ref()
                .and_then(|f| f.max_in_flight)
                .unwrap_or(default.filter.max_in_flight)
                .max(1),
        },
        logging: LoggingSettings {
            level: logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logging.level),
        },
    })
}
