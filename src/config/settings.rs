use serde::Deserialize;

use crate::filter::ThresholdConfig;

/// Top-level configuration settings for the application.
///
/// Includes settings for the hub server, the filter and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub filter: FilterSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the hub server.
///
/// Defines the host and port the WebSocket server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the filter.
///
/// `temperature_threshold` is only the starting value; desired-properties
/// updates replace it at runtime.
#[derive(Debug, Deserialize, Clone)]
pub struct FilterSettings {
    pub input_route: String,
    pub output_route: String,
    pub temperature_threshold: f64,
    pub max_in_flight: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub filter: Option<PartialFilterSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialFilterSettings {
    pub input_route: Option<String>,
    pub output_route: Option<String>,
    pub temperature_threshold: Option<f64>,
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            filter: FilterSettings {
                input_route: "input1".to_string(),
                output_route: "output1".to_string(),
                temperature_threshold: ThresholdConfig::DEFAULT,
                max_in_flight: 64,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Address the hub server binds to.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
