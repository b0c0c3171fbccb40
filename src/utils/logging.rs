use tracing::Level;

/// Map a configured level name to a `tracing::Level`.
///
/// Accepts the usual names in any case plus `warning`; anything unknown
/// falls back to `INFO`.
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_lowercase().as_str() {
        "warning" => Level::WARN,
        other => other.parse().unwrap_or(Level::INFO),
    }
}

/// Install the global fmt subscriber at the configured level.
pub fn init(level: &str) {
    // try_init: tests and the binary may both get here
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .try_init();
}
