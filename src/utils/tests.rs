use super::error::{DecodeError, FilterError, TransportError};
use super::logging;
use crate::transport::AckDecision;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
    logging::init("nonsense");
}

#[test]
fn parse_level_names() {
    use tracing::Level;
    assert_eq!(logging::parse_level("error"), Level::ERROR);
    assert_eq!(logging::parse_level("Warning"), Level::WARN);
    assert_eq!(logging::parse_level(" DEBUG "), Level::DEBUG);
    assert_eq!(logging::parse_level("trace"), Level::TRACE);
    assert_eq!(logging::parse_level("loud"), Level::INFO);
}

#[test]
fn test_decode_error_is_completed() {
    let err = FilterError::from(DecodeError::MissingTemperature);
    assert_eq!(err.ack(), AckDecision::Completed);

    let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let err = FilterError::from(DecodeError::from(json_err));
    assert_eq!(err.ack(), AckDecision::Completed);
}

#[test]
fn test_publish_and_unexpected_errors_are_abandoned() {
    let err = FilterError::from(TransportError::Closed {
        route: "output1".to_string(),
    });
    assert_eq!(err.ack(), AckDecision::Abandoned);
    assert_eq!(
        err.to_string(),
        "publish failed: output route 'output1' is closed"
    );

    let err = FilterError::Unexpected("handler panicked".to_string());
    assert_eq!(err.ack(), AckDecision::Abandoned);
}
