//! Desired-properties parsing
//!
//! The operator pushes configuration as an untyped JSON document. Only
//! `TemperatureThreshold` is read; every other key (including the `$version`
//! bookkeeping the hub may attach) is ignored.

use serde_json::Value;

use crate::utils::error::FilterError;

pub const TEMPERATURE_THRESHOLD_KEY: &str = "TemperatureThreshold";

/// Extract the threshold from a desired-properties document.
///
/// Returns `Ok(None)` when the key is absent or `null`, and a
/// `ConfigParse` error when the document is not an object or the value is
/// not a JSON number.
pub fn parse_threshold(desired: &Value) -> Result<Option<f64>, FilterError> {
    let Some(document) = desired.as_object() else {
        return Err(FilterError::ConfigParse {
            key: TEMPERATURE_THRESHOLD_KEY.to_string(),
            reason: format!("expected an object document, got {}", kind(desired)),
        });
    };

    match document.get(TEMPERATURE_THRESHOLD_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => {
            number
                .as_f64()
                .map(Some)
                .ok_or_else(|| FilterError::ConfigParse {
                    key: TEMPERATURE_THRESHOLD_KEY.to_string(),
                    reason: format!("{number} is not representable as a float"),
                })
        }
        Some(other) => Err(FilterError::ConfigParse {
            key: TEMPERATURE_THRESHOLD_KEY.to_string(),
            reason: format!("expected a number, got {}", kind(other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
