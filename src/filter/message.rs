//! Message definitions for the filter
//!
//! `Message` is what the transport hands to the filter and what the filter
//! publishes back: an opaque byte payload plus string properties with unique
//! keys. A received message is never mutated; forwarding builds a new one.
//!
//! `MessageBody` is the decoded telemetry document. Only
//! `machine.temperature` drives filtering; the other fields are optional and
//! unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::error::DecodeError;

/// Property key added to forwarded messages.
pub const MESSAGE_TYPE_PROPERTY: &str = "MessageType";

/// Value of [`MESSAGE_TYPE_PROPERTY`] on forwarded messages.
pub const ALERT_MESSAGE_TYPE: &str = "Alert";

pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    payload: Vec<u8>,
    properties: Properties,
}

impl Message {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_properties(payload: impl Into<Vec<u8>>, properties: Properties) -> Self {
        Self {
            payload: payload.into(),
            properties,
        }
    }

    /// Builder-style property insertion, replacing any existing value.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Build the alert copy of this message: same payload, every property
    /// copied, and `MessageType=Alert` added.
    ///
    /// If the original already carried a different `MessageType`, the alert
    /// value wins and the displaced value is returned so the caller can
    /// report it.
    pub fn to_alert(&self) -> (Message, Option<String>) {
        let mut properties = self.properties.clone();
        let displaced =
            properties.insert(MESSAGE_TYPE_PROPERTY.to_string(), ALERT_MESSAGE_TYPE.to_string());
        let alert = Message {
            payload: self.payload.clone(),
            properties,
        };
        (alert, displaced.filter(|previous| previous != ALERT_MESSAGE_TYPE))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub machine: Machine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient: Option<Ambient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ambient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

impl MessageBody {
    /// Decode a payload as UTF-8 JSON telemetry.
    ///
    /// A document without `machine.temperature` is reported as
    /// `MissingTemperature` rather than a generic parse error.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        let value: serde_json::Value = serde_json::from_str(text)?;

        let has_temperature = value
            .get("machine")
            .and_then(|machine| machine.get("temperature"))
            .is_some_and(|temperature| !temperature.is_null());
        if !has_temperature {
            return Err(DecodeError::MissingTemperature);
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
