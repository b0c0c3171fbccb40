//! Filter engine
//!
//! This module contains the per-message filtering protocol:
//! - decode the payload as a telemetry document
//! - compare `machine.temperature` against the live threshold (strict `>`)
//! - publish an alert copy of qualifying messages on the output route
//! - report exactly one acknowledgment per message
//!
//! Concurrency and usage notes:
//! - `FilterEngine` is shared as `Arc<FilterEngine>` and every method takes
//!   `&self`; any number of messages may be in flight at once, alongside
//!   desired-properties updates.
//! - The threshold is read once per message. An update that lands after that
//!   read does not affect the message already being evaluated.
//! - The processing counter is diagnostic only and has no ordering meaning.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::filter::desired::parse_threshold;
use crate::filter::message::{MESSAGE_TYPE_PROPERTY, Message, MessageBody};
use crate::filter::threshold::ThresholdConfig;
use crate::transport::{AckDecision, ConfigHandler, InputHandler, OutputPublisher};
use crate::utils::error::FilterError;

/// What happened to a message that was processed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Temperature exceeded the threshold and an alert was published.
    Forwarded,
    /// Temperature was at or below the threshold.
    Suppressed,
}

/// Strict, tolerance-free threshold test. NaN on either side never forwards.
pub fn exceeds_threshold(temperature: f64, threshold: f64) -> bool {
    temperature > threshold
}

pub struct FilterEngine {
    threshold: Arc<ThresholdConfig>,
    publisher: Arc<dyn OutputPublisher>,
    output_route: String,
    counter: AtomicU64,
}

impl FilterEngine {
    pub fn new(
        threshold: Arc<ThresholdConfig>,
        publisher: Arc<dyn OutputPublisher>,
        output_route: &str,
    ) -> Self {
        Self {
            threshold,
            publisher,
            output_route: output_route.to_string(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> &Arc<ThresholdConfig> {
        &self.threshold
    }

    pub fn output_route(&self) -> &str {
        &self.output_route
    }

    /// Number of messages received so far.
    pub fn processed(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Handle one inbound message and decide its acknowledgment.
    ///
    /// Decode failures complete the message without forwarding; publish
    /// failures abandon it so the transport may redeliver.
    pub async fn handle_message(&self, message: Message) -> AckDecision {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Received message {counter}: [{}]",
            String::from_utf8_lossy(message.payload())
        );

        match self.process(counter, &message).await {
            Ok(_) => AckDecision::Completed,
            Err(FilterError::Decode(e)) => {
                warn!("Message {counter} not filtered: {e}");
                AckDecision::Completed
            }
            Err(e) => {
                error!("Message {counter} abandoned: {e}");
                e.ack()
            }
        }
    }

    /// Run decode, evaluate and forward for a single message.
    pub async fn process(
        &self,
        counter: u64,
        message: &Message,
    ) -> Result<FilterOutcome, FilterError> {
        let body = MessageBody::decode(message.payload())?;
        let threshold = self.threshold.get();
        let temperature = body.machine.temperature;

        if !exceeds_threshold(temperature, threshold) {
            debug!("Message {counter}: temperature {temperature} within threshold {threshold}");
            return Ok(FilterOutcome::Suppressed);
        }

        info!("Machine temperature {temperature} exceeds threshold {threshold}");

        let (alert, displaced) = message.to_alert();
        if let Some(previous) = displaced {
            warn!(
                "Message {counter} already carried {MESSAGE_TYPE_PROPERTY}={previous}; replaced with alert"
            );
        }

        self.publisher.publish(&self.output_route, alert).await?;
        Ok(FilterOutcome::Forwarded)
    }

    /// Apply a desired-properties document to the threshold.
    ///
    /// Returns the newly installed threshold, or `None` when the document
    /// left it unchanged (missing key or malformed value).
    pub fn apply_desired_properties(&self, desired: &Value) -> Option<f64> {
        debug!("Desired property change: {desired}");

        match parse_threshold(desired) {
            Ok(Some(threshold)) => {
                self.threshold.set(threshold);
                Some(threshold)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    "Error when receiving desired property: {e}; keeping threshold {}",
                    self.threshold.get()
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("threshold", &self.threshold.get())
            .field("output_route", &self.output_route)
            .field("processed", &self.processed())
            .finish()
    }
}

#[async_trait]
impl InputHandler for FilterEngine {
    async fn handle(&self, message: Message) -> AckDecision {
        self.handle_message(message).await
    }
}

impl ConfigHandler for FilterEngine {
    fn on_desired_properties(&self, desired: &Value) {
        self.apply_desired_properties(desired);
    }
}
