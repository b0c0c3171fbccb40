//! The `filter` module holds the message-filtering core: the live threshold,
//! the message model, desired-properties parsing and the engine that ties
//! them together.

pub mod desired;
pub mod engine;
pub mod message;
pub mod threshold;

pub use engine::{FilterEngine, FilterOutcome};
pub use message::{Message, MessageBody};
pub use threshold::ThresholdConfig;
