//! # edge-filter
//!
//! `edge-filter` is an edge-deployed telemetry filter. It receives messages
//! on an input route, compares the reported machine temperature against a
//! threshold that operators can change at runtime, and forwards an alert copy
//! of every message that runs too hot.
//!
//! ## Core Modules
//!
//! - `filter`: the threshold store, the message model and the filter engine.
//! - `transport`: the contracts the engine is wired through, and a small
//!   WebSocket edge hub implementing them.
//! - `client`: a peer connected to the edge hub.
//! - `config`: loading server, filter and logging settings.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod config;
pub mod filter;
pub mod transport;
pub mod utils;
