//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `edge-filter` application.
//!
//! It centralizes the error taxonomy shared by the filter and the transport,
//! and the logging bootstrap used by the binary and by tests.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;
