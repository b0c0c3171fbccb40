//! The `client` module defines the representation of a peer connected to the
//! edge hub.

pub mod hub_client;
pub use hub_client::Client;

#[cfg(test)]
mod tests;
