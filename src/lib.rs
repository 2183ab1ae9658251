//! Load-control firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod comms;
pub mod config;
pub mod encoder;
pub mod error;
pub mod iothub;
pub mod pins;

// Hardware- and network-facing modules; the ESP-IDF implementations
// are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;

pub use error::Error;
