//! Sensor subsystem.
//!
//! The board has a single analog input: the load voltage divider.

pub mod voltage;
