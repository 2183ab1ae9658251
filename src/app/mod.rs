//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the load controller:
//! the live [`DeviceState`](state::DeviceState), remote command decoding
//! and the [`CommandDispatcher`](dispatcher::CommandDispatcher).
//! All interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod state;
