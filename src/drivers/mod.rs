//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod critical;
pub mod dimmer;
pub mod hw_init;
pub mod relay_bank;
pub mod status_led;
pub mod task_pin;
