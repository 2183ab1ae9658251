//! Placement of the comms task on an ESP32 core.
//!
//! `std::thread` on ESP-IDF is a pthread over a FreeRTOS task.  The
//! pthread config set by `esp_pthread_set_cfg()` is per calling thread
//! and consumed by the next spawn, so set-then-spawn happens back to
//! back here.  Host builds spawn an ordinary named thread.

use std::io;
use std::thread::JoinHandle;

/// ESP32 core a task is pinned to.  Only the protocol core hosts a
/// task; the application core is left to ESP-IDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU), shared with the WiFi/lwIP stacks.
    Pro = 0,
}

/// Placement of a spawned task.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Null-terminated, e.g. `"comms\0"`.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// The comms task: core 0, priority 1, 64 KiB stack.
pub const COMMS_TASK: TaskSpec = TaskSpec {
    name: "comms\0",
    core: Core::Pro,
    priority: 1,
    stack_kb: 64,
};

/// Spawn a thread pinned to `spec.core` with explicit priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(spec: TaskSpec, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    // SAFETY: cfg is fully initialised by esp_create_default_pthread_config
    // and `name` is a 'static null-terminated string.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = spec.priority as _;
        cfg.stack_size = (spec.stack_kb * 1024) as _;
        cfg.thread_name = spec.name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = spec.name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        spec.core,
        spec.priority,
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(spec: TaskSpec, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    let display_name = spec.name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(spec.stack_kb * 1024)
        .spawn(f)
}
