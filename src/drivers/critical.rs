//! Scheduler-suspension guard.
//!
//! Holding a [`SchedulerSuspendGuard`] stops FreeRTOS from switching
//! tasks on this core, so a peripheral read cannot be interleaved with
//! another task's work.  Interrupts stay enabled.  The scheduler resumes
//! when the guard drops.
//!
//! Keep the guarded section short and never block inside it.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `vTaskSuspendAll` / `xTaskResumeAll`.
//! On host/test: a per-thread nesting counter, observable via
//! `is_suspended()`.

use core::marker::PhantomData;

/// RAII guard; the scheduler stays suspended while it lives.
///
/// Not `Send`: it must be dropped on the task that created it.
pub struct SchedulerSuspendGuard {
    _not_send: PhantomData<*const ()>,
}

impl SchedulerSuspendGuard {
    pub fn new() -> Self {
        suspend();
        Self { _not_send: PhantomData }
    }
}

impl Default for SchedulerSuspendGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SchedulerSuspendGuard {
    fn drop(&mut self) {
        resume();
    }
}

#[cfg(target_os = "espidf")]
fn suspend() {
    // SAFETY: Paired with xTaskResumeAll in resume(); calls nest.
    unsafe { esp_idf_svc::sys::vTaskSuspendAll() };
}

#[cfg(target_os = "espidf")]
fn resume() {
    // SAFETY: Matches the vTaskSuspendAll issued in suspend().
    unsafe { esp_idf_svc::sys::xTaskResumeAll() };
}

#[cfg(not(target_os = "espidf"))]
fn suspend() {
    SIM_DEPTH.with(|d| d.set(d.get() + 1));
}

#[cfg(not(target_os = "espidf"))]
fn resume() {
    SIM_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
}

#[cfg(not(target_os = "espidf"))]
std::thread_local! {
    static SIM_DEPTH: core::cell::Cell<u32> = const { core::cell::Cell::new(0) };
}

/// Whether the calling task currently holds a suspension guard.
#[cfg(not(target_os = "espidf"))]
pub fn is_suspended() -> bool {
    SIM_DEPTH.with(|d| d.get() > 0)
}
