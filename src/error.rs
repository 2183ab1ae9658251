//! Unified error type for the load-control firmware.
//!
//! Each subsystem keeps its own small error enum; this module funnels
//! the ones that can stop bring-up into a single [`Error`] so `main` can
//! use `?` uniformly.  Faults after bring-up are logged and retried by
//! the comms loop and never reach this type.

use core::fmt;

use crate::app::ports::ConnectivityError;
use crate::config::CredentialsError;
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Bring-up failures surfaced to `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// WiFi station could not be brought up.
    Connectivity(ConnectivityError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// Build-time credentials are unusable.
    Credentials(CredentialsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Credentials(e) => write!(f, "credentials: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<CredentialsError> for Error {
    fn from(e: CredentialsError) -> Self {
        Self::Credentials(e)
    }
}
