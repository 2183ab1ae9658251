//! Load-control firmware: main entry point.
//!
//! Hexagonal architecture with a single comms task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     WifiAdapter       IotHubAdapter  Esp32Time│
//! │  (Sensor+Output)     (Connectivity)    (Messaging)    (Clock)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  CommsLoop (comms task, core 0)                        │    │
//! │  │    telemetry · reconnect · check → CommandDispatcher   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::info;

use loadctl::Error;
use loadctl::adapters::hardware::HardwareAdapter;
use loadctl::adapters::iothub::IotHubAdapter;
use loadctl::adapters::time::Esp32TimeAdapter;
use loadctl::adapters::wifi::WifiAdapter;
use loadctl::app::ports::Clock;
use loadctl::comms::CommsLoop;
use loadctl::config::{Credentials, DeviceConfig};
use loadctl::drivers::{hw_init, task_pin};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  LoadCtl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = DeviceConfig::default();
    let credentials = Credentials::from_build_env().map_err(Error::from)?;
    info!("Config: {:?}", config);
    info!("Credentials: {:?}", credentials);

    // ── 3. Peripherals (all relays LOW) ───────────────────────
    hw_init::init_peripherals(&config).map_err(Error::from)?;

    // ── 4. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, Some(nvs), &credentials)
        .map_err(Error::from)?;
    let mut hub = IotHubAdapter::new(&config.model_id);
    let mut hw = HardwareAdapter::new(&config);
    let clock = Esp32TimeAdapter::new();

    let mut comms = CommsLoop::new(&config, &credentials);
    let poll_ms = config.poll_period_ms;

    // ── 5. Comms task ─────────────────────────────────────────
    let handle = task_pin::spawn_on_core(task_pin::COMMS_TASK, move || {
        comms.establish(&clock, &mut wifi, &mut hub);
        info!("Entering comms loop (link {:?}).", comms.link_state());

        loop {
            comms.tick(clock.now_ms(), &mut wifi, &mut hub, &mut hw);
            FreeRtos::delay_ms(poll_ms);
        }
    })?;

    handle
        .join()
        .map_err(|_| anyhow!("comms task panicked"))?;
    Err(anyhow!("comms task exited"))
}
