//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `hardware` | SensorPort         | ESP32 ADC1               |
//! |            | OutputPort         | Relay GPIOs, LEDC, LED   |
//! | `iothub`   | MessagingPort      | Azure IoT Hub over MQTT  |
//! | `time`     | Clock              | ESP32 system timer       |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod iothub;
pub mod time;
pub mod wifi;
