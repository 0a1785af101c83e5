//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | SensorPort         | Presence switch GPIO     |
//! |                | ActuatorPort       | Cylinder valve GPIOs     |
//! | `log_sink`     | EventSink          | `log` output             |
//! | `serial_sink`  | EventSink          | Host link (UART)         |
//! | `nvs`          | StoragePort        | NVS / in-memory store    |
//! | `time`         | -                  | System timer             |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial_sink;
pub mod time;
