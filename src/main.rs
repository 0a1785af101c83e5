//! SortRouter Firmware: Main Entry Point
//!
//! Hexagonal architecture with a cooperative, poll-driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   SerialEventSink   NvsAdapter │
//! │  (Sensor+Actuator) (EventSink)    (EventSink)       (Storage)  │
//! │  LineReader → parse_line (host commands)                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            RouterService (pure logic)                  │    │
//! │  │  FSM · Fault monitor                                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each loop iteration drains every complete host line **before** ticking
//! the service, so a verdict that lands in the same iteration as the
//! analysis deadline wins.
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::delay::{FreeRtos, NON_BLOCK};
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver, UartTxDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use sortrouter::adapters::hardware::HardwareAdapter;
use sortrouter::adapters::log_sink::LogEventSink;
use sortrouter::adapters::nvs::NvsAdapter;
use sortrouter::adapters::serial_sink::SerialEventSink;
use sortrouter::adapters::time::MonotonicClock;
use sortrouter::app::ports::HostLink;
use sortrouter::app::service::RouterService;
use sortrouter::config::RouterConfig;
use sortrouter::diagnostics::BootCounter;
use sortrouter::drivers::cylinder::Cylinder;
use sortrouter::drivers::watchdog::{Watchdog, WATCHDOG_TIMEOUT_MS};
use sortrouter::fsm::context::Actuator;
use sortrouter::pins;
use sortrouter::sensors::presence::PresenceSensor;
use sortrouter::serial::{self, line::LineEvent, line::LineReader};

/// Control loop period.
const CONTROL_TICK_MS: u32 = 10;

// ── Host link over UART ───────────────────────────────────────

struct UartLink<'d> {
    tx: UartTxDriver<'d>,
}

impl HostLink for UartLink<'_> {
    fn send_line(&mut self, line: &str) {
        for chunk in [line.as_bytes(), b"\r\n"] {
            if let Err(e) = self.tx.write(chunk) {
                warn!("Host link write failed: {}", e);
                return;
            }
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SortRouter v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let watchdog =
        Watchdog::arm(WATCHDOG_TIMEOUT_MS).map_err(|e| anyhow::anyhow!("watchdog: {e}"))?;
    let peripherals = Peripherals::take()?;

    // ── 2. Boot counter ───────────────────────────────────────
    let mut nvs = NvsAdapter::new(EspDefaultNvsPartition::take()?);
    let boot_count = BootCounter::increment(&mut nvs).unwrap_or_else(|e| {
        warn!("Boot counter unavailable ({}), reporting 0", e);
        0
    });

    // ── 3. Configuration ──────────────────────────────────────
    let config = RouterConfig::default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid router config: {e}"))?;

    // ── 4. Station hardware ───────────────────────────────────
    // SAFETY: each GPIO number in `pins` is claimed exactly once here, and
    // `peripherals.pins` is never used, so no second driver aliases them.
    let (sensor_pin, push_pin, riser_pin, ejection_pin, tx_pin, rx_pin) = unsafe {
        (
            AnyInputPin::new(pins::PRESENCE_SENSOR_GPIO),
            AnyOutputPin::new(pins::PUSH_CYLINDER_GPIO),
            AnyOutputPin::new(pins::RISER_CYLINDER_GPIO),
            AnyOutputPin::new(pins::EJECTION_CYLINDER_GPIO),
            AnyIOPin::new(pins::HOST_UART_TX_GPIO),
            AnyIOPin::new(pins::HOST_UART_RX_GPIO),
        )
    };

    let mut sensor = PinDriver::input(sensor_pin)?;
    sensor.set_pull(Pull::Up)?;

    let mut hw = HardwareAdapter::new(
        PresenceSensor::new(sensor, config.debounce_ms),
        Cylinder::new(Actuator::Push, PinDriver::output(push_pin)?),
        Cylinder::new(Actuator::Riser, PinDriver::output(riser_pin)?),
        Cylinder::new(Actuator::Ejection, PinDriver::output(ejection_pin)?),
    );

    // ── 5. Host link ──────────────────────────────────────────
    let uart_cfg = UartConfig::default().baudrate(Hertz(pins::HOST_BAUD_RATE));
    let mut uart = UartDriver::new(
        peripherals.uart1,
        tx_pin,
        rx_pin,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_cfg,
    )?;
    let (tx, rx) = uart.split();

    let mut sink = (LogEventSink::new(), SerialEventSink::new(UartLink { tx }));
    let mut reader = LineReader::new();
    let mut rx_buf = [0u8; 64];

    // ── 6. Application service ────────────────────────────────
    let clock = MonotonicClock::new();
    let mut app = RouterService::new(config);
    app.set_boot_count(boot_count);
    app.start(clock.now_ms(), &mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();

        // Host lines first: verdicts take precedence over the deadline.
        loop {
            let n = match rx.read(&mut rx_buf, NON_BLOCK) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("Host link read failed: {}", e);
                    reader.reset();
                    break;
                }
            };
            for &byte in &rx_buf[..n] {
                match reader.push(byte) {
                    Some(LineEvent::Line(line)) => {
                        // Rejections are already reported to the host.
                        let _ = serial::dispatch_line(line, now_ms, &mut app, &mut hw, &mut sink);
                    }
                    Some(LineEvent::Overflow) => warn!("Host line too long, dropped"),
                    Some(LineEvent::InvalidUtf8) => warn!("Host line not UTF-8, dropped"),
                    None => {}
                }
            }
        }

        app.tick(now_ms, &mut hw, &mut sink);

        watchdog.feed();
        FreeRtos::delay_ms(CONTROL_TICK_MS);
    }
}
