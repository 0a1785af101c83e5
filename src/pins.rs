//! GPIO / peripheral pin assignments for the router station board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Pneumatic cylinders (solenoid valves via MOSFET drivers, active HIGH)
// ---------------------------------------------------------------------------

/// Digital output: push cylinder valve.
pub const PUSH_CYLINDER_GPIO: i32 = 18;
/// Digital output: ejection cylinder valve.
pub const EJECTION_CYLINDER_GPIO: i32 = 19;
/// Digital output: riser cylinder valve.
pub const RISER_CYLINDER_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Digital input: part-presence sensor (NPN, pulled up).
/// LOW = object present, HIGH = clear.
pub const PRESENCE_SENSOR_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Host link (UART1 to the analysis controller)
// ---------------------------------------------------------------------------

pub const HOST_UART_TX_GPIO: i32 = 4;
pub const HOST_UART_RX_GPIO: i32 = 5;
/// Line rate shared with the host controller.
pub const HOST_BAUD_RATE: u32 = 115_200;
