//! Station sensors.
//!
//! The router has a single input: the part-presence switch at the inlet.

pub mod presence;
