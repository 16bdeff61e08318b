//! Hardware and Transport Seams
//!
//! The core never touches registers or radios directly. Everything it needs
//! from the board and the mesh stack goes through the small traits in this
//! module, so the same decoder and protocol code runs on an ESP32, under a
//! Linux GPIO character device, or against the deterministic simulators in
//! [`crate::sim`].
//!
//! ## Module Organization
//!
//! - [`gpio`] - digital pins and the analog light input
//! - [`time`] - microsecond/millisecond clock and busy-wait delay
//! - [`transport`] - broadcast-only mesh channel
//!
//! ## Design Philosophy
//!
//! - **Narrow**: each trait carries only the calls the core makes
//! - **Static Dispatch**: nodes are generic over the traits, no `dyn`
//! - **Pin numbers, not pin types**: the reference firmware addresses pins by
//!   number and several sensors share one bank, so pins are plain `u8`

pub mod gpio;
pub mod time;
pub mod transport;

pub use gpio::{AnalogInput, Gpio, Level, Pin, PinMode};
pub use time::Clock;
pub use transport::Transport;
