//! This crate provides a platform agnostic no_std firmware bridge for the Alphasense OPC-N2
//! optical particle counter. The driver is built on the [`embedded-hal`](https://crates.io/crates/embedded-hal)
//! 1.0 SPI and delay traits.
//!
//! The bridge sits between a host processor and the sensor. The host posts command words into a
//! shared mailbox, the [`Dispatcher`] executes them against the sensor and packs the results into
//! 16-bit register slots.
//!
//! ## Supported features
//! * Power the fan and laser on/off with the sensor's handshake and retry schedule
//! * Read the particulate-mass frame (PM1, PM2.5, PM10)
//! * Read the histogram frame (16 bins, mass time-of-flight, flow rate, sampling period, checksum)
//! * Mailbox command dispatch for the host protocol
//! * Ping, serial number, information string and firmware version
//! * Fan power level and fan-only switching
//! * Host-side client that reassembles register words into readings
//!
//! ## Usage
//!
//! ```no_run
//! # fn run<SPI, D, M>(spi: SPI, delay: D, mailbox: M)
//! # where
//! #     SPI: embedded_hal::spi::SpiDevice,
//! #     D: embedded_hal::delay::DelayNs,
//! #     M: opcn2_bridge::Mailbox,
//! # {
//! use opcn2_bridge::{Config, Dispatcher, Opcn2, SpiTransport};
//!
//! let mut opc = Opcn2::new(SpiTransport::new(spi), delay, Config::default());
//! opc.setup();
//! let mut dispatcher = Dispatcher::new(opc, mailbox);
//! dispatcher.run();
//! # }
//! ```
//!
//! ## Cargo features
//! * `defmt`: log protocol events and derive `defmt::Format` for the public types
//! * `thiserror`: derive `core::error::Error` for [`Error`]

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

mod checksum;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod host;
pub mod mailbox;
pub mod power;
pub mod types;

mod bus;
mod device;

#[cfg(test)]
mod testing;

pub use bus::{SpiTransport, Transport};
pub use config::{Config, Pins, ReadMode, Timing, MODE};
pub use device::Opcn2;
pub use dispatch::{Dispatcher, Outcome};
pub use error::Error;
pub use frame::{Frame, FrameLengthError};
pub use host::{HistogramReading, Host, PmReading};
pub use mailbox::{Mailbox, MemoryMailbox, Opcode};
pub use power::PowerController;
pub use types::{DeviceState, HistogramFrame, InfoString, PmFrame, SerialNumber};
