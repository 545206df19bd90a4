//! A platform-agnostic driver for the nRF24L01+ 2.4 GHz packet radio.
//!
//! The core driver ([`Nrf24`]) is `no_std` compatible and speaks to the radio
//! through the [`embedded-hal`] traits: an [`SpiDevice`] for the bus (the bus
//! driver owns the chip-select line), an [`OutputPin`] for the radio's CE
//! line, and a [`DelayNs`] provider for the chip's settling times.
//!
//! The `std` feature (enabled by default) adds the [`device`] module: a
//! mutex-serialized wrapper around the core driver with an interrupt-driven
//! blocking receive, cancellation tokens, and orderly teardown. Use it on
//! hosted targets (e.g. a Raspberry Pi); use [`Nrf24`] directly on bare-metal
//! targets where `&mut` access already guarantees exclusivity.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//! [`SpiDevice`]: embedded_hal::spi::SpiDevice
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//!
//! ## Example
//!
//! ```ignore
//! use nrf24_radio::{Address, Nrf24, RadioConfig};
//!
//! let config = RadioConfig::default()
//!     .with_channel(76)
//!     .with_rx_address(Address::new([0xE7; 5]));
//! let mut radio = Nrf24::new(ce_pin, spi, delay, config);
//! radio.init()?;
//!
//! radio.transmit(Address::new([0xC2; 5]), b"hello")?;
//! if let Some(packet) = radio.receive()? {
//!     // packet derefs to &[u8]
//! }
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

mod config;
mod types;
pub use config::RadioConfig;
pub use types::{Address, CrcLength, DataRate, PaLevel, Payload, StatusFlags, MAX_PAYLOAD_SIZE};

pub mod radio;
pub use radio::{Nrf24, RadioError};

#[cfg(feature = "std")]
pub mod device;
#[cfg(feature = "std")]
pub use device::{CancelToken, Device, DeviceError, Edge, IrqHandler, IrqPin};
