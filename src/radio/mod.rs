//! The register-level core of the driver.
//!
//! [`Nrf24`] owns the SPI handle, the CE pin, and a delay provider, and
//! translates every public operation into the exact opcode-prefixed bus
//! transactions the nRF24L01+ expects. All methods take `&mut self`; on
//! multi-threaded hosts wrap it in [`Device`](crate::device::Device), which
//! serializes callers behind a mutex.

use core::fmt::{Display, Formatter};

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

pub(crate) mod bit_fields;
pub mod constants;
mod init;
mod mode;
mod pipe;
mod rx;
mod settings;
mod tx;

use crate::{config::RadioConfig, types::StatusFlags};
use bit_fields::Config;
use constants::{commands, registers};

/// Errors reported by the driver.
///
/// `SPI` and `PIN` are the error types of the underlying bus and CE pin
/// drivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioError<SPI, PIN> {
    /// The SPI transfer failed. Bus errors are surfaced immediately and
    /// never retried by the driver.
    Spi(SPI),
    /// The CE output pin could not be driven.
    Pin(PIN),
    /// A parameter was rejected before any hardware was touched.
    InvalidArgument(&'static str),
    /// The RF_CH readback after configuration did not match the programmed
    /// value; the radio is missing, miswired, or unpowered.
    DeviceNotFound,
    /// A transmission exhausted the configured retransmissions without an
    /// acknowledgement.
    MaxRetries,
    /// Transmit supervision gave up after `retransmit delay x count + 50 ms`
    /// without the hardware reporting either TX_DS or MAX_RT.
    Timeout,
    /// A blocking wait was aborted through its [`CancelToken`](crate::CancelToken).
    Cancelled,
    /// The operation needs an IRQ pin but none was supplied at construction.
    IrqNotConfigured,
}

/// The nRF24L01+ register-level driver.
///
/// Constructed with [`Nrf24::new`] and brought alive with [`Nrf24::init`],
/// which programs the full configuration and leaves the radio listening.
pub struct Nrf24<CE, SPI, DELAY> {
    spi: SPI,
    ce_pin: CE,
    delay: DELAY,
    pub(crate) config: RadioConfig,
    pub(crate) config_reg: Config,
    pub(crate) status: StatusFlags,
    /// One command byte plus up to 32 payload bytes; reused by every bus
    /// transaction.
    pub(crate) buf: [u8; 33],
}

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Instantiate a driver for the radio wired to `spi` and `ce_pin`.
    ///
    /// The radio's CSN (chip select) pin belongs to the `spi` device; this
    /// driver never touches it. No bus traffic happens here; call
    /// [`Nrf24::init`] to validate `config`, program the hardware, and start
    /// listening.
    pub fn new(ce_pin: CE, spi: SPI, delay: DELAY, config: RadioConfig) -> Self {
        Self {
            spi,
            ce_pin,
            delay,
            config,
            config_reg: Config::default(),
            status: StatusFlags::from_bits(0),
            buf: [0u8; 33],
        }
    }

    /// The configuration as last written to the hardware.
    pub const fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// One full-duplex exchange of `len` bytes on the scratch buffer.
    ///
    /// The first byte shifted back in is always the STATUS register, which
    /// is cached for [`Nrf24::cached_status`].
    pub(crate) fn spi_transfer(
        &mut self,
        len: usize,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.spi
            .transfer_in_place(&mut self.buf[..len])
            .map_err(RadioError::Spi)?;
        self.status = StatusFlags::from_bits(self.buf[0]);
        Ok(())
    }

    /// Issue a single-byte command (NOP, FLUSH_TX, FLUSH_RX).
    pub(crate) fn command(&mut self, opcode: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = opcode;
        self.spi_transfer(1)
    }

    pub(crate) fn read_register(
        &mut self,
        reg: u8,
    ) -> Result<u8, RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = reg;
        self.buf[1] = 0;
        self.spi_transfer(2)?;
        Ok(self.buf[1])
    }

    pub(crate) fn write_register(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = commands::W_REGISTER | reg;
        self.buf[1] = value;
        self.spi_transfer(2)
    }

    /// Multi-byte register write (addresses), least significant byte first.
    pub(crate) fn write_register_buf(
        &mut self,
        reg: u8,
        data: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = commands::W_REGISTER | reg;
        self.buf[1..=data.len()].copy_from_slice(data);
        self.spi_transfer(data.len() + 1)
    }

    /// Clear the write-1-to-clear interrupt flags (RX_DR, TX_DS, MAX_RT).
    pub(crate) fn clear_status(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.write_register(registers::STATUS, StatusFlags::IRQ_MASK)
    }

    /// The STATUS byte captured during the most recent bus transaction.
    pub const fn cached_status(&self) -> StatusFlags {
        self.status
    }
}

impl<CE, SPI, DELAY> Display for Nrf24<CE, SPI, DELAY> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "nRF24L01+(channel={}, rate={}, pa={}, rx={}, dynamic_payload={}, auto_ack={})",
            self.config.channel(),
            self.config.data_rate(),
            self.config.pa_level(),
            self.config.rx_address(),
            self.config.dynamic_payload(),
            self.config.auto_ack(),
        )
    }
}
