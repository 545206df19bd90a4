use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{
    constants::{commands, registers},
    Nrf24, RadioError,
};
use crate::{
    config::{encode_setup_retr, validate_auto_retransmit},
    types::{DataRate, PaLevel, StatusFlags},
};

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Change the radio channel (frequency). `channel` must be 0 to 124.
    pub fn set_channel(&mut self, channel: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        if channel > 124 {
            return Err(RadioError::InvalidArgument("channel must be 0..=124"));
        }
        self.write_register(registers::RF_CH, channel)?;
        self.config = self.config.with_channel(channel);
        Ok(())
    }

    /// Change the on-air data rate.
    pub fn set_data_rate(
        &mut self,
        rate: DataRate,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.config = self.config.with_data_rate(rate);
        self.write_register(registers::RF_SETUP, self.config.rf_setup_bits())
    }

    /// Change the power amplifier level.
    pub fn set_pa_level(
        &mut self,
        level: PaLevel,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.config = self.config.with_pa_level(level);
        self.write_register(registers::RF_SETUP, self.config.rf_setup_bits())
    }

    /// Reconfigure automatic retransmissions.
    ///
    /// `delay_us` must be 250 to 4000 in steps of 250; `count` at most 15.
    pub fn set_auto_retransmit(
        &mut self,
        delay_us: u16,
        count: u8,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        validate_auto_retransmit(delay_us, count).map_err(RadioError::InvalidArgument)?;
        self.write_register(registers::SETUP_RETR, encode_setup_retr(delay_us, count))?;
        self.config = self.config.with_auto_retransmit(delay_us, count);
        Ok(())
    }

    /// Change the address width (3, 4, or 5 bytes, applied to all pipes).
    pub fn set_address_width(&mut self, width: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        if !(3..=5).contains(&width) {
            return Err(RadioError::InvalidArgument("address width must be 3..=5"));
        }
        self.write_register(registers::SETUP_AW, width - 2)?;
        self.config = self.config.with_address_width(width);
        Ok(())
    }

    /// Read the STATUS register (via a NOP, which shifts it out for free).
    pub fn status(&mut self) -> Result<StatusFlags, RadioError<SPI::Error, CE::Error>> {
        self.command(commands::NOP)?;
        Ok(self.status)
    }

    /// Clear the given write-1-to-clear interrupt flags in STATUS.
    pub(crate) fn clear_interrupts(
        &mut self,
        flags: StatusFlags,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.write_register(registers::STATUS, flags.into_bits() & StatusFlags::IRQ_MASK)
    }

    /// Counters from OBSERVE_TX: `(lost_packets, retries)`.
    ///
    /// `lost_packets` counts packets lost since the channel was last set
    /// (capped at 15); `retries` is the retransmission count of the most
    /// recent transmission.
    pub fn retransmission_counters(
        &mut self,
    ) -> Result<(u8, u8), RadioError<SPI::Error, CE::Error>> {
        let observe = self.read_register(registers::OBSERVE_TX)?;
        Ok((observe >> 4, observe & 0x0F))
    }

    /// True when a signal above -64 dBm is present on the current channel.
    ///
    /// Useful as a crude clear-channel assessment before transmitting.
    pub fn carrier_detected(&mut self) -> Result<bool, RadioError<SPI::Error, CE::Error>> {
        Ok(self.read_register(registers::RPD)? & 1 == 1)
    }

    /// Discard every payload waiting in the TX FIFO.
    pub fn flush_tx(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.command(commands::FLUSH_TX)
    }

    /// Discard every payload waiting in the RX FIFO.
    pub fn flush_rx(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.command(commands::FLUSH_RX)
    }
}
