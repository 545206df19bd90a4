use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{constants::commands, Nrf24, RadioError};
use crate::types::{Payload, StatusFlags};

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Fetch the payload at the head of the RX FIFO, if any.
    ///
    /// Non-blocking; the radio must already be listening (it is after
    /// [`Nrf24::init`] and after every [`Nrf24::transmit`]). Returns
    /// `Ok(None)` when nothing has arrived.
    pub fn receive(&mut self) -> Result<Option<Payload>, RadioError<SPI::Error, CE::Error>> {
        self.command(commands::NOP)?;
        if self.status.rx_pipe() == StatusFlags::RX_FIFO_EMPTY {
            return Ok(None);
        }
        if self.config.dynamic_payload() {
            self.read_dynamic()
        } else {
            self.read_payload(self.config.payload_size() as usize)
        }
    }

    fn read_dynamic(&mut self) -> Result<Option<Payload>, RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = commands::R_RX_PL_WID;
        self.buf[1] = 0;
        self.spi_transfer(2)?;
        let width = self.buf[1];
        if width == 0 || width > 32 {
            // A zero width cannot be read past and anything above 32 is the
            // documented glitch case; drop the whole FIFO either way.
            self.command(commands::FLUSH_RX)?;
            self.clear_status()?;
            return Ok(None);
        }
        self.read_payload(width as usize)
    }

    fn read_payload(
        &mut self,
        len: usize,
    ) -> Result<Option<Payload>, RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = commands::R_RX_PAYLOAD;
        self.buf[1..=len].fill(0);
        self.spi_transfer(len + 1)?;
        // Copy out before clear_status() reuses the scratch buffer.
        let payload = Payload::from_slice(&self.buf[1..=len]);
        self.clear_status()?;
        Ok(Some(payload))
    }
}
