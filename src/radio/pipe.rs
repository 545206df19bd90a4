use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{constants::registers, Nrf24, RadioError};

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Enable receive pipe `pipe` (0-5) with the given address.
    ///
    /// Pipes 0 and 1 take a full address of at least the configured width.
    /// Pipes 2-5 store a single byte and borrow the upper bytes from pipe 1,
    /// so only `address[0]` is used for them. The payload width mode
    /// (dynamic or static) and the auto-ack setting are applied to the pipe
    /// as part of opening it.
    ///
    /// Pipe 0 doubles as the auto-ack receive pipe: its address is
    /// overwritten by every transmit, so prefer pipe 1 (or 2-5) for
    /// listening.
    pub fn open_rx_pipe(
        &mut self,
        pipe: u8,
        address: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        if pipe > 5 {
            return Err(RadioError::InvalidArgument("pipe must be 0..=5"));
        }

        let width = self.config.address_width() as usize;
        if pipe <= 1 {
            if address.len() < width {
                return Err(RadioError::InvalidArgument(
                    "address shorter than the configured width",
                ));
            }
            self.write_register_buf(registers::RX_ADDR_P0 + pipe, &address[..width])?;
        } else {
            if address.is_empty() {
                return Err(RadioError::InvalidArgument(
                    "pipes 2-5 need at least one address byte",
                ));
            }
            self.write_register(registers::RX_ADDR_P0 + pipe, address[0])?;
        }

        if self.config.dynamic_payload() {
            let dynpd = self.read_register(registers::DYNPD)?;
            self.write_register(registers::DYNPD, dynpd | (1 << pipe))?;
        } else {
            let dynpd = self.read_register(registers::DYNPD)?;
            self.write_register(registers::DYNPD, dynpd & !(1 << pipe))?;
            self.write_register(registers::RX_PW_P0 + pipe, self.config.payload_size())?;
        }

        let enabled = self.read_register(registers::EN_RXADDR)?;
        self.write_register(registers::EN_RXADDR, enabled | (1 << pipe))?;

        let auto_ack = self.read_register(registers::EN_AA)?;
        if self.config.auto_ack() {
            self.write_register(registers::EN_AA, auto_ack | (1 << pipe))
        } else {
            self.write_register(registers::EN_AA, auto_ack & !(1 << pipe))
        }
    }

    /// Stop receiving on pipe `pipe` (0-5).
    pub fn close_rx_pipe(&mut self, pipe: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        if pipe > 5 {
            return Err(RadioError::InvalidArgument("pipe must be 0..=5"));
        }
        let enabled = self.read_register(registers::EN_RXADDR)?;
        self.write_register(registers::EN_RXADDR, enabled & !(1 << pipe))?;
        let auto_ack = self.read_register(registers::EN_AA)?;
        self.write_register(registers::EN_AA, auto_ack & !(1 << pipe))
    }
}
