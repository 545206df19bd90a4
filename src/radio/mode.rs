use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{
    constants::{commands, registers},
    Nrf24, RadioError,
};

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    pub(crate) fn set_ce(&mut self, level: bool) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        if level {
            self.ce_pin.set_high().map_err(RadioError::Pin)
        } else {
            self.ce_pin.set_low().map_err(RadioError::Pin)
        }
    }

    /// Enter active RX mode and drain anything stale from the RX FIFO.
    pub(crate) fn start_listening(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.set_ce(false)?;
        self.config_reg = self.config_reg.as_rx();
        self.write_register(registers::CONFIG, self.config_reg.into_bits())?;
        self.set_ce(true)?;
        // RX settling (Tstby2a)
        self.delay.delay_us(130);
        self.clear_status()?;
        self.command(commands::FLUSH_RX)
    }

    /// Drop back to Standby-I as primary transmitter.
    pub(crate) fn stop_listening(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.set_ce(false)?;
        self.config_reg = self.config_reg.as_tx();
        self.write_register(registers::CONFIG, self.config_reg.into_bits())
    }

    /// Wake the radio from power down.
    ///
    /// Blocks for the crystal oscillator start-up (Tpd2stby) before the
    /// radio may enter Standby or RX/TX modes.
    pub fn power_up(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.config_reg = self.config_reg.with_power(true);
        self.write_register(registers::CONFIG, self.config_reg.into_bits())?;
        self.delay.delay_us(2000);
        Ok(())
    }

    /// Put the radio into power down mode (about 900 nA draw).
    pub fn power_down(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.config_reg = self.config_reg.with_power(false);
        self.write_register(registers::CONFIG, self.config_reg.into_bits())
    }
}
