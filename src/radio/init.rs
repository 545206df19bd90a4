use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{
    bit_fields::Config,
    constants::{bits, commands, registers},
    Nrf24, RadioError,
};

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Validate the configuration, program every register, and enter RX mode.
    ///
    /// The radio is held in Standby-I (CE low) for the whole sequence and
    /// CE only goes high once the last register is written. A readback of
    /// RF_CH serves as the connection sanity check: if it does not return
    /// the programmed channel the wiring or power is bad and
    /// [`RadioError::DeviceNotFound`] is returned with CE left low.
    ///
    /// On success the radio is powered up, configured, and listening on
    /// [`RadioConfig::rx_address()`](fn@crate::RadioConfig::rx_address).
    pub fn init(&mut self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.config
            .validate()
            .map_err(RadioError::InvalidArgument)?;

        self.set_ce(false)?;

        // Reset-like state: powered down, no CRC, primary TX.
        self.write_register(registers::CONFIG, 0)?;
        self.clear_status()?;
        self.command(commands::FLUSH_TX)?;
        self.command(commands::FLUSH_RX)?;

        self.config_reg = Config::default()
            .with_crc_length(self.config.crc_length())
            .with_power(true)
            .as_rx();
        self.write_register(registers::CONFIG, self.config_reg.into_bits())?;
        // Oscillator settle after leaving power down. The datasheet worst
        // case is 4.5 ms; configuration bits written earlier do not stick.
        self.delay.delay_us(5000);

        self.write_register(registers::RF_CH, self.config.channel())?;
        self.write_register(registers::SETUP_AW, self.config.address_width() - 2)?;
        self.write_register(registers::SETUP_RETR, self.config.setup_retr_bits())?;
        self.write_register(registers::RF_SETUP, self.config.rf_setup_bits())?;

        let auto_ack = if self.config.auto_ack() {
            bits::ERX_P0 | bits::ERX_P1
        } else {
            0
        };
        self.write_register(registers::EN_AA, auto_ack)?;
        self.write_register(registers::EN_RXADDR, bits::ERX_P0 | bits::ERX_P1)?;

        let rx_addr = self.config.rx_address().into_bytes();
        let width = self.config.address_width() as usize;
        self.write_register_buf(registers::RX_ADDR_P0 + 1, &rx_addr[..width])?;

        if self.config.dynamic_payload() {
            self.write_register(
                registers::FEATURE,
                bits::EN_DYN_ACK | bits::EN_DPL | bits::EN_ACK_PAY,
            )?;
            self.write_register(registers::DYNPD, bits::ERX_P0 | bits::ERX_P1)?;
        } else {
            // EN_DYN_ACK stays on so no-ack transmits keep working.
            self.write_register(registers::FEATURE, bits::EN_DYN_ACK)?;
            self.write_register(registers::DYNPD, 0)?;
            self.write_register(registers::RX_PW_P0, self.config.payload_size())?;
            self.write_register(registers::RX_PW_P0 + 1, self.config.payload_size())?;
        }

        if self.read_register(registers::RF_CH)? != self.config.channel() {
            return Err(RadioError::DeviceNotFound);
        }

        self.set_ce(true)?;
        log::debug!("radio configured and listening");
        Ok(())
    }
}
