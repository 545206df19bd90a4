use crate::types::{Address, CrcLength, DataRate, PaLevel};

/// Radio configuration applied by [`Nrf24::init()`](fn@crate::Nrf24::init).
///
/// This struct follows a builder pattern; start from [`RadioConfig::default`]
/// and refine it:
/// ```
/// use nrf24_radio::{DataRate, RadioConfig};
///
/// let config = RadioConfig::default()
///     .with_channel(42)
///     .with_data_rate(DataRate::Mbps1);
/// ```
///
/// Values are stored as given and validated when the driver programs the
/// hardware, so an out-of-range channel surfaces as
/// [`RadioError::InvalidArgument`](crate::RadioError::InvalidArgument)
/// instead of being silently clamped.
///
/// | feature | default value |
/// |--------:|:--------------|
/// | [`RadioConfig::channel()`] | `76` |
/// | [`RadioConfig::rx_address()`] | `C2:C2:C2:C2:C2` |
/// | [`RadioConfig::payload_size()`] | `32` |
/// | [`RadioConfig::dynamic_payload()`] | `false` |
/// | [`RadioConfig::auto_ack()`] | `true` |
/// | [`RadioConfig::data_rate()`] | [`DataRate::Kbps250`] |
/// | [`RadioConfig::pa_level()`] | [`PaLevel::Max`] |
/// | [`RadioConfig::auto_retransmit_delay()`] | `250` µs |
/// | [`RadioConfig::auto_retransmit_count()`] | `3` |
/// | [`RadioConfig::address_width()`] | `5` |
/// | [`RadioConfig::crc_length()`] | [`CrcLength::Bit16`] |
#[derive(Clone, Copy, Debug)]
pub struct RadioConfig {
    channel: u8,
    rx_address: Address,
    payload_size: u8,
    dynamic_payload: bool,
    auto_ack: bool,
    data_rate: DataRate,
    pa_level: PaLevel,
    auto_retransmit_delay_us: u16,
    auto_retransmit_count: u8,
    address_width: u8,
    crc_length: CrcLength,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: 76,
            rx_address: Address::new([0xC2; 5]),
            payload_size: 32,
            dynamic_payload: false,
            auto_ack: true,
            data_rate: DataRate::Kbps250,
            pa_level: PaLevel::Max,
            auto_retransmit_delay_us: 250,
            auto_retransmit_count: 3,
            address_width: 5,
            crc_length: CrcLength::Bit16,
        }
    }
}

impl RadioConfig {
    /// Returns the value set by [`RadioConfig::with_channel()`].
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Set the channel (over the air frequency).
    ///
    /// The RF frequency is `2400 + channel` MHz. Valid range is 0 to 124;
    /// channels above the Wi-Fi spectrum (70-80) are usually the quietest.
    pub fn with_channel(self, channel: u8) -> Self {
        Self { channel, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_rx_address()`].
    pub const fn rx_address(&self) -> Address {
        self.rx_address
    }

    /// The address this radio listens on (written to pipe 1).
    pub fn with_rx_address(self, rx_address: Address) -> Self {
        Self { rx_address, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_payload_size()`].
    pub const fn payload_size(&self) -> u8 {
        self.payload_size
    }

    /// The static payload width in bytes (1 to 32).
    ///
    /// Only meaningful while dynamic payloads are disabled: every packet on
    /// the air is exactly this long, and shorter transmit buffers are
    /// zero-padded.
    pub fn with_payload_size(self, payload_size: u8) -> Self {
        Self {
            payload_size,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_dynamic_payload()`].
    pub const fn dynamic_payload(&self) -> bool {
        self.dynamic_payload
    }

    /// Enable dynamically sized payloads (and with them, ACK payloads).
    ///
    /// Enabling this nullifies [`RadioConfig::payload_size()`]; the packet
    /// length is reported per-packet by the hardware instead.
    pub fn with_dynamic_payload(self, enable: bool) -> Self {
        Self {
            dynamic_payload: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_auto_ack()`].
    pub const fn auto_ack(&self) -> bool {
        self.auto_ack
    }

    /// Enable or disable Enhanced ShockBurst auto-acknowledgements.
    pub fn with_auto_ack(self, enable: bool) -> Self {
        Self {
            auto_ack: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_data_rate()`].
    pub const fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    /// The on-air data rate. Both ends of a link must agree on it.
    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self { data_rate, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_pa_level()`].
    pub const fn pa_level(&self) -> PaLevel {
        self.pa_level
    }

    /// The Power Amplifier level.
    pub fn with_pa_level(self, pa_level: PaLevel) -> Self {
        Self { pa_level, ..self }
    }

    /// Returns the delay set by [`RadioConfig::with_auto_retransmit()`].
    pub const fn auto_retransmit_delay(&self) -> u16 {
        self.auto_retransmit_delay_us
    }

    /// Returns the count set by [`RadioConfig::with_auto_retransmit()`].
    pub const fn auto_retransmit_count(&self) -> u8 {
        self.auto_retransmit_count
    }

    /// Configure automatic retransmissions.
    ///
    /// `delay_us` is the wait between attempts, 250 to 4000 µs in steps of
    /// 250. `count` is the number of retries (0 to 15) before the radio
    /// reports MAX_RT.
    pub fn with_auto_retransmit(self, delay_us: u16, count: u8) -> Self {
        Self {
            auto_retransmit_delay_us: delay_us,
            auto_retransmit_count: count,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_address_width()`].
    pub const fn address_width(&self) -> u8 {
        self.address_width
    }

    /// The address width in bytes (3 to 5), shared by all pipes.
    pub fn with_address_width(self, address_width: u8) -> Self {
        Self {
            address_width,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_crc_length()`].
    pub const fn crc_length(&self) -> CrcLength {
        self.crc_length
    }

    /// The Cyclical Redundancy Checksum length.
    ///
    /// Note that the hardware forces CRC on whenever auto-ack is enabled.
    pub fn with_crc_length(self, crc_length: CrcLength) -> Self {
        Self { crc_length, ..self }
    }

    /// Reject values the hardware cannot express.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.channel > 124 {
            return Err("channel must be 0..=124");
        }
        if self.payload_size == 0 || self.payload_size > 32 {
            return Err("payload size must be 1..=32");
        }
        if self.address_width < 3 || self.address_width > 5 {
            return Err("address width must be 3..=5");
        }
        validate_auto_retransmit(self.auto_retransmit_delay_us, self.auto_retransmit_count)
    }

    /// SETUP_RETR value: delay in the high nibble (in units of 250 µs,
    /// offset by one), count in the low nibble.
    pub(crate) const fn setup_retr_bits(&self) -> u8 {
        encode_setup_retr(self.auto_retransmit_delay_us, self.auto_retransmit_count)
    }

    /// RF_SETUP value combining the data-rate and PA bits.
    pub(crate) const fn rf_setup_bits(&self) -> u8 {
        self.data_rate.into_bits() | self.pa_level.into_bits()
    }
}

pub(crate) fn validate_auto_retransmit(delay_us: u16, count: u8) -> Result<(), &'static str> {
    if delay_us < 250 || delay_us > 4000 || delay_us % 250 != 0 {
        return Err("retransmit delay must be 250..=4000 us in steps of 250");
    }
    if count > 15 {
        return Err("retransmit count must be 0..=15");
    }
    Ok(())
}

pub(crate) const fn encode_setup_retr(delay_us: u16, count: u8) -> u8 {
    let ard = (delay_us / 250 - 1) as u8 & 0x0F;
    (ard << 4) | (count & 0x0F)
}

#[cfg(test)]
mod test {
    use super::{encode_setup_retr, RadioConfig};
    use crate::{Address, CrcLength, DataRate, PaLevel};

    #[test]
    fn defaults() {
        let config = RadioConfig::default();
        assert_eq!(config.channel(), 76);
        assert_eq!(config.rx_address(), Address::new([0xC2; 5]));
        assert_eq!(config.payload_size(), 32);
        assert!(!config.dynamic_payload());
        assert!(config.auto_ack());
        assert_eq!(config.data_rate(), DataRate::Kbps250);
        assert_eq!(config.pa_level(), PaLevel::Max);
        assert_eq!(config.auto_retransmit_delay(), 250);
        assert_eq!(config.auto_retransmit_count(), 3);
        assert_eq!(config.address_width(), 5);
        assert_eq!(config.crc_length(), CrcLength::Bit16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builders() {
        let config = RadioConfig::default()
            .with_channel(100)
            .with_rx_address(Address::new([0xB3; 5]))
            .with_payload_size(8)
            .with_dynamic_payload(true)
            .with_auto_ack(false)
            .with_data_rate(DataRate::Mbps2)
            .with_pa_level(PaLevel::Low)
            .with_auto_retransmit(1500, 10)
            .with_address_width(3)
            .with_crc_length(CrcLength::Bit8);
        assert_eq!(config.channel(), 100);
        assert_eq!(config.rx_address(), Address::new([0xB3; 5]));
        assert_eq!(config.payload_size(), 8);
        assert!(config.dynamic_payload());
        assert!(!config.auto_ack());
        assert_eq!(config.data_rate(), DataRate::Mbps2);
        assert_eq!(config.pa_level(), PaLevel::Low);
        assert_eq!(config.auto_retransmit_delay(), 1500);
        assert_eq!(config.auto_retransmit_count(), 10);
        assert_eq!(config.address_width(), 3);
        assert_eq!(config.crc_length(), CrcLength::Bit8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(RadioConfig::default().with_channel(125).validate().is_err());
        assert!(RadioConfig::default()
            .with_payload_size(0)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_payload_size(33)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_address_width(2)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_address_width(6)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_auto_retransmit(0, 3)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_auto_retransmit(4250, 3)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_auto_retransmit(300, 3)
            .validate()
            .is_err());
        assert!(RadioConfig::default()
            .with_auto_retransmit(250, 16)
            .validate()
            .is_err());
    }

    #[test]
    fn derived_register_values() {
        let config = RadioConfig::default();
        // 250 us delay encodes as 0, three retries in the low nibble.
        assert_eq!(config.setup_retr_bits(), 0x03);
        // 250 kbps + max PA
        assert_eq!(config.rf_setup_bits(), 0x26);

        assert_eq!(encode_setup_retr(4000, 15), 0xFF);
        assert_eq!(encode_setup_retr(500, 0), 0x10);
        let fast = config
            .with_data_rate(DataRate::Mbps2)
            .with_pa_level(PaLevel::Min);
        assert_eq!(fast.rf_setup_bits(), 0x08);
    }
}
