use bitfield_struct::bitfield;

use crate::types::CrcLength;

/// Cached view of the CONFIG register.
///
/// The three IRQ mask bits stay zero so every event (RX_DR, TX_DS, MAX_RT)
/// drives the IRQ pin.
#[bitfield(u8, order = Msb)]
pub(crate) struct Config {
    #[bits(1)]
    _padding: u8,

    /// MASK_RX_DR, MASK_TX_DS, MASK_MAX_RT; zero = event reflected on IRQ.
    #[bits(3)]
    _irq_masks: u8,

    /// EN_CRC and CRCO.
    #[bits(2, access = None, default = 3)]
    crc: u8,

    pub power: bool,

    pub is_rx: bool,
}

impl Config {
    pub(crate) const CRC_MASK: u8 = 0b1100;

    pub const fn crc_length(&self) -> CrcLength {
        CrcLength::from_bits(self.into_bits() & Self::CRC_MASK)
    }

    pub fn with_crc_length(self, length: CrcLength) -> Self {
        Self::from_bits(self.into_bits() & !Self::CRC_MASK | length.into_bits())
    }

    pub fn as_rx(self) -> Self {
        Self::from_bits(self.into_bits() | 1)
    }

    pub fn as_tx(self) -> Self {
        Self::from_bits(self.into_bits() & !1)
    }
}
