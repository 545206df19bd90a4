//! Value types shared by the core driver and the hosted envelope.

use core::{
    fmt::{Debug, Display, Formatter, Result},
    ops::Deref,
    write,
};

use bitfield_struct::bitfield;

/// Largest payload the radio can carry in a single packet.
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// An on-air address.
///
/// The radio matches the first `address_width` (3 to 5) bytes configured via
/// [`RadioConfig::with_address_width()`](fn@crate::RadioConfig::with_address_width);
/// any trailing bytes are ignored. Stored least significant byte first, as
/// the hardware shifts it out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Address([u8; 5]);

impl Address {
    pub const fn new(bytes: [u8; 5]) -> Self {
        Self(bytes)
    }

    pub const fn into_bytes(self) -> [u8; 5] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 5]> for Address {
    fn from(bytes: [u8; 5]) -> Self {
        Self(bytes)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4]
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Address {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}",
            self.0[0],
            self.0[1],
            self.0[2],
            self.0[3],
            self.0[4]
        )
    }
}

/// A packet received from the radio.
///
/// This owns a copy of the bytes taken from the RX FIFO, so it stays valid
/// after the driver reuses its internal transfer buffer for the next command.
/// Derefs to `&[u8]` of the actual packet length.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    bytes: [u8; MAX_PAYLOAD_SIZE],
    len: u8,
}

impl Payload {
    /// `data` must not exceed [`MAX_PAYLOAD_SIZE`]; the driver guarantees it.
    pub(crate) fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_PAYLOAD_SIZE];
        bytes[..data.len()].copy_from_slice(data);
        Self {
            bytes,
            len: data.len() as u8,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Deref for Payload {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Payload({:02X?})", self.as_slice())
    }
}

/// How fast data moves through the air, in bits per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataRate {
    /// 250 kbps. The slowest rate, with the best receiver sensitivity.
    Kbps250,
    /// 1 Mbps
    Mbps1,
    /// 2 Mbps
    Mbps2,
}

impl DataRate {
    /// RF_SETUP bits: RF_DR_LOW (bit 5) and RF_DR_HIGH (bit 3).
    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            DataRate::Kbps250 => 1 << 5,
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => 1 << 3,
        }
    }
}

impl Display for DataRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DataRate::Kbps250 => write!(f, "250 kbps"),
            DataRate::Mbps1 => write!(f, "1 Mbps"),
            DataRate::Mbps2 => write!(f, "2 Mbps"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DataRate {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DataRate::Kbps250 => defmt::write!(fmt, "250 kbps"),
            DataRate::Mbps1 => defmt::write!(fmt, "1 Mbps"),
            DataRate::Mbps2 => defmt::write!(fmt, "2 Mbps"),
        }
    }
}

/// Power Amplifier level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaLevel {
    /// -18 dBm
    Min,
    /// -12 dBm
    Low,
    /// -6 dBm
    High,
    /// 0 dBm
    Max,
}

impl PaLevel {
    /// RF_SETUP bits 2:1 (RF_PWR).
    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            PaLevel::Min => 0,
            PaLevel::Low => 1 << 1,
            PaLevel::High => 2 << 1,
            PaLevel::Max => 3 << 1,
        }
    }
}

impl Display for PaLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            PaLevel::Min => write!(f, "-18 dBm"),
            PaLevel::Low => write!(f, "-12 dBm"),
            PaLevel::High => write!(f, "-6 dBm"),
            PaLevel::Max => write!(f, "0 dBm"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PaLevel {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PaLevel::Min => defmt::write!(fmt, "-18 dBm"),
            PaLevel::Low => defmt::write!(fmt, "-12 dBm"),
            PaLevel::High => defmt::write!(fmt, "-6 dBm"),
            PaLevel::Max => defmt::write!(fmt, "0 dBm"),
        }
    }
}

/// The length of the CRC checksum appended to every packet (if any).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrcLength {
    /// No CRC checksum is used.
    Disabled,
    /// 8 bit checksum
    Bit8,
    /// 16 bit checksum
    Bit16,
}

impl CrcLength {
    /// CONFIG bits: EN_CRC (bit 3) and CRCO (bit 2).
    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            CrcLength::Disabled => 0,
            CrcLength::Bit8 => 8,
            CrcLength::Bit16 => 12,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value {
            0 => CrcLength::Disabled,
            8 => CrcLength::Bit8,
            _ => CrcLength::Bit16,
        }
    }
}

impl Display for CrcLength {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            CrcLength::Disabled => write!(f, "disabled"),
            CrcLength::Bit8 => write!(f, "8 bit"),
            CrcLength::Bit16 => write!(f, "16 bit"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CrcLength {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CrcLength::Disabled => defmt::write!(fmt, "disabled"),
            CrcLength::Bit8 => defmt::write!(fmt, "8 bit"),
            CrcLength::Bit16 => defmt::write!(fmt, "16 bit"),
        }
    }
}

/// A view of the radio's STATUS register.
///
/// The STATUS byte is shifted out on every SPI transaction, so the driver
/// refreshes its copy for free with each command it issues.
#[bitfield(u8, new = false, order = Msb)]
pub struct StatusFlags {
    #[bits(1)]
    _padding: u8,

    /// RX Data Ready: a payload arrived in the RX FIFO.
    #[bits(1, access = RO)]
    pub rx_dr: bool,

    /// TX Data Sent: the last payload left the air (and was acknowledged
    /// when auto-ack is enabled).
    #[bits(1, access = RO)]
    pub tx_ds: bool,

    /// Maximum retransmissions reached without an acknowledgement.
    #[bits(1, access = RO)]
    pub max_rt: bool,

    /// Pipe number of the payload at the head of the RX FIFO.
    /// `0b111` means the RX FIFO is empty.
    #[bits(3, access = RO)]
    pub rx_pipe: u8,

    /// The TX FIFO cannot accept another payload.
    #[bits(1, access = RO)]
    pub tx_full: bool,
}

impl StatusFlags {
    /// Mask isolating the three write-1-to-clear interrupt bits.
    pub(crate) const IRQ_MASK: u8 = 0x70;

    /// RX_P_NO value reported when the RX FIFO holds no payload.
    pub(crate) const RX_FIFO_EMPTY: u8 = 0b111;
}

impl Display for StatusFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt()
        )
    }
}
