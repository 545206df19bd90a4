//! Register offsets, SPI opcodes, and bit mnemonics for the nRF24L01+.

/// Register addresses, readable with the implicit `R_REGISTER` command
/// (the address itself) and writable with [`commands::W_REGISTER`]` | addr`.
pub mod registers {
    pub const CONFIG: u8 = 0x00;
    pub const EN_AA: u8 = 0x01;
    pub const EN_RXADDR: u8 = 0x02;
    pub const SETUP_AW: u8 = 0x03;
    pub const SETUP_RETR: u8 = 0x04;
    pub const RF_CH: u8 = 0x05;
    pub const RF_SETUP: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const OBSERVE_TX: u8 = 0x08;
    pub const RPD: u8 = 0x09;
    /// RX_ADDR_P1..P5 follow at consecutive offsets.
    pub const RX_ADDR_P0: u8 = 0x0A;
    pub const TX_ADDR: u8 = 0x10;
    /// RX_PW_P1..P5 follow at consecutive offsets.
    pub const RX_PW_P0: u8 = 0x11;
    pub const DYNPD: u8 = 0x1C;
    pub const FEATURE: u8 = 0x1D;
}

/// SPI command opcodes.
pub mod commands {
    pub const W_REGISTER: u8 = 0x20;
    pub const R_RX_PL_WID: u8 = 0x60;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    /// OR with the pipe number (0-5).
    pub const W_ACK_PAYLOAD: u8 = 0xA8;
    pub const W_TX_PAYLOAD_NO_ACK: u8 = 0xB0;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const NOP: u8 = 0xFF;
}

/// Bit definitions for the registers the driver programs.
pub mod bits {
    // CONFIG
    pub const PRIM_RX: u8 = 1 << 0;
    pub const PWR_UP: u8 = 1 << 1;
    pub const CRCO: u8 = 1 << 2;
    pub const EN_CRC: u8 = 1 << 3;

    // EN_AA / EN_RXADDR / DYNPD
    pub const ERX_P0: u8 = 1 << 0;
    pub const ERX_P1: u8 = 1 << 1;

    // RF_SETUP
    pub const RF_DR_HIGH: u8 = 1 << 3;
    pub const RF_DR_LOW: u8 = 1 << 5;

    // FEATURE
    /// Permit `W_TX_PAYLOAD_NO_ACK`.
    pub const EN_DYN_ACK: u8 = 1 << 0;
    pub const EN_ACK_PAY: u8 = 1 << 1;
    pub const EN_DPL: u8 = 1 << 2;
}
