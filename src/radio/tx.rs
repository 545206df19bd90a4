use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{
    constants::{commands, registers},
    Nrf24, RadioError,
};
use crate::types::{Address, MAX_PAYLOAD_SIZE};

/// Pad added to the worst-case hardware retry time to cover bus traffic and
/// scheduling jitter, in microseconds.
const TX_TIMEOUT_PAD_US: u32 = 50_000;

/// STATUS polling cadence while a transmission is in flight.
const TX_POLL_INTERVAL_US: u32 = 1000;

impl<CE, SPI, DELAY> Nrf24<CE, SPI, DELAY>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Send `payload` to `dest` and wait for the outcome.
    ///
    /// With auto-ack enabled (the default) this returns `Ok` only once the
    /// receiver acknowledged the packet; [`RadioError::MaxRetries`] means
    /// every retransmission went unanswered. Without an IRQ line the
    /// completion is detected by polling STATUS at a 1 ms cadence, bounded
    /// by `retransmit delay x count + 50 ms` ([`RadioError::Timeout`]).
    ///
    /// With static payloads (dynamic disabled), `payload` may be at most
    /// [`RadioConfig::payload_size()`](fn@crate::RadioConfig::payload_size)
    /// bytes and is zero-padded on the air; with dynamic payloads the limit
    /// is 32 bytes and exactly `payload.len()` bytes are sent.
    ///
    /// The radio re-enters RX mode before returning, on success and on
    /// every failure path.
    pub fn transmit(
        &mut self,
        dest: Address,
        payload: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.transmit_inner(dest, payload, false)
    }

    /// Like [`Nrf24::transmit`] but flags the packet so the receiver does
    /// not reply with an acknowledgement.
    ///
    /// Preferred for broadcasts: receivers spend no airtime on ACKs the
    /// transmitter is not listening for. Completion is still signalled via
    /// TX_DS once the packet leaves the air.
    pub fn transmit_no_ack(
        &mut self,
        dest: Address,
        payload: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.transmit_inner(dest, payload, true)
    }

    /// Reachability probe: transmit a single zero byte to `addr`.
    ///
    /// Collapses every failure (unreachable, bus error) into `false`.
    pub fn ping(&mut self, addr: Address) -> bool {
        self.transmit(addr, &[0]).is_ok()
    }

    /// Queue `data` to ride along the next auto-ack frame sent from `pipe`.
    ///
    /// Requires auto-ack and dynamic payloads to be enabled.
    pub fn write_ack_payload(
        &mut self,
        pipe: u8,
        data: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        if !self.config.auto_ack() {
            return Err(RadioError::InvalidArgument(
                "ack payloads require auto-ack",
            ));
        }
        if !self.config.dynamic_payload() {
            return Err(RadioError::InvalidArgument(
                "ack payloads require dynamic payloads",
            ));
        }
        if pipe > 5 {
            return Err(RadioError::InvalidArgument("pipe must be 0..=5"));
        }
        if data.len() > MAX_PAYLOAD_SIZE {
            return Err(RadioError::InvalidArgument("ack payload exceeds 32 bytes"));
        }
        self.buf[0] = commands::W_ACK_PAYLOAD | pipe;
        self.buf[1..=data.len()].copy_from_slice(data);
        self.spi_transfer(data.len() + 1)
    }

    fn transmit_inner(
        &mut self,
        dest: Address,
        payload: &[u8],
        no_ack: bool,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        let limit = if self.config.dynamic_payload() {
            MAX_PAYLOAD_SIZE
        } else {
            self.config.payload_size() as usize
        };
        if payload.len() > limit {
            return Err(RadioError::InvalidArgument(
                "payload exceeds configured maximum",
            ));
        }

        let result = self
            .stop_listening()
            .and_then(|()| self.set_tx_target(dest))
            .and_then(|()| self.write_payload_and_wait(payload, no_ack));

        // Back to RX no matter how the transfer went.
        match result {
            Ok(()) => self.start_listening(),
            Err(e) => {
                let _ = self.start_listening();
                Err(e)
            }
        }
    }

    /// Point the transmitter at `addr`.
    ///
    /// Pipe 0 must mirror the TX address whenever auto-ack is in play; the
    /// acknowledgement comes back addressed to it.
    fn set_tx_target(&mut self, addr: Address) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.set_ce(false)?;
        let bytes = addr.into_bytes();
        let width = self.config.address_width() as usize;
        self.write_register_buf(registers::TX_ADDR, &bytes[..width])?;
        self.write_register_buf(registers::RX_ADDR_P0, &bytes[..width])?;
        self.delay.delay_us(1000);
        Ok(())
    }

    fn write_payload_and_wait(
        &mut self,
        payload: &[u8],
        no_ack: bool,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.buf[0] = if no_ack {
            commands::W_TX_PAYLOAD_NO_ACK
        } else {
            commands::W_TX_PAYLOAD
        };
        let len = if self.config.dynamic_payload() {
            payload.len()
        } else {
            self.config.payload_size() as usize
        };
        self.buf[1..=len].fill(0);
        self.buf[1..=payload.len()].copy_from_slice(payload);
        self.spi_transfer(len + 1)?;

        // 10 us of CE high clocks the payload out; anything in [10, 15] is fine.
        self.set_ce(true)?;
        self.delay.delay_us(15);
        self.set_ce(false)?;

        let timeout_us = self.config.auto_retransmit_delay() as u32
            * self.config.auto_retransmit_count() as u32
            + TX_TIMEOUT_PAD_US;
        let mut elapsed_us = 0u32;
        loop {
            self.command(commands::NOP)?;
            if self.status.tx_ds() || self.status.max_rt() {
                let unacknowledged = self.status.max_rt();
                self.clear_status()?;
                if unacknowledged {
                    self.command(commands::FLUSH_TX)?;
                    return Err(RadioError::MaxRetries);
                }
                return Ok(());
            }
            elapsed_us += TX_POLL_INTERVAL_US;
            if elapsed_us >= timeout_us {
                self.clear_status()?;
                self.command(commands::FLUSH_TX)?;
                return Err(RadioError::Timeout);
            }
            self.delay.delay_us(TX_POLL_INTERVAL_US);
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////
/// unit tests
#[cfg(test)]
mod test {
    extern crate std;
    use super::{commands, registers};
    use crate::{
        radio::RadioError, spi_test_expects, test::mk_radio, test::mk_radio_config, Address,
        RadioConfig,
    };
    use embedded_hal_mock::eh1::{
        digital::{State as PinState, Transaction as PinTransaction},
        spi::Transaction as SpiTransaction,
    };
    use std::{vec, vec::Vec};

    const DEST: [u8; 5] = [1, 2, 3, 4, 5];

    fn transmit_ce_expects() -> [PinTransaction; 6] {
        [
            // stop_listening
            PinTransaction::set(PinState::Low),
            // set_tx_target
            PinTransaction::set(PinState::Low),
            // transmit pulse
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            // start_listening
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]
    }

    /// Expectations up to and including the payload upload, static 32 byte
    /// payloads.
    fn transmit_prologue_expects(opcode: u8, payload: &[u8]) -> Vec<SpiTransaction<u8>> {
        let mut tx_addr = vec![registers::TX_ADDR | commands::W_REGISTER];
        tx_addr.extend_from_slice(&DEST);
        let mut p0_addr = vec![registers::RX_ADDR_P0 | commands::W_REGISTER];
        p0_addr.extend_from_slice(&DEST);
        let mut buf = vec![0u8; 33];
        buf[0] = opcode;
        buf[1..=payload.len()].copy_from_slice(payload);
        spi_test_expects![
            // stop_listening clears PRIM_RX
            (
                vec![registers::CONFIG | commands::W_REGISTER, 0x0Cu8],
                vec![0xEu8, 0u8],
            ),
            // TX address and its pipe 0 mirror
            (tx_addr, vec![0u8; 6]),
            (p0_addr, vec![0u8; 6]),
            // zero-padded payload upload
            (buf, vec![0u8; 33]),
        ]
        .to_vec()
    }

    fn start_listening_expects() -> Vec<SpiTransaction<u8>> {
        spi_test_expects![
            (
                vec![registers::CONFIG | commands::W_REGISTER, 0x0Du8],
                vec![0xEu8, 0u8],
            ),
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
            (vec![commands::FLUSH_RX], vec![0xEu8]),
        ]
        .to_vec()
    }

    #[test]
    pub fn transmit_success() {
        let mut spi_expectations = transmit_prologue_expects(commands::W_TX_PAYLOAD, b"hello");
        spi_expectations.extend(spi_test_expects![
            // first poll reports TX_DS
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
        ]);
        spi_expectations.extend(start_listening_expects());
        let mocks = mk_radio(&transmit_ce_expects(), &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio.transmit(Address::new(DEST), b"hello").unwrap();
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn transmit_max_retries() {
        let mut spi_expectations = transmit_prologue_expects(commands::W_TX_PAYLOAD, b"hello");
        spi_expectations.extend(spi_test_expects![
            // MAX_RT asserted
            (vec![commands::NOP], vec![0x1Eu8]),
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
            // stale payload is dropped
            (vec![commands::FLUSH_TX], vec![0xEu8]),
        ]);
        spi_expectations.extend(start_listening_expects());
        let mocks = mk_radio(&transmit_ce_expects(), &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        assert_eq!(
            radio.transmit(Address::new(DEST), b"hello"),
            Err(RadioError::MaxRetries)
        );
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn transmit_timeout() {
        let mut spi_expectations = transmit_prologue_expects(commands::W_TX_PAYLOAD, b"hello");
        // STATUS never reports TX_DS nor MAX_RT; supervision polls once per
        // millisecond until the computed ceiling (250 us x 3 + 50 ms).
        let polls = (250u32 * 3 + 50_000).div_ceil(1000);
        for _ in 0..polls {
            spi_expectations.extend(spi_test_expects![(vec![commands::NOP], vec![0x0Eu8]),]);
        }
        spi_expectations.extend(spi_test_expects![
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
            (vec![commands::FLUSH_TX], vec![0xEu8]),
        ]);
        spi_expectations.extend(start_listening_expects());
        let mocks = mk_radio(&transmit_ce_expects(), &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        assert_eq!(
            radio.transmit(Address::new(DEST), b"hello"),
            Err(RadioError::Timeout)
        );
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn transmit_no_ack_opcode() {
        let mut tx_addr = vec![registers::TX_ADDR | commands::W_REGISTER];
        tx_addr.extend_from_slice(&DEST);
        let mut p0_addr = vec![registers::RX_ADDR_P0 | commands::W_REGISTER];
        p0_addr.extend_from_slice(&DEST);
        // dynamic payloads: exactly the given bytes, no padding
        let mut buf = vec![commands::W_TX_PAYLOAD_NO_ACK];
        buf.extend_from_slice(b"hello");

        let mut spi_expectations = spi_test_expects![
            (
                vec![registers::CONFIG | commands::W_REGISTER, 0x0Cu8],
                vec![0xEu8, 0u8],
            ),
            (tx_addr, vec![0u8; 6]),
            (p0_addr, vec![0u8; 6]),
            (buf, vec![0u8; 6]),
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
        ]
        .to_vec();
        spi_expectations.extend(start_listening_expects());
        let mocks = mk_radio_config(
            &transmit_ce_expects(),
            &spi_expectations,
            RadioConfig::default().with_dynamic_payload(true),
        );
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio
            .transmit_no_ack(Address::new(DEST), b"hello")
            .unwrap();
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn transmit_oversized_payload() {
        let mocks = mk_radio_config(
            &[],
            &[],
            RadioConfig::default().with_payload_size(4),
        );
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        // no bus traffic happens for a rejected payload
        assert!(matches!(
            radio.transmit(Address::new(DEST), b"hello"),
            Err(RadioError::InvalidArgument(_))
        ));
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn ping_outcomes() {
        let mut spi_expectations = transmit_prologue_expects(commands::W_TX_PAYLOAD, &[0]);
        spi_expectations.extend(spi_test_expects![
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
        ]);
        spi_expectations.extend(start_listening_expects());
        // second ping: unreachable peer (MAX_RT)
        spi_expectations.extend(transmit_prologue_expects(commands::W_TX_PAYLOAD, &[0]));
        spi_expectations.extend(spi_test_expects![
            (vec![commands::NOP], vec![0x1Eu8]),
            (
                vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
                vec![0xEu8, 0u8],
            ),
            (vec![commands::FLUSH_TX], vec![0xEu8]),
        ]);
        spi_expectations.extend(start_listening_expects());

        let mut ce_expectations = transmit_ce_expects().to_vec();
        ce_expectations.extend(transmit_ce_expects());
        let mocks = mk_radio(&ce_expectations, &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        assert!(radio.ping(Address::new(DEST)));
        assert!(!radio.ping(Address::new(DEST)));
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn ack_payload_preconditions() {
        let mocks = mk_radio(&[], &[]);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        // dynamic payloads are off by default
        assert!(matches!(
            radio.write_ack_payload(1, b"hi"),
            Err(RadioError::InvalidArgument(_))
        ));
        spi.done();
        ce_pin.done();

        let mocks = mk_radio_config(
            &[],
            &[],
            RadioConfig::default()
                .with_dynamic_payload(true)
                .with_auto_ack(false),
        );
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        assert!(matches!(
            radio.write_ack_payload(1, b"hi"),
            Err(RadioError::InvalidArgument(_))
        ));
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn ack_payload_write() {
        let spi_expectations = spi_test_expects![
            (
                vec![commands::W_ACK_PAYLOAD | 2, 0x55u8, 0x55u8, 0x55u8],
                vec![0u8; 4],
            ),
        ];
        let mocks = mk_radio_config(
            &[],
            &spi_expectations,
            RadioConfig::default().with_dynamic_payload(true),
        );
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio.write_ack_payload(2, &[0x55; 3]).unwrap();
        // out of range arguments never reach the bus
        assert!(matches!(
            radio.write_ack_payload(6, &[0x55; 3]),
            Err(RadioError::InvalidArgument(_))
        ));
        assert!(matches!(
            radio.write_ack_payload(2, &[0x55; 33]),
            Err(RadioError::InvalidArgument(_))
        ));
        spi.done();
        ce_pin.done();
    }
}
