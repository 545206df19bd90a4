//! Hosted (std) envelope around the core driver.
//!
//! [`Device`] serializes every register-touching operation behind a mutex so
//! the radio can be shared between threads, and adds the blocking receive
//! path: a capacity-one interrupt signal fed by a falling-edge watch on the
//! radio's IRQ pin, with cooperative cancellation via [`CancelToken`].
//!
//! The IRQ pin is abstracted by the [`IrqPin`] trait because `embedded-hal`
//! has no edge-notification capability; implement it with whatever GPIO
//! library drives your platform (e.g. an epoll-backed watcher on Linux).

use core::fmt::{Debug, Display, Formatter};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread,
    time::Duration,
};

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    types::{Address, Payload, StatusFlags},
    Nrf24, RadioConfig, RadioError,
};

/// Polling cadence for [`Device::receive_blocking`] when no IRQ pin is wired.
const RX_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Granularity at which blocking waits re-check their [`CancelToken`].
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// The signal edge a [`IrqPin::watch`] subscription fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// Callback invoked by the pin driver on each observed edge.
pub type IrqHandler = Box<dyn FnMut() + Send>;

/// An interrupt-capable input pin, implemented by platform glue.
///
/// The nRF24L01+ IRQ line is active low, so [`Device`] subscribes to
/// [`Edge::Falling`]. `watch` is expected to configure the pin as an input
/// with a pull-up before arming the edge detection.
pub trait IrqPin {
    type Error: Debug;

    /// Arm edge detection; `handler` is called from the pin driver's
    /// context on every observed `edge` until [`IrqPin::unwatch`].
    fn watch(&mut self, edge: Edge, handler: IrqHandler) -> Result<(), Self::Error>;

    /// Disarm edge detection and drop the handler.
    fn unwatch(&mut self);

    /// Current line level; `true` while the radio holds the line asserted.
    fn is_low(&self) -> bool;
}

/// Cooperative cancellation for the blocking waits.
///
/// Clones share one flag; cancelling any clone releases every wait that was
/// given one of them. Cancellation is honored between bus transactions and
/// while sleeping, never in the middle of a transfer.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Capacity-one interrupt slot.
///
/// The producer side ([`IrqSignal::raise`]) never blocks on a waiting
/// consumer and collapses bursts: raising an already-raised signal is a
/// no-op, which is exactly the drop-when-full queue the edge callback needs.
struct IrqSignal {
    pending: Mutex<bool>,
    edge: Condvar,
}

impl IrqSignal {
    fn new() -> Self {
        Self {
            pending: Mutex::new(false),
            edge: Condvar::new(),
        }
    }

    fn raise(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = true;
        self.edge.notify_one();
    }

    /// Wait up to `timeout` for a token; drains it when one arrives.
    fn wait(&self, timeout: Duration) -> bool {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut pending, _) = self
            .edge
            .wait_timeout_while(pending, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        let raised = *pending;
        *pending = false;
        raised
    }
}

/// Construction errors of [`Device`].
#[derive(Debug)]
pub enum DeviceError<SPI, PIN> {
    /// The core driver failed while configuring the radio.
    Radio(RadioError<SPI, PIN>),
    /// Subscribing to falling edges on the IRQ pin failed; carries the pin
    /// driver's error rendered via `Debug`.
    IrqSetup(String),
}

impl<SPI, PIN> From<RadioError<SPI, PIN>> for DeviceError<SPI, PIN> {
    fn from(e: RadioError<SPI, PIN>) -> Self {
        DeviceError::Radio(e)
    }
}

/// A thread-safe nRF24L01+ handle.
///
/// All methods take `&self`; a mutex makes every register-touching
/// operation appear atomic to concurrent callers, in the order their lock
/// acquisitions linearize.
pub struct Device<CE, SPI, DELAY, IRQ> {
    radio: Mutex<Nrf24<CE, SPI, DELAY>>,
    irq: Option<IRQ>,
    signal: Arc<IrqSignal>,
}

impl<CE, SPI, DELAY, IRQ> Device<CE, SPI, DELAY, IRQ>
where
    CE: OutputPin,
    SPI: SpiDevice,
    DELAY: DelayNs,
    IRQ: IrqPin,
{
    /// Configure the radio and start listening.
    ///
    /// When `irq` is given, a falling-edge watch is armed before the radio
    /// is brought up; without it, [`Device::receive_blocking`] falls back
    /// to polling. Either the returned device is live and listening, or an
    /// error is returned with the edge watch released and the radio left
    /// untouched beyond the failed configuration attempt.
    pub fn new(
        ce_pin: CE,
        spi: SPI,
        delay: DELAY,
        config: RadioConfig,
        mut irq: Option<IRQ>,
    ) -> Result<Self, DeviceError<SPI::Error, CE::Error>> {
        let signal = Arc::new(IrqSignal::new());
        if let Some(pin) = irq.as_mut() {
            let slot = Arc::clone(&signal);
            pin.watch(Edge::Falling, Box::new(move || slot.raise()))
                .map_err(|e| DeviceError::IrqSetup(format!("{e:?}")))?;
        }

        let mut radio = Nrf24::new(ce_pin, spi, delay, config);
        if let Err(e) = radio.init() {
            if let Some(pin) = irq.as_mut() {
                pin.unwatch();
            }
            return Err(DeviceError::Radio(e));
        }

        log::info!("{radio} ready");
        Ok(Self {
            radio: Mutex::new(radio),
            irq,
            signal,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Nrf24<CE, SPI, DELAY>> {
        self.radio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`Nrf24::transmit`].
    pub fn transmit(
        &self,
        dest: Address,
        payload: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().transmit(dest, payload)
    }

    /// See [`Nrf24::transmit_no_ack`].
    pub fn transmit_no_ack(
        &self,
        dest: Address,
        payload: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().transmit_no_ack(dest, payload)
    }

    /// See [`Nrf24::receive`].
    pub fn receive(&self) -> Result<Option<Payload>, RadioError<SPI::Error, CE::Error>> {
        self.lock().receive()
    }

    /// See [`Nrf24::ping`].
    pub fn ping(&self, addr: Address) -> bool {
        self.lock().ping(addr)
    }

    /// See [`Nrf24::write_ack_payload`].
    pub fn write_ack_payload(
        &self,
        pipe: u8,
        data: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().write_ack_payload(pipe, data)
    }

    /// See [`Nrf24::open_rx_pipe`].
    pub fn open_rx_pipe(
        &self,
        pipe: u8,
        address: &[u8],
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().open_rx_pipe(pipe, address)
    }

    /// See [`Nrf24::close_rx_pipe`].
    pub fn close_rx_pipe(&self, pipe: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().close_rx_pipe(pipe)
    }

    /// See [`Nrf24::set_channel`].
    pub fn set_channel(&self, channel: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().set_channel(channel)
    }

    /// See [`Nrf24::set_data_rate`].
    pub fn set_data_rate(
        &self,
        rate: crate::DataRate,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().set_data_rate(rate)
    }

    /// See [`Nrf24::set_pa_level`].
    pub fn set_pa_level(
        &self,
        level: crate::PaLevel,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().set_pa_level(level)
    }

    /// See [`Nrf24::set_auto_retransmit`].
    pub fn set_auto_retransmit(
        &self,
        delay_us: u16,
        count: u8,
    ) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().set_auto_retransmit(delay_us, count)
    }

    /// See [`Nrf24::set_address_width`].
    pub fn set_address_width(&self, width: u8) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().set_address_width(width)
    }

    /// See [`Nrf24::status`].
    pub fn status(&self) -> Result<StatusFlags, RadioError<SPI::Error, CE::Error>> {
        self.lock().status()
    }

    /// See [`Nrf24::retransmission_counters`].
    pub fn retransmission_counters(&self) -> Result<(u8, u8), RadioError<SPI::Error, CE::Error>> {
        self.lock().retransmission_counters()
    }

    /// See [`Nrf24::carrier_detected`].
    pub fn carrier_detected(&self) -> Result<bool, RadioError<SPI::Error, CE::Error>> {
        self.lock().carrier_detected()
    }

    /// See [`Nrf24::flush_tx`].
    pub fn flush_tx(&self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().flush_tx()
    }

    /// See [`Nrf24::flush_rx`].
    pub fn flush_rx(&self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().flush_rx()
    }

    /// See [`Nrf24::power_up`].
    pub fn power_up(&self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().power_up()
    }

    /// See [`Nrf24::power_down`].
    pub fn power_down(&self) -> Result<(), RadioError<SPI::Error, CE::Error>> {
        self.lock().power_down()
    }

    /// Block until the radio asserts its IRQ line, then return STATUS.
    ///
    /// Returns immediately (with a fresh STATUS read) when the line is
    /// already low. The mutex is *not* held while waiting, so other threads
    /// keep making progress.
    pub fn wait_for_interrupt(
        &self,
        cancel: &CancelToken,
    ) -> Result<StatusFlags, RadioError<SPI::Error, CE::Error>> {
        let Some(pin) = self.irq.as_ref() else {
            return Err(RadioError::IrqNotConfigured);
        };
        if pin.is_low() {
            return self.lock().status();
        }
        loop {
            if cancel.is_cancelled() {
                return Err(RadioError::Cancelled);
            }
            if self.signal.wait(WAIT_SLICE) {
                return self.lock().status();
            }
        }
    }

    /// Block until a payload arrives or `cancel` fires.
    ///
    /// Waits on the IRQ line when one is configured; otherwise polls the
    /// radio every 5 ms. Wake-ups for events other than RX_DR (a MAX_RT
    /// from a concurrent transmit, a stale flag) are cleared and waited
    /// through.
    pub fn receive_blocking(
        &self,
        cancel: &CancelToken,
    ) -> Result<Payload, RadioError<SPI::Error, CE::Error>> {
        loop {
            if cancel.is_cancelled() {
                return Err(RadioError::Cancelled);
            }
            if let Some(payload) = self.lock().receive()? {
                return Ok(payload);
            }
            if self.irq.is_some() {
                let status = self.wait_for_interrupt(cancel)?;
                if status.rx_dr() {
                    continue;
                }
                // Some other event pulled the line low; clear it so the
                // next edge can fire.
                self.lock().clear_interrupts(status)?;
            } else {
                if cancel.is_cancelled() {
                    return Err(RadioError::Cancelled);
                }
                thread::sleep(RX_POLL_INTERVAL);
            }
        }
    }

    /// Power the radio down and release every resource.
    ///
    /// Secondary failures (e.g. the power-down write on a dead bus) are
    /// logged rather than returned; the edge watch and the bus handle are
    /// released regardless.
    pub fn close(mut self) {
        let radio = self.radio.get_mut().unwrap_or_else(PoisonError::into_inner);
        match radio.power_down() {
            Ok(()) => log::info!("radio powered down"),
            Err(e) => log::warn!("power-down on close failed: {e:?}"),
        }
        if let Some(pin) = self.irq.as_mut() {
            pin.unwatch();
        }
        log::info!("radio device closed");
        // Dropping self releases the bus and pin handles.
    }
}

impl<CE, SPI, DELAY, IRQ> Display for Device<CE, SPI, DELAY, IRQ> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let radio = self.radio.lock().unwrap_or_else(PoisonError::into_inner);
        Display::fmt(&*radio, f)
    }
}
