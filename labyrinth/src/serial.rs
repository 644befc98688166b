//! Flow-controlled serial link to the motion controller module.
//!
//! Receive: the byte interrupt appends to a ring buffer and asks the peer to
//! pause once occupancy reaches the high watermark. A single drain loop, kept
//! unique by a dispatch guard, hands bytes to the receive callback in arrival
//! order and releases the pause when occupancy drops below the low watermark.
//! Bytes arriving while the loop runs are picked up by that same loop.
//!
//! Transmit: one byte may be outstanding. It is written from the
//! transmit-empty interrupt unless the peer asks us to pause, in which case it
//! waits for the handshake line to clear. With nothing outstanding the
//! transmit-empty interrupt pulls more data through the ready callback.
//!
//! Callbacks always run outside the critical section, so they may call
//! [`SerialTransport::send`] and may be preempted by other interrupts.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};
use log::{debug, info, trace};

use crate::config::Watermarks;
use crate::context::{Handshake, SerialPort};
use crate::error::Error;
use crate::ring::RingBuffer;

/// Counters kept for diagnostics
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkDiagnostics {
    /// Received bytes dropped on a full buffer
    pub overruns: u32,
    /// Highest buffer occupancy seen
    pub peak: usize,
    /// Times the peer has been asked to pause
    pub pauses: u32,
}

struct LinkState<const N: usize> {
    rx: RingBuffer<N>,
    local_paused: bool,
    dispatching: bool,
    pending: Option<u8>,
    tx_paused: bool,
    ready: bool,
    peak: usize,
    pauses: u32,
}

impl<const N: usize> LinkState<N> {
    const fn new() -> Self {
        Self {
            rx: RingBuffer::new(),
            local_paused: false,
            dispatching: false,
            pending: None,
            tx_paused: false,
            ready: false,
            peak: 0,
            pauses: 0,
        }
    }
}

enum TxAction {
    Idle,
    Written(u8),
    Pull,
}

pub struct SerialTransport<P, H, R, T, const N: usize>
where
    P: SerialPort,
    H: Handshake,
    R: Fn(u8),
    T: Fn(),
{
    port: P,
    handshake: H,
    on_receive: R,
    on_ready: T,
    marks: Watermarks,
    state: Mutex<RefCell<LinkState<N>>>,
}

impl<P, H, R, T, const N: usize> SerialTransport<P, H, R, T, N>
where
    P: SerialPort,
    H: Handshake,
    R: Fn(u8),
    T: Fn(),
{
    /// Assemble a transport; see [`crate::builder::LinkBuilder`] for the
    /// checked variant.
    pub const fn new(port: P, handshake: H, on_receive: R, on_ready: T, marks: Watermarks) -> Self {
        Self {
            port,
            handshake,
            on_receive,
            on_ready,
            marks,
            state: Mutex::new(RefCell::new(LinkState::new())),
        }
    }

    /// Hold the peer in reset with both directions idle.
    ///
    /// The port stays disabled until [`Self::on_reset_elapsed`].
    pub fn initialize(&self) {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            *st = LinkState::new();
            self.handshake.set_local_pause(false);
            self.port.unlisten_transmit_empty();
            self.handshake.hold_peer_in_reset(true);
        });
        info!("link reset, capacity {} watermarks {:?}", N, self.marks);
    }

    /// Reset delay timer interrupt handler: release the peer and open the port
    pub fn on_reset_elapsed(&self) {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            self.handshake.hold_peer_in_reset(false);
            self.port.enable();
            st.ready = true;
            if st.pending.is_some() && !st.tx_paused {
                self.port.listen_transmit_empty();
            }
        });
        info!("link up");
    }

    /// Received-byte interrupt handler: enqueue, then drain unless a drain
    /// is already running further down the stack.
    pub fn on_receive_interrupt(&self) {
        if self.receive() {
            self.dispatch();
        }
    }

    /// Move the received byte into the buffer and apply backpressure.
    ///
    /// Returns whether a drain has to be started.
    pub fn receive(&self) -> bool {
        let byte = self.port.read_byte();
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            // a full buffer drops the byte, the ring buffer counts it
            let _ = st.rx.push(byte);
            let len = st.rx.len();
            if len > st.peak {
                st.peak = len;
            }
            if len >= self.marks.high && !st.local_paused {
                self.pause_peer(cs, &mut st, true);
            }
            trace!("rx {:#04x}, {} buffered", byte, len);
            !st.dispatching && !st.rx.is_empty()
        })
    }

    /// Drain the buffer into the receive callback.
    ///
    /// Returns immediately when another drain is active.
    pub fn dispatch(&self) {
        let claimed = critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if st.dispatching {
                false
            } else {
                st.dispatching = true;
                true
            }
        });
        if !claimed {
            return;
        }

        loop {
            let next = critical_section::with(|cs| {
                let mut st = self.state.borrow_ref_mut(cs);
                let byte = st.rx.pop();
                if st.local_paused && st.rx.len() < self.marks.low {
                    self.pause_peer(cs, &mut st, false);
                }
                if byte.is_none() {
                    st.dispatching = false;
                }
                byte
            });
            match next {
                Some(byte) => (self.on_receive)(byte),
                None => break,
            }
        }
    }

    /// Queue one byte for transmission.
    ///
    /// Fails with [`Error::Busy`] while an earlier byte is still waiting.
    pub fn send(&self, byte: u8) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if st.pending.is_some() {
                return Err(Error::Busy);
            }
            st.pending = Some(byte);
            if self.handshake.peer_paused() {
                st.tx_paused = true;
                debug!("peer paused, holding {:#04x}", byte);
            } else if st.ready {
                self.port.listen_transmit_empty();
            }
            Ok(())
        })
    }

    /// Transmit-empty interrupt handler
    pub fn on_transmit_empty(&self) {
        let action = critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            self.port.unlisten_transmit_empty();
            if st.tx_paused {
                return TxAction::Idle;
            }
            match st.pending {
                Some(_) if self.handshake.peer_paused() => {
                    st.tx_paused = true;
                    TxAction::Idle
                }
                Some(byte) => {
                    st.pending = None;
                    self.port.write_byte(byte);
                    self.port.listen_transmit_empty();
                    TxAction::Written(byte)
                }
                None => TxAction::Pull,
            }
        });
        match action {
            TxAction::Written(byte) => trace!("tx {:#04x}", byte),
            TxAction::Pull => (self.on_ready)(),
            TxAction::Idle => {}
        }
    }

    /// Pin-change interrupt handler for the peer's pause line
    pub fn on_handshake_change(&self) {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if st.tx_paused && !self.handshake.peer_paused() {
                st.tx_paused = false;
                debug!("peer resumed");
                if st.ready {
                    self.port.listen_transmit_empty();
                }
            }
        });
    }

    /// We are asking the peer to pause
    pub fn is_local_paused(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).local_paused)
    }

    /// A byte is held back by the peer's pause request
    pub fn is_tx_paused(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).tx_paused)
    }

    /// A byte is waiting for the transmitter
    pub fn is_sending(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).pending.is_some())
    }

    pub fn is_ready(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).ready)
    }

    pub fn buffered(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).rx.len())
    }

    pub fn diagnostics(&self) -> LinkDiagnostics {
        critical_section::with(|cs| {
            let st = self.state.borrow_ref(cs);
            LinkDiagnostics {
                overruns: st.rx.overruns(),
                peak: st.peak,
                pauses: st.pauses,
            }
        })
    }

    pub fn watermarks(&self) -> Watermarks {
        self.marks
    }

    fn pause_peer(&self, _cs: CriticalSection<'_>, st: &mut LinkState<N>, asserted: bool) {
        st.local_paused = asserted;
        if asserted {
            st.pauses = st.pauses.wrapping_add(1);
        }
        self.handshake.set_local_pause(asserted);
        debug!("local pause {}, {} buffered", if asserted { "on" } else { "off" }, st.rx.len());
    }
}
