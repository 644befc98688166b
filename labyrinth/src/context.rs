//! Hardware the core is driven by.
//!
//! Every method takes `&self`: one peripheral is touched both from its
//! interrupt handler and from the main loop, so implementors keep their state
//! in registers or behind a critical section.

use core::time::Duration;

/// Periodic compare timer in reset-on-match mode
pub trait TickTimer {
    /// Program the period and start counting with the match interrupt enabled
    fn start(&self, period: Duration);
    /// Change period (and prescaler) of a running timer
    fn reprogram(&self, period: Duration);
    /// Clear the pending match event
    ///
    /// Called first thing by every timer interrupt handler
    fn acknowledge(&self);
}

/// Analog input channels the sampler alternates between
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    /// The external analog control (volume knob)
    Primary,
    /// Differential/noise channel harvested for entropy
    Entropy,
}

/// Analog-to-digital converter running single, externally triggered conversions
pub trait Converter {
    /// Bits in a conversion result
    const RESOLUTION: u32;

    /// Power the converter up with the conversion-complete interrupt enabled
    fn enable(&self);
    /// Route `channel` to the converter (multiplexer and reference)
    fn select(&self, channel: Channel);
    /// Request one conversion
    fn start(&self);
    /// Right-aligned result of the last conversion
    fn read(&self) -> u16;
}

/// Byte-wide serial port with receive and transmit-empty interrupts
pub trait SerialPort {
    /// Turn transmitter, receiver and receive interrupt on
    fn enable(&self);
    fn read_byte(&self) -> u8;
    fn write_byte(&self, byte: u8);
    fn listen_transmit_empty(&self);
    fn unlisten_transmit_empty(&self);
}

/// Hardware handshake pins shared with the peer
pub trait Handshake {
    /// Peer asks us to stop transmitting
    fn peer_paused(&self) -> bool;
    /// Ask the peer to stop (or resume) transmitting
    fn set_local_pause(&self, asserted: bool);
    /// Drive the peer module's reset line
    fn hold_peer_in_reset(&self, asserted: bool);
}

/// Low-power wait until any interrupt fires
pub trait Idle {
    fn wait_for_interrupt(&self);
}

impl<F: Fn()> Idle for F {
    fn wait_for_interrupt(&self) {
        self()
    }
}

impl<T: TickTimer + ?Sized> TickTimer for &T {
    fn start(&self, period: Duration) {
        (**self).start(period)
    }

    fn reprogram(&self, period: Duration) {
        (**self).reprogram(period)
    }

    fn acknowledge(&self) {
        (**self).acknowledge()
    }
}

impl<T: Converter + ?Sized> Converter for &T {
    const RESOLUTION: u32 = T::RESOLUTION;

    fn enable(&self) {
        (**self).enable()
    }

    fn select(&self, channel: Channel) {
        (**self).select(channel)
    }

    fn start(&self) {
        (**self).start()
    }

    fn read(&self) -> u16 {
        (**self).read()
    }
}

impl<T: SerialPort + ?Sized> SerialPort for &T {
    fn enable(&self) {
        (**self).enable()
    }

    fn read_byte(&self) -> u8 {
        (**self).read_byte()
    }

    fn write_byte(&self, byte: u8) {
        (**self).write_byte(byte)
    }

    fn listen_transmit_empty(&self) {
        (**self).listen_transmit_empty()
    }

    fn unlisten_transmit_empty(&self) {
        (**self).unlisten_transmit_empty()
    }
}

impl<T: Handshake + ?Sized> Handshake for &T {
    fn peer_paused(&self) -> bool {
        (**self).peer_paused()
    }

    fn set_local_pause(&self, asserted: bool) {
        (**self).set_local_pause(asserted)
    }

    fn hold_peer_in_reset(&self, asserted: bool) {
        (**self).hold_peer_in_reset(asserted)
    }
}
