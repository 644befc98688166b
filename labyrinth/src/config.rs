//! Timing and buffering constants of the console.
//!
//! Timings are taken from the reference board (16 MHz core clock) and are
//! expressed as durations so every platform can derive its own prescaler and
//! reload values from them.

use core::time::Duration;

use crate::error::Error;

/// Receive ring buffer capacity of the controller link
pub const RX_CAPACITY: usize = 64;

/// Baud rate of the controller link
pub const LINK_BAUD: u32 = 1_000_000;

/// How long the peer module is held in reset before the port is enabled
pub const LINK_RESET_DELAY: Duration = Duration::from_micros(5_000);

/// Period of the timer re-triggering analog conversions
pub const SAMPLE_PERIOD: Duration = Duration::from_micros(1_884);

/// Tick periods before and after the intro sequence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickConfig {
    /// Slow rate used while the start screen animates
    pub intro: Duration,
    /// Gameplay rate, applied by `TickScheduler::request_fast_mode`
    pub gameplay: Duration,
}

impl TickConfig {
    /// Periods of the reference board
    pub const REFERENCE: TickConfig = TickConfig {
        intro: Duration::from_millis(800),
        gameplay: Duration::from_millis(50),
    };
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Prescaler and auto-reload values making an up-counting timer clocked at
/// `clock_hz` overflow every `period`.
///
/// Returns `None` for a zero period or one too long for 16-bit registers.
pub fn timer_reload(clock_hz: u32, period: Duration) -> Option<(u16, u16)> {
    let ticks = u64::from(clock_hz) * period.as_micros() as u64 / 1_000_000;
    if ticks == 0 {
        return None;
    }
    let prescaler = u16::try_from((ticks - 1) >> 16).ok()?;
    let reload = ticks / (u64::from(prescaler) + 1) - 1;
    Some((prescaler, reload as u16))
}

/// Occupancy thresholds for local backpressure.
///
/// Backpressure is asserted once occupancy reaches `high` and released only
/// when it drops strictly below `low`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Watermarks {
    pub high: usize,
    pub low: usize,
}

impl Watermarks {
    /// Headroom left above the high watermark for bytes still in flight
    /// after the peer has been told to pause.
    pub const HEADROOM: usize = 5;

    /// Derive thresholds from buffer capacity: `capacity - HEADROOM` and a quarter.
    pub const fn for_capacity(capacity: usize) -> Self {
        Self {
            high: capacity.saturating_sub(Self::HEADROOM),
            low: capacity / 4,
        }
    }

    pub fn new(high: usize, low: usize) -> Result<Self, Error> {
        if low == 0 {
            return Err(Error::InvalidConfig("low watermark must be positive"));
        }
        if low >= high {
            return Err(Error::InvalidConfig("low watermark must be below high watermark"));
        }
        Ok(Self { high, low })
    }

    pub(crate) fn check(&self, capacity: usize) -> Result<(), Error> {
        if self.low == 0 || self.low >= self.high {
            return Err(Error::InvalidConfig("watermarks do not form a hysteresis band"));
        }
        if self.high > capacity {
            return Err(Error::InvalidConfig("high watermark exceeds buffer capacity"));
        }
        Ok(())
    }
}

impl Default for Watermarks {
    fn default() -> Self {
        Self::for_capacity(RX_CAPACITY)
    }
}
