//! 16-bit linear-feedback shift register fed with hardware noise.
//!
//! Each step shifts the register left by one, moving the input bit into the
//! low end. When the bit leaving the high end is set, the register is xored
//! with the tap mask. With [`TAPS`] the sequence visits all 65535 non-zero
//! states before repeating.
//!
//! Steps run inside a critical section: the analog sampler feeds bits from
//! its interrupt handler while game code draws numbers in the main loop.
//!
//! ```
//! use labyrinth::lfsr::{Lfsr, DEFAULT_SEED};
//!
//! let rng = Lfsr::new(DEFAULT_SEED);
//! assert_eq!(rng.next16(), 0x0001);
//! assert_eq!(rng.next16(), 0xB01A);
//! ```

use core::cell::Cell;
use core::num::NonZeroU16;

use critical_section::Mutex;

pub const TAP_HIGH: u8 = 0xC7;
pub const TAP_LOW: u8 = 0x01;

/// Feedback mask applied when a set bit is shifted out
pub const TAPS: u16 = u16::from_be_bytes([TAP_HIGH, TAP_LOW]);

pub const DEFAULT_SEED: NonZeroU16 = match NonZeroU16::new(0x0001) {
    Some(seed) => seed,
    None => unreachable!(),
};

/// One shift of the register, returning the new state and the bit shifted out.
///
/// A step landing on zero would lock the register there, so it is dropped
/// and the state is kept. Only `feed(true)` from `0xE380` gets there.
#[inline]
fn step(state: u16, input: bool) -> (u16, bool) {
    let out = state & 0x8000 != 0;
    let mut next = (state << 1) | input as u16;
    if out {
        next ^= TAPS;
    }
    if next == 0 {
        (state, out)
    } else {
        (next, out)
    }
}

pub struct Lfsr {
    state: Mutex<Cell<u16>>,
}

impl Lfsr {
    pub const fn new(seed: NonZeroU16) -> Self {
        Self {
            state: Mutex::new(Cell::new(seed.get())),
        }
    }

    /// Mix one bit of entropy into the register
    pub fn feed(&self, bit: bool) {
        self.shift(bit);
    }

    /// Produce one pseudo-random bit
    pub fn shift_out(&self) -> bool {
        self.shift(false)
    }

    pub fn next8(&self) -> u8 {
        (0..8).fold(0u8, |acc, _| (acc << 1) | self.shift_out() as u8)
    }

    pub fn next16(&self) -> u16 {
        (0..16).fold(0u16, |acc, _| (acc << 1) | self.shift_out() as u16)
    }

    /// Value in `0..bound`, or 0 for an empty range
    pub fn below(&self, bound: u16) -> u16 {
        match bound {
            0 => 0,
            _ => self.next16() % bound,
        }
    }

    /// Current register contents
    pub fn state(&self) -> u16 {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    fn shift(&self, input: bool) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let (next, out) = step(cell.get(), input);
            cell.set(next);
            out
        })
    }
}

impl Default for Lfsr {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
