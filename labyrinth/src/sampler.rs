//! Two-channel analog sampler.
//!
//! Conversions alternate between the primary control and the entropy
//! channel. Every conversion is requested explicitly by the sample trigger
//! timer, never free-running.
//!
//! | state     | on conversion complete                                      |
//! |-----------|-------------------------------------------------------------|
//! | primary   | deliver top 8 bits, switch to entropy, discard next sample  |
//! | entropy   | first sample after the switch is dropped (mux settling)     |
//! | entropy   | deliver lowest bit, switch back to primary                  |

use core::cell::Cell;

use critical_section::Mutex;
use log::{info, trace};

use crate::context::{Channel, Converter};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerState {
    MeasuringPrimary,
    MeasuringEntropy,
}

/// What a completed conversion turned into
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    Primary(u8),
    /// Sample taken while the multiplexer settled, dropped on purpose
    Settling,
    Entropy(bool),
}

#[derive(Copy, Clone)]
struct Phase {
    state: SamplerState,
    discard_next: bool,
}

impl Phase {
    const START: Phase = Phase {
        state: SamplerState::MeasuringPrimary,
        discard_next: false,
    };
}

pub struct AnalogSampler<C, P, E>
where
    C: Converter,
    P: Fn(u8),
    E: Fn(bool),
{
    converter: C,
    on_primary: P,
    on_entropy: E,
    phase: Mutex<Cell<Phase>>,
}

impl<C, P, E> AnalogSampler<C, P, E>
where
    C: Converter,
    P: Fn(u8),
    E: Fn(bool),
{
    pub const fn new(converter: C, on_primary: P, on_entropy: E) -> Self {
        Self {
            converter,
            on_primary,
            on_entropy,
            phase: Mutex::new(Cell::new(Phase::START)),
        }
    }

    /// Select the primary channel and run the first conversion
    pub fn initialize(&self) {
        critical_section::with(|cs| self.phase.borrow(cs).set(Phase::START));
        self.converter.select(Channel::Primary);
        self.converter.enable();
        self.converter.start();
        info!("sampler started, {}-bit converter", C::RESOLUTION);
    }

    /// Sample trigger timer interrupt handler
    pub fn on_trigger(&self) {
        self.converter.start();
    }

    /// Conversion-complete interrupt handler
    pub fn on_conversion_complete(&self) -> Conversion {
        let raw = self.converter.read();
        let conversion = critical_section::with(|cs| {
            let cell = self.phase.borrow(cs);
            let mut phase = cell.get();
            let conversion = match phase.state {
                SamplerState::MeasuringPrimary => {
                    self.converter.select(Channel::Entropy);
                    phase.state = SamplerState::MeasuringEntropy;
                    phase.discard_next = true;
                    Conversion::Primary(top_byte(raw, C::RESOLUTION))
                }
                SamplerState::MeasuringEntropy if phase.discard_next => {
                    phase.discard_next = false;
                    Conversion::Settling
                }
                SamplerState::MeasuringEntropy => {
                    self.converter.select(Channel::Primary);
                    phase.state = SamplerState::MeasuringPrimary;
                    Conversion::Entropy(raw & 1 != 0)
                }
            };
            cell.set(phase);
            conversion
        });

        trace!("conversion {:?}", conversion);
        match conversion {
            Conversion::Primary(value) => (self.on_primary)(value),
            Conversion::Entropy(bit) => (self.on_entropy)(bit),
            Conversion::Settling => {}
        }
        conversion
    }

    pub fn state(&self) -> SamplerState {
        critical_section::with(|cs| self.phase.borrow(cs).get().state)
    }

    /// Whether the next conversion will be thrown away
    pub fn discarding(&self) -> bool {
        critical_section::with(|cs| self.phase.borrow(cs).get().discard_next)
    }
}

fn top_byte(raw: u16, resolution: u32) -> u8 {
    if resolution > 8 {
        (raw >> (resolution - 8)) as u8
    } else {
        (raw << (8 - resolution)) as u8
    }
}
