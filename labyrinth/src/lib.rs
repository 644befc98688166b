#![cfg_attr(not(test), no_std)]
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod flag;
pub mod lfsr;
pub mod ring;
pub mod sampler;
pub mod serial;
pub mod tick;
pub mod volume;

pub use builder::LinkBuilder;
pub use config::{TickConfig, Watermarks};
pub use error::Error;
pub use flag::{Flag, Latch};
pub use lfsr::Lfsr;
pub use ring::RingBuffer;
pub use sampler::{AnalogSampler, Conversion, SamplerState};
pub use serial::{LinkDiagnostics, SerialTransport};
pub use tick::TickScheduler;
pub use volume::perceived_volume;
