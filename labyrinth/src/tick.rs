//! Game tick scheduling.
//!
//! The timer interrupt raises a coalescing flag which the main loop drains
//! with [`TickScheduler::wait_for_tick`]. A slow main loop sees fewer ticks
//! than timer matches, never more.

use log::{info, trace};

use crate::config::TickConfig;
use crate::context::{Idle, TickTimer};
use crate::flag::Flag;

pub struct TickScheduler<T: TickTimer> {
    timer: T,
    config: TickConfig,
    pending: Flag,
    fast_requested: Flag,
    fast: Flag,
}

impl<T: TickTimer> TickScheduler<T> {
    pub const fn new(timer: T, config: TickConfig) -> Self {
        Self {
            timer,
            config,
            pending: Flag::new(),
            fast_requested: Flag::new(),
            fast: Flag::new(),
        }
    }

    /// Start ticking at the intro rate
    pub fn initialize(&self) {
        info!("tick timer armed, period {:?}", self.config.intro);
        self.timer.start(self.config.intro);
    }

    /// Switch to the gameplay rate on the next timer match.
    ///
    /// Calling it again, or after the switch happened, does nothing.
    pub fn request_fast_mode(&self) {
        if !self.fast.is_raised() {
            self.fast_requested.raise();
        }
    }

    pub fn is_fast(&self) -> bool {
        self.fast.is_raised()
    }

    /// Timer match interrupt handler
    pub fn on_timer(&self) {
        self.timer.acknowledge();
        if self.fast_requested.take() && !self.fast.is_raised() {
            self.timer.reprogram(self.config.gameplay);
            self.fast.raise();
            info!("tick timer switched to gameplay period {:?}", self.config.gameplay);
        }
        self.pending.raise();
    }

    /// Sleep until an interrupt arrives and report whether a tick is due.
    ///
    /// Any interrupt ends the sleep, so `false` means "sleep again". A tick
    /// raised before the call is returned without sleeping.
    pub fn wait_for_tick<I: Idle>(&self, idle: &I) -> bool {
        if self.pending.take() {
            return true;
        }
        idle.wait_for_interrupt();
        let due = self.pending.take();
        trace!("woken, tick due: {}", due);
        due
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
