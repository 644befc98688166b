//! Basic timers TIM6 and TIM7 driven through their registers.
//!
//! Both count up from zero and raise the update interrupt on overflow, which
//! is the reset-on-match behaviour the tick scheduler expects.

use core::time::Duration;

use stm32f3xx_hal as stm32f303;

use stm32f303::pac::{self, RCC};

use labyrinth::config::timer_reload;
use labyrinth::context::TickTimer;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

macro_rules! basic_timer {
    ($(#[$meta:meta])* $name:ident, $tim:ident, $timen:ident) => {
        $(#[$meta])*
        pub struct $name {
            clock_hz: u32,
        }

        impl $name {
            /// `clock_hz` is the timer kernel clock, twice PCLK1 when APB1 is divided
            pub const fn new(clock_hz: u32) -> Self {
                Self { clock_hz }
            }

            fn regs(&self) -> &'static pac::tim6::RegisterBlock {
                unsafe { &*pac::$tim::ptr() }
            }

            fn load(&self, period: Duration) {
                let (psc, arr) = timer_reload(self.clock_hz, period).unwrap_or_else(|| {
                    error!("{} period {:?} out of range", stringify!($tim), period);
                    (u16::MAX, u16::MAX)
                });
                trace!("{}: psc {} arr {}", stringify!($tim), psc, arr);
                let tim = self.regs();
                #[allow(unused_unsafe)]
                unsafe {
                    tim.psc.write(|w| w.psc().bits(psc));
                    tim.arr.write(|w| w.arr().bits(arr));
                }
                // latch the prescaler now instead of at the next overflow
                tim.cr1.modify(|_, w| w.urs().set_bit());
                tim.egr.write(|w| w.ug().set_bit());
                tim.sr.modify(|_, w| w.uif().clear_bit());
            }
        }

        impl TickTimer for $name {
            fn start(&self, period: Duration) {
                unsafe { (*RCC::ptr()).apb1enr.modify(|_, w| w.$timen().set_bit()) };
                self.load(period);
                let tim = self.regs();
                tim.dier.modify(|_, w| w.uie().set_bit());
                tim.cr1.modify(|_, w| w.cen().set_bit());
                debug!("{} started, period {:?}", stringify!($tim), period);
            }

            fn reprogram(&self, period: Duration) {
                let tim = self.regs();
                tim.cr1.modify(|_, w| w.cen().clear_bit());
                self.load(period);
                tim.cr1.modify(|_, w| w.cen().set_bit());
            }

            fn acknowledge(&self) {
                self.regs().sr.modify(|_, w| w.uif().clear_bit());
            }
        }
    };
}

basic_timer!(
    /// Game tick timer
    Tim6,
    TIM6,
    tim6en
);

basic_timer!(
    /// Link reset delay, then analog sample trigger
    Tim7,
    TIM7,
    tim7en
);
