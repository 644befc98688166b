#![no_std]

use stm32f3xx_hal as stm32f303;

use stm32f303::{
    flash,
    pac, rcc,
    time::{MegaHertz, U32Ext},
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

pub mod adc;
mod critical;
pub mod handshake;
pub mod logger;
pub mod serial;
pub mod spu;
pub mod timer;

pub use adc::Adc1;
pub use handshake::HandshakePins;
pub use serial::Usart2Port;
pub use spu::Speaker;
pub use timer::{Tim6, Tim7};

/// Run from the 8MHz crystal with APB1 at core speed, so basic timers and
/// USART2 are clocked at `sysclk`. `sysclk` must not exceed 36MHz.
pub fn freeze_clocks(sysclk: MegaHertz, cfgr: rcc::CFGR, flash: &mut flash::Parts) -> rcc::Clocks {
    let clocks = cfgr
        .use_hse(8.mhz())
        .sysclk(sysclk)
        .pclk1(sysclk)
        .freeze(&mut flash.acr);
    debug!("sysclk {}hz, pclk1 {}hz", clocks.sysclk().0, clocks.pclk1().0);
    clocks
}

/// tpiu is a bridge for ITM, it's asynchronous clock prescaller
/// has to be updated, otherwise logging through ITM won't work
pub trait ClocksExt {
    fn set_tpiu_async_cpr(self, baud_rate: MegaHertz) -> Self;
}

impl ClocksExt for rcc::Clocks {
    fn set_tpiu_async_cpr(self, baud_rate: MegaHertz) -> Self {
        let tpiu_async_presc = self.hclk().0 / (baud_rate.0 * 1_000_000) - 1;
        unsafe { (*pac::TPIU::ptr()).acpr.write(tpiu_async_presc) }
        trace!("setting tpiu baud rate to: {}mhz", baud_rate.0);
        trace!("setting async clock prescaller: {}", tpiu_async_presc);
        self
    }
}
