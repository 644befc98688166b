//! ITM logger for the `log` facade, built on cortex_m_log.
//!
//! Records from interrupt handlers and the main loop share one stimulus port,
//! so the printer runs with interrupts masked ([`InterruptFree`]).
//!
//! # Examples
//!
//! ```no_run
//! # use peripherals::logger::*;
//! # use log::info;
//! let p = cortex_m::Peripherals::take().unwrap();
//!
//! let logger = create_itm_logger::<InterruptFree>(LevelFilter::Info, p.ITM);
//! unsafe {
//!     init(&logger);
//! }
//!
//! info!("link up");
//! ```
//!
//! Capture with openocd and `itmdump`:
//!
//! ```gdb
//! monitor tpiu config internal itm.out uart off 36000000
//! monitor itm port 0 on
//! ```

use core::marker::{Send, Sync};
use cortex_m::peripheral::ITM;
use cortex_m_log::{
    destination,
    log::{trick_init, Logger},
    modes::InterruptModer,
    printer::{itm::ItmSync, Printer},
};

pub use log::LevelFilter;

pub use cortex_m_log::modes::{InterruptFree, InterruptOk};

/// Logger writing to ITM stimulus port 0
pub fn create_itm_logger<M>(level: LevelFilter, itm_reg: ITM) -> Logger<ItmSync<M>>
where
    M: InterruptModer + Send + Sync + 'static,
{
    Logger {
        level,
        inner: ItmSync::<M>::new(destination::Itm::new(itm_reg)),
    }
}

/// Install `logger` behind the log facade.
///
/// # Safety
///
/// Call once, with a logger that outlives every later log call. The
/// firmware keeps it on the stack of a diverging `main`.
pub unsafe fn init<P>(logger: &Logger<P>)
where
    P: Printer + Send + Sync + 'static,
{
    // fails only when a logger is already installed
    let _ = trick_init(logger);
}
