//! Flow-control and reset lines shared with the motion controller module.
//!
//! | line        | pin | direction | asserted |
//! |-------------|-----|-----------|----------|
//! | peer pause  | PD3 | input     | high     |
//! | local pause | PD4 | output    | high     |
//! | peer reset  | PD5 | output    | low      |
//!
//! Both edges of the peer pause line raise EXTI3.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;

use stm32f3xx_hal as stm32f303;

use stm32f303::{
    gpio::{gpiod, Input, Output, PullDown, PushPull},
    hal::digital::v2::{InputPin, OutputPin},
    pac::{EXTI, RCC, SYSCFG},
};

use labyrinth::context::Handshake;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

pub struct Lines<PI, PO, RST> {
    pub peer_pause: PI,
    pub local_pause: PO,
    pub peer_reset: RST,
}

pub type DiscoveryPins = HandshakePins<
    gpiod::PD3<Input<PullDown>>,
    gpiod::PD4<Output<PushPull>>,
    gpiod::PD5<Output<PushPull>>,
>;

/// Handshake pins installed at run time into a `static`
pub struct HandshakePins<PI, PO, RST> {
    lines: Mutex<RefCell<Option<Lines<PI, PO, RST>>>>,
}

impl<PI, PO, RST> HandshakePins<PI, PO, RST>
where
    PI: InputPin<Error = Infallible>,
    PO: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
{
    pub const fn new() -> Self {
        Self {
            lines: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn install(&self, lines: Lines<PI, PO, RST>) {
        critical_section::with(|cs| self.lines.borrow(cs).replace(Some(lines)));
    }

    fn with_lines<F: FnOnce(&mut Lines<PI, PO, RST>)>(&self, f: F) {
        critical_section::with(|cs| match self.lines.borrow(cs).borrow_mut().as_mut() {
            Some(lines) => f(lines),
            None => error!("handshake lines used before install"),
        });
    }
}

impl<PI, PO, RST> Handshake for HandshakePins<PI, PO, RST>
where
    PI: InputPin<Error = Infallible>,
    PO: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
{
    fn peer_paused(&self) -> bool {
        critical_section::with(|cs| {
            self.lines
                .borrow(cs)
                .borrow()
                .as_ref()
                .map_or(true, |lines| lines.peer_pause.is_high().unwrap_or(true))
        })
    }

    fn set_local_pause(&self, asserted: bool) {
        self.with_lines(|lines| {
            let _ = if asserted {
                lines.local_pause.set_high()
            } else {
                lines.local_pause.set_low()
            };
        });
    }

    fn hold_peer_in_reset(&self, asserted: bool) {
        self.with_lines(|lines| {
            let _ = if asserted {
                lines.peer_reset.set_low()
            } else {
                lines.peer_reset.set_high()
            };
        });
    }
}

/// Route PD3 to EXTI3 and trigger on both edges
pub fn listen_peer_pause(exti: &EXTI) {
    unsafe {
        (*RCC::ptr()).apb2enr.modify(|_, w| w.syscfgen().set_bit());
        (*SYSCFG::ptr()).exticr1.modify(|_, w| w.exti3().bits(0b011));
    }
    exti.rtsr1.modify(|_, w| w.tr3().set_bit());
    exti.ftsr1.modify(|_, w| w.tr3().set_bit());
    exti.imr1.modify(|_, w| w.mr3().set_bit());
    debug!("exti3 listening on pd3");
}

/// Clear the EXTI3 pending bit, first thing in its handler
pub fn acknowledge_peer_pause() {
    unsafe { (*EXTI::ptr()).pr1.write(|w| w.pr3().set_bit()) };
}
