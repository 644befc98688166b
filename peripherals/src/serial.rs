use stm32f3xx_hal as stm32f303;

use stm32f303::{
    gpio::{gpioa, AF7},
    pac::{self, USART2},
    rcc::{Clocks, APB1},
    serial::Serial,
    time::Bps,
};

use labyrinth::context::SerialPort;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

pub type Usart2Pins = (gpioa::PA2<AF7>, gpioa::PA3<AF7>);

/// USART2 on PA2 (tx) / PA3 (rx), interrupt driven.
///
/// The HAL sets up baud rate and framing in [`configure_usart2`]; afterwards
/// the port is accessed through its registers so it can live in a `static`.
pub struct Usart2Port;

/// Configure USART2 with the peripheral left disabled until
/// [`SerialPort::enable`]
pub fn configure_usart2(
    usart: USART2,
    pins: Usart2Pins,
    baud: Bps,
    clocks: Clocks,
    apb1: &mut APB1,
) -> Usart2Pins {
    info!("configuring usart2 at {}bps", baud.0);
    let (usart, pins) = Serial::usart2(usart, pins, baud, clocks, apb1).free();
    usart.cr1.modify(|_, w| w.ue().clear_bit());
    pins
}

impl Usart2Port {
    fn regs(&self) -> &'static pac::usart1::RegisterBlock {
        unsafe { &*USART2::ptr() }
    }

    /// A byte is waiting in the receive register
    pub fn has_received(&self) -> bool {
        let isr = self.regs().isr.read();
        isr.rxne().bit_is_set() || isr.ore().bit_is_set()
    }

    /// Transmit-empty interrupt armed and the data register free
    pub fn can_transmit(&self) -> bool {
        let usart = self.regs();
        usart.cr1.read().txeie().bit_is_set() && usart.isr.read().txe().bit_is_set()
    }
}

impl SerialPort for Usart2Port {
    fn enable(&self) {
        self.regs().cr1.modify(|_, w| {
            w.te().set_bit().re().set_bit().rxneie().set_bit().ue().set_bit()
        });
        debug!("usart2 enabled");
    }

    fn read_byte(&self) -> u8 {
        let usart = self.regs();
        if usart.isr.read().ore().bit_is_set() {
            warn!("usart2 hardware overrun");
            usart.icr.write(|w| w.orecf().set_bit());
        }
        usart.rdr.read().bits() as u8
    }

    fn write_byte(&self, byte: u8) {
        self.regs().tdr.write(|w| unsafe { w.bits(u32::from(byte)) });
    }

    fn listen_transmit_empty(&self) {
        self.regs().cr1.modify(|_, w| w.txeie().set_bit());
    }

    fn unlisten_transmit_empty(&self) {
        self.regs().cr1.modify(|_, w| w.txeie().clear_bit());
    }
}
