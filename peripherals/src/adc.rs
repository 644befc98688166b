//! ADC1 as a software-triggered single conversion converter.
//!
//! The volume knob is wired to PA0 (channel 1). Entropy comes from the
//! internal temperature sensor (channel 16): its least significant bit is
//! dominated by noise.

use stm32f3xx_hal as stm32f303;

use stm32f303::pac::{self, ADC1, ADC1_2, GPIOA, RCC};

use labyrinth::context::{Channel, Converter};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

const KNOB_CHANNEL: u8 = 1;
const TEMPERATURE_CHANNEL: u8 = 16;

/// Voltage regulator start-up, 10us at up to 72MHz
const REGULATOR_STARTUP_CYCLES: u32 = 720;

pub struct Adc1;

impl Adc1 {
    fn regs(&self) -> &'static pac::adc1::RegisterBlock {
        unsafe { &*ADC1::ptr() }
    }

    fn calibrate(&self) {
        let adc = self.regs();
        adc.cr.modify(|_, w| w.adcal().set_bit());
        while adc.cr.read().adcal().bit_is_set() {}
    }
}

impl Converter for Adc1 {
    const RESOLUTION: u32 = 12;

    fn enable(&self) {
        let adc = self.regs();
        unsafe {
            (*RCC::ptr()).ahbenr.modify(|_, w| w.adc12en().set_bit().iopaen().set_bit());
            (*GPIOA::ptr()).moder.modify(|_, w| w.moder0().analog());
            // synchronous clock HCLK/1, temperature sensor on
            (*ADC1_2::ptr())
                .ccr
                .modify(|_, w| w.ckmode().bits(0b01).tsen().set_bit());
            adc.cr.modify(|_, w| w.advregen().bits(0b00));
            adc.cr.modify(|_, w| w.advregen().bits(0b01));
        }
        cortex_m::asm::delay(REGULATOR_STARTUP_CYCLES);
        self.calibrate();

        unsafe {
            // the sensor needs the longest sampling time
            adc.smpr1.modify(|_, w| w.smp1().bits(0b100));
            adc.smpr2.modify(|_, w| w.smp16().bits(0b111));
        }
        adc.cr.modify(|_, w| w.aden().set_bit());
        while adc.isr.read().adrdy().bit_is_clear() {}
        adc.ier.modify(|_, w| w.eocie().set_bit());
        debug!("adc1 calibrated and enabled");
    }

    fn select(&self, channel: Channel) {
        let input = match channel {
            Channel::Primary => KNOB_CHANNEL,
            Channel::Entropy => TEMPERATURE_CHANNEL,
        };
        unsafe {
            self.regs()
                .sqr1
                .modify(|_, w| w.l3().bits(0).sq1().bits(input));
        }
    }

    fn start(&self) {
        self.regs().cr.modify(|_, w| w.adstart().set_bit());
    }

    fn read(&self) -> u16 {
        // reading the data register clears EOC
        (self.regs().dr.read().bits() & 0x0FFF) as u16
    }
}
