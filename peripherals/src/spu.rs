use stm32f3xx_hal as stm32f303;

use stm32f303::{
    gpio::{gpiob, AF2},
    hal::PwmPin,
    pwm::{self, PwmChannel, WithPins, TIM3_CH2},
    rcc,
    stm32::TIM3,
    time::Hertz,
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Piezo speaker driven by TIM3 channel 2 on PB5
pub struct Speaker {
    channel: PwmChannel<TIM3_CH2, WithPins>,
}

impl Speaker {
    pub fn new(tone: Hertz, tim3: TIM3, pb5: gpiob::PB5<AF2>, clocks: &rcc::Clocks) -> Self {
        info!("configuring timer3 in pwm mode, tone {}hz", tone.0);
        let resolution = core::u16::MAX;
        let (_, tim3_ch2, ..) = pwm::tim3(tim3, resolution, tone, clocks);
        let mut channel = tim3_ch2.output_to_pb5(pb5);
        channel.set_duty(0);
        channel.enable();
        Self { channel }
    }

    /// Loudness as produced by `labyrinth::perceived_volume`, 0 is silent.
    ///
    /// The duty cycle tops out at half the period, where a square wave is
    /// loudest.
    pub fn set_volume(&mut self, volume: u8) {
        let half = u32::from(self.channel.get_max_duty() / 2);
        let duty = (half * u32::from(volume) / 255) as u16;
        trace!("speaker duty {}", duty);
        self.channel.set_duty(duty);
    }
}
