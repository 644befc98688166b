#![no_main]
#![no_std]

// sets default panic handler
#[allow(unused_imports)]
use panic_itm;

use cortex_m::{asm::wfi, peripheral::NVIC};
// provides _start symbol
use cortex_m_rt::entry;

use stm32f3xx_hal as stm32f303;

use stm32f303::{
    pac::{self, interrupt, Interrupt},
    prelude::*,
};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use labyrinth::{
    config::{TickConfig, LINK_BAUD, LINK_RESET_DELAY, RX_CAPACITY, SAMPLE_PERIOD},
    context::TickTimer,
    lfsr::DEFAULT_SEED,
    perceived_volume, AnalogSampler, Error, Flag, Latch, Lfsr, SerialTransport, TickScheduler,
    Watermarks,
};
use peripherals::{
    freeze_clocks,
    handshake::{self, DiscoveryPins, Lines},
    logger::*,
    serial::{configure_usart2, Usart2Port},
    Adc1, ClocksExt, HandshakePins, Speaker, Tim6, Tim7,
};

const SYSCLK_MHZ: u32 = 36;
/// APB1 runs undivided, so basic timers see the core clock
const TIMER_CLOCK: u32 = SYSCLK_MHZ * 1_000_000;

/// Start screen frames before switching to gameplay speed
const INTRO_TICKS: u32 = 8;
const MAZE_CELLS: u16 = 32 * 16;
const GHOSTS: usize = 4;

static TICKS: TickScheduler<Tim6> = TickScheduler::new(Tim6::new(TIMER_CLOCK), TickConfig::REFERENCE);

/// Runs once for the peer reset delay, then at the sampling period
static TRIGGER: Tim7 = Tim7::new(TIMER_CLOCK);
static LINK_UP: Flag = Flag::new();

static SAMPLER: AnalogSampler<Adc1, fn(u8), fn(bool)> = AnalogSampler::new(Adc1, on_knob, on_noise);
static PRNG: Lfsr = Lfsr::new(DEFAULT_SEED);
static VOLUME: Latch<u8> = Latch::new();

static PINS: DiscoveryPins = HandshakePins::new();
static LINK: SerialTransport<Usart2Port, &DiscoveryPins, fn(u8), fn(), RX_CAPACITY> = SerialTransport::new(
    Usart2Port,
    &PINS,
    on_controller_byte,
    on_link_ready,
    Watermarks::for_capacity(RX_CAPACITY),
);
static CONTROLLER: Latch<u8> = Latch::new();
static REPORT: Latch<u8> = Latch::new();

fn on_knob(measure: u8) {
    VOLUME.put(perceived_volume(measure));
}

fn on_noise(bit: bool) {
    PRNG.feed(bit);
}

fn on_controller_byte(byte: u8) {
    CONTROLLER.put(byte);
}

fn on_link_ready() {
    if let Some(byte) = REPORT.take() {
        // nothing is outstanding when the transmitter asks for more
        let _ = LINK.send(byte);
    }
}

/// Send now, or leave it for the next ready callback
fn queue_report(byte: u8) {
    if let Err(Error::Busy) = LINK.send(byte) {
        REPORT.put(byte);
    }
}

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().expect("Failed requesting peripherals");
    let dp = pac::Peripherals::take().expect("Failed requesting peripherals");

    let logger = create_itm_logger::<InterruptFree>(LevelFilter::Info, cp.ITM);
    unsafe { init(&logger) }
    info!("init process started");

    info!("configuring clocks");
    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();
    let clocks = freeze_clocks(SYSCLK_MHZ.mhz(), rcc.cfgr, &mut flash).set_tpiu_async_cpr(2.mhz());
    if clocks.pclk1().0 != TIMER_CLOCK {
        warn!("pclk1 at {}hz, timer periods will be off", clocks.pclk1().0);
    }

    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let mut gpiob = dp.GPIOB.split(&mut rcc.ahb);
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);

    info!("configuring speaker on pb5");
    let pb5 = gpiob.pb5.into_af2(&mut gpiob.moder, &mut gpiob.afrl);
    let mut speaker = Speaker::new(440.hz(), dp.TIM3, pb5, &clocks);

    info!("configuring controller link");
    let tx = gpioa.pa2.into_af7(&mut gpioa.moder, &mut gpioa.afrl);
    let rx = gpioa.pa3.into_af7(&mut gpioa.moder, &mut gpioa.afrl);
    let _link_pins = configure_usart2(dp.USART2, (tx, rx), LINK_BAUD.bps(), clocks, &mut rcc.apb1);
    PINS.install(Lines {
        peer_pause: gpiod.pd3.into_pull_down_input(&mut gpiod.moder, &mut gpiod.pupdr),
        local_pause: gpiod
            .pd4
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper),
        peer_reset: gpiod
            .pd5
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper),
    });
    handshake::listen_peer_pause(&dp.EXTI);
    LINK.initialize();
    TRIGGER.start(LINK_RESET_DELAY);

    info!("configuring sampler and tick timer");
    SAMPLER.initialize();
    TICKS.initialize();

    unsafe {
        cp.NVIC.set_priority(Interrupt::USART2_EXTI26, 0x00);
        cp.NVIC.set_priority(Interrupt::EXTI3, 0x20);
        cp.NVIC.set_priority(Interrupt::TIM6_DACUNDER, 0x40);
        cp.NVIC.set_priority(Interrupt::TIM7, 0x40);
        cp.NVIC.set_priority(Interrupt::ADC1_2, 0x40);
        cp.NVIC.set_priority(Interrupt::EXTI4, 0xE0);
        for irq in [
            Interrupt::USART2_EXTI26,
            Interrupt::EXTI3,
            Interrupt::TIM6_DACUNDER,
            Interrupt::TIM7,
            Interrupt::ADC1_2,
            Interrupt::EXTI4,
        ] {
            NVIC::unmask(irq);
        }
    }
    info!("init done");

    let mut ticks: u32 = 0;
    loop {
        if !TICKS.wait_for_tick(&wfi) {
            continue;
        }
        ticks = ticks.wrapping_add(1);

        if ticks == INTRO_TICKS {
            TICKS.request_fast_mode();
            let mut ghosts = [0u16; GHOSTS];
            ghosts.iter_mut().for_each(|cell| *cell = PRNG.below(MAZE_CELLS));
            info!("game started, ghosts at {:?}", ghosts);
        }

        if let Some(volume) = VOLUME.take() {
            speaker.set_volume(volume);
        }

        if let Some(byte) = CONTROLLER.take() {
            trace!("controller {:#04x}", byte);
        }

        if TICKS.is_fast() {
            queue_report(ticks as u8);
        }

        if ticks % 1024 == 0 {
            debug!("link {:?}", LINK.diagnostics());
        }
    }
}

#[interrupt]
fn TIM6_DACUNDER() {
    TICKS.on_timer();
}

#[interrupt]
fn TIM7() {
    TRIGGER.acknowledge();
    if LINK_UP.is_raised() {
        SAMPLER.on_trigger();
    } else {
        LINK_UP.raise();
        LINK.on_reset_elapsed();
        TRIGGER.reprogram(SAMPLE_PERIOD);
    }
}

#[interrupt]
fn ADC1_2() {
    SAMPLER.on_conversion_complete();
}

#[interrupt]
fn USART2_EXTI26() {
    let port = Usart2Port;
    if port.has_received() && LINK.receive() {
        // drain at the lowest priority so new bytes can preempt it
        NVIC::pend(Interrupt::EXTI4);
    }
    if port.can_transmit() {
        LINK.on_transmit_empty();
    }
}

#[interrupt]
fn EXTI3() {
    handshake::acknowledge_peer_pause();
    LINK.on_handshake_change();
}

#[interrupt]
fn EXTI4() {
    LINK.dispatch();
}
