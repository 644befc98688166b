use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use crossbeam_utils::thread;

use labyrinth::context::{Handshake, SerialPort};
use labyrinth::{SerialTransport, Watermarks};

struct Port {
    incoming: Mutex<VecDeque<u8>>,
    written: Mutex<Vec<u8>>,
    armed: AtomicBool,
}

impl Port {
    const fn new() -> Self {
        Self {
            incoming: Mutex::new(VecDeque::new()),
            written: Mutex::new(Vec::new()),
            armed: AtomicBool::new(false),
        }
    }

    fn arrive(&self, byte: u8) {
        self.incoming.lock().unwrap().push_back(byte);
    }

    fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }
}

impl SerialPort for Port {
    fn enable(&self) {}

    fn read_byte(&self) -> u8 {
        self.incoming.lock().unwrap().pop_front().unwrap_or(0)
    }

    fn write_byte(&self, byte: u8) {
        self.written.lock().unwrap().push(byte);
    }

    fn listen_transmit_empty(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn unlisten_transmit_empty(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

struct Pins {
    peer_paused: AtomicBool,
    local_pause: AtomicBool,
    peer_reset: AtomicBool,
}

impl Pins {
    const fn new() -> Self {
        Self {
            peer_paused: AtomicBool::new(false),
            local_pause: AtomicBool::new(false),
            peer_reset: AtomicBool::new(false),
        }
    }
}

impl Handshake for Pins {
    fn peer_paused(&self) -> bool {
        self.peer_paused.load(Ordering::SeqCst)
    }

    fn set_local_pause(&self, asserted: bool) {
        self.local_pause.store(asserted, Ordering::SeqCst);
    }

    fn hold_peer_in_reset(&self, asserted: bool) {
        self.peer_reset.store(asserted, Ordering::SeqCst);
    }
}

type Link = SerialTransport<&'static Port, &'static Pins, fn(u8), fn(), 64>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ignore(_: u8) {}

fn idle() {}

#[test]
fn burst_during_callback_joins_running_drain() {
    static PORT: Port = Port::new();
    static PINS: Pins = Pins::new();
    static LINK: Link = SerialTransport::new(&PORT, &PINS, on_receive, idle, Watermarks::for_capacity(64));
    static GOT: Mutex<Vec<u8>> = Mutex::new(Vec::new());
    static DEPTH: AtomicUsize = AtomicUsize::new(0);
    static DEEPEST: AtomicUsize = AtomicUsize::new(0);

    fn on_receive(byte: u8) {
        let depth = DEPTH.fetch_add(1, Ordering::SeqCst) + 1;
        DEEPEST.fetch_max(depth, Ordering::SeqCst);
        GOT.lock().unwrap().push(byte);
        if byte == 1 {
            // receive interrupt preempts the callback three times
            for b in 2..5 {
                PORT.arrive(b);
                LINK.on_receive_interrupt();
            }
        }
        DEPTH.fetch_sub(1, Ordering::SeqCst);
    }

    init_logger();
    LINK.initialize();
    LINK.on_reset_elapsed();

    PORT.arrive(1);
    LINK.on_receive_interrupt();
    assert_eq!(*GOT.lock().unwrap(), [1, 2, 3, 4]);
    assert_eq!(DEEPEST.load(Ordering::SeqCst), 1);
    assert_eq!(LINK.buffered(), 0);

    // guard released once the loop saw an empty buffer
    PORT.arrive(5);
    LINK.on_receive_interrupt();
    assert_eq!(*GOT.lock().unwrap(), [1, 2, 3, 4, 5]);
}

#[test]
fn ready_callback_pulls_next_byte() {
    static PORT: Port = Port::new();
    static PINS: Pins = Pins::new();
    static LINK: Link = SerialTransport::new(&PORT, &PINS, ignore, on_ready, Watermarks::for_capacity(64));
    static OUTBOX: Mutex<VecDeque<u8>> = Mutex::new(VecDeque::new());

    fn on_ready() {
        let next = OUTBOX.lock().unwrap().pop_front();
        if let Some(byte) = next {
            LINK.send(byte).unwrap();
        }
    }

    fn drive() {
        for _ in 0..100 {
            if !PORT.armed.load(Ordering::SeqCst) {
                return;
            }
            LINK.on_transmit_empty();
        }
        panic!("transmitter never went idle");
    }

    init_logger();
    LINK.initialize();
    assert!(PINS.peer_reset.load(Ordering::SeqCst));
    LINK.on_reset_elapsed();
    assert!(!PINS.peer_reset.load(Ordering::SeqCst));

    OUTBOX.lock().unwrap().extend([0x11, 0x22, 0x33, 0x44]);
    LINK.send(0x00).unwrap();
    drive();
    assert_eq!(PORT.written(), [0x00, 0x11, 0x22, 0x33, 0x44]);
    assert!(!LINK.is_sending());

    // peer raises its pause line in the middle of a stream
    OUTBOX.lock().unwrap().extend([0x55, 0x66]);
    LINK.send(0x50).unwrap();
    LINK.on_transmit_empty();
    PINS.peer_paused.store(true, Ordering::SeqCst);
    drive();
    assert_eq!(PORT.written().len(), 6);
    assert!(LINK.is_tx_paused());

    PINS.peer_paused.store(false, Ordering::SeqCst);
    LINK.on_handshake_change();
    drive();
    assert_eq!(PORT.written()[5..], [0x50, 0x55, 0x66]);
    assert!(!LINK.is_tx_paused());
}

#[test]
fn paused_byte_waits_for_resume() {
    static PORT: Port = Port::new();
    static PINS: Pins = Pins::new();
    static LINK: Link = SerialTransport::new(&PORT, &PINS, ignore, idle, Watermarks::for_capacity(64));

    LINK.initialize();
    LINK.on_reset_elapsed();

    PINS.peer_paused.store(true, Ordering::SeqCst);
    LINK.send(0xAB).unwrap();
    assert!(!PORT.armed.load(Ordering::SeqCst));
    assert!(PORT.written().is_empty());

    PINS.peer_paused.store(false, Ordering::SeqCst);
    LINK.on_handshake_change();
    assert!(PORT.armed.load(Ordering::SeqCst));
    LINK.on_transmit_empty();
    assert_eq!(PORT.written(), [0xAB]);

    // a second resume edge does not duplicate the byte
    LINK.on_handshake_change();
    LINK.on_transmit_empty();
    assert_eq!(PORT.written(), [0xAB]);
}

#[test]
fn backpressure_with_slow_consumer() {
    static PORT: Port = Port::new();
    static PINS: Pins = Pins::new();
    static LINK: Link = SerialTransport::new(&PORT, &PINS, on_receive, idle, Watermarks::for_capacity(64));
    static GOT: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    fn on_receive(byte: u8) {
        GOT.lock().unwrap().push(byte);
    }

    init_logger();
    LINK.initialize();
    LINK.on_reset_elapsed();

    // 59 bytes back to back, nobody draining
    for b in 0..59 {
        PORT.arrive(b);
        LINK.receive();
    }
    assert!(PINS.local_pause.load(Ordering::SeqCst));

    // the peer overshoots by the headroom, one more is lost
    for b in 59..65 {
        PORT.arrive(b);
        LINK.receive();
    }
    assert_eq!(LINK.buffered(), 64);
    assert_eq!(LINK.diagnostics().overruns, 1);

    LINK.dispatch();
    assert!(!PINS.local_pause.load(Ordering::SeqCst));
    assert_eq!(*GOT.lock().unwrap(), (0..64).collect::<Vec<u8>>());
    assert_eq!(LINK.diagnostics().pauses, 1);
}

#[test]
fn peer_honouring_pause_never_overruns() {
    static PORT: Port = Port::new();
    static PINS: Pins = Pins::new();
    static LINK: Link = SerialTransport::new(&PORT, &PINS, on_receive, idle, Watermarks::for_capacity(64));
    static GOT: Mutex<Vec<u8>> = Mutex::new(Vec::new());
    const TOTAL: usize = 5_000;

    fn on_receive(byte: u8) {
        GOT.lock().unwrap().push(byte);
    }

    init_logger();
    LINK.initialize();
    LINK.on_reset_elapsed();

    thread::scope(|s| {
        // peer module: stops while our pause line is asserted
        s.spawn(|_| {
            for i in 0..TOTAL {
                while PINS.local_pause.load(Ordering::SeqCst) {
                    std::thread::yield_now();
                }
                PORT.arrive(i as u8);
                LINK.receive();
            }
        });
        // lower priority dispatch context
        s.spawn(|_| {
            while GOT.lock().unwrap().len() < TOTAL {
                LINK.dispatch();
                std::thread::yield_now();
            }
        });
    })
    .unwrap();

    let got = GOT.lock().unwrap();
    assert!(got.iter().enumerate().all(|(i, &b)| b == i as u8));
    let diagnostics = LINK.diagnostics();
    assert_eq!(diagnostics.overruns, 0);
    assert!(diagnostics.peak <= 59);
}
