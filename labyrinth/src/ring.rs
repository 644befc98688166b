use heapless::Deque;
use log::warn;

use crate::error::Error;

/// Fixed-capacity FIFO of received bytes.
///
/// A push into a full buffer drops the incoming byte and counts an overrun;
/// bytes already buffered are never disturbed.
pub struct RingBuffer<const N: usize> {
    queue: Deque<u8, N>,
    overruns: u32,
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            overruns: 0,
        }
    }

    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        self.queue.push_back(byte).map_err(|dropped| {
            self.overruns = self.overruns.wrapping_add(1);
            warn!("rx buffer full, dropped {:#04x} (overruns: {})", dropped, self.overruns);
            Error::BufferOverrun
        })
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes dropped because the buffer was full
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
