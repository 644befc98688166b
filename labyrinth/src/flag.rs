//! Interrupt-to-main-loop signalling.
//!
//! A [`Flag`] is level triggered: raising it several times before it is taken
//! is observed as a single event. A [`Latch`] keeps only the latest value put
//! into it.

use core::cell::Cell;

use critical_section::Mutex;

/// Flag for targets without compare-and-swap, guarded by a critical section
pub mod guarded {
    use super::*;

    pub struct Flag(Mutex<Cell<bool>>);

    impl Flag {
        pub const fn new() -> Self {
            Self(Mutex::new(Cell::new(false)))
        }

        #[inline]
        pub fn raise(&self) {
            critical_section::with(|cs| self.0.borrow(cs).set(true));
        }

        /// Clear the flag, returning whether it was raised
        #[inline]
        pub fn take(&self) -> bool {
            critical_section::with(|cs| self.0.borrow(cs).replace(false))
        }

        #[inline]
        pub fn is_raised(&self) -> bool {
            critical_section::with(|cs| self.0.borrow(cs).get())
        }
    }

    impl Default for Flag {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(feature = "atomic")]
pub mod atomic {
    use core::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    pub struct Flag(AtomicBool);

    impl Flag {
        pub const fn new() -> Self {
            Self(AtomicBool::new(false))
        }

        #[inline]
        pub fn raise(&self) {
            self.0.store(true, Ordering::Release);
        }

        /// Clear the flag, returning whether it was raised
        #[inline]
        pub fn take(&self) -> bool {
            self.0.swap(false, Ordering::AcqRel)
        }

        #[inline]
        pub fn is_raised(&self) -> bool {
            self.0.load(Ordering::Acquire)
        }
    }

    impl Default for Flag {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(feature = "atomic")]
pub use self::atomic::Flag;
#[cfg(not(feature = "atomic"))]
pub use self::guarded::Flag;

/// Single-slot mailbox overwritten by every `put`
pub struct Latch<T: Copy>(Mutex<Cell<Option<T>>>);

impl<T: Copy> Latch<T> {
    pub const fn new() -> Self {
        Self(Mutex::new(Cell::new(None)))
    }

    pub fn put(&self, value: T) {
        critical_section::with(|cs| self.0.borrow(cs).set(Some(value)));
    }

    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.0.borrow(cs).take())
    }

    pub fn peek(&self) -> Option<T> {
        critical_section::with(|cs| self.0.borrow(cs).get())
    }
}

impl<T: Copy> Default for Latch<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! coalescing_law {
        ($name:ident, $flag:ty) => {
            #[test]
            fn $name() {
                let flag = <$flag>::new();
                assert!(!flag.take());

                flag.raise();
                flag.raise();
                flag.raise();
                assert!(flag.is_raised());
                assert!(flag.take());
                assert!(!flag.is_raised());
                assert!(!flag.take());

                flag.raise();
                assert!(flag.take());
            }
        };
    }

    coalescing_law!(guarded_flag_coalesces, guarded::Flag);
    #[cfg(feature = "atomic")]
    coalescing_law!(atomic_flag_coalesces, atomic::Flag);

    #[test]
    fn latch_keeps_latest() {
        let latch = Latch::<u8>::new();
        assert_eq!(latch.take(), None);
        latch.put(3);
        latch.put(200);
        assert_eq!(latch.peek(), Some(200));
        assert_eq!(latch.take(), Some(200));
        assert_eq!(latch.take(), None);
    }
}
