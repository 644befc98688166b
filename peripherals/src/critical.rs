//! Critical sections for a single Cortex-M core.
//!
//! Masking interrupts through PRIMASK is enough on one core. The previous mask
//! state is restored on release, so nested sections entered from interrupt
//! handlers do not re-enable interrupts early.

use cortex_m::{interrupt, register::primask};

struct SingleCore;

critical_section::set_impl!(SingleCore);

unsafe impl critical_section::Impl for SingleCore {
    unsafe fn acquire() -> bool {
        let was_active = primask::read().is_active();
        interrupt::disable();
        was_active
    }

    unsafe fn release(was_active: bool) {
        if was_active {
            interrupt::enable();
        }
    }
}
