//! Sharing one driver between the foreground and the DIO0 interrupt handler
//!
//! ```ignore
//! static RADIO: SharedRadio<Port, Link> = SharedRadio::new();
//!
//! #[interrupt]
//! fn EXTI0() {
//!     RADIO.on_interrupt();
//! }
//!
//! RADIO.install(radio);
//! RADIO.with(|radio| radio.transmit_nonblocking(&frame));
//! ```
use core::cell::RefCell;

use critical_section::Mutex;

use crate::mod_traits::{LinkCallbacks, RegisterPort};
use crate::sx127x::Sx127x;

/// A driver slot guarded by `critical_section`
///
/// Every access runs with interrupts masked, so foreground calls and [`SharedRadio::on_interrupt`]
/// never interleave on the SPI bus. Link callbacks run while the driver is borrowed: an access
/// from inside one finds the slot busy and gets `None`. Callbacks queue their next operation on
/// the [`crate::mod_params::Turnaround`] instead.
pub struct SharedRadio<P, CB> {
    radio: Mutex<RefCell<Option<Sx127x<P, CB>>>>,
}

impl<P, CB> SharedRadio<P, CB> {
    /// An empty slot, usable in a `static`
    pub const fn new() -> Self {
        Self {
            radio: Mutex::new(RefCell::new(None)),
        }
    }

    /// Move a driver into the slot, returning the one left out of it
    ///
    /// That is the previous driver, or `radio` itself when the slot is busy.
    pub fn install(&self, radio: Sx127x<P, CB>) -> Option<Sx127x<P, CB>> {
        critical_section::with(|cs| match self.radio.borrow(cs).try_borrow_mut() {
            Ok(mut slot) => slot.replace(radio),
            Err(_) => Some(radio),
        })
    }

    /// Move the driver out of the slot; `None` when empty or busy
    pub fn take(&self) -> Option<Sx127x<P, CB>> {
        critical_section::with(|cs| {
            let mut slot = self.radio.borrow(cs).try_borrow_mut().ok()?;
            slot.take()
        })
    }

    /// Run `f` on the driver with interrupts masked
    ///
    /// `None` when the slot is empty, or busy because this is called from a link callback.
    pub fn with<R>(&self, f: impl FnOnce(&mut Sx127x<P, CB>) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let mut slot = self.radio.borrow(cs).try_borrow_mut().ok()?;
            slot.as_mut().map(f)
        })
    }
}

impl<P, CB> SharedRadio<P, CB>
where
    P: RegisterPort,
    CB: LinkCallbacks,
{
    /// Entry point for the DIO0 interrupt handler
    pub fn on_interrupt(&self) {
        match self.with(|radio| radio.handle_irq()) {
            Some(Ok(())) => {}
            Some(Err(err)) => warn!("DIO0 handling failed: {:?}", err),
            None => trace!("DIO0 with no radio installed, or dispatched from a callback"),
        }
    }
}

impl<P, CB> Default for SharedRadio<P, CB> {
    fn default() -> Self {
        Self::new()
    }
}
