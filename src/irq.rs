//! Async DIO0 pump for executors that expose the interrupt line as an `embedded-hal-async` pin
use core::convert::Infallible;

use embedded_hal_async::digital::Wait;

use crate::mod_params::RadioError;
use crate::mod_traits::{LinkCallbacks, RegisterPort};
use crate::shared::SharedRadio;

/// Service DIO0 for as long as the pin can be awaited
///
/// DIO0 stays high until the IRQ flags are cleared, so waiting on the level never misses a
/// completion raised while the previous one was being handled.
pub async fn run<P, CB, W>(radio: &SharedRadio<P, CB>, dio0: &mut W) -> Result<Infallible, RadioError>
where
    P: RegisterPort,
    CB: LinkCallbacks,
    W: Wait,
{
    loop {
        dio0.wait_for_high().await.map_err(|_| RadioError::Irq)?;
        radio.on_interrupt();
    }
}
