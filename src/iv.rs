use embedded_hal::digital::OutputPin;

use crate::mod_params::RadioError;
use crate::mod_params::RadioError::*;
use crate::mod_traits::InterfaceVariant;

/// Base for the InterfaceVariant implementation for boards with GPIO driven RF switches
pub struct GenericSx127xInterfaceVariant<CTRL> {
    rf_switch_rx: Option<CTRL>,
    rf_switch_tx: Option<CTRL>,
}

impl<CTRL> GenericSx127xInterfaceVariant<CTRL>
where
    CTRL: OutputPin,
{
    /// Create an InterfaceVariant instance from the optional RX and TX switch enable pins
    pub fn new(rf_switch_rx: Option<CTRL>, rf_switch_tx: Option<CTRL>) -> Self {
        Self {
            rf_switch_rx,
            rf_switch_tx,
        }
    }
}

impl<CTRL> InterfaceVariant for GenericSx127xInterfaceVariant<CTRL>
where
    CTRL: OutputPin,
{
    fn enable_rf_switch_rx(&mut self) -> Result<(), RadioError> {
        if let Some(pin) = &mut self.rf_switch_tx {
            pin.set_low().map_err(|_| RfSwitchTx)?;
        }
        match &mut self.rf_switch_rx {
            Some(pin) => pin.set_high().map_err(|_| RfSwitchRx),
            None => Ok(()),
        }
    }
    fn enable_rf_switch_tx(&mut self) -> Result<(), RadioError> {
        if let Some(pin) = &mut self.rf_switch_rx {
            pin.set_low().map_err(|_| RfSwitchRx)?;
        }
        match &mut self.rf_switch_tx {
            Some(pin) => pin.set_high().map_err(|_| RfSwitchTx),
            None => Ok(()),
        }
    }
    fn disable_rf_switch(&mut self) -> Result<(), RadioError> {
        if let Some(pin) = &mut self.rf_switch_rx {
            pin.set_low().map_err(|_| RfSwitchRx)?;
        }
        match &mut self.rf_switch_tx {
            Some(pin) => pin.set_low().map_err(|_| RfSwitchTx),
            None => Ok(()),
        }
    }
}

/// For boards whose antenna switch is hard wired or driven by the chip itself
pub struct NoRfSwitch;

impl InterfaceVariant for NoRfSwitch {
    fn enable_rf_switch_rx(&mut self) -> Result<(), RadioError> {
        Ok(())
    }
    fn enable_rf_switch_tx(&mut self) -> Result<(), RadioError> {
        Ok(())
    }
    fn disable_rf_switch(&mut self) -> Result<(), RadioError> {
        Ok(())
    }
}
