use crate::mod_params::*;
use crate::sx127x::{BitField, Register};

/// Register-level access to an SX127x, implemented by the board support layer
///
/// Every method must complete in bounded time: the driver calls these from interrupt context.
pub trait RegisterPort {
    /// Read one register
    fn read_register(&mut self, register: Register) -> Result<u8, RadioError>;
    /// Write one register
    fn write_register(&mut self, register: Register, value: u8) -> Result<(), RadioError>;
    /// Read consecutive registers starting at `register`
    fn read_register_burst(&mut self, register: Register, buf: &mut [u8]) -> Result<(), RadioError>;
    /// Write consecutive registers starting at `register`
    fn write_register_burst(&mut self, register: Register, buf: &[u8]) -> Result<(), RadioError>;
    /// Enable the antenna path used for send operations, disabling the receive path
    fn enable_tx_path(&mut self) -> Result<(), RadioError>;
    /// Enable the antenna path used for receive operations, disabling the send path
    fn enable_rx_path(&mut self) -> Result<(), RadioError>;
    /// Disable both antenna paths
    fn disable_paths(&mut self) -> Result<(), RadioError>;

    /// Drain `buf.len()` bytes from the FIFO at the current FIFO pointer
    fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), RadioError> {
        self.read_register_burst(Register::RegFifo, buf)
    }

    /// Push `buf` into the FIFO at the current FIFO pointer
    fn write_fifo(&mut self, buf: &[u8]) -> Result<(), RadioError> {
        self.write_register_burst(Register::RegFifo, buf)
    }

    /// Read the bits of `field`, left in register position
    fn get_reg_value(&mut self, field: BitField) -> Result<u8, RadioError> {
        Ok(self.read_register(field.register)? & field.mask())
    }

    /// Replace the bits of `field` with the matching bits of `value`, keeping the rest of the register
    fn set_reg_value(&mut self, field: BitField, value: u8) -> Result<(), RadioError> {
        let mask = field.mask();
        let current = self.read_register(field.register)?;
        self.write_register(field.register, (current & !mask) | (value & mask))
    }
}

/// Functions implemented for an embedded framework for an MCU/LoRa chip combination
/// to allow [`crate::SpiInterface`] to drive the board RF switch.
pub trait InterfaceVariant {
    /// Enable an antenna used for receive operations, disabling other antennas
    fn enable_rf_switch_rx(&mut self) -> Result<(), RadioError>;
    /// Enable an antenna used for send operations, disabling other antennas
    fn enable_rf_switch_tx(&mut self) -> Result<(), RadioError>;
    /// Disable all antennas
    fn disable_rf_switch(&mut self) -> Result<(), RadioError>;
}

/// Completion notifications delivered to the link layer
///
/// Both methods run in interrupt context while the driver is borrowed: keep them short and
/// never block. The next operation, such as the receive window after a transmission, is queued
/// on `next` rather than started through [`crate::SharedRadio`].
pub trait LinkCallbacks {
    /// The packet handed to [`crate::Sx127x::transmit_nonblocking`] has left the antenna
    fn tx_done(&mut self, _next: &mut Turnaround) {}
    /// A packet arrived; `payload` borrows the driver receive buffer until return
    fn rx_done(&mut self, _status: RxStatus, _payload: &[u8], _next: &mut Turnaround) {}
}

impl LinkCallbacks for () {}
