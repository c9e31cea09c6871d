use embedded_hal::spi::{Operation, SpiDevice};

use crate::mod_params::RadioError::{self, Spi};
use crate::mod_traits::{InterfaceVariant, RegisterPort};
use crate::sx127x::Register;

/// [`RegisterPort`] over an `embedded-hal` SPI device and an RF switch variant
///
/// Chip select framing is left to the `SpiDevice` implementation; one register access is one transaction.
pub struct SpiInterface<SPI, IV> {
    pub(crate) spi: SPI,
    pub(crate) iv: IV,
}

impl<SPI, IV> SpiInterface<SPI, IV>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
{
    /// Wrap a SPI device and the board RF switch
    pub fn new(spi: SPI, iv: IV) -> Self {
        Self { spi, iv }
    }

    /// Give back the bus and the RF switch
    pub fn release(self) -> (SPI, IV) {
        (self.spi, self.iv)
    }

    // Write an address byte followed by a payload in one chip select window.
    fn write(&mut self, addr: u8, payload: &[u8]) -> Result<(), RadioError> {
        let addr = [addr];
        let mut ops = [Operation::Write(&addr), Operation::Write(payload)];
        self.spi.transaction(&mut ops).map_err(|_| Spi)?;
        trace!("write: {:02x} -> {:?}", addr[0], payload);
        Ok(())
    }

    // Request a read, filling the provided buffer.
    fn read(&mut self, addr: u8, read_buffer: &mut [u8]) -> Result<(), RadioError> {
        let addr = [addr];
        let mut ops = [Operation::Write(&addr), Operation::Read(read_buffer)];
        self.spi.transaction(&mut ops).map_err(|_| Spi)?;
        trace!("read: {:02x}", addr[0]);
        Ok(())
    }
}

impl<SPI, IV> RegisterPort for SpiInterface<SPI, IV>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
{
    fn read_register(&mut self, register: Register) -> Result<u8, RadioError> {
        let mut read_buffer = [0x00u8];
        self.read(register.read_addr(), &mut read_buffer)?;
        Ok(read_buffer[0])
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), RadioError> {
        self.write(register.write_addr(), &[value])
    }

    fn read_register_burst(&mut self, register: Register, buf: &mut [u8]) -> Result<(), RadioError> {
        self.read(register.read_addr(), buf)
    }

    fn write_register_burst(&mut self, register: Register, buf: &[u8]) -> Result<(), RadioError> {
        self.write(register.write_addr(), buf)
    }

    fn enable_tx_path(&mut self) -> Result<(), RadioError> {
        self.iv.enable_rf_switch_tx()
    }

    fn enable_rx_path(&mut self) -> Result<(), RadioError> {
        self.iv.enable_rf_switch_rx()
    }

    fn disable_paths(&mut self) -> Result<(), RadioError> {
        self.iv.disable_rf_switch()
    }
}
