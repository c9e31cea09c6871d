pub use lora_modulation::{Bandwidth, CodingRate, SpreadingFactor};

use crate::sx127x::MAX_PAYLOAD_LENGTH;

/// Errors types reported during LoRa physical layer processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum RadioError {
    Spi,
    RfSwitchRx,
    RfSwitchTx,
    Irq,
    /// RegVersion never read back as the SX127x silicon id; carries the last value seen
    ChipNotDetected(u8),
    PayloadSizeUnexpected(usize),
    UnavailableSpreadingFactor(u8),
    /// A PPM correction was requested before any carrier frequency was programmed
    FrequencyNotSet,
}

impl From<lora_modulation::InvalidSpreadingFactor> for RadioError {
    fn from(value: lora_modulation::InvalidSpreadingFactor) -> Self {
        RadioError::UnavailableSpreadingFactor(value.0)
    }
}

/// Operating mode of the chip, as last written to RegOpMode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum OperatingMode {
    Sleep,
    Standby,
    Transmit,
    ReceiveSingle,
    ReceiveContinuous,
}

impl OperatingMode {
    /// Whether the chip is listening, single shot or continuous
    pub fn is_receive(self) -> bool {
        matches!(self, OperatingMode::ReceiveSingle | OperatingMode::ReceiveContinuous)
    }
}

/// Outcome reported to the link layer with a completed reception
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum RxStatus {
    Ok,
    Failed,
}

/// Operation queued by a link callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum NextOperation {
    Transmit,
    Receive,
    Sleep,
}

/// Follow-up handed to [`crate::LinkCallbacks`] so a completion can start the next operation
///
/// The driver is busy while a callback runs. The queued operation is started by
/// [`crate::Sx127x::handle_irq`] once every callback has returned; the last request wins.
pub struct Turnaround {
    next: Option<NextOperation>,
    payload: [u8; MAX_PAYLOAD_LENGTH],
    len: u8,
}

impl Turnaround {
    pub(crate) const fn new() -> Self {
        Self {
            next: None,
            payload: [0; MAX_PAYLOAD_LENGTH],
            len: 0,
        }
    }

    /// Transmit `payload` next; it is copied, so the caller keeps no borrow
    pub fn transmit(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if payload.len() > MAX_PAYLOAD_LENGTH {
            return Err(RadioError::PayloadSizeUnexpected(payload.len()));
        }
        self.payload[..payload.len()].copy_from_slice(payload);
        self.len = payload.len() as u8;
        self.next = Some(NextOperation::Transmit);
        Ok(())
    }

    /// Arm receive next, single shot or continuous as for [`crate::Sx127x::arm_receive_nonblocking`]
    pub fn receive(&mut self) {
        self.next = Some(NextOperation::Receive);
    }

    /// Put the chip to sleep next
    pub fn sleep(&mut self) {
        self.next = Some(NextOperation::Sleep);
    }

    /// Drop whatever was queued
    pub fn cancel(&mut self) {
        self.next = None;
    }

    /// The queued operation, if any
    pub fn pending(&self) -> Option<NextOperation> {
        self.next
    }

    pub(crate) fn take(&mut self) -> Option<NextOperation> {
        self.next.take()
    }

    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }
}

/// Link quality of the last received packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct PacketStats {
    /// dBm, corrected for negative SNR
    pub rssi: i16,
    /// raw RegPktSnrValue (quarter dB steps)
    pub snr_raw: i8,
    /// carrier offset in Hz from the last FEI read
    pub frequency_error: i32,
}

/// Carrier frequency, in Hz or in raw synthesizer steps
///
/// The driver remembers which one was used last; PPM corrections take their offset in the same unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Frequency {
    /// Hz
    Hz(u32),
    /// RegFrf units (FXOSC / 2^19 per step)
    Reg(u32),
}

impl Frequency {
    /// Value in whatever unit the variant carries
    pub fn raw(self) -> u32 {
        match self {
            Frequency::Hz(v) | Frequency::Reg(v) => v,
        }
    }
}

/// Power amplifier output wired on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaOutput {
    /// RFO_HF pin
    Rfo,
    /// PA_BOOST pin
    PaBoost,
}

/// Board capabilities and link defaults, resolved once when the driver is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Which PA pin drives the antenna. NB! Depends on board layout.
    pub pa_output: PaOutput,
    /// Transmit an explicit header (ignored with SF6)
    pub explicit_header: bool,
    /// Append and check a payload CRC (ignored with SF6)
    pub crc_enabled: bool,
    /// Sync word programmed by `begin`
    pub sync_word: u8,
    /// Fixed payload length used for implicit header packets and FIFO reads
    pub payload_length: u8,
    /// OutputPower field of RegPaConfig, 0..=15
    pub output_power: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pa_output: PaOutput::PaBoost,
            explicit_header: false,
            crc_enabled: false,
            sync_word: 0x12,
            payload_length: 8,
            output_power: 0,
        }
    }
}

/// Modem parameters applied together by [`crate::Sx127x::configure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub struct RadioConfig {
    pub bandwidth: Bandwidth,
    pub spreading_factor: SpreadingFactor,
    pub coding_rate: CodingRate,
    pub frequency: Frequency,
    pub preamble_length: u8,
    /// `None` keeps the sync word currently programmed
    pub sync_word: Option<u8>,
    pub iq_inverted: bool,
    pub payload_length: u8,
    /// Single-shot receive window in microseconds, 0 for continuous receive
    pub rx_timeout_us: u32,
}
