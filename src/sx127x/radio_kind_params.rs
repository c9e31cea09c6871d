use crate::mod_params::*;

/// Internal sx127x LoRa modes (signified by most significant bit flag)
#[derive(Clone, Copy)]
pub enum LoRaMode {
    Sleep = 0x00,
    Standby = 0x01,
    Tx = 0x03,
    RxContinuous = 0x05,
    RxSingle = 0x06,
}

impl LoRaMode {
    /// Mode value, including LoRa flag
    pub fn value(self) -> u8 {
        (self as u8) | LORA_MODE_FLAG
    }
}

impl From<OperatingMode> for LoRaMode {
    fn from(mode: OperatingMode) -> Self {
        match mode {
            OperatingMode::Sleep => LoRaMode::Sleep,
            OperatingMode::Standby => LoRaMode::Standby,
            OperatingMode::Transmit => LoRaMode::Tx,
            OperatingMode::ReceiveSingle => LoRaMode::RxSingle,
            OperatingMode::ReceiveContinuous => LoRaMode::RxContinuous,
        }
    }
}

/// LongRangeMode bit of RegOpMode, writable in sleep only
pub const LORA_MODE_FLAG: u8 = 0x80;

// IRQ mapping for sx127x chips:
// DIO0 - RxDone, TxDone, CadDone
// DIO1 - RxTimeout, FhssChangeChannel, CadDetected
// DIO0 mapping 0b11 is listed as unused but raises on both RxDone and TxDone,
// which saves remapping between transmit and receive.
pub const DIO0_RX_TX_DONE: u8 = 0b1100_0000;

#[derive(Clone, Copy)]
#[allow(dead_code)]
pub enum IrqMask {
    None = 0x00,
    CADActivityDetected = 0x01,
    FhssChangedChannel = 0x02,
    CADDone = 0x04,
    TxDone = 0x08,
    HeaderValid = 0x10,
    CRCError = 0x20,
    RxDone = 0x40,
    RxTimeout = 0x80,
    All = 0xFF,
}

impl IrqMask {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_set_in(self, mask: u8) -> bool {
        self.value() & mask == self.value()
    }
}

/// LoRa page register addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Register {
    RegFifo = 0x00,
    RegOpMode = 0x01,
    RegFrfMsb = 0x06,
    RegFrfMid = 0x07,
    RegFrfLsb = 0x08,
    RegPaConfig = 0x09,
    RegOcp = 0x0b,
    RegLna = 0x0c,
    RegFifoAddrPtr = 0x0d,
    RegFifoTxBaseAddr = 0x0e,
    RegFifoRxBaseAddr = 0x0f,
    RegIrqFlags = 0x12,
    RegPktSnrValue = 0x19,
    RegPktRssiValue = 0x1a,
    RegRssiValue = 0x1b,
    RegModemConfig1 = 0x1d,
    RegModemConfig2 = 0x1e,
    RegSymbTimeoutLsb = 0x1f,
    RegPreambleMsb = 0x20,
    RegPreambleLsb = 0x21,
    RegPayloadLength = 0x22,
    RegModemConfig3 = 0x26,
    RegPpmCorrection = 0x27,
    RegFreqErrorMsb = 0x28,
    RegFreqErrorMid = 0x29,
    RegFreqErrorLsb = 0x2a,
    RegDetectionOptimize = 0x31,
    RegInvertiq = 0x33,
    RegHighBwOptimize1 = 0x36,
    RegDetectionThreshold = 0x37,
    RegSyncWord = 0x39,
    RegHighBwOptimize2 = 0x3a,
    RegInvertiq2 = 0x3b,
    RegDioMapping1 = 0x40,
    RegVersion = 0x42,
}

impl Register {
    /// Register address without the access bit
    pub fn addr(self) -> u8 {
        self as u8
    }
    /// Address byte for an SPI read access
    pub fn read_addr(self) -> u8 {
        (self as u8) & 0x7f
    }
    /// Address byte for an SPI write access
    pub fn write_addr(self) -> u8 {
        (self as u8) | 0x80
    }
}

/// Bits `msb..=lsb` of a register
///
/// Values handed to or read from a field stay in register position (not shifted down).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    /// Register holding the field
    pub register: Register,
    /// Highest bit, inclusive
    pub msb: u8,
    /// Lowest bit, inclusive
    pub lsb: u8,
}

impl BitField {
    /// Field covering bits `msb..=lsb` of `register`
    pub const fn new(register: Register, msb: u8, lsb: u8) -> Self {
        Self { register, msb, lsb }
    }

    /// Register mask selecting the field bits
    pub const fn mask(self) -> u8 {
        ((0xffu16 << self.lsb) & (0xffu16 >> (7 - self.msb))) as u8
    }
}

pub const OP_MODE_MODE: BitField = BitField::new(Register::RegOpMode, 2, 0);
pub const MODEM_CONFIG_2_SF_TX_CONT: BitField = BitField::new(Register::RegModemConfig2, 7, 3);
pub const MODEM_CONFIG_2_CRC: BitField = BitField::new(Register::RegModemConfig2, 2, 2);
pub const MODEM_CONFIG_2_SYMB_TIMEOUT_MSB: BitField = BitField::new(Register::RegModemConfig2, 1, 0);
pub const DETECT_OPTIMIZE: BitField = BitField::new(Register::RegDetectionOptimize, 2, 0);
pub const DIO_MAPPING_1_DIO0: BitField = BitField::new(Register::RegDioMapping1, 7, 6);
pub const OCP_TRIM: BitField = BitField::new(Register::RegOcp, 5, 0);
pub const FREQ_ERROR_SIGN: BitField = BitField::new(Register::RegFreqErrorMsb, 3, 3);
pub const FEI_MSB_SIGN: u8 = 0b1000;

pub const VERSION_SX127X: u8 = 0x12;
pub const DETECT_ATTEMPTS: u8 = 3;
pub const DETECT_RETRY_DELAY_MS: u32 = 200;

pub const FIFO_TX_BASE_ADDR: u8 = 0x00;
pub const FIFO_RX_BASE_ADDR: u8 = 0x00;
pub const DEFAULT_PREAMBLE_LENGTH: u8 = 8;

// RegModemConfig1 [0]
pub const HEADER_IMPLICIT: u8 = 0x01;
pub const HEADER_EXPLICIT: u8 = 0x00;
// RegModemConfig2 [2]
pub const RX_CRC_ON: u8 = 0b0000_0100;
pub const RX_CRC_OFF: u8 = 0x00;
// RegModemConfig2 [3]
pub const TX_MODE_SINGLE: u8 = 0x00;
// RegModemConfig3 [2], LowDataRateOptimize [3] left off
pub const AGC_AUTO_ON: u8 = 0b0000_0100;
pub const LOW_DATA_RATE_OPT_OFF: u8 = 0x00;
// RegLna [1:0], gain bits are overridden by the AGC
pub const LNA_BOOST_ON: u8 = 0b0000_0011;
// RegOcp [5] on, [4:0] trim 150 mA
pub const OCP_ON_150MA: u8 = 0b0011_0010;

// RegInvertiq [6] InvertIQRX, [5:1] reserved 0x13, [0] InvertIQTX
// RegInvertiq2 0x19 when inverted, otherwise 0x1d
pub const INVERT_IQ_RESERVED: u8 = 0x13 << 1;
pub const INVERT_IQ_RX: u8 = 1 << 6;
pub const INVERT_IQ_TX: u8 = 1 << 0;
pub const INVERT_IQ_2_ON: u8 = 0x19;
pub const INVERT_IQ_2_OFF: u8 = 0x1d;

// Sx1276/77/78/79 errata note 1.1, section 2.1 (500 kHz sensitivity)
pub const HIGH_BW_OPTIMIZE_1_500KHZ: u8 = 0x02;
pub const HIGH_BW_OPTIMIZE_1_DEFAULT: u8 = 0x03;
pub const HIGH_BW_OPTIMIZE_2_500KHZ: u8 = 0x64;

/// PA configuration
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub enum PaConfig {
    PaBoost = 0x80,
    Rfo = 0x00,
}

impl PaConfig {
    pub fn value(self) -> u8 {
        self as u8
    }
}

// RegPaConfig [6:4] MaxPower: Pmax = 10.8 + 0.6 * MaxPower
pub const MAX_POWER_PA_BOOST: u8 = 0x70;
pub const MAX_POWER_RFO_HF: u8 = 0x70;
pub const OUTPUT_POWER_MASK: u8 = 0x0f;

/// RegPaConfig value for the given PA pin and OutputPower field
pub fn pa_config_value(pa_output: PaOutput, output_power: u8) -> u8 {
    let power = output_power & OUTPUT_POWER_MASK;
    match pa_output {
        PaOutput::PaBoost => PaConfig::PaBoost.value() | MAX_POWER_PA_BOOST | power,
        PaOutput::Rfo => PaConfig::Rfo.value() | MAX_POWER_RFO_HF | power,
    }
}

/// (RegDetectOptimize[2:0], RegDetectionThreshold) recommended per spreading factor
pub fn detection_values(spreading_factor: SpreadingFactor) -> (u8, u8) {
    match spreading_factor {
        SpreadingFactor::_6 => (0x05, 0x0c),
        _ => (0x03, 0x0a),
    }
}

/// RegModemConfig2 [7:4]
pub fn spreading_factor_value(spreading_factor: SpreadingFactor) -> u8 {
    spreading_factor.factor() << 4
}

/// RegModemConfig1 [7:4]
pub fn bandwidth_value(bandwidth: Bandwidth) -> u8 {
    match bandwidth {
        Bandwidth::_7KHz => 0x00,
        Bandwidth::_10KHz => 0x10,
        Bandwidth::_15KHz => 0x20,
        Bandwidth::_20KHz => 0x30,
        Bandwidth::_31KHz => 0x40,
        Bandwidth::_41KHz => 0x50,
        Bandwidth::_62KHz => 0x60,
        Bandwidth::_125KHz => 0x70,
        Bandwidth::_250KHz => 0x80,
        Bandwidth::_500KHz => 0x90,
    }
}

/// RegModemConfig1 [3:1]
pub fn coding_rate_value(coding_rate: CodingRate) -> u8 {
    match coding_rate {
        CodingRate::_4_5 => 0b0000_0010,
        CodingRate::_4_6 => 0b0000_0100,
        CodingRate::_4_7 => 0b0000_0110,
        CodingRate::_4_8 => 0b0000_1000,
    }
}

/// Normalised reciprocal of the bandwidth (8000 / BW in kHz), precomputed for a 32 MHz crystal
///
/// Lets the FEI conversion run in integer arithmetic.
pub fn bandwidth_normalised_shift(bandwidth: Bandwidth) -> i32 {
    match bandwidth {
        Bandwidth::_7KHz => 1026,
        Bandwidth::_10KHz => 769,
        Bandwidth::_15KHz => 513,
        Bandwidth::_20KHz => 385,
        Bandwidth::_31KHz => 256,
        Bandwidth::_41KHz => 192,
        Bandwidth::_62KHz => 128,
        Bandwidth::_125KHz => 64,
        Bandwidth::_250KHz => 32,
        Bandwidth::_500KHz => 16,
    }
}

/// Sync words that do not alias the preamble, ascending.
pub const ALLOWED_SYNC_WORDS: [u8; 105] = [
    0, 5, 6, 7, 11, 12, 13, 15, 18, 21, 23, 26, 29, 30, 31, 33, 34, 37, 38, 39, 40, 42, 44, 50, 51, 54, 55, 57, 58,
    59, 61, 63, 65, 67, 68, 71, 77, 78, 79, 80, 82, 84, 86, 89, 92, 94, 96, 97, 99, 101, 102, 105, 106, 109, 111,
    113, 115, 117, 118, 119, 121, 122, 124, 126, 127, 129, 130, 138, 143, 161, 170, 172, 173, 175, 180, 181, 182,
    187, 190, 191, 192, 193, 196, 199, 201, 204, 205, 208, 209, 212, 213, 219, 220, 221, 223, 227, 229, 235, 239,
    240, 242, 243, 246, 247, 255,
];

/// Smallest allowed sync word not below `requested`
///
/// The table ends at 0xff, so every byte has an answer.
pub fn nearest_sync_word(requested: u8) -> u8 {
    match ALLOWED_SYNC_WORDS.binary_search(&requested) {
        Ok(_) => requested,
        Err(idx) => ALLOWED_SYNC_WORDS[idx],
    }
}
