#![no_std]
//! LoRa modulation parameters shared between the radio driver and the link layer above it.

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Channel width.
pub enum Bandwidth {
    _7KHz,
    _10KHz,
    _15KHz,
    _20KHz,
    _31KHz,
    _41KHz,
    _62KHz,
    _125KHz,
    _250KHz,
    _500KHz,
}

impl Bandwidth {
    /// Widest supported channel.
    pub const MAX: Bandwidth = Bandwidth::_500KHz;

    /// Channel width in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            Bandwidth::_7KHz => 7_800,
            Bandwidth::_10KHz => 10_400,
            Bandwidth::_15KHz => 15_600,
            Bandwidth::_20KHz => 20_800,
            Bandwidth::_31KHz => 31_250,
            Bandwidth::_41KHz => 41_700,
            Bandwidth::_62KHz => 62_500,
            Bandwidth::_125KHz => 125_000,
            Bandwidth::_250KHz => 250_000,
            Bandwidth::_500KHz => 500_000,
        }
    }
}

impl From<Bandwidth> for u32 {
    fn from(value: Bandwidth) -> Self {
        value.hz()
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Controls the chirp rate. Lower values are slower bandwidth, but more robust.
pub enum SpreadingFactor {
    _6,
    _7,
    _8,
    _9,
    _10,
    _11,
    _12,
}

impl SpreadingFactor {
    /// Smallest spreading factor; it only works with an implicit header.
    pub const MIN: SpreadingFactor = SpreadingFactor::_6;

    /// log2 of the number of chips per symbol.
    pub const fn factor(self) -> u8 {
        match self {
            SpreadingFactor::_6 => 6,
            SpreadingFactor::_7 => 7,
            SpreadingFactor::_8 => 8,
            SpreadingFactor::_9 => 9,
            SpreadingFactor::_10 => 10,
            SpreadingFactor::_11 => 11,
            SpreadingFactor::_12 => 12,
        }
    }
}

/// Error for a raw spreading factor outside 6..=12.
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSpreadingFactor(pub u8);

impl TryFrom<u8> for SpreadingFactor {
    type Error = InvalidSpreadingFactor;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(SpreadingFactor::_6),
            7 => Ok(SpreadingFactor::_7),
            8 => Ok(SpreadingFactor::_8),
            9 => Ok(SpreadingFactor::_9),
            10 => Ok(SpreadingFactor::_10),
            11 => Ok(SpreadingFactor::_11),
            12 => Ok(SpreadingFactor::_12),
            other => Err(InvalidSpreadingFactor(other)),
        }
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Controls the forward error correction. Higher values are more robust, but reduces the ratio
/// of actual data in transmissions.
pub enum CodingRate {
    _4_5,
    _4_6,
    _4_7,
    _4_8,
}

impl CodingRate {
    /// Denominator of the 4/x ratio.
    pub const fn denominator(self) -> u8 {
        match self {
            CodingRate::_4_5 => 5,
            CodingRate::_4_6 => 6,
            CodingRate::_4_7 => 7,
            CodingRate::_4_8 => 8,
        }
    }
}
