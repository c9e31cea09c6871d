use super::radio_kind_params::*;
use super::Sx127x;
use crate::mod_params::*;
use crate::mod_traits::{LinkCallbacks, RegisterPort};

// RSSI offset for the high frequency port (Section 5.5.5)
const SX1276_RSSI_OFFSET_HF: i16 = -157;
// RegPktSnrValue is in quarter dB
const SNR_SCALE: i8 = 4;

/// dBm for a raw RegPktRssiValue or RegRssiValue
pub fn rssi_from_raw(raw: u8) -> i16 {
    SX1276_RSSI_OFFSET_HF + raw as i16
}

/// Packet RSSI lowered by the SNR in dB when the packet was below the noise floor
pub fn snr_corrected_rssi(rssi: i16, snr_raw: i8) -> i16 {
    if snr_raw < 0 {
        rssi + (snr_raw / SNR_SCALE) as i16
    } else {
        rssi
    }
}

/// Frequency error in Hz from RegFreqErrorMsb/Mid/Lsb
///
/// The register triple is a 20-bit two's complement value, sign in bit 3 of the first byte.
pub fn decode_frequency_error(fei: [u8; 3], bandwidth: Bandwidth) -> i32 {
    let mut raw = (((fei[0] & (FEI_MSB_SIGN - 1)) as i32) << 16) | ((fei[1] as i32) << 8) | fei[2] as i32;
    if fei[0] & FEI_MSB_SIGN != 0 {
        raw -= 1 << 19;
    }
    ((raw >> 3) * bandwidth_normalised_shift(bandwidth)) >> 4
}

/// RegPpmCorrection value compensating `offset` at carrier `frequency`, both in the same unit
///
/// `None` for a zero carrier. The result saturates at the register range.
pub fn ppm_correction(offset: i32, frequency: u32) -> Option<i8> {
    let ppm = (offset as i64 * 1_000_000 * 95).checked_div(frequency as i64 * 100)?;
    Some(ppm.clamp(i8::MIN as i64, i8::MAX as i64) as i8)
}

impl<P, CB> Sx127x<P, CB>
where
    P: RegisterPort,
    CB: LinkCallbacks,
{
    /// RSSI of the last packet in dBm, uncorrected
    pub fn get_last_packet_rssi(&mut self) -> Result<i16, RadioError> {
        Ok(rssi_from_raw(self.get_last_packet_rssi_raw()?))
    }

    /// Raw RegPktRssiValue
    pub fn get_last_packet_rssi_raw(&mut self) -> Result<u8, RadioError> {
        self.port.read_register(Register::RegPktRssiValue)
    }

    /// Raw RegPktSnrValue, quarter dB
    pub fn get_last_packet_snr_raw(&mut self) -> Result<i8, RadioError> {
        Ok(self.port.read_register(Register::RegPktSnrValue)? as i8)
    }

    /// Instantaneous channel RSSI in dBm
    pub fn get_current_rssi(&mut self) -> Result<i16, RadioError> {
        Ok(rssi_from_raw(self.port.read_register(Register::RegRssiValue)?))
    }

    /// Refresh RSSI and SNR of the last packet
    ///
    /// The frequency error is left as of the last [`Sx127x::get_frequency_error`].
    pub fn get_last_packet_stats(&mut self) -> Result<PacketStats, RadioError> {
        let rssi = self.get_last_packet_rssi()?;
        let snr_raw = self.get_last_packet_snr_raw()?;
        self.stats.rssi = snr_corrected_rssi(rssi, snr_raw);
        self.stats.snr_raw = snr_raw;
        Ok(self.stats)
    }

    /// Carrier offset of the last packet in Hz, for the current bandwidth
    pub fn get_frequency_error(&mut self) -> Result<i32, RadioError> {
        let mut fei = [0u8; 3];
        self.port.read_register_burst(Register::RegFreqErrorMsb, &mut fei)?;
        let error = decode_frequency_error(fei, self.current_bandwidth());
        self.stats.frequency_error = error;
        Ok(error)
    }

    /// Whether the sign bit of the last frequency error is set
    pub fn frequency_error_is_negative(&mut self) -> Result<bool, RadioError> {
        Ok(self.port.get_reg_value(FREQ_ERROR_SIGN)? != 0)
    }

    /// Program RegPpmCorrection for a carrier offset in the unit of the last frequency setter
    pub fn set_ppm_offset_reg(&mut self, offset: i32) -> Result<(), RadioError> {
        let frequency = self.frequency.ok_or(RadioError::FrequencyNotSet)?;
        let ppm = ppm_correction(offset, frequency.raw()).ok_or(RadioError::FrequencyNotSet)?;
        trace!("ppm correction {} for offset {}", ppm, offset);
        self.port.write_register(Register::RegPpmCorrection, ppm as u8)
    }
}
