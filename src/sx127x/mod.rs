mod radio_kind_params;
mod telemetry;
#[cfg(test)]
pub(crate) mod test;

use embedded_hal::delay::DelayNs;
use radio_kind_params::*;
pub use radio_kind_params::{BitField, Register, ALLOWED_SYNC_WORDS};
pub use telemetry::{decode_frequency_error, ppm_correction, rssi_from_raw, snr_corrected_rssi};

use crate::mod_params::*;
use crate::mod_traits::{LinkCallbacks, RegisterPort};

// RegSymbTimeout is 10 bits wide
const SX127X_MAX_LORA_SYMB_NUM_TIMEOUT: u16 = 1023;

// Frequency synthesizer: Fstep = FXOSC / 2^19
const FXOSC: u64 = 32_000_000;
const FREQ_STEP_SHIFT: u32 = 19;

/// Largest payload the FIFO can hold
pub const MAX_PAYLOAD_LENGTH: usize = 255;

/// Register value for a carrier in Hz
pub fn freq_to_pll_step(freq_in_hz: u32) -> u32 {
    (((freq_in_hz as u64) << FREQ_STEP_SHIFT) / FXOSC) as u32
}

/// Carrier in Hz for a register value, truncated
pub fn pll_step_to_freq(pll_step: u32) -> u32 {
    ((pll_step as u64 * FXOSC) >> FREQ_STEP_SHIFT) as u32
}

/// Duration of one LoRa symbol in microseconds
pub fn symbol_time_us(spreading_factor: SpreadingFactor, bandwidth: Bandwidth) -> u32 {
    ((1u64 << spreading_factor.factor()) * 1_000_000 / bandwidth.hz() as u64) as u32
}

/// Whole symbols fitting in a receive window of `interval_us`, capped at the register width
///
/// A window shorter than one symbol gives 0, which selects continuous receive.
pub fn rx_timeout_symbols(interval_us: u32, spreading_factor: SpreadingFactor, bandwidth: Bandwidth) -> u16 {
    let symbols = interval_us / symbol_time_us(spreading_factor, bandwidth);
    symbols.min(SX127X_MAX_LORA_SYMB_NUM_TIMEOUT as u32) as u16
}

// Chip values after reset, used for computations until the modem has been programmed
const RESET_BANDWIDTH: Bandwidth = Bandwidth::_125KHz;
const RESET_SPREADING_FACTOR: SpreadingFactor = SpreadingFactor::_7;

/// Interrupt driven LoRa driver for an SX127x behind a [`RegisterPort`]
///
/// Modulation settings are cached as last written; setters skip the register write when the
/// cached value already matches. Completions are delivered to `CB` from [`Sx127x::handle_irq`].
pub struct Sx127x<P, CB> {
    pub(crate) port: P,
    callbacks: CB,
    config: Config,
    mode: OperatingMode,
    bandwidth: Option<Bandwidth>,
    coding_rate: Option<CodingRate>,
    spreading_factor: Option<SpreadingFactor>,
    preamble_length: Option<u8>,
    sync_word: Option<u8>,
    frequency: Option<Frequency>,
    output_power: u8,
    payload_length: u8,
    iq_inverted: bool,
    timeout_symbols: u16,
    stats: PacketStats,
    rx_buffer: [u8; MAX_PAYLOAD_LENGTH + 1],
    turnaround: Turnaround,
}

impl<P, CB> Sx127x<P, CB>
where
    P: RegisterPort,
    CB: LinkCallbacks,
{
    /// Create a driver; nothing is sent to the chip until [`Sx127x::begin`]
    pub fn new(port: P, callbacks: CB, config: Config) -> Self {
        Self {
            port,
            callbacks,
            config,
            mode: OperatingMode::Sleep,
            bandwidth: None,
            coding_rate: None,
            spreading_factor: None,
            preamble_length: None,
            sync_word: None,
            frequency: None,
            output_power: config.output_power,
            payload_length: config.payload_length,
            iq_inverted: false,
            timeout_symbols: 0,
            stats: PacketStats::default(),
            rx_buffer: [0; MAX_PAYLOAD_LENGTH + 1],
            turnaround: Turnaround::new(),
        }
    }

    /// Detect the chip, then program the LoRa defaults from [`Config`]
    ///
    /// No configuration register is touched when detection fails.
    pub fn begin(&mut self, delay: &mut impl DelayNs) -> Result<(), RadioError> {
        self.detect_chip(delay)?;
        self.config_lora_defaults(self.config.sync_word)
    }

    /// Read RegVersion up to three times, pausing after every miss
    ///
    /// On success the chip is put to sleep.
    pub fn detect_chip(&mut self, delay: &mut impl DelayNs) -> Result<(), RadioError> {
        let mut version = 0;
        for attempt in 1..=DETECT_ATTEMPTS {
            version = self.port.read_register(Register::RegVersion)?;
            if version == VERSION_SX127X {
                debug!("SX127x found (RegVersion == 0x{:02x})", version);
                self.port.set_reg_value(OP_MODE_MODE, LoRaMode::Sleep as u8)?;
                self.mode = OperatingMode::Sleep;
                return Ok(());
            }
            debug!(
                "SX127x not found ({} of {} tries) RegVersion == 0x{:02x}",
                attempt, DETECT_ATTEMPTS, version
            );
            delay.delay_ms(DETECT_RETRY_DELAY_MS);
        }
        warn!("SX127x not detected");
        Err(RadioError::ChipNotDetected(version))
    }

    /// Switch the chip into LoRa mode and write the baseline registers
    ///
    /// Leaves the chip in standby.
    pub fn config_lora_defaults(&mut self, sync_word: u8) -> Result<(), RadioError> {
        // LongRangeMode only changes while sleeping
        self.port.write_register(Register::RegOpMode, LoRaMode::Sleep as u8)?;
        self.port.write_register(Register::RegOpMode, LoRaMode::Sleep.value())?;
        self.mode = OperatingMode::Sleep;
        self.set_mode(OperatingMode::Standby)?;

        self.port.write_register(Register::RegPayloadLength, self.payload_length)?;
        self.set_sync_word(sync_word)?;
        self.port.write_register(Register::RegFifoTxBaseAddr, FIFO_TX_BASE_ADDR)?;
        self.port.write_register(Register::RegFifoRxBaseAddr, FIFO_RX_BASE_ADDR)?;
        self.port.set_reg_value(DIO_MAPPING_1_DIO0, DIO0_RX_TX_DONE)?;
        self.port.write_register(Register::RegLna, LNA_BOOST_ON)?;
        self.port
            .write_register(Register::RegModemConfig3, AGC_AUTO_ON | LOW_DATA_RATE_OPT_OFF)?;
        self.port.set_reg_value(OCP_TRIM, OCP_ON_150MA)?;
        self.set_preamble_length(DEFAULT_PREAMBLE_LENGTH)?;
        self.set_iq_inversion(self.iq_inverted)
    }

    /// Apply a full modem configuration
    ///
    /// Calling it twice with the same parameters writes no modulation register the second time.
    pub fn configure(&mut self, params: &RadioConfig) -> Result<(), RadioError> {
        debug!(
            "configure: sf = {}, bw = {} Hz, cr = 4/{}, preamble = {}",
            params.spreading_factor.factor(),
            params.bandwidth.hz(),
            params.coding_rate.denominator(),
            params.preamble_length
        );
        self.payload_length = params.payload_length;
        self.iq_inverted = params.iq_inverted;
        let sync_word = params
            .sync_word
            .or(self.sync_word)
            .unwrap_or(self.config.sync_word);

        self.config_lora_defaults(sync_word)?;
        self.set_preamble_length(params.preamble_length)?;
        self.set_output_power(self.output_power)?;
        self.set_spreading_factor(params.spreading_factor)?;
        self.set_bandwidth_coding_rate(params.bandwidth, params.coding_rate)?;
        match params.frequency {
            Frequency::Hz(freq) => self.set_frequency_hz(freq)?,
            Frequency::Reg(frf) => self.set_frequency_reg(frf)?,
        }
        self.set_rx_timeout_us(params.rx_timeout_us)
    }

    /// Write RegOpMode unless `mode` is already the cached one
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), RadioError> {
        if self.mode != mode {
            self.port.write_register(Register::RegOpMode, LoRaMode::from(mode).value())?;
            trace!("mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
        Ok(())
    }

    /// Program bandwidth, coding rate, header mode and CRC
    ///
    /// With SF6 the header is forced implicit and the CRC off. A 500 kHz bandwidth applies the
    /// errata sensitivity settings.
    pub fn set_bandwidth_coding_rate(&mut self, bandwidth: Bandwidth, coding_rate: CodingRate) -> Result<(), RadioError> {
        if self.bandwidth == Some(bandwidth) && self.coding_rate == Some(coding_rate) {
            return Ok(());
        }

        let (header, crc) = if self.spreading_factor == Some(SpreadingFactor::MIN) {
            (HEADER_IMPLICIT, RX_CRC_OFF)
        } else {
            (
                if self.config.explicit_header {
                    HEADER_EXPLICIT
                } else {
                    HEADER_IMPLICIT
                },
                if self.config.crc_enabled { RX_CRC_ON } else { RX_CRC_OFF },
            )
        };
        self.port.write_register(
            Register::RegModemConfig1,
            bandwidth_value(bandwidth) | coding_rate_value(coding_rate) | header,
        )?;
        self.port.set_reg_value(MODEM_CONFIG_2_CRC, crc)?;

        if bandwidth == Bandwidth::MAX {
            self.port
                .write_register(Register::RegHighBwOptimize1, HIGH_BW_OPTIMIZE_1_500KHZ)?;
            self.port
                .write_register(Register::RegHighBwOptimize2, HIGH_BW_OPTIMIZE_2_500KHZ)?;
        } else {
            self.port
                .write_register(Register::RegHighBwOptimize1, HIGH_BW_OPTIMIZE_1_DEFAULT)?;
        }

        self.bandwidth = Some(bandwidth);
        self.coding_rate = Some(coding_rate);
        Ok(())
    }

    /// Program the nearest allowed sync word at or above `sync_word`
    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), RadioError> {
        let programmed = nearest_sync_word(sync_word);
        if programmed != sync_word {
            info!("using sync word 0x{:02x} instead of 0x{:02x}", programmed, sync_word);
        }
        if self.sync_word != Some(programmed) {
            self.port.write_register(Register::RegSyncWord, programmed)?;
            self.sync_word = Some(programmed);
        }
        Ok(())
    }

    /// Program the spreading factor with its detection optimisation pair
    pub fn set_spreading_factor(&mut self, spreading_factor: SpreadingFactor) -> Result<(), RadioError> {
        if self.spreading_factor == Some(spreading_factor) {
            return Ok(());
        }
        let crosses_sf6 = self.spreading_factor.map(|sf| sf == SpreadingFactor::MIN)
            != Some(spreading_factor == SpreadingFactor::MIN);

        self.port.set_reg_value(
            MODEM_CONFIG_2_SF_TX_CONT,
            spreading_factor_value(spreading_factor) | TX_MODE_SINGLE,
        )?;
        let (opt, thr) = detection_values(spreading_factor);
        self.port.set_reg_value(DETECT_OPTIMIZE, opt)?;
        self.port.write_register(Register::RegDetectionThreshold, thr)?;
        self.spreading_factor = Some(spreading_factor);

        if crosses_sf6 {
            self.reapply_header_mode()?;
        }
        Ok(())
    }

    /// Program the preamble length (RegPreambleLsb)
    pub fn set_preamble_length(&mut self, preamble_length: u8) -> Result<(), RadioError> {
        if self.preamble_length != Some(preamble_length) {
            self.port.write_register(Register::RegPreambleLsb, preamble_length)?;
            self.preamble_length = Some(preamble_length);
        }
        Ok(())
    }

    /// Program the OutputPower field for the configured PA pin, from standby
    pub fn set_output_power(&mut self, output_power: u8) -> Result<(), RadioError> {
        self.set_mode(OperatingMode::Standby)?;
        debug!("tx power = {}", output_power & OUTPUT_POWER_MASK);
        self.port.write_register(
            Register::RegPaConfig,
            pa_config_value(self.config.pa_output, output_power),
        )?;
        self.output_power = output_power;
        Ok(())
    }

    /// Tune to `freq_in_hz`, from standby
    pub fn set_frequency_hz(&mut self, freq_in_hz: u32) -> Result<(), RadioError> {
        debug!("channel = {}", freq_in_hz);
        self.frequency = Some(Frequency::Hz(freq_in_hz));
        self.set_mode(OperatingMode::Standby)?;
        self.write_frf(freq_to_pll_step(freq_in_hz))
    }

    /// Tune to a raw RegFrf value, from standby
    pub fn set_frequency_reg(&mut self, frf: u32) -> Result<(), RadioError> {
        debug!("channel = {} Hz (frf 0x{:06x})", pll_step_to_freq(frf), frf);
        self.frequency = Some(Frequency::Reg(frf));
        self.set_mode(OperatingMode::Standby)?;
        self.write_frf(frf)
    }

    fn write_frf(&mut self, frf: u32) -> Result<(), RadioError> {
        let frf_bytes = [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8];
        self.port.write_register_burst(Register::RegFrfMsb, &frf_bytes)
    }

    /// Arm a single-shot receive window of `interval_us`, or continuous receive for 0
    ///
    /// The symbol count uses the current spreading factor and bandwidth. A non-zero window
    /// shorter than one symbol is programmed as 0 symbols and also selects continuous receive.
    pub fn set_rx_timeout_us(&mut self, interval_us: u32) -> Result<(), RadioError> {
        self.timeout_symbols = 0;
        if interval_us == 0 {
            return Ok(());
        }
        let symbols = rx_timeout_symbols(interval_us, self.current_spreading_factor(), self.current_bandwidth());
        self.port
            .set_reg_value(MODEM_CONFIG_2_SYMB_TIMEOUT_MSB, (symbols >> 8) as u8)?;
        self.port.write_register(Register::RegSymbTimeoutLsb, symbols as u8)?;
        debug!("rx timeout {} us = {} symbols", interval_us, symbols);
        self.timeout_symbols = symbols;
        Ok(())
    }

    /// Transmit an explicit header from now on, unless running SF6
    pub fn set_header_mode(&mut self, explicit_header: bool) -> Result<(), RadioError> {
        if self.config.explicit_header != explicit_header {
            self.config.explicit_header = explicit_header;
            self.reapply_header_mode()?;
        }
        Ok(())
    }

    /// Append and check a payload CRC from now on, unless running SF6
    pub fn set_crc(&mut self, crc_enabled: bool) -> Result<(), RadioError> {
        if self.config.crc_enabled != crc_enabled {
            self.config.crc_enabled = crc_enabled;
            self.reapply_header_mode()?;
        }
        Ok(())
    }

    // Rewrite RegModemConfig1/2 header and CRC bits for the cached bandwidth and coding rate.
    fn reapply_header_mode(&mut self) -> Result<(), RadioError> {
        if let (Some(bandwidth), Some(coding_rate)) = (self.bandwidth.take(), self.coding_rate) {
            self.set_bandwidth_coding_rate(bandwidth, coding_rate)?;
        }
        Ok(())
    }

    fn set_iq_inversion(&mut self, iq_inverted: bool) -> Result<(), RadioError> {
        let (iq1, iq2) = match iq_inverted {
            true => (INVERT_IQ_RX, INVERT_IQ_2_ON),
            false => (INVERT_IQ_TX, INVERT_IQ_2_OFF),
        };
        self.port
            .write_register(Register::RegInvertiq, INVERT_IQ_RESERVED | iq1)?;
        self.port.write_register(Register::RegInvertiq2, iq2)
    }

    /// Load `payload` into the FIFO and start transmitting
    ///
    /// Completion is reported through [`LinkCallbacks::tx_done`].
    pub fn transmit_nonblocking(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if payload.len() > MAX_PAYLOAD_LENGTH {
            return Err(RadioError::PayloadSizeUnexpected(payload.len()));
        }
        self.prepare_transmit()?;
        self.port.write_fifo(payload)?;
        self.set_mode(OperatingMode::Transmit)
    }

    fn prepare_transmit(&mut self) -> Result<(), RadioError> {
        self.set_mode(OperatingMode::Standby)?;
        self.port.enable_tx_path()?;
        self.port.write_register(Register::RegFifoAddrPtr, FIFO_TX_BASE_ADDR)
    }

    /// Start listening, single shot if a receive timeout is set, continuous otherwise
    ///
    /// Packets are reported through [`LinkCallbacks::rx_done`].
    pub fn arm_receive_nonblocking(&mut self) -> Result<(), RadioError> {
        self.set_mode(OperatingMode::Standby)?;
        self.port.enable_rx_path()?;
        self.port.write_register(Register::RegFifoAddrPtr, FIFO_RX_BASE_ADDR)?;
        if self.timeout_symbols != 0 {
            self.set_mode(OperatingMode::ReceiveSingle)
        } else {
            self.set_mode(OperatingMode::ReceiveContinuous)
        }
    }

    /// DIO0 interrupt service routine
    ///
    /// Flags are cleared before any completion is dispatched. A completion whose flag does not
    /// match the cached mode is dropped. An operation queued on the [`Turnaround`] by a callback
    /// is started last.
    pub fn handle_irq(&mut self) -> Result<(), RadioError> {
        let irq_flags = self.get_irq_flags()?;
        self.clear_irq_flags()?;

        if IrqMask::TxDone.is_set_in(irq_flags) && self.mode == OperatingMode::Transmit {
            self.port.disable_paths()?;
            // the chip falls back to standby by itself
            self.mode = OperatingMode::Standby;
            self.callbacks.tx_done(&mut self.turnaround);
        }

        if IrqMask::RxDone.is_set_in(irq_flags) && self.mode.is_receive() {
            let len = self.payload_length as usize;
            self.port.read_fifo(&mut self.rx_buffer[..len])?;
            // a receive window means single shot, after which the chip is back in standby
            if self.timeout_symbols != 0 {
                self.mode = OperatingMode::Standby;
            }
            self.callbacks
                .rx_done(RxStatus::Ok, &self.rx_buffer[..len], &mut self.turnaround);
        }
        self.start_turnaround()
    }

    fn start_turnaround(&mut self) -> Result<(), RadioError> {
        match self.turnaround.take() {
            None => Ok(()),
            Some(NextOperation::Receive) => self.arm_receive_nonblocking(),
            Some(NextOperation::Sleep) => self.end(),
            Some(NextOperation::Transmit) => {
                trace!("turnaround transmit of {} bytes", self.turnaround.payload().len());
                self.prepare_transmit()?;
                self.port.write_fifo(self.turnaround.payload())?;
                self.set_mode(OperatingMode::Transmit)
            }
        }
    }

    /// Raw RegIrqFlags
    pub fn get_irq_flags(&mut self) -> Result<u8, RadioError> {
        self.port.read_register(Register::RegIrqFlags)
    }

    /// Clear every pending IRQ flag
    pub fn clear_irq_flags(&mut self) -> Result<(), RadioError> {
        self.port.write_register(Register::RegIrqFlags, IrqMask::All.value())
    }

    /// Put the chip to sleep
    pub fn end(&mut self) -> Result<(), RadioError> {
        self.set_mode(OperatingMode::Sleep)
    }

    /// Give back the port and the link callbacks
    pub fn release(self) -> (P, CB) {
        (self.port, self.callbacks)
    }
}

impl<P, CB> Sx127x<P, CB> {
    /// Mode as last written to RegOpMode
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Board configuration, including header and CRC changes made since creation
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Payload of the last received packet
    pub fn payload(&self) -> &[u8] {
        &self.rx_buffer[..self.payload_length as usize]
    }

    /// Fixed payload length used for reads and implicit headers
    pub fn payload_length(&self) -> u8 {
        self.payload_length
    }

    /// Link quality as of the last telemetry read
    pub fn stats(&self) -> PacketStats {
        self.stats
    }

    /// Carrier as last programmed
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    /// Sync word as last programmed
    pub fn sync_word(&self) -> Option<u8> {
        self.sync_word
    }

    /// Single receive window in symbols, 0 for continuous receive
    pub fn timeout_symbols(&self) -> u16 {
        self.timeout_symbols
    }

    /// Bandwidth as last programmed, or the chip reset value
    pub fn current_bandwidth(&self) -> Bandwidth {
        self.bandwidth.unwrap_or(RESET_BANDWIDTH)
    }

    /// Bandwidth in Hz as last programmed, or the chip reset value
    pub fn get_current_bandwidth_hz(&self) -> u32 {
        self.current_bandwidth().hz()
    }

    /// Spreading factor as last programmed, or the chip reset value
    pub fn current_spreading_factor(&self) -> SpreadingFactor {
        self.spreading_factor.unwrap_or(RESET_SPREADING_FACTOR)
    }

    /// Coding rate as last programmed
    pub fn current_coding_rate(&self) -> Option<CodingRate> {
        self.coding_rate
    }
}
