pub(crate) use fixtures::{get_configured_sx127x, radio_config};
use fixtures::{get_sx127x, Delayer, Ops};

use crate::mod_params::*;
use crate::sx127x::Register;

#[test]
fn begin_programs_lora_defaults() {
    let mut radio = get_sx127x(Config::default());
    let mut delay = Delayer::default();
    radio.begin(&mut delay).unwrap();

    let port = &radio.port;
    assert_eq!(port.ops[0], Ops::Read(Register::RegVersion));
    assert!(delay.ms.is_empty());
    assert_eq!(radio.mode(), OperatingMode::Standby);
    assert_eq!(port.reg(Register::RegOpMode), 0x81);
    assert_eq!(port.reg(Register::RegPayloadLength), 8);
    assert_eq!(port.reg(Register::RegSyncWord), 0x12);
    assert_eq!(port.reg(Register::RegFifoTxBaseAddr), 0);
    assert_eq!(port.reg(Register::RegFifoRxBaseAddr), 0);
    assert_eq!(port.reg(Register::RegDioMapping1) & 0xc0, 0xc0);
    assert_eq!(port.reg(Register::RegLna), 0x03);
    assert_eq!(port.reg(Register::RegModemConfig3), 0x04);
    assert_eq!(port.reg(Register::RegOcp) & 0x3f, 0x32);
    assert_eq!(port.reg(Register::RegPreambleLsb), 8);
    assert_eq!(port.reg(Register::RegInvertiq), 0x27);
    assert_eq!(port.reg(Register::RegInvertiq2), 0x1d);
}

#[test]
fn begin_enters_lora_mode_from_sleep() {
    let mut radio = get_sx127x(Config::default());
    radio.begin(&mut Delayer::default()).unwrap();
    let op_mode_writes: Vec<_> = radio
        .port
        .ops
        .iter()
        .filter_map(|op| match op {
            Ops::Write(Register::RegOpMode, v) => Some(*v),
            _ => None,
        })
        .collect();
    // detection sleep, FSK sleep, LoRa sleep, LoRa standby
    assert_eq!(op_mode_writes, vec![0x00, 0x00, 0x80, 0x81]);
}

#[test]
fn detection_gives_up_after_three_reads() {
    let mut radio = get_sx127x(Config::default());
    radio.port.regs[Register::RegVersion.addr() as usize] = 0x00;
    let mut delay = Delayer::default();

    assert_eq!(radio.begin(&mut delay), Err(RadioError::ChipNotDetected(0x00)));
    assert_eq!(delay.ms, vec![200, 200, 200]);
    assert_eq!(radio.port.ops, vec![Ops::Read(Register::RegVersion); 3]);
    assert!(!radio.port.has_writes());
}

#[test]
fn detection_retries_until_version_matches() {
    let mut radio = get_sx127x(Config::default());
    radio.port.versions.extend([0x22, 0xff]);
    let mut delay = Delayer::default();

    radio.detect_chip(&mut delay).unwrap();
    assert_eq!(delay.ms, vec![200, 200]);
    assert_eq!(radio.mode(), OperatingMode::Sleep);
}

#[test]
fn set_mode_skips_repeated_modes() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());

    // already in standby
    radio.set_mode(OperatingMode::Standby).unwrap();
    radio.set_mode(OperatingMode::Sleep).unwrap();
    radio.set_mode(OperatingMode::Sleep).unwrap();
    radio.set_mode(OperatingMode::Transmit).unwrap();
    radio.set_mode(OperatingMode::Transmit).unwrap();
    radio.set_mode(OperatingMode::Sleep).unwrap();

    assert_eq!(
        radio.port.ops,
        vec![
            Ops::Write(Register::RegOpMode, 0x80),
            Ops::Write(Register::RegOpMode, 0x83),
            Ops::Write(Register::RegOpMode, 0x80),
        ]
    );
}

#[test]
fn configure_is_idempotent_for_modulation_registers() {
    let mut radio = get_sx127x(Config::default());
    radio.begin(&mut Delayer::default()).unwrap();
    radio.configure(&radio_config()).unwrap();
    radio.configure(&radio_config()).unwrap();

    let port = &radio.port;
    assert_eq!(port.writes_to(Register::RegModemConfig1), 1);
    assert_eq!(port.writes_to(Register::RegDetectionThreshold), 1);
    assert_eq!(port.writes_to(Register::RegSyncWord), 1);
    assert_eq!(port.writes_to(Register::RegHighBwOptimize1), 1);
    assert_eq!(port.reg(Register::RegPreambleLsb), 12);
}

#[test]
fn configure_programs_modem() {
    let config = Config {
        explicit_header: true,
        crc_enabled: true,
        ..Default::default()
    };
    let radio = get_configured_sx127x(config, &radio_config());

    let port = &radio.port;
    // 125 kHz, 4/5, explicit header
    assert_eq!(port.reg(Register::RegModemConfig1), 0x72);
    // SF7, single packet, CRC on
    assert_eq!(port.reg(Register::RegModemConfig2), 0x74);
    assert_eq!(port.reg(Register::RegDetectionOptimize) & 0x07, 0x03);
    assert_eq!(port.reg(Register::RegDetectionThreshold), 0x0a);
    assert_eq!(port.reg(Register::RegHighBwOptimize1), 0x03);
    assert_eq!(port.reg(Register::RegPaConfig), 0xf0);
    assert_eq!(
        [
            port.reg(Register::RegFrfMsb),
            port.reg(Register::RegFrfMid),
            port.reg(Register::RegFrfLsb)
        ],
        [0xe4, 0xc0, 0x00]
    );
    assert_eq!(radio.frequency(), Some(Frequency::Hz(915_000_000)));
    assert_eq!(radio.mode(), OperatingMode::Standby);
}

#[test]
fn sf6_forces_implicit_header_without_crc() {
    let config = Config {
        explicit_header: true,
        crc_enabled: true,
        ..Default::default()
    };
    let mut params = RadioConfig {
        spreading_factor: SpreadingFactor::_6,
        ..radio_config()
    };
    let mut radio = get_configured_sx127x(config, &params);

    assert_eq!(radio.port.reg(Register::RegModemConfig1) & 0x01, 0x01);
    assert_eq!(radio.port.reg(Register::RegModemConfig2) & 0x04, 0x00);
    assert_eq!(radio.port.reg(Register::RegDetectionOptimize) & 0x07, 0x05);
    assert_eq!(radio.port.reg(Register::RegDetectionThreshold), 0x0c);

    // leaving SF6 with unchanged bandwidth restores the configured header and CRC
    params.spreading_factor = SpreadingFactor::_8;
    radio.configure(&params).unwrap();
    assert_eq!(radio.port.reg(Register::RegModemConfig1) & 0x01, 0x00);
    assert_eq!(radio.port.reg(Register::RegModemConfig2) & 0x04, 0x04);
    assert_eq!(radio.port.reg(Register::RegModemConfig2) >> 4, 8);
}

#[test]
fn bandwidth_500khz_applies_errata() {
    let params = RadioConfig {
        bandwidth: Bandwidth::_500KHz,
        ..radio_config()
    };
    let mut radio = get_configured_sx127x(Config::default(), &params);
    assert_eq!(radio.port.reg(Register::RegHighBwOptimize1), 0x02);
    assert_eq!(radio.port.reg(Register::RegHighBwOptimize2), 0x64);
    assert_eq!(radio.get_current_bandwidth_hz(), 500_000);

    radio
        .set_bandwidth_coding_rate(Bandwidth::_250KHz, CodingRate::_4_5)
        .unwrap();
    assert_eq!(radio.port.reg(Register::RegHighBwOptimize1), 0x03);
    assert_eq!(radio.port.reg(Register::RegModemConfig1) & 0xf0, 0x80);
}

#[test]
fn sync_word_moves_to_allowed_value() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());

    radio.set_sync_word(52).unwrap();
    assert_eq!(radio.port.reg(Register::RegSyncWord), 54);
    assert_eq!(radio.sync_word(), Some(54));

    // 53 lands on the same word, nothing to write
    radio.port.ops.clear();
    radio.set_sync_word(53).unwrap();
    assert!(radio.port.ops.is_empty());

    let params = RadioConfig {
        sync_word: Some(0x34),
        ..radio_config()
    };
    radio.configure(&params).unwrap();
    assert_eq!(radio.port.reg(Register::RegSyncWord), 0x36);
}

#[test]
fn transmit_loads_fifo_and_reports_completion() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());

    radio.transmit_nonblocking(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
    assert_eq!(
        radio.port.ops,
        vec![
            Ops::TxPath,
            Ops::Write(Register::RegFifoAddrPtr, 0x00),
            Ops::WriteBurst(Register::RegFifo, vec![0xde, 0xad, 0xbe, 0xef]),
            Ops::Write(Register::RegOpMode, 0x83),
        ]
    );
    assert_eq!(radio.mode(), OperatingMode::Transmit);

    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x08;
    radio.handle_irq().unwrap();

    assert_eq!(radio.callbacks.tx_done, 1);
    assert!(radio.callbacks.rx.is_empty());
    assert_eq!(radio.mode(), OperatingMode::Standby);
    assert_eq!(radio.port.reg(Register::RegIrqFlags), 0x00);
    assert!(radio.port.ops.contains(&Ops::NoPath));
}

#[test]
fn tx_done_can_open_receive_window() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    radio.callbacks.listen_after_tx = true;
    radio.transmit_nonblocking(&[0x01]).unwrap();
    radio.port.ops.clear();

    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x08;
    radio.handle_irq().unwrap();

    assert_eq!(radio.callbacks.tx_done, 1);
    assert_eq!(radio.mode(), OperatingMode::ReceiveContinuous);
    assert_eq!(
        radio.port.ops,
        vec![
            Ops::Read(Register::RegIrqFlags),
            Ops::Write(Register::RegIrqFlags, 0xff),
            Ops::NoPath,
            Ops::RxPath,
            Ops::Write(Register::RegFifoAddrPtr, 0x00),
            Ops::Write(Register::RegOpMode, 0x85),
        ]
    );
}

#[test]
fn rx_done_can_queue_reply() {
    let params = RadioConfig {
        payload_length: 2,
        ..radio_config()
    };
    let mut radio = get_configured_sx127x(Config::default(), &params);
    radio.callbacks.reply = Some(vec![0xac, 0x4b]);
    radio.arm_receive_nonblocking().unwrap();
    radio.port.rx_fifo = vec![0x10, 0x20];
    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x40;
    radio.port.ops.clear();

    radio.handle_irq().unwrap();

    assert_eq!(radio.callbacks.rx, vec![(RxStatus::Ok, vec![0x10, 0x20])]);
    assert_eq!(radio.mode(), OperatingMode::Transmit);
    assert!(radio
        .port
        .ops
        .ends_with(&[
            Ops::Write(Register::RegOpMode, 0x81),
            Ops::TxPath,
            Ops::Write(Register::RegFifoAddrPtr, 0x00),
            Ops::WriteBurst(Register::RegFifo, vec![0xac, 0x4b]),
            Ops::Write(Register::RegOpMode, 0x83),
        ]));

    // the reply is sent once
    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x08;
    radio.handle_irq().unwrap();
    assert_eq!(radio.callbacks.tx_done, 1);
    assert_eq!(radio.mode(), OperatingMode::Standby);
}

#[test]
fn transmit_rejects_oversized_payload() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    assert_eq!(
        radio.transmit_nonblocking(&[0u8; 256]),
        Err(RadioError::PayloadSizeUnexpected(256))
    );
    assert!(radio.port.ops.is_empty());
}

#[test]
fn continuous_receive_delivers_payload() {
    let params = RadioConfig {
        payload_length: 4,
        ..radio_config()
    };
    let mut radio = get_configured_sx127x(Config::default(), &params);

    radio.arm_receive_nonblocking().unwrap();
    assert_eq!(
        radio.port.ops,
        vec![
            Ops::RxPath,
            Ops::Write(Register::RegFifoAddrPtr, 0x00),
            Ops::Write(Register::RegOpMode, 0x85),
        ]
    );

    radio.port.rx_fifo = vec![1, 2, 3, 4, 5, 6];
    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x50;
    radio.handle_irq().unwrap();

    assert_eq!(radio.callbacks.rx, vec![(RxStatus::Ok, vec![1, 2, 3, 4])]);
    assert_eq!(radio.payload(), &[1, 2, 3, 4]);
    assert_eq!(radio.mode(), OperatingMode::ReceiveContinuous);
    assert!(radio.port.ops.contains(&Ops::ReadBurst(Register::RegFifo, 4)));
}

#[test]
fn single_receive_uses_symbol_timeout() {
    let params = RadioConfig {
        rx_timeout_us: 10_240,
        ..radio_config()
    };
    let mut radio = get_configured_sx127x(Config::default(), &params);
    // SF7 at 125 kHz is 1024 us per symbol
    assert_eq!(radio.timeout_symbols(), 10);
    assert_eq!(radio.port.reg(Register::RegSymbTimeoutLsb), 10);
    assert_eq!(radio.port.reg(Register::RegModemConfig2) & 0x03, 0);

    radio.arm_receive_nonblocking().unwrap();
    assert_eq!(radio.port.reg(Register::RegOpMode), 0x86);

    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x40;
    radio.handle_irq().unwrap();
    assert_eq!(radio.callbacks.rx.len(), 1);
    assert_eq!(radio.mode(), OperatingMode::Standby);
}

#[test]
fn sub_symbol_window_falls_back_to_continuous_receive() {
    let params = RadioConfig {
        rx_timeout_us: 500,
        ..radio_config()
    };
    let mut radio = get_configured_sx127x(Config::default(), &params);
    assert_eq!(radio.timeout_symbols(), 0);
    assert_eq!(radio.port.reg(Register::RegSymbTimeoutLsb), 0);

    radio.arm_receive_nonblocking().unwrap();
    assert_eq!(radio.mode(), OperatingMode::ReceiveContinuous);
    assert_eq!(radio.port.reg(Register::RegOpMode), 0x85);

    // two whole symbols are kept as two
    radio.set_rx_timeout_us(2048).unwrap();
    assert_eq!(radio.timeout_symbols(), 2);
    assert_eq!(radio.port.reg(Register::RegSymbTimeoutLsb), 2);
}

#[test]
fn rx_timeout_splits_across_registers() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    radio.set_rx_timeout_us(u32::MAX).unwrap();

    assert_eq!(radio.timeout_symbols(), 1023);
    assert_eq!(radio.port.reg(Register::RegSymbTimeoutLsb), 0xff);
    assert_eq!(radio.port.reg(Register::RegModemConfig2) & 0x03, 0x03);
    // spreading factor bits survive
    assert_eq!(radio.port.reg(Register::RegModemConfig2) >> 4, 7);

    radio.port.ops.clear();
    radio.set_rx_timeout_us(0).unwrap();
    assert_eq!(radio.timeout_symbols(), 0);
    assert!(radio.port.ops.is_empty());
}

#[test]
fn misattributed_irq_is_ignored() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    assert_eq!(radio.mode(), OperatingMode::Standby);

    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x48;
    radio.handle_irq().unwrap();

    assert_eq!(radio.callbacks.tx_done, 0);
    assert!(radio.callbacks.rx.is_empty());
    assert_eq!(
        radio.port.ops,
        vec![
            Ops::Read(Register::RegIrqFlags),
            Ops::Write(Register::RegIrqFlags, 0xff),
        ]
    );
}

#[test]
fn tx_done_while_receiving_is_ignored() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    radio.arm_receive_nonblocking().unwrap();

    radio.port.regs[Register::RegIrqFlags.addr() as usize] = 0x08;
    radio.handle_irq().unwrap();

    assert_eq!(radio.callbacks.tx_done, 0);
    assert_eq!(radio.mode(), OperatingMode::ReceiveContinuous);
}

#[test]
fn packet_telemetry() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    radio.port.regs[Register::RegPktRssiValue.addr() as usize] = 100;
    radio.port.regs[Register::RegPktSnrValue.addr() as usize] = (-20i8) as u8;
    radio.port.regs[Register::RegFreqErrorMid.addr() as usize] = 0x01;

    let stats = radio.get_last_packet_stats().unwrap();
    assert_eq!(stats.rssi, -62);
    assert_eq!(stats.snr_raw, -20);
    assert_eq!(radio.get_last_packet_rssi().unwrap(), -57);

    assert_eq!(radio.get_frequency_error().unwrap(), 128);
    assert!(!radio.frequency_error_is_negative().unwrap());
    assert_eq!(radio.stats().frequency_error, 128);

    radio.port.regs[Register::RegRssiValue.addr() as usize] = 50;
    assert_eq!(radio.get_current_rssi().unwrap(), -107);
}

#[test]
fn ppm_correction_follows_frequency_unit() {
    let mut radio = get_sx127x(Config::default());
    assert_eq!(radio.set_ppm_offset_reg(10_000), Err(RadioError::FrequencyNotSet));

    radio.set_frequency_hz(915_000_000).unwrap();
    radio.set_ppm_offset_reg(10_000).unwrap();
    assert_eq!(radio.port.reg(Register::RegPpmCorrection), 10);

    radio.set_frequency_reg(0xe4c000).unwrap();
    // same ratio in register steps
    radio.set_ppm_offset_reg(-164).unwrap();
    assert_eq!(radio.port.reg(Register::RegPpmCorrection) as i8, -10);

    radio.set_frequency_hz(0).unwrap();
    assert_eq!(radio.set_ppm_offset_reg(1), Err(RadioError::FrequencyNotSet));
}

#[test]
fn frequency_setters_always_write() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    radio.set_frequency_hz(915_000_000).unwrap();
    radio.set_frequency_reg(0xd90000).unwrap();
    assert_eq!(
        radio.port.ops,
        vec![
            Ops::WriteBurst(Register::RegFrfMsb, vec![0xe4, 0xc0, 0x00]),
            Ops::WriteBurst(Register::RegFrfMsb, vec![0xd9, 0x00, 0x00]),
        ]
    );
    assert_eq!(radio.frequency(), Some(Frequency::Reg(0xd90000)));
}

#[test]
fn header_and_crc_setters_rewrite_modem_config() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    assert_eq!(radio.port.reg(Register::RegModemConfig1) & 0x01, 0x01);

    radio.set_header_mode(true).unwrap();
    assert_eq!(radio.port.reg(Register::RegModemConfig1), 0x72);
    radio.set_crc(true).unwrap();
    assert_eq!(radio.port.reg(Register::RegModemConfig2) & 0x04, 0x04);
    assert!(radio.config().explicit_header && radio.config().crc_enabled);

    radio.port.ops.clear();
    radio.set_crc(true).unwrap();
    assert!(radio.port.ops.is_empty());
}

#[test]
fn output_power_selects_pa_pin() {
    let config = Config {
        pa_output: PaOutput::Rfo,
        ..Default::default()
    };
    let mut radio = get_configured_sx127x(config, &radio_config());
    radio.set_output_power(0x0f).unwrap();
    assert_eq!(radio.port.reg(Register::RegPaConfig), 0x7f);
}

#[test]
fn end_puts_chip_to_sleep() {
    let mut radio = get_configured_sx127x(Config::default(), &radio_config());
    radio.end().unwrap();
    assert_eq!(radio.mode(), OperatingMode::Sleep);
    let (port, link) = radio.release();
    assert_eq!(port.reg(Register::RegOpMode), 0x80);
    assert_eq!(link.tx_done, 0);
}
