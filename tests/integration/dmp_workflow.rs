//! End-to-end DMP workflow against the mock device

use crate::common::test_utils::packet_filled;
use crate::common::{MockClock, MockDelay, MockInterface, create_driver_with, create_mock_driver};
use mpu6050_motion::dmp::orientation;
use mpu6050_motion::{CalibrationConfig, ClockSource, DlpfConfig, GyroFullScale, LoadOutcome};

const USER_CTRL: u8 = 0x6A;
const MEM_R_W: u8 = 0x6F;

fn firmware() -> Vec<u8> {
    (0u8..20).map(|b| b.wrapping_mul(13) ^ 0x5C).collect()
}

fn identity_packet() -> Vec<u8> {
    let mut bytes = vec![0u8; 28];
    bytes[0..4].copy_from_slice(&(1i32 << 30).to_be_bytes());
    bytes[20..22].copy_from_slice(&8192i16.to_be_bytes());
    bytes
}

#[test]
fn test_dmp_initialize_configures_device() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::new();
    driver.initialize(&mut delay).unwrap();

    let outcome = driver.dmp_initialize(&mut delay, &firmware()).unwrap();

    assert_eq!(outcome, LoadOutcome::Complete);
    assert_eq!(interface.memory(0, 0, 20), firmware());
    let lengths: Vec<usize> = interface.writes_to(MEM_R_W).iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![16, 4]);

    // Program start 0x0400
    assert_eq!(interface.register(0x70), 0x04);
    assert_eq!(interface.register(0x71), 0x00);

    assert_eq!(driver.gyro_full_scale().unwrap(), GyroFullScale::Dps2000);
    assert_eq!(interface.register(0x1B), 0x18);
    assert_eq!(driver.sample_rate_divider().unwrap(), 4);
    assert_eq!(driver.dlpf().unwrap(), DlpfConfig::BANDWIDTH_188HZ);
    assert_eq!(interface.register(0x38), 0x02);
    assert_eq!(interface.register(0x37) & 0x10, 0x10);
    assert_eq!(interface.register(0x23), 0x00);
    assert_eq!(driver.clock_source().unwrap(), ClockSource::PllXGyro);
    assert!(!driver.sleep_enabled().unwrap());
    assert!(driver.fifo_enabled().unwrap());
    assert!(!driver.dmp_enabled().unwrap());

    // Signal path reset plus two FIFO resets
    assert_eq!(interface.fifo_resets(), 3);
    // 100 ms from initialize, then 100 ms after each reset
    assert_eq!(delay.total_ns(), 300_000_000);
}

#[test]
fn test_dmp_packets_stream_after_enable() {
    let (mut driver, interface) = create_mock_driver();
    let clock = MockClock::new();
    let mut delay = MockDelay::with_clock(&clock);
    let _ = driver.dmp_initialize(&mut delay, &firmware()).unwrap();

    driver.set_dmp_enabled(true).unwrap();
    assert!(driver.dmp_enabled().unwrap());
    assert_eq!(driver.dmp_packet_size(), 28);
    assert!(!driver.dmp_packet_available().unwrap());

    interface.push_fifo(&identity_packet());
    assert!(driver.dmp_packet_available().unwrap());

    let packet = driver
        .dmp_current_fifo_packet(&mut delay, &clock)
        .unwrap()
        .unwrap();
    let q = packet.quaternion().normalized();
    let gravity = orientation::gravity(&q, 2.0);
    assert_eq!(gravity, [0.0, 0.0, 1.0]);
    assert_eq!(orientation::linear_accel(packet.accel, gravity), [0.0, 0.0, 0.0]);

    let ypr = orientation::yaw_pitch_roll(&q, gravity, true);
    assert_eq!((ypr.yaw, ypr.pitch, ypr.roll), (0.0, 0.0, 0.0));

    // Only one packet was queued
    assert!(driver.dmp_current_fifo_packet(&mut delay, &clock).unwrap().is_none());
}

#[test]
fn test_backlog_yields_latest_packet() {
    let (mut driver, interface) = create_mock_driver();
    let clock = MockClock::new();
    let mut delay = MockDelay::with_clock(&clock);
    let _ = driver.dmp_initialize(&mut delay, &firmware()).unwrap();
    driver.set_dmp_enabled(true).unwrap();

    for fill in 1..=5 {
        interface.push_fifo(&packet_filled(fill));
    }

    let packet = driver
        .dmp_current_fifo_packet(&mut delay, &clock)
        .unwrap()
        .unwrap();
    assert_eq!(packet.quaternion[0], i32::from_be_bytes([5; 4]));
    assert_eq!(interface.fifo_len(), 0);
}

#[test]
fn test_verification_failure_still_completes_setup() {
    let interface = MockInterface::new();
    interface.corrupt_memory_readback(0, 3);
    let mut driver = create_driver_with(&interface);
    let mut delay = MockDelay::new();

    let outcome = driver.dmp_initialize(&mut delay, &firmware()).unwrap();

    assert!(matches!(
        outcome,
        LoadOutcome::VerificationFailed { bank: 0, address: 0, offset: 3, .. }
    ));
    // The rest of the sequence ran
    assert_eq!(interface.register(0x70), 0x04);
    assert_eq!(interface.register(0x1B), 0x18);
    assert_eq!(interface.register(0x38), 0x02);
    assert_eq!(interface.register(USER_CTRL) & 0xC0, 0x40);
}

#[test]
fn test_calibration_between_dmp_sessions() {
    let interface = MockInterface::new();
    interface.set_gyro_bias([-120, 64, 30]);
    let mut driver = create_driver_with(&interface);
    let mut delay = MockDelay::new();
    let _ = driver.dmp_initialize(&mut delay, &firmware()).unwrap();
    driver.set_dmp_enabled(true).unwrap();

    let report = driver
        .calibrate_gyro(&mut delay, &CalibrationConfig::gyroscope(6).with_output(false))
        .unwrap();

    assert!(report.converged);
    assert!(driver.dmp_enabled().unwrap());
    let offsets = driver.log_active_offsets().unwrap();
    assert_eq!(&offsets[3..], &report.offsets);

    driver.close().unwrap();
    assert!(!driver.dmp_enabled().unwrap());
}

#[test]
fn test_packet_gyro_keeps_fixed_scaler_at_2000_dps() {
    let (mut driver, interface) = create_mock_driver();
    let clock = MockClock::new();
    let mut delay = MockDelay::with_clock(&clock);
    let _ = driver.dmp_initialize(&mut delay, &firmware()).unwrap();
    driver.set_dmp_enabled(true).unwrap();
    assert_eq!(driver.gyro_full_scale().unwrap(), GyroFullScale::Dps2000);

    let mut bytes = identity_packet();
    bytes[22..24].copy_from_slice(&131i16.to_be_bytes());
    bytes[26..28].copy_from_slice(&(-262i16).to_be_bytes());
    interface.push_fifo(&bytes);

    let packet = driver
        .dmp_current_fifo_packet(&mut delay, &clock)
        .unwrap()
        .unwrap();
    assert_eq!(packet.gyro_dps(), [1.0, 0.0, -2.0]);
}
