//! Unit tests for configuration getters and setters

use crate::common::{MockDelay, MockError, create_mock_driver};
use mpu6050_motion::interrupt::{INT_STATUS_DATA_READY, INT_STATUS_DMP};
use mpu6050_motion::{
    AccelFullScale, ClockSource, DlpfConfig, Error, GyroFullScale, InterruptClearMode,
    InterruptMode,
};

#[test]
fn test_initialize_sets_documented_defaults() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::new();

    driver.initialize(&mut delay).unwrap();

    // CLKSEL = PLL Z gyro, sleep bit cleared
    assert_eq!(interface.register(0x6B), 0x03);
    assert_eq!(driver.gyro_full_scale().unwrap(), GyroFullScale::Dps250);
    assert_eq!(driver.accel_full_scale().unwrap(), AccelFullScale::G2);
    assert!(!driver.sleep_enabled().unwrap());
    assert_eq!(delay.total_ns(), 100_000_000);
}

#[test]
fn test_reset_sets_device_reset_bit_and_settles() {
    let (mut driver, interface) = create_mock_driver();
    let mut delay = MockDelay::new();
    driver.initialize(&mut delay).unwrap();

    driver.reset(&mut delay).unwrap();

    assert!(interface.writes_to(0x6B).iter().any(|w| w[0] & 0x80 != 0));
    assert!(driver.sleep_enabled().unwrap());
    assert_eq!(delay.total_ns(), 200_000_000);
}

#[test]
fn test_connection_and_device_id() {
    let (mut driver, _interface) = create_mock_driver();
    assert_eq!(driver.device_id().unwrap(), 0x34);
    assert!(driver.test_connection().unwrap());
}

#[test]
fn test_clock_source_round_trip() {
    let (mut driver, _interface) = create_mock_driver();
    for source in [
        ClockSource::Internal,
        ClockSource::PllXGyro,
        ClockSource::PllYGyro,
        ClockSource::PllZGyro,
        ClockSource::PllExternal32k,
        ClockSource::PllExternal19M,
        ClockSource::KeepReset,
    ] {
        driver.set_clock_source(source).unwrap();
        assert_eq!(driver.clock_source().unwrap(), source);
    }
}

#[test]
fn test_reserved_clock_source_is_an_error() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(0x6B, 0x06);
    assert_eq!(
        driver.clock_source(),
        Err(Error::<MockError>::UnknownClockSource(6))
    );
}

#[test]
fn test_full_scale_ranges() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_gyro_full_scale(GyroFullScale::Dps1000).unwrap();
    assert_eq!(interface.register(0x1B), 0x10);
    assert_eq!(driver.gyro_full_scale().unwrap(), GyroFullScale::Dps1000);

    driver.set_accel_full_scale(AccelFullScale::G8).unwrap();
    assert_eq!(interface.register(0x1C), 0x10);
    assert_eq!(driver.accel_full_scale().unwrap(), AccelFullScale::G8);
}

#[test]
fn test_sample_rate_and_dlpf() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_sample_rate_divider(9).unwrap();
    assert_eq!(interface.register(0x19), 9);
    assert_eq!(driver.sample_rate_divider().unwrap(), 9);

    interface.set_register(0x1A, 0b0011_1000);
    driver.set_dlpf(DlpfConfig::new(200)).unwrap();
    assert_eq!(interface.register(0x1A), 0b0011_1111);
    assert_eq!(driver.dlpf().unwrap().bits(), 7);
}

#[test]
fn test_fifo_source_enables() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_x_gyro_fifo_enabled(true).unwrap();
    driver.set_z_gyro_fifo_enabled(true).unwrap();
    driver.set_accel_fifo_enabled(true).unwrap();
    assert_eq!(interface.register(0x23), 0b0101_1000);
    assert!(driver.x_gyro_fifo_enabled().unwrap());
    assert!(!driver.y_gyro_fifo_enabled().unwrap());

    driver.set_y_gyro_fifo_enabled(true).unwrap();
    driver.set_accel_fifo_enabled(false).unwrap();
    assert_eq!(interface.register(0x23), 0b0111_0000);
    assert!(!driver.accel_fifo_enabled().unwrap());
    assert!(driver.z_gyro_fifo_enabled().unwrap());
}

#[test]
fn test_interrupt_pin_configuration() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_interrupt_mode(InterruptMode::ActiveLow).unwrap();
    driver.set_interrupt_latch_enabled(true).unwrap();
    driver
        .set_interrupt_clear_mode(InterruptClearMode::AnyRead)
        .unwrap();
    driver.set_fsync_interrupt_enabled(true).unwrap();
    assert_eq!(interface.register(0x37), 0b1011_0100);

    assert_eq!(driver.interrupt_mode().unwrap(), InterruptMode::ActiveLow);
    assert!(driver.interrupt_latch_enabled().unwrap());
    assert_eq!(
        driver.interrupt_clear_mode().unwrap(),
        InterruptClearMode::AnyRead
    );
    assert!(driver.fsync_interrupt_enabled().unwrap());
}

#[test]
fn test_interrupt_enables_and_status() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_interrupt_enable_register(0x00).unwrap();
    driver.set_dmp_interrupt_enabled(true).unwrap();
    driver.set_fifo_overflow_interrupt_enabled(true).unwrap();
    driver.set_data_ready_interrupt_enabled(true).unwrap();
    assert_eq!(driver.interrupt_enable_register().unwrap(), 0x13);
    assert!(driver.dmp_interrupt_enabled().unwrap());
    assert!(driver.fifo_overflow_interrupt_enabled().unwrap());
    assert!(driver.data_ready_interrupt_enabled().unwrap());

    interface.set_register(0x3A, INT_STATUS_DMP | INT_STATUS_DATA_READY);
    assert_eq!(driver.interrupt_status().unwrap(), 0x03);
    assert!(driver.data_ready_status().unwrap());
}

#[test]
fn test_user_control_bits() {
    let (mut driver, interface) = create_mock_driver();

    driver.set_fifo_enabled(true).unwrap();
    driver.set_dmp_enabled(true).unwrap();
    assert_eq!(interface.register(0x6A), 0xC0);
    assert!(driver.fifo_enabled().unwrap());
    assert!(driver.dmp_enabled().unwrap());

    interface.push_fifo(&[1, 2, 3]);
    driver.reset_fifo().unwrap();
    driver.reset_dmp().unwrap();
    assert_eq!(interface.fifo_len(), 0);
    // Reset bits clear themselves, enables survive
    assert_eq!(interface.register(0x6A), 0xC0);
}

#[test]
fn test_fetch_decodes_sample() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_accel_data(0, 8192, 16384);
    interface.set_temperature_data(-340);
    interface.set_gyro_data(131, -262, 0);

    let sample = driver.fetch().unwrap();
    assert_eq!(sample.accel, [0, 8192, 16384]);
    assert_eq!(sample.gyro, [131, -262, 0]);
    assert_eq!(sample.gyro_dps(GyroFullScale::Dps250), [1.0, -2.0, 0.0]);
    assert!((sample.temperature_celsius() - 35.53).abs() < 1e-3);
    assert!((sample.roll_degrees() - 26.565).abs() < 1e-2);
    assert!(sample.pitch_degrees().abs() < 1e-4);
}

#[test]
fn test_fifo_byte_access() {
    let (mut driver, interface) = create_mock_driver();
    interface.push_fifo(&[9, 8, 7, 6]);

    assert_eq!(driver.fifo_count().unwrap(), 4);
    assert_eq!(driver.read_fifo_byte().unwrap(), 9);
    let mut buf = [0u8; 3];
    driver.read_fifo_bytes(&mut buf).unwrap();
    assert_eq!(buf, [8, 7, 6]);
    assert_eq!(driver.fifo_count().unwrap(), 0);
}

#[test]
fn test_close_disables_dmp_and_interrupts() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(0x6A, 0xC0);
    interface.set_register(0x37, 0x04);
    interface.set_register(0x38, 0x03);

    driver.close().unwrap();

    assert_eq!(interface.register(0x6A), 0x40);
    assert_eq!(interface.register(0x37), 0x00);
    assert_eq!(interface.register(0x38), 0x02);
}
