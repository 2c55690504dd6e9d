//! Unit tests for error handling and recovery

use crate::common::{MockClock, MockDelay, MockError, MockInterface, create_mock_driver};
use mpu6050_motion::fifo::{FifoState, FifoSynchronizer};
use mpu6050_motion::registers::fields;
use mpu6050_motion::{Error, Mpu6050Driver};

#[test]
fn test_read_failure_propagates_and_recovers() {
    let (mut driver, interface) = create_mock_driver();

    interface.fail_next_read();
    assert_eq!(driver.device_id(), Err(Error::Bus(MockError::Communication)));

    assert_eq!(driver.device_id().unwrap(), 0x34);
}

#[test]
fn test_write_failure_propagates_and_recovers() {
    let (mut driver, interface) = create_mock_driver();

    interface.fail_next_write();
    assert_eq!(
        driver.set_sample_rate_divider(9),
        Err(Error::Bus(MockError::Communication))
    );
    assert_eq!(interface.register(0x19), 0);

    driver.set_sample_rate_divider(9).unwrap();
    assert_eq!(driver.sample_rate_divider().unwrap(), 9);
}

#[test]
fn test_construction_fails_when_bus_is_down() {
    let interface = MockInterface::new();
    interface.fail_next_read();

    assert!(matches!(
        Mpu6050Driver::new(interface),
        Err(Error::Bus(MockError::Communication))
    ));
}

#[test]
fn test_failed_read_leaves_field_unwritten() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(0x1B, 0b1110_0111);
    interface.clear_operations();

    interface.fail_next_read();
    assert!(driver.bus_mut().write_field(fields::GYRO_FS_SEL, 0b11).is_err());

    assert!(interface.writes_to(0x1B).is_empty());
    assert_eq!(interface.register(0x1B), 0b1110_0111);
}

#[test]
fn test_invalid_bit_field_is_rejected() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    assert_eq!(
        driver.bus_mut().read_bits(0x1A, 2, 4),
        Err(Error::InvalidBitField { start: 2, length: 4 })
    );
    assert!(driver.bus_mut().write_bits(0x1A, 3, 0, 0).is_err());
    assert!(interface.operations().is_empty());
}

#[test]
fn test_write_failure_during_firmware_load() {
    let (mut driver, interface) = create_mock_driver();
    driver.set_memory_bank(0, true, false).unwrap();

    interface.fail_next_write();
    let result = driver.write_memory_block(&[0xAA; 40], 0, 0, true);
    assert_eq!(result, Err(Error::Bus(MockError::Communication)));

    // A retry starts from scratch and completes
    let outcome = driver.write_memory_block(&[0xAA; 40], 0, 0, true).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(interface.memory(0, 0, 40), vec![0xAA; 40]);
}

#[test]
fn test_fifo_error_resets_synchronizer() {
    let (mut driver, interface) = create_mock_driver();
    let clock = MockClock::new();
    let mut delay = MockDelay::with_clock(&clock);
    interface.push_fifo(&[0x10; 28]);

    interface.fail_next_read();
    let result = driver.current_fifo_packet::<28, _, _>(&mut delay, &clock);
    assert_eq!(result, Err(Error::Bus(MockError::Communication)));

    // The queued packet is still there for the next call
    let packet = driver
        .current_fifo_packet::<28, _, _>(&mut delay, &clock)
        .unwrap();
    assert_eq!(packet, Some([0x10; 28]));

    let mut sync = FifoSynchronizer::<28>::new();
    interface.fail_next_read();
    assert!(sync.poll(driver.bus_mut(), 0).is_err());
    assert_eq!(sync.state(), FifoState::Idle);
}

#[test]
fn test_unknown_clock_source_is_an_error() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(0x6B, 0x07);
    assert!(driver.clock_source().is_ok());

    interface.set_register(0x6B, 0x06);
    assert_eq!(driver.clock_source(), Err(Error::UnknownClockSource(6)));
}

#[test]
fn test_error_messages() {
    let error: Error<MockError> = Error::UnknownClockSource(6);
    assert_eq!(error.to_string(), "reserved clock source code 6");
    assert_eq!(
        Error::Bus(MockError::Communication).to_string(),
        "bus error: Communication"
    );
}
