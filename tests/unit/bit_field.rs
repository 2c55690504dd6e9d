//! Unit tests for the bit-field accessor

use crate::common::{MockError, Operation, create_mock_driver};
use mpu6050_motion::registers::{BitField, Register, fields};
use mpu6050_motion::{ByteOrder, Error};

#[test]
fn test_round_trip_every_valid_field() {
    let (mut driver, interface) = create_mock_driver();
    let bus = driver.bus_mut();

    for start in 0u8..8 {
        for length in 1..=start + 1 {
            let max = ((1u16 << length) - 1) as u8;
            for value in [0, max, max / 2, max & 0b101] {
                interface.set_register(0x19, 0b1100_0011);
                bus.write_bits(0x19, start, length, value).unwrap();
                assert_eq!(bus.read_bits(0x19, start, length).unwrap(), value);

                let mask = (max as u16) << (start + 1 - length);
                let outside = !(mask as u8);
                assert_eq!(
                    interface.register(0x19) & outside,
                    0b1100_0011 & outside,
                    "bits outside start={start} length={length} changed"
                );
            }
        }
    }
}

#[test]
fn test_write_bits_is_read_modify_write_of_one_byte() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(0x6A, 0b1000_0000);
    interface.clear_operations();

    driver.bus_mut().write_bit(0x6A, 6, true).unwrap();

    assert_eq!(
        interface.operations(),
        vec![
            Operation::Read {
                address: 0x6A,
                data: vec![0b1000_0000]
            },
            Operation::Write {
                address: 0x6A,
                data: vec![0b1100_0000]
            },
        ]
    );
}

#[test]
fn test_field_too_wide_for_its_start_bit() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    let result = driver.bus_mut().write_bits(0x1B, 2, 4, 0xF);
    assert_eq!(
        result,
        Err(Error::<MockError>::InvalidBitField {
            start: 2,
            length: 4
        })
    );
    assert!(driver.bus_mut().read_bits(0x1B, 3, 0).is_err());
    assert!(interface.operations().is_empty());
    assert!(!BitField::new(Register::GyroConfig, 2, 4).is_valid());
}

#[test]
fn test_named_fields_hit_documented_bits() {
    let (mut driver, interface) = create_mock_driver();
    let bus = driver.bus_mut();

    interface.set_register(0x6B, 0x00);
    bus.write_field(fields::CLOCK_SOURCE, 0b011).unwrap();
    assert_eq!(interface.register(0x6B), 0x03);

    interface.set_register(0x1B, 0x00);
    bus.write_field(fields::GYRO_FS_SEL, 3).unwrap();
    assert_eq!(interface.register(0x1B), 0x18);

    interface.set_register(0x75, 0x68);
    assert_eq!(bus.read_field(fields::DEVICE_ID).unwrap(), 0x34);
}

#[test]
fn test_word_access_byte_order() {
    let (mut driver, interface) = create_mock_driver();
    let bus = driver.bus_mut();

    bus.write_word(0x13, 0x1234, ByteOrder::BigEndian).unwrap();
    assert_eq!(interface.register(0x13), 0x12);
    assert_eq!(interface.register(0x14), 0x34);
    assert_eq!(bus.read_word(0x13, ByteOrder::LittleEndian).unwrap(), 0x3412);
}
