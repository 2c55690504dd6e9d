//! Unit tests for DMP packet decoding and orientation math

use crate::common::test_utils::assert_float_eq;
use crate::common::{MockClock, MockDelay, create_mock_driver};
use mpu6050_motion::dmp::orientation::{self, Quaternion};
use mpu6050_motion::dmp::DMP_PACKET_SIZE;

const Q30_ONE: i32 = 1 << 30;

fn encode_packet(quaternion: [i32; 4], accel: [i16; 3], gyro: [i16; 3]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(DMP_PACKET_SIZE);
    for q in quaternion {
        bytes.extend_from_slice(&q.to_be_bytes());
    }
    for v in accel.iter().chain(gyro.iter()) {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes
}

#[test]
fn test_packet_decodes_from_fifo() {
    let (mut driver, interface) = create_mock_driver();
    let clock = MockClock::new();
    let mut delay = MockDelay::with_clock(&clock);
    interface.push_fifo(&encode_packet([Q30_ONE, 0, -5, 77], [120, -40, 8192], [131, 0, -262]));

    let packet = driver
        .dmp_current_fifo_packet(&mut delay, &clock)
        .unwrap()
        .unwrap();

    assert_eq!(packet.quaternion, [Q30_ONE, 0, -5, 77]);
    assert_eq!(packet.accel, [120, -40, 8192]);
    assert_eq!(packet.gyro, [131, 0, -262]);
    assert_eq!(packet.gyro_dps(), [1.0, 0.0, -2.0]);
    assert_eq!(packet.accel_g()[2], 0.5);
}

#[test]
fn test_identity_orientation() {
    let q = Quaternion::from_q30([Q30_ONE, 0, 0, 0]);
    assert_eq!(q, Quaternion::IDENTITY);

    assert_eq!(orientation::gravity(&q, 1.0), [0.0, 0.0, 0.5]);
    assert_eq!(orientation::euler(&q), [0.0, 0.0, 0.0]);

    let ypr = orientation::yaw_pitch_roll(&q, orientation::gravity(&q, 1.0), true);
    assert_float_eq(ypr.yaw, 0.0, 1e-12);
    assert_float_eq(ypr.pitch, 0.0, 1e-12);
    assert_float_eq(ypr.roll, 0.0, 1e-12);
}

#[test]
fn test_yaw_follows_rotation_about_z() {
    // 90 degrees about Z
    let half = core::f64::consts::FRAC_1_SQRT_2;
    let q = Quaternion::new(half, 0.0, 0.0, half);

    let ypr = orientation::yaw_pitch_roll(&q, orientation::gravity(&q, 1.0), true);

    assert_float_eq(ypr.yaw, -90.0, 1e-9);
    assert_float_eq(ypr.pitch, 0.0, 1e-9);
    assert_float_eq(ypr.roll, 0.0, 1e-9);
}

#[test]
fn test_roll_from_gravity_vector() {
    let q = Quaternion::IDENTITY;
    let ypr = orientation::yaw_pitch_roll(&q, [0.0, 1.0, 1.0], true);
    assert_float_eq(ypr.roll, 45.0, 1e-9);

    let radians = orientation::yaw_pitch_roll(&q, [0.0, 1.0, 1.0], false);
    assert_float_eq(radians.roll, core::f64::consts::FRAC_PI_4, 1e-12);
}

#[test]
fn test_linear_accel_removes_gravity() {
    let q = Quaternion::IDENTITY;
    let gravity = orientation::gravity(&q, 2.0);

    let linear = orientation::linear_accel([100, -50, 8192 + 300], gravity);

    assert_float_eq(linear[0], 100.0, 1e-9);
    assert_float_eq(linear[1], -50.0, 1e-9);
    assert_float_eq(linear[2], 300.0, 1e-9);
}

#[test]
fn test_normalized_quaternion() {
    let q = Quaternion::from_raw([2, 0, 0, 2]).normalized();
    assert_float_eq(q.magnitude(), 1.0, 1e-12);
    assert_float_eq(q.w, core::f64::consts::FRAC_1_SQRT_2, 1e-12);

    let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    assert_eq!(zero.normalized(), zero);
}
