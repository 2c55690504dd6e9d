//! Orientation math on DMP quaternions
//!
//! Pure functions, nothing is cached: every call recomputes from the
//! quaternion it is given. Vectors are `[x, y, z]`.

use core::f64::consts::PI;

/// Accelerometer scale for the ±2g range (g per LSB)
pub const ACCEL_SCALE: f64 = 1.0 / 16384.0;

/// DMP accel counts per g in the standard FIFO packet
pub const DMP_ACCEL_ONE_G: f64 = 8192.0;

const Q30: f64 = 1_073_741_824.0;

/// Orientation quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quaternion {
    /// Scalar part
    pub w: f64,
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// Create a quaternion from its components
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Raw integer components `[w, x, y, z]` as the DMP sends them
    pub fn from_raw(raw: [i32; 4]) -> Self {
        let [w, x, y, z] = raw.map(f64::from);
        Self::new(w, x, y, z)
    }

    /// Components `[w, x, y, z]` in Q30 fixed point
    pub fn from_q30(raw: [i32; 4]) -> Self {
        let [w, x, y, z] = raw.map(|v| f64::from(v) / Q30);
        Self::new(w, x, y, z)
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// Unit quaternion; a zero quaternion is returned unchanged
    #[must_use]
    pub fn normalized(&self) -> Self {
        let m = self.magnitude();
        if m == 0.0 {
            return *self;
        }
        Self::new(self.w / m, self.x / m, self.y / m, self.z / m)
    }
}

/// Yaw, pitch and roll
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct YawPitchRoll {
    /// Rotation about Z
    pub yaw: f64,
    /// Nose up/down, about Y
    pub pitch: f64,
    /// Tilt left/right, about X
    pub roll: f64,
}

/// Gravity direction scaled by `scale`
///
/// `z` carries an extra factor of one half, matching the DMP convention of
/// +1g = 8192 counts.
pub fn gravity(q: &Quaternion, scale: f64) -> [f64; 3] {
    let Quaternion { w, x, y, z } = *q;
    [
        (x * z - w * y) * scale,
        (w * x + y * z) * scale,
        (w * w - x * x - y * y + z * z) * scale / 2.0,
    ]
}

/// Euler angles in radians; the third angle is always zero
pub fn euler(q: &Quaternion) -> [f64; 3] {
    let Quaternion { w, x, y, z } = *q;
    [
        libm::atan2(2.0 * x * y - 2.0 * w * z, 2.0 * w * w + 2.0 * x * x - 1.0)
            - libm::asin(2.0 * x * z + 2.0 * w * y),
        libm::atan2(2.0 * y * z - 2.0 * w * x, 2.0 * w * w + 2.0 * z * z - 1.0),
        0.0,
    ]
}

/// Yaw from the quaternion, pitch and roll from the gravity vector
///
/// Pitch is mirrored around ±π when the device is upside down (`gz < 0`).
pub fn yaw_pitch_roll(q: &Quaternion, gravity: [f64; 3], degrees: bool) -> YawPitchRoll {
    let Quaternion { w, x, y, .. } = *q;
    let [gx, gy, gz] = gravity;

    let yaw = libm::atan2(2.0 * x * y - 2.0 * w * q.z, 2.0 * w * w + 2.0 * x * x - 1.0);
    let mut pitch = libm::atan2(gx, libm::sqrt(gy * gy + gz * gz));
    let roll = libm::atan2(gy, gz);

    if gz < 0.0 {
        pitch = if pitch > 0.0 { PI - pitch } else { -PI - pitch };
    }

    let ypr = YawPitchRoll { yaw, pitch, roll };
    if degrees {
        YawPitchRoll {
            yaw: ypr.yaw.to_degrees(),
            pitch: ypr.pitch.to_degrees(),
            roll: ypr.roll.to_degrees(),
        }
    } else {
        ypr
    }
}

/// Raw DMP acceleration with the gravity component removed
pub fn linear_accel(accel: [i16; 3], gravity: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, (a, g)) in out.iter_mut().zip(accel.iter().zip(gravity.iter())) {
        *o = f64::from(*a) - g * DMP_ACCEL_ONE_G;
    }
    out
}
