//! Gyro integration + accelerometer filtering + complementary fusion.
//!
//! The gyro integrator stays in fixed-point `i32` (units of `degrees *
//! 2^16`) for deterministic timing; only the fused output crosses into
//! floating point, matching the source firmware exactly.

use crate::config::{
    COMPLEMENTARY_ACCEL_WEIGHT, COMPLEMENTARY_GYRO_WEIGHT, COMPLEMENTARY_SHIFT, DEADBAND_ROLL,
    DEADBAND_YAW, YAW_WRAP_FIXED,
};

/// `(180/pi) * 2^16`, the scale that turns an `atan2` result in radians into
/// the same fixed-point units as the gyro accumulator.
const GRADE: f64 = (180.0 / core::f64::consts::PI) * 65536.0;

/// Fused roll/yaw angles, in degrees, range `[-180, 180]`.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct FusedAngles {
    pub roll_deg: f64,
    pub yaw_deg: f64,
}

#[derive(Clone, Copy, Default)]
pub struct AttitudeEstimator {
    a_gyro_roll: i32,
    a_gyro_yaw: i32,
    gyro_roll_prev: i32,
    gyro_yaw_prev: i32,
    accel_x_filt: i32,
    accel_z_filt: i32,
    result: FusedAngles,
}

impl AttitudeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the axes used for roll (one gyro axis, two accel axes) and yaw
    /// (one gyro axis) are consumed; the others are discarded by the caller.
    ///
    /// `dt` is the elapsed sample period in ms, captured by the scheduler.
    pub fn integrate_gyro(&mut self, dt: u8, gyro_roll_raw: i16, gyro_yaw_raw: i16) {
        let gyro_roll = deadband(gyro_roll_raw as i32, DEADBAND_ROLL);
        let gyro_yaw = deadband(gyro_yaw_raw as i32, DEADBAND_YAW);

        let dt = dt as i32;
        self.a_gyro_roll += dt * ((gyro_roll + self.gyro_roll_prev) >> 1);
        self.a_gyro_yaw += dt * ((gyro_yaw + self.gyro_yaw_prev) >> 1);

        if self.a_gyro_yaw > YAW_WRAP_FIXED || self.a_gyro_yaw < -YAW_WRAP_FIXED {
            self.a_gyro_yaw = 0;
        }

        self.gyro_roll_prev = gyro_roll;
        self.gyro_yaw_prev = gyro_yaw;
    }

    /// First-order IIR low-pass on the two accelerometer axes used for tilt.
    pub fn filter_accel(&mut self, accel_x_raw: i16, accel_z_raw: i16) {
        self.accel_x_filt = lpf_16(accel_x_raw as i32, self.accel_x_filt);
        self.accel_z_filt = lpf_16(accel_z_raw as i32, self.accel_z_filt);
    }

    /// Complementary fusion: runs once every `T_RESULT`-th sample.
    pub fn fuse(&mut self) -> FusedAngles {
        let ax = libm::atan2(self.accel_x_filt as f64, self.accel_z_filt as f64) * GRADE;

        // Mixed long/double arithmetic in the source: the blend is computed in
        // double precision, then truncated back to the fixed-point accumulator.
        let blended = COMPLEMENTARY_GYRO_WEIGHT as f64 * self.a_gyro_roll as f64
            + COMPLEMENTARY_ACCEL_WEIGHT as f64 * (-ax);
        self.a_gyro_roll = blended as i32;
        self.a_gyro_roll >>= COMPLEMENTARY_SHIFT;

        self.result = FusedAngles {
            roll_deg: (self.a_gyro_roll >> 10) as f64 / 64.0,
            yaw_deg: (self.a_gyro_yaw >> 10) as f64 / 64.0,
        };
        self.result
    }

    pub fn angles(&self) -> FusedAngles {
        self.result
    }
}

fn deadband(raw: i32, threshold: i32) -> i32 {
    if raw.abs() > threshold {
        raw
    } else {
        0
    }
}

/// `(kf * raw + (16 - kf) * prev) / 16` with `kf = 1`: very heavy smoothing.
fn lpf_16(raw: i32, prev: i32) -> i32 {
    const KF: i32 = 1;
    (KF * raw + (16 - KF) * prev) >> 4
}
