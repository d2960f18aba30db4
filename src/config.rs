//! Named tunables. Kept as compile-time constants rather than scattered
//! literals, matching the reference firmware's module-level `const` blocks
//! (e.g. the teacher's `fast_loop.rs` filter-chain constants).

/// Sample period, in ms: `T = T_SAMPLE * 1ms`.
pub const T_SAMPLE: u8 = 2;
/// Samples per fusion: `T = T_RESULT * T_SAMPLE`.
pub const T_RESULT: u8 = 6;
/// Fusions per control action. Gated by the PWM-frame flag, so control
/// fires at most once per frame regardless of this value.
pub const T_CONTROL: u8 = 1;

/// Noise band for the adaptation-enable flag.
pub const NL: f64 = 0.0002;
/// Projection-gain weight on the output regressors.
pub const GAIN_A: f64 = 0.4;
/// Projection-gain weight on the input regressors.
pub const GAIN_B: f64 = 0.2;
/// Output-history regressor delay.
pub const PM_A: usize = 1;
/// Input-history regressor delay.
pub const PM_B: usize = 2;
/// Prediction horizon.
pub const HZ: usize = 5;

/// Output saturation, roll loop (PWM-tick units after scaling).
pub const UP_ROLL: f64 = 800.0;
/// Output saturation, yaw loop (PWM-tick units after scaling).
pub const UP_YAW: f64 = 180.0;
/// Roll controller output scale.
pub const GAIN_T_ROLL: f64 = 25.0;
/// Yaw controller output scale.
pub const GAIN_T_YAW: f64 = 5.0;
/// Roll loop saturation at the controller's own output, before scaling.
pub const MAX_OUT_ROLL: f64 = UP_ROLL / GAIN_T_ROLL;
/// Yaw loop saturation at the controller's own output, before scaling.
pub const MAX_OUT_YAW: f64 = UP_YAW / GAIN_T_YAW;

/// Seed parameters `(a1, a2, b1, b2, b3)` for the roll loop.
pub const ROLL_SEED: [f64; 5] = [0.49, 0.49, 0.051, 0.041, 0.011];
/// Seed parameters `(a1, a2, b1, b2, b3)` for the yaw loop.
pub const YAW_SEED: [f64; 5] = [1.0, 0.003, 0.02, 0.012, 0.013];

/// Gyro dead-band, roll axis, in raw LSB.
pub const DEADBAND_ROLL: i32 = 40;
/// Gyro dead-band, yaw axis, in raw LSB.
pub const DEADBAND_YAW: i32 = 100;

/// Fixed-point yaw wrap threshold: `180deg * 2^16`, rounded as the source does.
pub const YAW_WRAP_FIXED: i32 = 11_796_480;

/// Accelerometer IIR low-pass coefficient (`kf` in the 2^4-scaled filter).
pub const ACCEL_LPF_KF: i64 = 1;

/// Complementary-filter gyro/accel mix, as `(gyro_weight, accel_weight)` over
/// a base of 64: `0.984 / 0.0156`.
pub const COMPLEMENTARY_GYRO_WEIGHT: i64 = 63;
pub const COMPLEMENTARY_ACCEL_WEIGHT: i64 = 1;
pub const COMPLEMENTARY_SHIFT: u32 = 6;

/// Reference-model coefficients for the horizon-5, order-2 desired trajectory.
pub const REF_MODEL_A1: f64 = 0.2387;
pub const REF_MODEL_A2: f64 = -0.083467;
pub const REF_MODEL_B1: f64 = 0.844767;

/// PWM compare-value bounds (1-2ms pulse, centered at 1.5ms).
pub const PWM_MIN: u16 = 2000;
pub const PWM_CENTER: u16 = 3000;
pub const PWM_MAX: u16 = 4000;

/// PWM frame period, ms (50 Hz servo standard).
pub const PWM_FRAME_PERIOD_MS: u32 = 20;
