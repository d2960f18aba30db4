//! Optional debug telemetry line, built the way the teacher's debug line is:
//! a fixed-capacity `heapless::String` filled with `core::fmt::Write`.
//!
//! Not present in the source firmware (its serial output was a few
//! commented-out `put_float` calls); this gives a board integration
//! something useful to push out a UART without pulling in `alloc`.

use core::fmt::Write;

use crate::controller::AdaptiveController;
use crate::estimator::FusedAngles;

/// Formats one debug line: fused angles and both controllers' last output
/// and identified parameters. Truncated (not panicking) if it would
/// overflow the 128-byte buffer.
pub fn format_debug_line(
    angles: FusedAngles,
    roll: &AdaptiveController,
    yaw: &AdaptiveController,
) -> heapless::String<128> {
    let mut line = heapless::String::<128>::new();
    let p = roll.params();
    let _ = write!(
        &mut line,
        "r={:.1} y={:.1} ur={:.0} uy={:.0} t=[{:.3},{:.3},{:.3},{:.3},{:.3}]\r\n",
        angles.roll_deg,
        angles.yaw_deg,
        roll.last_output(),
        yaw.last_output(),
        p[0],
        p[1],
        p[2],
        p[3],
        p[4],
    );
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_OUT_ROLL, MAX_OUT_YAW, ROLL_SEED, YAW_SEED};

    #[test]
    fn debug_line_contains_both_loop_prefixes() {
        let roll = AdaptiveController::new(ROLL_SEED, MAX_OUT_ROLL);
        let yaw = AdaptiveController::new(YAW_SEED, MAX_OUT_YAW);
        let angles = FusedAngles {
            roll_deg: 1.5,
            yaw_deg: -2.5,
        };
        let line = format_debug_line(angles, &roll, &yaw);
        assert!(line.starts_with("r=1.5 y=-2.5"));
    }
}
