//! Desktop simulation: drives `Balancer` against a software plant instead of
//! real hardware, so the control loop can be exercised without a board.
//! Not part of the embedded firmware image; a developer tool only.

use std::time::{SystemTime, UNIX_EPOCH};

use segway_balancer_core::hal::{Bus, Channel, Clock, PwmSink};
use segway_balancer_core::pipeline::Balancer;

/// A flat, level, motionless IMU: always reports zero rotation and gravity
/// pointing straight down the Z axis.
struct StubBus;

impl Bus for StubBus {
    type Error = std::convert::Infallible;

    fn write_register(&mut self, _reg: u8, _val: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        // GYRO_XOUT: all axes zero. ACCEL_XOUT: Z axis at +1g (16384 LSB),
        // X/Y at zero, matching a level resting robot.
        const ACCEL_XOUT: u8 = 0x3B;
        if reg == ACCEL_XOUT {
            let z = 16384i16.to_be_bytes();
            buf.fill(0);
            if buf.len() >= 6 {
                buf[4] = z[0];
                buf[5] = z[1];
            }
        } else {
            buf.fill(0);
        }
        Ok(())
    }
}

struct WallClock;

impl Clock for WallClock {
    fn now_ms(&self) -> u32 {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        now.as_millis() as u32
    }
}

struct ConsoleSink;

impl PwmSink for ConsoleSink {
    fn set_compare(&mut self, channel: Channel, value: u16) {
        println!("{:?} -> {}", channel, value);
    }
}

fn main() {
    let mut balancer = Balancer::new(StubBus, ConsoleSink);
    balancer.init(&WallClock).expect("imu init");
    balancer.on_pwm_frame();

    for ms in 0..2000u32 {
        balancer.on_ms_tick();
        balancer.poll();
        if ms % 20 == 19 {
            balancer.on_pwm_frame();
        }
    }
}
