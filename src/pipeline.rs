//! Top-level orchestration: wires the IMU, estimator, both controllers, and
//! the actuator together in the per-PWM-frame dispatch order the source's
//! `while(1)` loop follows.

use crate::actuator::Actuator;
use crate::config::{
    GAIN_T_ROLL, GAIN_T_YAW, MAX_OUT_ROLL, MAX_OUT_YAW, UP_ROLL, UP_YAW, YAW_SEED, ROLL_SEED,
};
use crate::controller::AdaptiveController;
use crate::drivers::imu::{ImuDriver, ImuError};
use crate::estimator::AttitudeEstimator;
use crate::hal::{Bus, Clock, PwmSink};
use crate::scheduler::Scheduler;

/// Owns every stateful component and runs one iteration of the control
/// system per call to [`Balancer::poll`].
pub struct Balancer<B, P> {
    imu: ImuDriver<B>,
    estimator: AttitudeEstimator,
    roll: AdaptiveController,
    yaw: AdaptiveController,
    actuator: Actuator,
    sink: P,
    scheduler: Scheduler,
}

impl<B, P> Balancer<B, P>
where
    B: Bus,
    P: PwmSink,
{
    pub fn new(bus: B, sink: P) -> Self {
        Self {
            imu: ImuDriver::new(bus),
            estimator: AttitudeEstimator::new(),
            roll: AdaptiveController::new(ROLL_SEED, MAX_OUT_ROLL),
            yaw: AdaptiveController::new(YAW_SEED, MAX_OUT_YAW),
            actuator: Actuator::new(),
            sink,
            scheduler: Scheduler::new(),
        }
    }

    pub fn init<C: Clock>(&mut self, clock: &C) -> Result<(), ImuError<B::Error>> {
        self.imu.init(clock)
    }

    /// Board integrations wire this to the 1ms system timer interrupt.
    pub fn on_ms_tick(&self) {
        self.scheduler.on_ms_tick();
    }

    /// Board integrations wire this to the PWM-frame overflow interrupt.
    pub fn on_pwm_frame(&self) {
        self.scheduler.on_pwm_frame();
    }

    /// Drains due scheduler work. Call from the main loop at any rate
    /// faster than `T_SAMPLE` ms; a bus error on the sample read is
    /// swallowed and the stale sample is reused, matching the source's
    /// fire-and-forget TWI transactions.
    pub fn poll(&mut self) {
        let event = self.scheduler.poll();

        if event.sample_dt > 0 {
            // Each read is independent: a bus failure on one must not
            // suppress the other, matching `sample_meters()`'s two
            // sequential, independently-failing TWI_Read blocks.
            if let Ok((_gx, gy, gz)) = self.imu.read_gyro() {
                self.estimator.integrate_gyro(event.sample_dt, gy, gz);
            }
            if let Ok((ax, _ay, az)) = self.imu.read_accel() {
                self.estimator.filter_accel(ax, az);
            }
        }

        if event.fuse {
            self.estimator.fuse();
        }

        if event.control {
            let angles = self.estimator.angles();

            let mut out_balancer = self.roll.step(0.0, angles.roll_deg) * GAIN_T_ROLL;
            out_balancer = out_balancer.clamp(-UP_ROLL, UP_ROLL);

            let mut out_yaw = self.yaw.step(0.0, angles.yaw_deg) * GAIN_T_YAW;
            out_yaw = out_yaw.clamp(-UP_YAW, UP_YAW);

            self.actuator.drive(&mut self.sink, out_balancer, out_yaw);
        }
    }
}
