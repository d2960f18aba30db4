//! Cooperative scheduling via byte counters shared with the ISR context.
//!
//! Mirrors the source's `t_sample` / `t_result` / `t_control` / `t_process`
//! counters: a 1ms tick increments `t_sample`; the PWM-frame boundary sets
//! `t_process` and clears `t_result`/`t_control`. The main loop drains
//! counters with [`Scheduler::poll`] instead of reading the volatiles
//! directly, so ordering is explicit at the one place it matters.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::{T_CONTROL, T_RESULT, T_SAMPLE};

/// What the main loop should do this pass through [`Scheduler::poll`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerEvent {
    /// Elapsed ms since the last sample; `0` if no sample is due.
    pub sample_dt: u8,
    pub fuse: bool,
    pub control: bool,
}

pub struct Scheduler {
    t_sample: AtomicU8,
    t_result: AtomicU8,
    t_control: AtomicU8,
    t_process: AtomicU8,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            t_sample: AtomicU8::new(0),
            t_result: AtomicU8::new(0),
            t_control: AtomicU8::new(0),
            t_process: AtomicU8::new(0),
        }
    }

    /// Call from the 1ms timer interrupt.
    pub fn on_ms_tick(&self) {
        self.t_sample.fetch_add(1, Ordering::Relaxed);
    }

    /// Call from the PWM-frame boundary interrupt. Does not reset
    /// `t_sample`: the gyro integrator needs the true elapsed time even
    /// across a frame boundary.
    ///
    /// The three stores below must land together: a `poll` interleaved
    /// between them would see `t_process` set but `t_result`/`t_control`
    /// not yet cleared, and fire a stale fuse/control early.
    pub fn on_pwm_frame(&self) {
        critical_section::with(|_cs| {
            self.t_process.store(1, Ordering::Relaxed);
            self.t_result.store(0, Ordering::Relaxed);
            self.t_control.store(0, Ordering::Relaxed);
        });
    }

    /// Drains due work. Safe to call from the main loop at any rate; counts
    /// below their threshold leave the corresponding event field unset.
    ///
    /// Each load-then-store pair below is wrapped in a critical section: an
    /// `on_ms_tick`/`on_pwm_frame` interrupt landing between the load and
    /// the store would otherwise have its increment clobbered by the store
    /// that follows, silently dropping a sample or frame boundary.
    pub fn poll(&self) -> SchedulerEvent {
        let mut event = SchedulerEvent::default();

        critical_section::with(|_cs| {
            let sample = self.t_sample.load(Ordering::Relaxed);
            if sample >= T_SAMPLE {
                self.t_sample.store(0, Ordering::Relaxed);
                event.sample_dt = sample;
                self.t_result.fetch_add(1, Ordering::Relaxed);
            }
        });

        let process = self.t_process.load(Ordering::Relaxed) != 0;

        critical_section::with(|_cs| {
            if process && self.t_result.load(Ordering::Relaxed) >= T_RESULT {
                self.t_result.store(0, Ordering::Relaxed);
                event.fuse = true;
                self.t_control.fetch_add(1, Ordering::Relaxed);
            }
        });

        critical_section::with(|_cs| {
            if process && self.t_control.load(Ordering::Relaxed) >= T_CONTROL {
                self.t_control.store(0, Ordering::Relaxed);
                self.t_process.store(0, Ordering::Relaxed);
                event.control = true;
            }
        });

        event
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_event_fires_only_after_t_sample_threshold() {
        let s = Scheduler::new();
        s.on_ms_tick();
        assert_eq!(s.poll().sample_dt, 0);
        s.on_ms_tick();
        let event = s.poll();
        assert_eq!(event.sample_dt, T_SAMPLE);
    }

    #[test]
    fn fuse_and_control_require_a_pwm_frame_to_have_occurred() {
        let s = Scheduler::new();
        for _ in 0..(T_SAMPLE as u32 * T_RESULT as u32) {
            s.on_ms_tick();
            let event = s.poll();
            assert!(!event.fuse);
            assert!(!event.control);
        }
    }

    #[test]
    fn fuse_fires_after_t_result_samples_once_processing_is_enabled() {
        let s = Scheduler::new();
        s.on_pwm_frame();
        let mut fused = false;
        for _ in 0..(T_SAMPLE as u32 * T_RESULT as u32) {
            s.on_ms_tick();
            if s.poll().fuse {
                fused = true;
                break;
            }
        }
        assert!(fused);
    }

    #[test]
    fn control_fires_once_per_pwm_frame_and_then_stops() {
        let s = Scheduler::new();
        s.on_pwm_frame();
        let mut controls = 0;
        for _ in 0..(T_SAMPLE as u32 * T_RESULT as u32 * T_CONTROL as u32 * 4) {
            s.on_ms_tick();
            if s.poll().control {
                controls += 1;
            }
        }
        assert_eq!(controls, 1);
    }
}
