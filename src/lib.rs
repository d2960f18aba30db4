//! Adaptive-predictive balance and yaw control core for a two-wheeled
//! self-balancing robot.
//!
//! Hardware access is abstracted behind [`hal::Bus`], [`hal::PwmSink`], and
//! [`hal::Clock`]; a board integration implements those traits and drives
//! [`pipeline::Balancer`] from its timer interrupts and main loop.

#![cfg_attr(not(test), no_std)]

pub mod actuator;
pub mod config;
pub mod controller;
pub mod drivers;
pub mod estimator;
pub mod hal;
pub mod pipeline;
pub mod scheduler;

#[cfg(feature = "debug-telemetry")]
pub mod telemetry;
