//! MPU-6050 register-level driver, generic over [`Bus`].
//!
//! Mirrors the reference firmware's fixed init sequence and register map
//! exactly; scaling and axis selection are the estimator's job, not this
//! driver's.

use crate::hal::{Bus, Clock};

use reg::*;

/// Register addresses and fixed init values for the MPU-6050 register map.
pub mod reg {
    /// Slave address with the R/W bit already set for writes.
    pub const IMU_ADDR: u8 = 0xD0;

    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const CLKSEL: u8 = 0x09;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const GYRO_FS: u8 = 0x08;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const AFS_SEL: u8 = 0x18;
    pub const CONFIG: u8 = 0x1A;
    pub const DLPF_CFG: u8 = 0x00;
    pub const SMPRT_DIV: u8 = 0x19;
    pub const SMPLRT_DIV: u8 = 0x03;

    pub const ACCEL_XOUT: u8 = 0x3B;
    pub const GYRO_XOUT: u8 = 0x43;
}

/// Wraps a bus error; distinguishes init from read-path failures so a
/// caller can decide whether to retry or fall back to the last sample.
#[derive(Debug)]
pub enum ImuError<E> {
    Bus(E),
}

impl<E> From<E> for ImuError<E> {
    fn from(e: E) -> Self {
        ImuError::Bus(e)
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for ImuError<E>
where
    E: defmt::Format,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            ImuError::Bus(e) => defmt::write!(f, "IMU bus error: {}", e),
        }
    }
}

/// Drives an MPU-6050-compatible IMU over a two-wire [`Bus`].
pub struct ImuDriver<B> {
    bus: B,
    addr: u8,
}

impl<B> ImuDriver<B>
where
    B: Bus,
{
    pub fn new(bus: B) -> Self {
        Self { bus, addr: IMU_ADDR }
    }

    /// Runs the fixed power-up sequence: clock select, then the 100ms
    /// settle the source always waits before touching scale/filter
    /// registers, then scale and sample-rate configuration.
    ///
    /// `clock` is only used to observe elapsed time; callers without a
    /// free-running clock can pass one that busy-waits internally.
    pub fn init<C: Clock>(&mut self, clock: &C) -> Result<(), ImuError<B::Error>> {
        self.bus.write_register(PWR_MGMT_1, CLKSEL)?;
        let start = clock.now_ms();
        while clock.now_ms().wrapping_sub(start) < 100 {}

        self.bus.write_register(GYRO_CONFIG, GYRO_FS)?;
        self.bus.write_register(ACCEL_CONFIG, AFS_SEL)?;
        self.bus.write_register(CONFIG, DLPF_CFG)?;
        self.bus.write_register(SMPRT_DIV, SMPLRT_DIV)?;
        Ok(())
    }

    /// Reads the six gyro bytes starting at `GYRO_XOUT`. On a bus error the
    /// caller's last sample is left untouched: this never partially fills
    /// the returned array.
    pub fn read_gyro(&mut self) -> Result<(i16, i16, i16), ImuError<B::Error>> {
        let mut buf = [0u8; 6];
        self.bus.read_registers(GYRO_XOUT, &mut buf)?;
        Ok(be_pairs(&buf))
    }

    /// Reads the six accelerometer bytes starting at `ACCEL_XOUT`.
    pub fn read_accel(&mut self) -> Result<(i16, i16, i16), ImuError<B::Error>> {
        let mut buf = [0u8; 6];
        self.bus.read_registers(ACCEL_XOUT, &mut buf)?;
        Ok(be_pairs(&buf))
    }

    /// Address byte the driver issues on the bus. Exposed for bus
    /// implementations that need to route the transaction.
    pub fn address(&self) -> u8 {
        self.addr
    }
}

fn be_pairs(buf: &[u8; 6]) -> (i16, i16, i16) {
    let x = i16::from_be_bytes([buf[0], buf[1]]);
    let y = i16::from_be_bytes([buf[2], buf[3]]);
    let z = i16::from_be_bytes([buf[4], buf[5]]);
    (x, y, z)
}
