//! Bus-attached peripherals
//!
//! A peripheral is brought up once with [`Peripheral::init`], then sampled
//! or driven with short single transactions. Callers hold the bus only for
//! the duration of one call.

use crate::i2c::I2cBus;

/// A device on a shared bus
pub trait Peripheral<B: I2cBus> {
    /// Value read from or written to the device
    type Value: Copy;

    /// Probe and configure the device
    ///
    /// Returns `false` if the device did not respond; the caller treats
    /// every later reading as unavailable.
    fn init(&mut self, bus: &mut B) -> bool;

    /// Sample the device
    fn read(&mut self, bus: &mut B) -> Result<Self::Value, B::Error>;

    /// Drive the device to `value`
    fn set(&mut self, bus: &mut B, value: Self::Value) -> Result<(), B::Error>;
}
