//! Shared bus access
//!
//! Touch polling, fuel-gauge sampling and backlight writes all run from one
//! cooperative tick but may interleave with an interrupt-driven touch read.
//! Every user takes the bus with a zero-wait try-acquire, performs a single
//! short transaction and releases it. If the bus is held, the caller skips
//! that cycle's transaction instead of waiting.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

use crate::i2c::I2cBus;
use crate::peripheral::Peripheral;

/// Shared bus failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Another user holds the bus
    Busy,
    /// The transaction ran but the device reported an error
    Device,
}

/// A bus that can be borrowed without waiting
pub trait SharedBus {
    /// The underlying bus
    type Bus;

    /// Run `f` with exclusive access, or fail immediately with
    /// [`BusError::Busy`]
    fn try_with<R, F>(&self, f: F) -> Result<R, BusError>
    where
        F: FnOnce(&mut Self::Bus) -> R;

    /// Sample a peripheral in one transaction
    fn try_read<P>(&self, peripheral: &mut P) -> Result<P::Value, BusError>
    where
        Self::Bus: I2cBus,
        P: Peripheral<Self::Bus>,
    {
        self.try_with(|bus| peripheral.read(bus))?
            .map_err(|_| BusError::Device)
    }

    /// Drive a peripheral in one transaction
    fn try_set<P>(&self, peripheral: &mut P, value: P::Value) -> Result<(), BusError>
    where
        Self::Bus: I2cBus,
        P: Peripheral<Self::Bus>,
    {
        self.try_with(|bus| peripheral.set(bus, value))?
            .map_err(|_| BusError::Device)
    }

    /// Bring up a peripheral; a busy bus counts as a failed probe
    fn try_init<P>(&self, peripheral: &mut P) -> bool
    where
        Self::Bus: I2cBus,
        P: Peripheral<Self::Bus>,
    {
        self.try_with(|bus| peripheral.init(bus)).unwrap_or(false)
    }
}

impl<M: RawMutex, B> SharedBus for Mutex<M, B> {
    type Bus = B;

    fn try_with<R, F>(&self, f: F) -> Result<R, BusError>
    where
        F: FnOnce(&mut B) -> R,
    {
        let mut guard = self.try_lock().map_err(|_| BusError::Busy)?;
        Ok(f(&mut guard))
    }
}

impl<T: SharedBus + ?Sized> SharedBus for &T {
    type Bus = T::Bus;

    fn try_with<R, F>(&self, f: F) -> Result<R, BusError>
    where
        F: FnOnce(&mut T::Bus) -> R,
    {
        (**self).try_with(f)
    }
}
