use std::fmt;

use crate::registers::SensorId;

/// Errors from the driver. `E` is the error type of the underlying I2C bus.
///
/// Out-of-range light levels are not errors, see [`crate::lux::LuxResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// A bus transaction failed. Never retried by the driver.
    Communication(E),
    /// The ID register does not identify a TSL2561.
    UnsupportedDevice(SensorId),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Communication(e) => write!(f, "I2C communication with the sensor failed: {e:?}"),
            Error::UnsupportedDevice(id) => write!(
                f,
                "bad sensor id {:#x} (part number {}, revision {})",
                id.part_number << 4 | id.revision,
                id.part_number,
                id.revision
            ),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}
