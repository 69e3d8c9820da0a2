//! Driver for the TSL2561 light-to-digital converter.
//!
//! Reads the broadband and infrared photodiode channels over I2C and converts them to lux, with
//! optional automatic gain control and a high dynamic range mode that searches every
//! gain / integration time combination.
//!
//! ```no_run
//! # fn run<I: embedded_hal::i2c::I2c, D: embedded_hal::delay::DelayNs>(i2c: I, delay: D) -> Result<(), tsl2561_hdr::Error<I::Error>> {
//! use tsl2561_hdr::{Mode, SensorConfig, Tsl2561};
//!
//! let mut sensor = Tsl2561::initialize(i2c, delay, SensorConfig::default())?;
//! let measurement = sensor.read(Mode::Hdr)?;
//! println!("{}", measurement.lux);
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod autogain;
pub mod config;
pub mod driver;
pub mod error;
pub mod hdr;
pub mod lux;
pub mod observer;
pub mod registers;

#[cfg(test)]
mod testing;

pub use acquisition::{Configuration, Measurement, RawReading, SensorState};
pub use config::SensorConfig;
pub use driver::{Mode, Tsl2561};
pub use error::Error;
pub use lux::{LuxResult, Package, to_lux};
pub use observer::{Event, LogObserver, NoopObserver, Observer};
pub use registers::{Address, Gain, IntegrationTime, SensorId, Threshold};
