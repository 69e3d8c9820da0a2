/// Represents a TSL2561 sensor and provides convenience methods to control & read from it over I2C.
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::acquisition::{Acquisition, Configuration, Measurement, RawReading, SensorState};
use crate::autogain::autogain;
use crate::config::SensorConfig;
use crate::error::Error;
use crate::hdr::hdr;
use crate::lux::LuxResult;
use crate::observer::{Event, NoopObserver, Observer};
use crate::registers::{Gain, IntegrationTime, Registers, SensorId, Threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One reading at the current configuration
    Raw,
    /// Adjust gain and integration time until channel 0 is in band; the next read starts there
    Autogain,
    /// Search the full sensitivity range, starting from the most sensitive configuration
    Hdr,
}

pub struct Tsl2561<I: I2c, D: DelayNs, O: Observer = NoopObserver> {
    engine: Acquisition<I, D, O>,
    identity: SensorId,
    config: SensorConfig,
    /// Configuration for raw reads, and the starting point for autogain.
    configuration: Configuration,
}

impl<I: I2c, D: DelayNs> Tsl2561<I, D, NoopObserver> {
    /// Check the chip is a TSL2561 and leave it powered down.
    pub fn initialize(i2c: I, delay: D, config: SensorConfig) -> Result<Self, Error<I::Error>> {
        Self::with_observer(i2c, delay, config, NoopObserver)
    }
}

impl<I: I2c, D: DelayNs, O: Observer> Tsl2561<I, D, O> {
    pub fn with_observer(
        i2c: I,
        delay: D,
        config: SensorConfig,
        mut observer: O,
    ) -> Result<Self, Error<I::Error>> {
        let mut registers = Registers::new(i2c, config.address);

        // Check the chip is what we expect
        let identity = registers.read_sensor_id()?;
        if !identity.is_tsl2561() {
            return Err(Error::UnsupportedDevice(identity));
        }
        observer.notify(&Event::Identified(identity));

        let mut engine =
            Acquisition::new(registers, delay, observer, config.power_down_between_reads);
        engine.set_power(false)?;

        Ok(Tsl2561 {
            engine,
            identity,
            config,
            configuration: Configuration::new(config.gain, config.integration),
        })
    }

    pub fn identity(&self) -> SensorId {
        self.identity
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    pub fn state(&self) -> SensorState {
        self.engine.state()
    }

    /// Read both channels with the given gain and integration time, which become the current
    /// configuration.
    pub fn read_raw(
        &mut self,
        gain: Gain,
        integration: IntegrationTime,
    ) -> Result<RawReading, Error<I::Error>> {
        let configuration = Configuration::new(gain, integration);
        let reading = self.engine.acquire(configuration)?;
        self.configuration = configuration;
        Ok(reading)
    }

    pub fn read(&mut self, mode: Mode) -> Result<Measurement, Error<I::Error>> {
        let package = self.config.package;
        let measurement = match mode {
            Mode::Raw => Measurement::new(self.engine.acquire(self.configuration)?, package),
            Mode::Autogain => {
                let m = autogain(&mut self.engine, self.configuration, package)?;
                self.configuration = m.reading.configuration();
                m
            }
            Mode::Hdr => hdr(&mut self.engine, package)?,
        };
        self.engine.observer.notify(&Event::Measured(measurement));
        Ok(measurement)
    }

    /// Read lux in the configured default mode: HDR if enabled, raw otherwise.
    pub fn read_lux(&mut self) -> Result<LuxResult, Error<I::Error>> {
        let mode = if self.config.hdr { Mode::Hdr } else { Mode::Raw };
        Ok(self.read(mode)?.lux)
    }

    pub fn power_on(&mut self) -> Result<(), Error<I::Error>> {
        self.engine.set_power(true)
    }

    pub fn power_off(&mut self) -> Result<(), Error<I::Error>> {
        self.engine.set_power(false)
    }

    /// Set the channel 0 interrupt window. The device is powered for the write and returned to
    /// its previous power state afterwards.
    pub fn set_threshold(&mut self, threshold: Threshold) -> Result<(), Error<I::Error>> {
        let was_active = self.engine.state().powered;
        self.engine.set_power(true)?;
        self.engine.registers().set_threshold(threshold)?;
        self.engine.set_power(was_active)
    }

    pub fn threshold(&mut self) -> Result<Threshold, Error<I::Error>> {
        self.engine.registers().threshold()
    }

    pub fn clear_interrupt(&mut self) -> Result<(), Error<I::Error>> {
        self.engine.registers().clear_interrupt()
    }

    /// Give back the bus and delay.
    pub fn release(self) -> (I, D) {
        self.engine.release()
    }
}
