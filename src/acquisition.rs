/// Takes single measurements, following the TSL258x "Accurate ADC Readings after Enable"
/// guidance: the gain and integration time are only ever changed with the ADC powered down, and
/// the first conversion after enabling the ADC is never used.
///
/// The engine assumes exclusive access to the bus device; callers sharing one driver across
/// threads must serialize access themselves.
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::Error;
use crate::lux::{LuxResult, Package};
use crate::observer::{Event, Observer};
use crate::registers::{Gain, IntegrationTime, Registers};

/// A gain + integration time pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Configuration {
    pub gain: Gain,
    pub integration: IntegrationTime,
}

impl Configuration {
    pub const fn new(gain: Gain, integration: IntegrationTime) -> Self {
        Configuration { gain, integration }
    }

    /// Counts per unit of light relative to 1x/13.7ms, used to order configurations.
    pub fn sensitivity(&self) -> f32 {
        self.gain.multiplier() as f32 * self.integration.nominal_ms() / IntegrationTime::Short.nominal_ms()
    }
}

/// Channel counts from one integration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    /// broadband (visible + infrared)
    pub channel0: u16,
    /// infrared only
    pub channel1: u16,
    pub gain: Gain,
    pub integration: IntegrationTime,
}

impl RawReading {
    pub fn configuration(&self) -> Configuration {
        Configuration::new(self.gain, self.integration)
    }
}

/// A reading together with the lux value computed from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub reading: RawReading,
    pub lux: LuxResult,
}

impl Measurement {
    pub fn new(reading: RawReading, package: Package) -> Self {
        Measurement {
            reading,
            lux: package.lux(&reading),
        }
    }
}

/// What the driver believes the device is currently doing.
///
/// `configuration` is `None` until the timing register has been written by this driver, so the
/// first acquisition always goes through the settling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorState {
    pub configuration: Option<Configuration>,
    pub powered: bool,
}

pub struct Acquisition<I: I2c, D: DelayNs, O: Observer> {
    registers: Registers<I>,
    delay: D,
    pub(crate) observer: O,
    state: SensorState,
    power_down_between_reads: bool,
}

impl<I: I2c, D: DelayNs, O: Observer> Acquisition<I, D, O> {
    pub fn new(registers: Registers<I>, delay: D, observer: O, power_down_between_reads: bool) -> Self {
        Acquisition {
            registers,
            delay,
            observer,
            state: SensorState::default(),
            power_down_between_reads,
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn registers(&mut self) -> &mut Registers<I> {
        &mut self.registers
    }

    pub fn release(self) -> (I, D) {
        (self.registers.release(), self.delay)
    }

    pub fn set_power(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.registers.set_power(on)?;
        if self.state.powered != on {
            self.state.powered = on;
            self.observer.notify(&Event::Power(on));
        }
        Ok(())
    }

    /// Write the timing register (with the ADC off), power up and wait out the first conversion.
    fn settle(&mut self, target: Configuration) -> Result<(), Error<I::Error>> {
        if self.state.configuration != Some(target) {
            if self.state.powered {
                self.set_power(false)?;
            }
            self.state.configuration = None;
            self.registers
                .set_timing(target.gain, target.integration, false)?;
            self.state.configuration = Some(target);
            self.observer.notify(&Event::Configured(target));
        }
        self.set_power(true)?;

        // powering down before the timing write restarts the ADC, so the conversion running now
        // is the first with the new settings and nothing stale needs to be read off
        let wait_ms = target.integration.wait_ms();
        self.observer.notify(&Event::Settling {
            configuration: target,
            wait_ms,
        });
        self.delay.delay_ms(wait_ms);
        Ok(())
    }

    /// Take one reading with the given configuration.
    ///
    /// Blocks for at least one full integration period, more if the configuration changed or
    /// the device was powered down.
    pub fn acquire(&mut self, target: Configuration) -> Result<RawReading, Error<I::Error>> {
        if self.state.configuration != Some(target) || !self.state.powered {
            self.settle(target)?;
        }

        // every reading is a fresh integration cycle
        self.delay.delay_ms(target.integration.wait_ms());
        let (channel0, channel1) = self.registers.read_channels()?;

        if self.power_down_between_reads {
            self.set_power(false)?;
        }

        Ok(RawReading {
            channel0,
            channel1,
            gain: target.gain,
            integration: target.integration,
        })
    }
}
