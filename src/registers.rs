/// Typed access to the TSL2561 register file over I2C.
///
/// Datasheet for the sensor: https://cdn-shop.adafruit.com/datasheets/TSL2561.pdf
use embedded_hal::i2c::{I2c, SevenBitAddress};
use serde::Deserialize;

use crate::error::Error;

const COMMAND_BIT: u8 = 0x80;
const CLEAR_BIT: u8 = 0x40;
const WORD_BIT: u8 = 0x20;

pub mod register {
    pub const CONTROL: u8 = 0x00;
    pub const TIMING: u8 = 0x01;

    // Interrupt related registers
    pub const THRESHLOW: u8 = 0x02;
    pub const THRESHHIGH: u8 = 0x04;
    pub const INTERRUPT: u8 = 0x06;

    pub const ID: u8 = 0x0A;

    // Data registers (word access, low byte first)
    pub const DATA0: u8 = 0x0C;
    pub const DATA1: u8 = 0x0E;
}

pub mod bits {
    pub const POWER_ON: u8 = 0x03;
    pub const POWER_OFF: u8 = 0x00;

    pub const GAIN_16X: u8 = 0x10;
    pub const MANUAL: u8 = 0x08;
    pub const INTEG_MASK: u8 = 0x03;

    pub const INTERRUPT_NONE: u8 = 0x00;
    pub const INTERRUPT_LEVEL: u8 = 0x10;
    pub const PERSIST_MASK: u8 = 0x0F;
}

/// Bus address, picked by how the ADDR SEL pin is wired.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Address {
    /// ADDR SEL tied to ground
    Low,
    /// ADDR SEL left floating
    #[default]
    Float,
    /// ADDR SEL tied to VDD
    High,
}

impl Address {
    pub const fn bits(self) -> SevenBitAddress {
        match self {
            Address::Low => 0x29,
            Address::Float => 0x39,
            Address::High => 0x49,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAddress(pub u8);

impl std::fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:#04x} is not a TSL2561 address (expected 0x29, 0x39 or 0x49)",
            self.0
        )
    }
}

impl std::error::Error for InvalidAddress {}

impl TryFrom<u8> for Address {
    type Error = InvalidAddress;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x29 => Ok(Address::Low),
            0x39 => Ok(Address::Float),
            0x49 => Ok(Address::High),
            other => Err(InvalidAddress(other)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gain {
    /// 1x
    Low,
    /// 16x
    High,
}

impl Gain {
    pub const fn multiplier(self) -> u16 {
        match self {
            Gain::Low => 1,
            Gain::High => 16,
        }
    }

    const fn bits(self) -> u8 {
        match self {
            Gain::Low => 0x00,
            Gain::High => bits::GAIN_16X,
        }
    }
}

/// Integration time. Manual integration (field value 0b11) is not supported.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrationTime {
    /// 13.7ms
    Short,
    /// 101ms
    Medium,
    /// 402ms
    Long,
}

impl IntegrationTime {
    const fn bits(self) -> u8 {
        match self {
            IntegrationTime::Short => 0x00,
            IntegrationTime::Medium => 0x01,
            IntegrationTime::Long => 0x02,
        }
    }

    /// Nominal integration period in milliseconds.
    pub const fn nominal_ms(self) -> f32 {
        match self {
            IntegrationTime::Short => 13.7,
            IntegrationTime::Medium => 101.0,
            IntegrationTime::Long => 402.0,
        }
    }

    /// How long to wait for one complete conversion, including the device's conversion margin.
    pub const fn wait_ms(self) -> u32 {
        match self {
            IntegrationTime::Short => 15,
            IntegrationTime::Medium => 120,
            IntegrationTime::Long => 450,
        }
    }

    /// Channel scale as a 2^10 fixed-point multiplier normalizing counts to 402ms.
    pub const fn channel_scale(self) -> u32 {
        match self {
            IntegrationTime::Short => 0x7517,
            IntegrationTime::Medium => 0x0FE7,
            IntegrationTime::Long => 1 << 10,
        }
    }

    /// Fraction of a 402ms integration this time corresponds to (0.034, 0.252, 1.0).
    pub fn scale_factor(self) -> f64 {
        1024.0 / self.channel_scale() as f64
    }

    /// Channel counts above this are clipped.
    pub const fn clip(self) -> u16 {
        match self {
            IntegrationTime::Short => 4900,
            IntegrationTime::Medium => 37000,
            IntegrationTime::Long => 65000,
        }
    }

    pub const fn shorter(self) -> Option<Self> {
        match self {
            IntegrationTime::Short => None,
            IntegrationTime::Medium => Some(IntegrationTime::Short),
            IntegrationTime::Long => Some(IntegrationTime::Medium),
        }
    }

    pub const fn longer(self) -> Option<Self> {
        match self {
            IntegrationTime::Short => Some(IntegrationTime::Medium),
            IntegrationTime::Medium => Some(IntegrationTime::Long),
            IntegrationTime::Long => None,
        }
    }
}

/// Contents of the ID register.
///
/// Part numbers from the datasheet:
///  - 0000 TSL2560CS
///  - 0001 TSL2561CS
///  - 0100 TSL2560T/FN/CL
///  - 0101 TSL2561T/FN/CL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorId {
    pub part_number: u8,
    pub revision: u8,
}

impl SensorId {
    pub const fn from_byte(id: u8) -> Self {
        SensorId {
            part_number: id >> 4,
            revision: id & 0x0F,
        }
    }

    /// TSL2561 parts have the low bit of the part number set, TSL2560 parts do not.
    pub const fn is_tsl2561(&self) -> bool {
        self.part_number & 0x01 == 0x01
    }
}

/// Interrupt threshold window on channel 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// `None` disables the level interrupt, otherwise the number of out-of-window cycles
    /// (0..=15) before it fires.
    pub persistence: Option<u8>,
    pub low: u16,
    pub high: u16,
}

pub struct Registers<I: I2c> {
    i2c: I,
    address: SevenBitAddress,
}

impl<I: I2c> Registers<I> {
    pub fn new(i2c: I, address: Address) -> Self {
        Registers {
            i2c,
            address: address.bits(),
        }
    }

    pub fn release(self) -> I {
        self.i2c
    }

    fn read8(&mut self, register: u8) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | register], &mut buf)
            .map_err(Error::Communication)?;
        Ok(buf[0])
    }

    fn write8(&mut self, register: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.address, &[COMMAND_BIT | register, value])
            .map_err(Error::Communication)
    }

    fn read16(&mut self, register: u8) -> Result<u16, Error<I::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | WORD_BIT | register], &mut buf)
            .map_err(Error::Communication)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write16(&mut self, register: u8, value: u16) -> Result<(), Error<I::Error>> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c
            .write(self.address, &[COMMAND_BIT | WORD_BIT | register, lo, hi])
            .map_err(Error::Communication)
    }

    pub fn read_sensor_id(&mut self) -> Result<SensorId, Error<I::Error>> {
        Ok(SensorId::from_byte(self.read8(register::ID)?))
    }

    pub fn set_power(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.write8(
            register::CONTROL,
            if on { bits::POWER_ON } else { bits::POWER_OFF },
        )
    }

    pub fn power(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.read8(register::CONTROL)? & bits::POWER_ON == bits::POWER_ON)
    }

    pub fn set_timing(
        &mut self,
        gain: Gain,
        integration: IntegrationTime,
        manual: bool,
    ) -> Result<(), Error<I::Error>> {
        let manual = if manual { bits::MANUAL } else { 0 };
        self.write8(register::TIMING, gain.bits() | manual | integration.bits())
    }

    /// Read (channel 0, channel 1) = (broadband, infrared).
    pub fn read_channels(&mut self) -> Result<(u16, u16), Error<I::Error>> {
        let ch0 = self.read16(register::DATA0)?;
        let ch1 = self.read16(register::DATA1)?;
        Ok((ch0, ch1))
    }

    pub fn set_threshold(&mut self, threshold: Threshold) -> Result<(), Error<I::Error>> {
        self.write16(register::THRESHLOW, threshold.low)?;
        self.write16(register::THRESHHIGH, threshold.high)?;
        let control = match threshold.persistence {
            None => bits::INTERRUPT_NONE,
            Some(cycles) => bits::INTERRUPT_LEVEL | cycles.min(bits::PERSIST_MASK),
        };
        self.write8(register::INTERRUPT, control)
    }

    pub fn threshold(&mut self) -> Result<Threshold, Error<I::Error>> {
        let low = self.read16(register::THRESHLOW)?;
        let high = self.read16(register::THRESHHIGH)?;
        let control = self.read8(register::INTERRUPT)?;
        let persistence = if control & bits::INTERRUPT_LEVEL != 0 {
            Some(control & bits::PERSIST_MASK)
        } else {
            None
        };
        Ok(Threshold {
            persistence,
            low,
            high,
        })
    }

    /// Clear a pending interrupt: a bare command byte with the CLEAR bit set.
    pub fn clear_interrupt(&mut self) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.address, &[COMMAND_BIT | CLEAR_BIT | register::CONTROL])
            .map_err(Error::Communication)
    }
}
