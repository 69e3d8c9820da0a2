use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::lux::Package;
use crate::registers::{Address, Gain, IntegrationTime};

/// Driver settings. Every field has a default, matching the sensor's state after
/// [`crate::Tsl2561::initialize`]: floating address, 16x gain, 13.7ms integration.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(default)]
pub struct SensorConfig {
    pub address: Address,
    /// Starting gain for raw and autogain reads
    pub gain: Gain,
    /// Starting integration time for raw and autogain reads
    pub integration: IntegrationTime,
    /// Power down after every reading. Saves power, but every reading then waits for the device
    /// to settle.
    pub power_down_between_reads: bool,
    /// Use HDR reads by default
    pub hdr: bool,
    pub package: Package,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            address: Address::Float,
            gain: Gain::High,
            integration: IntegrationTime::Short,
            power_down_between_reads: false,
            hdr: false,
            package: Package::T,
        }
    }
}

/// USB IDs of the FTDI bridge the sensor hangs off.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        // FT232H
        DeviceConfig {
            vendor_id: 0x0403,
            product_id: 0x6014,
        }
    }
}

fn default_interval_ms() -> u64 {
    5_000
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    /// Time between readings for `watch`
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Config {
    pub fn from_str(conf: &str) -> Result<Self, anyhow::Error> {
        Ok(ron::from_str::<Config>(conf)?)
    }

    pub fn read_from_file<P: AsRef<Path>>(file: P) -> Result<Self, anyhow::Error> {
        Ok(ron::de::from_reader(BufReader::new(File::open(file)?))?)
    }
}
