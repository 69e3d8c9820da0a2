// in-crate imports
use tsl2561_hdr::config::Config;
use tsl2561_hdr::{Address, LogObserver, Measurement, Mode, Tsl2561};

// my libraries
use xdg_dirs::{dirs, xdg_location_of, xdg_user_dir};

// STD
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::{fs, thread, time};

// 3rd party libraries
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum, command};
use ftdi_embedded_hal as hal;

const CONFIG_PATH: &str = "tsl2561-hdr/config.ron";

const DEFAULT_CONFIG: &str = r#"
(
sensor: (
    address: Float,
    gain: High,
    integration: Short,
    power_down_between_reads: false,
    hdr: true,
    package: T,
),
device: (
    vendor_id: 0x0403,
    product_id: 0x6014,
),
interval_ms: 5000,
)
"#;

type Sensor = Tsl2561<hal::I2c<ftdi::Device>, hal::Delay, LogObserver>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReadMode {
    Raw,
    Autogain,
    Hdr,
}

impl From<ReadMode> for Mode {
    fn from(mode: ReadMode) -> Self {
        match mode {
            ReadMode::Raw => Mode::Raw,
            ReadMode::Autogain => Mode::Autogain,
            ReadMode::Hdr => Mode::Hdr,
        }
    }
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    #[command(
        about = "(default) Take one reading and print lux and raw channel counts. Uses HDR if enabled in the config, raw otherwise."
    )]
    Read {
        #[arg(value_enum)]
        mode: Option<ReadMode>,
    },

    #[command(about = "Read repeatedly, sleeping `interval_ms` from the config between readings.")]
    Watch {
        #[arg(value_enum)]
        mode: Option<ReadMode>,
    },

    #[command(
        about = "Check configuration file syntax, print the settings, and identify the sensor."
    )]
    Check,

    #[command(about = "Generate a default config file")]
    GenConfig,
}

#[derive(Debug, Parser, PartialEq)]
#[command(about = "Read illuminance from a TSL2561 light sensor behind an FTDI I2C bridge", version)]
struct Args {
    #[arg(
        global = true,
        short,
        long = "config",
        help = format!("Path to configuration file. Defaults to `{CONFIG_PATH}` under the user's config directory."),
    )]
    config_path: Option<PathBuf>,

    #[arg(
        global = true,
        short,
        long,
        value_parser = parse_address,
        help = "Sensor I2C address (0x29, 0x39 or 0x49), overriding the config file."
    )]
    address: Option<Address>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn parse_address(arg: &str) -> Result<Address, String> {
    let value = match arg.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => arg.parse(),
    }
    .map_err(|e| format!("invalid address `{arg}`: {e}"))?;
    Address::try_from(value).map_err(|e| e.to_string())
}

impl Args {
    /// Get the config path, and verify the file exists. This is the either the path passed as an arg, or from the XDG directory if not specified.
    ///
    /// This returns error if the path does not exist.
    fn get_config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config_path {
            Some(path) => path
                .canonicalize()
                .with_context(|| format!("Could not open config file `{0}`", path.display())),
            None => xdg_location_of(&dirs::CONFIG, CONFIG_PATH)
                .with_context(|| "Could not open config file"),
        }
    }
}

/// Load the configuration based on arguments.
/// Uses the file supplied to the CLI, or in the default location if not specified, or the default config if there is no file.
fn get_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match args.get_config_path() {
        Ok(path) => {
            log::info!("Reading config from {path}", path = path.display());
            Config::read_from_file(path)?
        }
        Err(err) => {
            log::warn!(
                "Config file not found in any standard locations, using default configuration."
            );
            log::warn!("  Config search error: {err}");
            Config::from_str(DEFAULT_CONFIG)?
        }
    };

    if let Some(address) = args.address {
        config.sensor.address = address;
    }
    Ok(config)
}

/// Connect to the sensor through the FTDI bridge named in the config.
fn open_sensor(config: &Config) -> anyhow::Result<Sensor> {
    let device = ftdi::find_by_vid_pid(config.device.vendor_id, config.device.product_id)
        .interface(ftdi::Interface::A)
        .open()
        .with_context(|| {
            format!(
                "Could not open FTDI device {0:04x}:{1:04x}",
                config.device.vendor_id, config.device.product_id
            )
        })?;
    let i2c = hal::FtHal::init_default(device)?.i2c()?;

    Tsl2561::with_observer(i2c, hal::Delay::new(), config.sensor, LogObserver)
        .map_err(sensor_error)
}

/// Driver errors carry the bus error, which doesn't implement `std::error::Error` for anyhow.
fn sensor_error<E: std::fmt::Debug>(e: tsl2561_hdr::Error<E>) -> anyhow::Error {
    anyhow::anyhow!("{e}")
}

fn report(m: &Measurement) {
    println!(
        "{0} (ch0={1} ch1={2} gain={3}x integration={4}ms)",
        m.lux,
        m.reading.channel0,
        m.reading.channel1,
        m.reading.gain.multiplier(),
        m.reading.integration.nominal_ms()
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::debug!("args = {args:?}");

    // process commands
    match args.command {
        None => read_once(&args, None),
        Some(Command::Read { mode }) => read_once(&args, mode),

        // Read forever
        Some(Command::Watch { mode }) => watch(&args, mode),

        // Test config file: make sure it exists, can be read, and can be parsed
        Some(Command::Check) => check_config(&args),

        // Generate config file: if the file does not already exist, write
        Some(Command::GenConfig) => gen_config_file(&args),
    }
}

fn resolve_mode(config: &Config, mode: Option<ReadMode>) -> Mode {
    match mode {
        Some(mode) => mode.into(),
        None if config.sensor.hdr => Mode::Hdr,
        None => Mode::Raw,
    }
}

fn read_once(args: &Args, mode: Option<ReadMode>) -> anyhow::Result<()> {
    let config = get_config(args)?;
    let mode = resolve_mode(&config, mode);
    let mut sensor = open_sensor(&config)?;

    let measurement = sensor.read(mode).map_err(sensor_error)?;
    report(&measurement);
    Ok(())
}

/// Read the sensor repeatedly until interrupted.
fn watch(args: &Args, mode: Option<ReadMode>) -> anyhow::Result<()> {
    let config = get_config(args)?;
    let mode = resolve_mode(&config, mode);
    let mut sensor = open_sensor(&config)?;

    loop {
        let measurement = sensor.read(mode).map_err(sensor_error)?;
        report(&measurement);

        thread::sleep(time::Duration::from_millis(config.interval_ms));
    }
}

/// Verify the config file: Make sure it can be found at the expected location (passed through CLI or using XDG config location), and parses properly.
fn check_config(args: &Args) -> anyhow::Result<()> {
    // Try to _find_ the config file
    let path = args
        .get_config_path()
        .with_context(|| "Failed to find config file")?;

    // Try to _parse_ the config file
    println!("Attempting to load config from `{0}`", path.display());
    let config = Config::read_from_file(path).with_context(|| "Failed to parse configuration")?;

    println!("Successfully read config: {config:#?}");

    // Make sure the sensor is there and is the right part
    println!("\nLooking for the sensor...");
    let sensor = open_sensor(&config)?;
    let id = sensor.identity();
    println!(
        "Found TSL2561 at {0:#04x}: part number {1}, revision {2}",
        config.sensor.address.bits(),
        id.part_number,
        id.revision
    );

    Ok(())
}

/// Generate a default configuration file, at the expected location based on args or environment variables.
fn gen_config_file(args: &Args) -> anyhow::Result<()> {
    // CLI arg path, or default from environment
    let path = args
        .config_path
        .clone()
        .map_or_else(|| xdg_user_dir(&dirs::CONFIG, CONFIG_PATH), Ok)
        .with_context(|| "Could not determine location for config file")?;

    // Create parent directory path if applicable
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "Failed to create parent directory of the new config file {0}",
                path.display()
            )
        })?;
    }

    // Create the new file and write the default contents
    let mut file = File::create_new(&path)
        .with_context(|| format!("Failed to create new config file {0}", path.display()))?;

    write!(file, "{}", DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write the new config file {0}", path.display()))?;

    Ok(())
}
