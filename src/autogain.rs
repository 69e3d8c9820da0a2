/// Keeps channel 0 inside a usable band by stepping the gain and integration time.
///
/// Stepping down (less sensitive) drops the gain to 1x first, then shortens the integration time.
/// Stepping up retraces that path: lengthen the integration time, then raise the gain once at
/// 402ms. Each call starts wherever the previous one ended, so under steady light the
/// configuration does not churn.
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::acquisition::{Acquisition, Configuration, Measurement, RawReading};
use crate::error::Error;
use crate::lux::Package;
use crate::observer::{Event, Observer};
use crate::registers::{Gain, IntegrationTime};

/// One acquisition per point in the gain x integration time space.
pub const MAX_ACQUISITIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Down,
    Up,
}

/// Usable (min, max) channel 0 counts for an integration time.
const fn band(integration: IntegrationTime) -> (u16, u16) {
    match integration {
        IntegrationTime::Short => (100, 4850),
        IntegrationTime::Medium => (200, 36000),
        IntegrationTime::Long => (500, 63000),
    }
}

fn classify(reading: &RawReading) -> Option<Step> {
    let (min, max) = band(reading.integration);
    if reading.channel0 > max {
        Some(Step::Down)
    } else if reading.channel0 < min {
        Some(Step::Up)
    } else {
        None
    }
}

fn step(configuration: Configuration, step: Step) -> Option<Configuration> {
    let Configuration { gain, integration } = configuration;
    match (step, gain) {
        (Step::Down, Gain::High) => Some(Configuration::new(Gain::Low, integration)),
        (Step::Down, Gain::Low) => integration
            .shorter()
            .map(|t| Configuration::new(Gain::Low, t)),
        (Step::Up, Gain::Low) => Some(match integration.longer() {
            Some(t) => Configuration::new(Gain::Low, t),
            None => Configuration::new(Gain::High, IntegrationTime::Long),
        }),
        (Step::Up, Gain::High) => integration
            .longer()
            .map(|t| Configuration::new(Gain::High, t)),
    }
}

/// Read at `start`, re-reading at neighbouring configurations until channel 0 is in band.
///
/// At either end of the range the last reading is converted as is, so a clipped 1x/13.7ms reading
/// comes back as [`crate::lux::LuxResult::OutOfRange`] and a dim 16x/402ms reading gets the same treatment as
/// in an HDR read.
pub fn autogain<I, D, O>(
    engine: &mut Acquisition<I, D, O>,
    start: Configuration,
    package: Package,
) -> Result<Measurement, Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
    O: Observer,
{
    let mut configuration = start;
    let mut direction = None;
    let mut previous: Option<RawReading> = None;
    let mut reading = engine.acquire(configuration)?;

    for _ in 1..MAX_ACQUISITIONS {
        let Some(wanted) = classify(&reading) else {
            break;
        };

        if direction.is_some_and(|d| d != wanted) {
            // fell into the gap between two bands: settle for whichever reading isn't saturated
            if wanted == Step::Down {
                if let Some(p) = previous {
                    reading = p;
                }
            }
            break;
        }

        // nowhere left to go: the lux conversion decides whether this is out of range
        let Some(next) = step(configuration, wanted) else {
            break;
        };

        engine.observer.notify(&Event::AutogainStep {
            from: configuration,
            to: next,
            channel0: reading.channel0,
        });
        configuration = next;
        direction = Some(wanted);
        previous = Some(reading);
        reading = engine.acquire(configuration)?;
    }

    Ok(Measurement::new(reading, package))
}
