/// High dynamic range reads: start at the most sensitive configuration and fall back through
/// progressively less sensitive ones until a reading is not saturated.
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::acquisition::{Acquisition, Configuration, Measurement};
use crate::error::Error;
use crate::lux::Package;
use crate::observer::{Event, Observer};
use crate::registers::{Gain, IntegrationTime};

pub struct Stage {
    pub configuration: Configuration,
    /// Largest usable count on either channel, `None` for the last resort.
    pub ceiling: Option<u16>,
}

/// Most to least sensitive. Relative sensitivity: 6432, 1616, 402, 208, 101, 13.
pub static LADDER: [Stage; 6] = [
    Stage {
        configuration: Configuration::new(Gain::High, IntegrationTime::Long),
        ceiling: Some(62258),
    },
    Stage {
        configuration: Configuration::new(Gain::High, IntegrationTime::Medium),
        ceiling: Some(35318),
    },
    Stage {
        configuration: Configuration::new(Gain::Low, IntegrationTime::Long),
        ceiling: Some(62258),
    },
    Stage {
        configuration: Configuration::new(Gain::High, IntegrationTime::Short),
        ceiling: Some(4876),
    },
    Stage {
        configuration: Configuration::new(Gain::Low, IntegrationTime::Medium),
        ceiling: Some(35318),
    },
    Stage {
        configuration: Configuration::new(Gain::Low, IntegrationTime::Short),
        ceiling: None,
    },
];

/// Walk [`LADDER`] until a stage reads below its ceiling and convert that reading.
///
/// The lux conversion of the final reading decides between a value, out-of-range (the last
/// stage clipped) and insufficient light (the first stage saw nothing).
pub fn hdr<I, D, O>(
    engine: &mut Acquisition<I, D, O>,
    package: Package,
) -> Result<Measurement, Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
    O: Observer,
{
    let (fallbacks, last) = LADDER.split_at(LADDER.len() - 1);
    for stage in fallbacks {
        let reading = engine.acquire(stage.configuration)?;
        let saturated = stage
            .ceiling
            .is_some_and(|ceiling| reading.channel0.max(reading.channel1) > ceiling);
        if !saturated {
            return Ok(Measurement::new(reading, package));
        }
        engine.observer.notify(&Event::HdrFallback {
            from: stage.configuration,
            reading,
        });
    }

    // last resort: whatever it reads is converted as is
    let reading = engine.acquire(last[0].configuration)?;
    Ok(Measurement::new(reading, package))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::RawReading;
    use crate::lux::{LuxResult, to_lux};
    use crate::observer::NoopObserver;
    use crate::registers::{Address, Registers};
    use crate::testing::{Bus, Delay, Simulation};

    fn engine(sim: &Simulation) -> Acquisition<Bus, Delay, NoopObserver> {
        Acquisition::new(
            Registers::new(sim.bus(), Address::Float),
            sim.delay(),
            NoopObserver,
            false,
        )
    }

    /// channel 0 counts at 16x/402ms that give `counts` at 1x/13.7ms
    fn ambient_for_low_short(counts: f64) -> f64 {
        counts * 16.0 * 402.0 / IntegrationTime::Short.nominal_ms() as f64
    }

    #[test]
    fn dim_light_uses_most_sensitive_stage() {
        let sim = Simulation::new(20_000.0);
        let mut engine = engine(&sim);

        let m = hdr(&mut engine, Package::T).unwrap();
        assert_eq!(m.reading.configuration(), LADDER[0].configuration);
        assert_eq!(sim.reads(), 1);
    }

    #[test]
    fn bright_light_falls_back_to_least_sensitive() {
        // saturates every stage except 1x/13.7ms
        let sim = Simulation::new(ambient_for_low_short(4800.0));
        let mut engine = engine(&sim);

        let m = hdr(&mut engine, Package::T).unwrap();
        assert_eq!(
            m.reading.configuration(),
            Configuration::new(Gain::Low, IntegrationTime::Short)
        );
        assert_eq!(sim.reads(), 6);
        assert_eq!(
            m.lux,
            to_lux(&RawReading {
                channel0: m.reading.channel0,
                channel1: m.reading.channel1,
                gain: Gain::Low,
                integration: IntegrationTime::Short,
            })
        );
        assert!(matches!(m.lux, LuxResult::Lux(_)));
    }

    #[test]
    fn intermediate_light_stops_at_first_unsaturated_stage() {
        // 16x/402ms clips, 16x/101ms reads ~25000
        let sim = Simulation::new(100_000.0);
        let mut engine = engine(&sim);

        let m = hdr(&mut engine, Package::T).unwrap();
        assert_eq!(m.reading.configuration(), LADDER[1].configuration);
        assert_eq!(sim.reads(), 2);
    }

    #[test]
    fn saturated_least_sensitive_is_out_of_range() {
        let sim = Simulation::new(1.0e9);
        let mut engine = engine(&sim);

        let m = hdr(&mut engine, Package::T).unwrap();
        assert_eq!(m.lux, LuxResult::OutOfRange);
        assert_eq!(sim.reads(), 6);
    }

    #[test]
    fn darkness_is_insufficient_light() {
        let sim = Simulation::new(0.0);
        let mut engine = engine(&sim);

        let m = hdr(&mut engine, Package::T).unwrap();
        assert_eq!(m.lux, LuxResult::InsufficientLight);
        assert_eq!(sim.reads(), 1);
    }

    #[test]
    fn bus_failure_in_fallback_stage_aborts() {
        let sim = Simulation::new(1.0e9);
        let mut engine = engine(&sim);
        // the whole first stage goes through: timing write, power on, two channel reads
        sim.fail_after(4);

        let result = hdr(&mut engine, Package::T);
        assert!(matches!(result, Err(Error::Communication(_))));
        assert_eq!(sim.reads(), 1);
    }

    #[test]
    fn ladder_is_ordered_by_sensitivity() {
        for pair in LADDER.windows(2) {
            assert!(pair[0].configuration.sensitivity() > pair[1].configuration.sensitivity());
        }
    }
}
