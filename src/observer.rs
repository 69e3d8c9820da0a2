/// Hooks for watching what the driver does on the bus.
///
/// The driver never logs on its own; callers hand it an [`Observer`] instead.
use crate::acquisition::{Configuration, Measurement, RawReading};
use crate::lux::LuxResult;
use crate::registers::SensorId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Identified(SensorId),
    Power(bool),
    /// The timing register was rewritten.
    Configured(Configuration),
    /// Waiting out the first conversion after power-up or a configuration change.
    Settling {
        configuration: Configuration,
        wait_ms: u32,
    },
    AutogainStep {
        from: Configuration,
        to: Configuration,
        channel0: u16,
    },
    /// An HDR stage saturated and the next less sensitive stage is tried.
    HdrFallback {
        from: Configuration,
        reading: RawReading,
    },
    Measured(Measurement),
}

pub trait Observer {
    fn notify(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> Observer for F {
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn notify(&mut self, _event: &Event) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&mut self, event: &Event) {
        match event {
            Event::Identified(id) => log::info!(
                "Device found (partno={0}, revision={1})",
                id.part_number,
                id.revision
            ),
            Event::Power(on) => {
                log::debug!("Device was {0}", if *on { "enabled" } else { "disabled" })
            }
            Event::Configured(c) => log::info!(
                "Gain set to {0}x, integration time set to {1}ms",
                c.gain.multiplier(),
                c.integration.nominal_ms()
            ),
            Event::Settling {
                configuration,
                wait_ms,
            } => log::debug!("Settling for {wait_ms}ms after switching to {configuration:?}"),
            Event::AutogainStep { from, to, channel0 } => {
                log::info!("autogain: ch0={channel0} at {from:?}, stepping to {to:?}")
            }
            Event::HdrFallback { from, reading } => log::info!(
                "HDR: saturated at {from:?} (ch0={0} ch1={1}), falling back",
                reading.channel0,
                reading.channel1
            ),
            Event::Measured(m) => match m.lux {
                LuxResult::Lux(lux) => log::debug!(
                    "lux={lux:.2} (ch0={0} ch1={1} at {2:?})",
                    m.reading.channel0,
                    m.reading.channel1,
                    m.reading.configuration()
                ),
                LuxResult::OutOfRange => log::warn!(
                    "The device is saturated (gain={0}x integration_time={1}ms ch0={2} ch1={3})",
                    m.reading.gain.multiplier(),
                    m.reading.integration.nominal_ms(),
                    m.reading.channel0,
                    m.reading.channel1
                ),
                LuxResult::InsufficientLight => log::info!(
                    "Too dark to measure (ch0={0} ch1={1})",
                    m.reading.channel0,
                    m.reading.channel1
                ),
            },
        }
    }
}
