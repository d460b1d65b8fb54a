//! Plain data row types written by output backends.

use traffic_dynamics::{StreetSample, TickMeasurement};

/// Global measurement of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickMeasurementRow {
    pub tick: u64,
    pub mean_speed: f64,
    pub std_speed: f64,
    pub live_agents: u64,
    pub arrived: u64,
    pub rejected: u64,
}

impl From<&TickMeasurement> for TickMeasurementRow {
    fn from(m: &TickMeasurement) -> Self {
        Self {
            tick: m.tick,
            mean_speed: m.speed.mean,
            std_speed: m.speed.std,
            live_agents: m.live as u64,
            arrived: m.arrived,
            rejected: m.rejected,
        }
    }
}

/// State of one street at the end of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetStateRow {
    pub tick: u64,
    pub street_id: u32,
    pub density: f64,
    pub mean_speed: f64,
    pub spire_in: u32,
    pub spire_out: u32,
}

impl StreetStateRow {
    pub fn from_sample(tick: u64, sample: &StreetSample) -> Self {
        Self {
            tick,
            street_id: sample.street.0,
            density: sample.density,
            mean_speed: sample.mean_speed,
            spire_in: sample.spire_in,
            spire_out: sample.spire_out,
        }
    }
}
