//! Observer trait and per-tick measurement payloads.

use traffic_core::{ItineraryId, Measurement, NodeId, StreetId};

use crate::agent::Agent;

/// Global measurement snapshot taken at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickMeasurement {
    pub tick: u64,
    /// Mean and standard deviation over every live agent's speed.
    pub speed: Measurement,
    /// Agents on the network at the end of the tick.
    pub live: usize,
    /// Cumulative arrivals since the start of the run.
    pub arrived: u64,
    /// Cumulative rejected demands since the start of the run.
    pub rejected: u64,
}

/// Per-street measurement taken at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreetSample {
    pub street: StreetId,
    /// Occupancy over capacity, in `[0, 1]`.
    pub density: f64,
    /// Arithmetic mean of the in-transit agents' speeds; 0 if none.
    pub mean_speed: f64,
    /// Spire flux this tick (0 for uninstrumented streets).
    pub spire_in: u32,
    pub spire_out: u32,
}

/// Callbacks invoked by [`Dynamics`](crate::Dynamics) at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl DynamicsObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, tick: u64, m: &TickMeasurement, _: &[StreetSample]) {
///         println!("tick {tick}: {} agents, mean speed {}", m.live, m.speed);
///     }
/// }
/// ```
pub trait DynamicsObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: u64) {}

    /// Called at the end of each tick with the global measurement and one
    /// sample per street.
    fn on_tick_end(&mut self, _tick: u64, _measurement: &TickMeasurement, _streets: &[StreetSample]) {}

    /// Called when an agent reaches its destination, just before it is
    /// destroyed.
    fn on_arrival(&mut self, _tick: u64, _agent: &Agent) {}

    /// Called when a pending demand is dropped because its destination is
    /// unreachable from the source.
    fn on_demand_rejected(&mut self, _tick: u64, _source: NodeId, _itinerary: ItineraryId) {}
}

/// A [`DynamicsObserver`] that does nothing.  Use when you need to call
/// `evolve` but don't want callbacks.
pub struct NoopObserver;

impl DynamicsObserver for NoopObserver {}
