//! `traffic-dynamics` — the tick loop of the `rust_traffic` simulator.
//!
//! # Tick phases
//!
//! ```text
//! for each tick:
//!   ① Path refresh — only when `path_refresh_interval` fires.
//!   ② Light tick   — advance every traffic-light cycle counter.
//!   ③ Evacuation   — per node in ID order, move waiting agents onto their
//!                    chosen outbound streets (priority order, green phase,
//!                    per-street transport budgets, capacity); agents whose
//!                    junction is their destination leave the simulation.
//!   ④ Progress     — per street in ID order, advance transit agents; at
//!                    zero delay plan the hand-off and register at the
//!                    destination node.
//!   ⑤ Injection    — retry pending demands, spawning agents onto their
//!                    first streets.
//!   ⑥ Measurement  — per-street samples and the global speed snapshot.
//! ```
//!
//! The engine owns the graph, the agents and the itineraries; a single
//! explicitly seeded RNG drives every stochastic choice, and all maps are
//! ordered, so a run is a pure function of the initial state and the seed.
//!
//! # What lives here
//!
//! | Module        | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | [`engine`]    | `Dynamics`, `DynamicsOptions`, `Demand`             |
//! | [`agent`]     | `Agent`                                             |
//! | [`itinerary`] | `Itinerary`                                         |
//! | [`observer`]  | `DynamicsObserver`, per-tick measurement payloads   |
//! | [`error`]     | `DynamicsError`                                     |

pub mod agent;
pub mod engine;
pub mod error;
pub mod itinerary;
pub mod observer;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::Agent;
pub use engine::{Demand, Dynamics, DynamicsOptions};
pub use error::{DynamicsError, DynamicsResult};
pub use itinerary::Itinerary;
pub use observer::{DynamicsObserver, NoopObserver, StreetSample, TickMeasurement};
