//! `traffic-core` — foundational types for the `rust_traffic` simulator.
//!
//! This crate is a dependency of every other `traffic-*` crate.  It has no
//! `traffic-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `StreetId`, `AgentId`, `ItineraryId`        |
//! | [`matrix`]  | `SparseMatrix<T>` — sorted sparse container           |
//! | [`rng`]     | `SimRng` — explicitly seeded deterministic RNG        |
//! | [`measure`] | `Measurement` — mean/std over sample streams          |
//! | [`error`]   | `MatrixError`                                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types. |

pub mod error;
pub mod ids;
pub mod matrix;
pub mod measure;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{MatrixError, MatrixResult};
pub use ids::{AgentId, ItineraryId, NodeId, StreetId};
pub use matrix::SparseMatrix;
pub use measure::Measurement;
pub use rng::SimRng;
