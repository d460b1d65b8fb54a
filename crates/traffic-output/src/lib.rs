//! `traffic-output` — measurement writers for the `rust_traffic` simulator.
//!
//! Two backends behind one trait:
//!
//! | Feature  | Backend | Files created                                   |
//! |----------|---------|-------------------------------------------------|
//! | *(none)* | CSV     | `tick_measurements.csv`, `street_states.csv`    |
//! | `sqlite` | SQLite  | one database with the same two tables           |
//!
//! Both implement [`OutputWriter`] and are driven by
//! [`MeasurementObserver`], which implements
//! `traffic_dynamics::DynamicsObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use traffic_output::{CsvWriter, MeasurementObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = MeasurementObserver::new(writer);
//! sim.run(1_000, &mut obs)?;
//! obs.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::MeasurementObserver;
pub use row::{StreetStateRow, TickMeasurementRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
