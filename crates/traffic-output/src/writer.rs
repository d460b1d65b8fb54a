//! The backend-neutral writer trait.

use crate::row::{StreetStateRow, TickMeasurementRow};
use crate::OutputResult;

/// A sink for per-tick simulation measurements.
///
/// Implementations buffer as they see fit; callers must invoke
/// [`finish`](OutputWriter::finish) once at the end of a run to flush.
pub trait OutputWriter {
    fn write_tick(&mut self, row: &TickMeasurementRow) -> OutputResult<()>;

    fn write_streets(&mut self, rows: &[StreetStateRow]) -> OutputResult<()>;

    /// Flush and close.  Must be idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
