//! `MeasurementObserver<W>` — bridges `DynamicsObserver` to an
//! [`OutputWriter`].

use traffic_dynamics::{DynamicsObserver, StreetSample, TickMeasurement};

use crate::row::{StreetStateRow, TickMeasurementRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`DynamicsObserver`] that writes tick measurements and street states
/// to any [`OutputWriter`] backend (CSV, SQLite, …).
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After the run, [`finish`](Self::finish) flushes
/// the writer and surfaces the first stored error.
pub struct MeasurementObserver<W: OutputWriter> {
    writer: W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> MeasurementObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any).
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the writer, surfacing any error stored during the run.
    pub fn finish(mut self) -> OutputResult<W> {
        if let Some(err) = self.last_error.take() {
            return Err(err);
        }
        self.writer.finish()?;
        Ok(self.writer)
    }

    fn record(&mut self, result: OutputResult<()>) {
        if let Err(err) = result {
            // keep the first error; later ones are usually cascades
            self.last_error.get_or_insert(err);
        }
    }
}

impl<W: OutputWriter> DynamicsObserver for MeasurementObserver<W> {
    fn on_tick_end(&mut self, tick: u64, measurement: &TickMeasurement, streets: &[StreetSample]) {
        let row = TickMeasurementRow::from(measurement);
        let result = self.writer.write_tick(&row);
        self.record(result);

        let rows: Vec<StreetStateRow> = streets
            .iter()
            .map(|s| StreetStateRow::from_sample(tick, s))
            .collect();
        let result = self.writer.write_streets(&rows);
        self.record(result);
    }
}
