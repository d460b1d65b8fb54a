//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `tick_measurements.csv`
//! - `street_states.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::row::{StreetStateRow, TickMeasurementRow};
use crate::writer::OutputWriter;
use crate::OutputResult;

/// Writes simulation measurements to two CSV files.
pub struct CsvWriter {
    ticks: Writer<File>,
    streets: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut ticks = Writer::from_path(dir.join("tick_measurements.csv"))?;
        ticks.write_record([
            "tick",
            "mean_speed",
            "std_speed",
            "live_agents",
            "arrived",
            "rejected",
        ])?;

        let mut streets = Writer::from_path(dir.join("street_states.csv"))?;
        streets.write_record([
            "tick",
            "street_id",
            "density",
            "mean_speed",
            "spire_in",
            "spire_out",
        ])?;

        Ok(Self { ticks, streets, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_tick(&mut self, row: &TickMeasurementRow) -> OutputResult<()> {
        self.ticks.write_record(&[
            row.tick.to_string(),
            row.mean_speed.to_string(),
            row.std_speed.to_string(),
            row.live_agents.to_string(),
            row.arrived.to_string(),
            row.rejected.to_string(),
        ])?;
        Ok(())
    }

    fn write_streets(&mut self, rows: &[StreetStateRow]) -> OutputResult<()> {
        for row in rows {
            self.streets.write_record(&[
                row.tick.to_string(),
                row.street_id.to_string(),
                row.density.to_string(),
                row.mean_speed.to_string(),
                row.spire_in.to_string(),
                row.spire_out.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.ticks.flush()?;
        self.streets.flush()?;
        Ok(())
    }
}
