//! SQLite output backend — enabled with the `sqlite` Cargo feature.
//!
//! One database, two tables (`tick_measurements`, `street_states`), written
//! inside a single long-running transaction committed by `finish`.

use std::path::Path;

use rusqlite::Connection;

use crate::row::{StreetStateRow, TickMeasurementRow};
use crate::writer::OutputWriter;
use crate::OutputResult;

/// Writes simulation measurements to a SQLite database.
pub struct SqliteWriter {
    conn: Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) the database at `path` and create the tables.
    pub fn new(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tick_measurements (
                tick        INTEGER PRIMARY KEY,
                mean_speed  REAL NOT NULL,
                std_speed   REAL NOT NULL,
                live_agents INTEGER NOT NULL,
                arrived     INTEGER NOT NULL,
                rejected    INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS street_states (
                tick       INTEGER NOT NULL,
                street_id  INTEGER NOT NULL,
                density    REAL NOT NULL,
                mean_speed REAL NOT NULL,
                spire_in   INTEGER NOT NULL,
                spire_out  INTEGER NOT NULL,
                PRIMARY KEY (tick, street_id)
            );
            BEGIN;",
        )?;
        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_tick(&mut self, row: &TickMeasurementRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_measurements
             (tick, mean_speed, std_speed, live_agents, arrived, rejected)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.tick,
                row.mean_speed,
                row.std_speed,
                row.live_agents,
                row.arrived,
                row.rejected,
            ],
        )?;
        Ok(())
    }

    fn write_streets(&mut self, rows: &[StreetStateRow]) -> OutputResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO street_states
             (tick, street_id, density, mean_speed, spire_in, spire_out)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in rows {
            stmt.execute(rusqlite::params![
                row.tick,
                row.street_id,
                row.density,
                row.mean_speed,
                row.spire_in,
                row.spire_out,
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }
}
