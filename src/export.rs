//! # CSV Export
//!
//! Writes one row per date with its first two boatable windows, in the layout
//! the ramp's printed schedule uses:
//!
//! ```text
//! Date,Window 1,Duration 1,Window 2,Duration 2
//! "Saturday, March 01",10:00 AM - 02:00 PM,04:00,,
//! ```

use crate::{DayWindows, Interval};
use chrono::Duration;
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Windows beyond this many per date are left out of the CSV
pub const WINDOWS_PER_ROW: usize = 2;

const HEADER: [&str; 5] = ["Date", "Window 1", "Duration 1", "Window 2", "Duration 2"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Zero-padded `HH:MM`.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `HH:MM AM - HH:MM PM` on a 12 hour clock.
pub fn format_window(window: &Interval) -> String {
    format!(
        "{} - {}",
        window.start.format("%I:%M %p"),
        window.end.format("%I:%M %p")
    )
}

fn row(date: &chrono::NaiveDate, windows: &[Interval]) -> Vec<String> {
    let mut row = Vec::with_capacity(HEADER.len());
    row.push(date.format("%A, %B %d").to_string());

    for window in windows.iter().take(WINDOWS_PER_ROW) {
        row.push(format_window(window));
        row.push(format_duration(window.duration()));
    }
    row.resize(HEADER.len(), String::new());
    row
}

/// Write the CSV to any writer, dates in calendar order.
pub fn write_windows<W: io::Write>(writer: W, windows: &DayWindows) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for (date, intervals) in windows {
        csv.write_record(row(date, intervals))?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the CSV to `path`, replacing any existing file.
pub fn write_windows_file<P: AsRef<Path>>(path: P, windows: &DayWindows) -> Result<(), ExportError> {
    let file = File::create(path.as_ref())?;
    write_windows(file, windows)?;
    info!(path = %path.as_ref().display(), days = windows.len(), "wrote tide windows");
    Ok(())
}
