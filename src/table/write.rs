// src/table/write.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use std::{io::Write, path::Path};
use tracing::info;

/// Columns appended to every row, in order.
pub const RESULT_HEADERS: [&str; 4] = [
    "Latitude",
    "Longitude",
    "Confidence Score",
    "Geocoding Status",
];

/// `geocoded_YYYYMMDD_HHMMSS.csv`
pub fn output_file_name(now: DateTime<Local>) -> String {
    format!("geocoded_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write the original headers plus [`RESULT_HEADERS`], then every row.
pub fn write_records<W: Write>(writer: W, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);

    let header_row = headers
        .iter()
        .map(String::as_str)
        .chain(RESULT_HEADERS.iter().copied());
    wtr.write_record(header_row)
        .context("writing header row")?;

    for (idx, row) in rows.iter().enumerate() {
        wtr.write_record(row)
            .with_context(|| format!("writing row {}", idx + 1))?;
    }
    wtr.flush().context("flushing output")?;
    Ok(())
}

#[tracing::instrument(level = "info", skip(headers, rows), fields(path = %path.as_ref().display()))]
pub fn write_table<P: AsRef<Path>>(path: P, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_records(std::io::BufWriter::new(file), headers, rows)?;
    info!(rows = rows.len(), "wrote output");
    Ok(())
}
