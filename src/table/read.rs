// src/table/read.rs
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use std::{borrow::Cow, fs, io::ErrorKind, path::Path};
use tracing::{debug, warn};

use super::RawTable;

/// Decode file bytes as UTF-8, dropping a leading BOM.
///
/// Spreadsheet exports that are not valid UTF-8 are read as Windows-1252.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text;
    }
    warn!("input is not valid UTF-8, falling back to Windows-1252");
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text
}

/// Parse delimited text: first record is the header, the rest are data rows.
pub fn parse_table(text: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // ragged rows are allowed
        .from_reader(text.as_bytes());

    let mut records = rdr.records().enumerate();
    let headers: Vec<String> = match records.next() {
        Some((_, rec)) => rec
            .context("CSV parse error in header row")?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Err(anyhow!("input has no header row")),
    };

    let mut rows = Vec::new();
    for (idx, result) in records {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            bail!("File '{}' not found", path.display())
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };

    let table = parse_table(&decode_text(&bytes))
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded table"
    );
    Ok(table)
}
