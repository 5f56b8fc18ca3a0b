// src/address.rs
use crate::config::AddressColumns;

pub const SEPARATOR: &str = ", ";

/// Compose street1, street2, city and postal code into one query string.
///
/// Columns past the end of a short row count as blank. Returns `None` when
/// every part is blank after trimming.
pub fn build_address(row: &[String], columns: &AddressColumns) -> Option<String> {
    let parts: Vec<&str> = columns
        .as_array()
        .iter()
        .map(|&idx| row.get(idx).map(|s| s.trim()).unwrap_or(""))
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(SEPARATOR))
    }
}
