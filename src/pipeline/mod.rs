// src/pipeline/mod.rs
use anyhow::Result;
use std::io::Write;
use tracing::{debug, info};

use crate::{
    address::build_address,
    config::AddressColumns,
    geocode::Geocoder,
    table::RawTable,
};

pub mod summary;
pub mod throttle;

pub use summary::RunSummary;
pub use throttle::{FixedDelay, Throttle};

/// Input rows with latitude, longitude, confidence and status appended.
#[derive(Debug)]
pub struct GeocodedTable {
    /// Original headers, without the result columns.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub summary: RunSummary,
}

/// Sequential driver: one lookup per row, in input order, paced by `T`.
pub struct Pipeline<G, T> {
    geocoder: G,
    throttle: T,
    columns: AddressColumns,
}

impl<G: Geocoder, T: Throttle> Pipeline<G, T> {
    pub fn new(geocoder: G, throttle: T, columns: AddressColumns) -> Self {
        Self {
            geocoder,
            throttle,
            columns,
        }
    }

    /// Geocode every row of `table`, writing one progress line per row to `out`.
    ///
    /// Fails before any lookup if the header is narrower than the address
    /// mapping. Per-row lookup failures never abort the run.
    pub fn run<W: Write>(&mut self, table: &RawTable, out: &mut W) -> Result<GeocodedTable> {
        self.columns.validate_against(&table.headers)?;

        let total = table.rows.len();
        let mut summary = RunSummary::new(total);
        let mut rows = Vec::with_capacity(total);
        info!(rows = total, "starting batch");

        for (i, row) in table.rows.iter().enumerate() {
            let n = i + 1;
            let address = build_address(row, &self.columns);
            let progress = n as f64 / total as f64 * 100.0;
            write!(
                out,
                "[{}/{}] ({:.1}%) Processing: {}...",
                n,
                total,
                progress,
                address.as_deref().unwrap_or("No address")
            )?;
            out.flush()?;

            let result = self.geocoder.geocode(address.as_deref());
            writeln!(out, " {}", result.status)?;
            debug!(row = n, status = %result.status, "row done");

            summary.record(&result);

            let mut augmented = Vec::with_capacity(row.len() + 4);
            augmented.extend(row.iter().cloned());
            augmented.extend(result.into_fields());
            rows.push(augmented);

            if n < total {
                self.throttle.pause();
            }
        }

        info!(
            success = summary.success_count,
            failed = summary.error_count,
            "batch complete"
        );
        Ok(GeocodedTable {
            headers: table.headers.clone(),
            rows,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::geocode::{GeocodeResult, GeocodeStatus};
    use std::cell::RefCell;

    /// Replies by address; records every call.
    #[derive(Default)]
    struct ScriptedGeocoder {
        calls: RefCell<Vec<Option<String>>>,
    }

    impl Geocoder for ScriptedGeocoder {
        fn geocode(&self, address: Option<&str>) -> GeocodeResult {
            self.calls.borrow_mut().push(address.map(str::to_string));
            match address {
                None => GeocodeResult::failed(GeocodeStatus::NoAddress),
                Some(a) if a.contains("Busy") => GeocodeResult::failed(GeocodeStatus::RateLimit),
                Some(a) if a.contains("Odd") => GeocodeResult {
                    latitude: "1".into(),
                    longitude: "2".into(),
                    confidence: "weird".into(),
                    status: GeocodeStatus::Success,
                },
                Some(_) => GeocodeResult {
                    latitude: "40.0".into(),
                    longitude: "-75.0".into(),
                    confidence: "0.8".into(),
                    status: GeocodeStatus::Success,
                },
            }
        }
    }

    #[derive(Default)]
    struct CountingThrottle {
        pauses: usize,
    }

    impl Throttle for CountingThrottle {
        fn pause(&mut self) {
            self.pauses += 1;
        }
    }

    fn cols() -> AddressColumns {
        "1,2,3,4".parse().unwrap()
    }

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: ["id", "s1", "s2", "city", "zip"].map(String::from).to_vec(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn appends_four_fields_and_preserves_order() -> Result<()> {
        let input = table(&[
            &["1", "1 Main St", "", "Springfield", "12345"],
            &["2", "", "", "", ""],
            &["3", "9 Busy Rd", "", "Gotham", ""],
            &["4"],
        ]);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());
        let mut out = Vec::new();
        let done = p.run(&input, &mut out)?;

        assert_eq!(done.rows.len(), input.rows.len());
        for (orig, aug) in input.rows.iter().zip(&done.rows) {
            assert_eq!(aug.len(), orig.len() + 4);
            assert_eq!(&aug[..orig.len()], orig.as_slice());
        }
        assert_eq!(done.rows[0][5..], ["40.0", "-75.0", "0.8", "Success"]);
        assert_eq!(done.rows[1][5..], ["", "", "", "No Address"]);
        assert_eq!(done.rows[2][5..], ["", "", "", "Error: Rate Limit"]);
        assert_eq!(done.rows[3][1..], ["", "", "", "No Address"]);

        assert_eq!(done.summary.total_rows, 4);
        assert_eq!(done.summary.success_count, 1);
        assert_eq!(done.summary.error_count, 3);
        Ok(())
    }

    #[test]
    fn throttles_between_rows_only() -> Result<()> {
        let input = table(&[&["1", "a"], &["2", "b"], &["3", "c"]]);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());
        p.run(&input, &mut Vec::new())?;
        assert_eq!(p.throttle.pauses, 2);
        assert_eq!(p.geocoder.calls.borrow().len(), 3);
        Ok(())
    }

    #[test]
    fn passes_composed_address_to_geocoder() -> Result<()> {
        let input = table(&[&["1", " 1 Main St ", "Apt 4", "", "12345"], &["2"]]);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());
        p.run(&input, &mut Vec::new())?;
        assert_eq!(
            *p.geocoder.calls.borrow(),
            vec![Some("1 Main St, Apt 4, 12345".to_string()), None]
        );
        Ok(())
    }

    #[test]
    fn progress_lines_match_console_format() -> Result<()> {
        let input = table(&[&["1", "1 Main St"], &["2"]]);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());
        let mut out = Vec::new();
        p.run(&input, &mut out)?;

        let text = String::from_utf8(out)?;
        assert_eq!(
            text,
            "[1/2] (50.0%) Processing: 1 Main St... Success\n\
             [2/2] (100.0%) Processing: No address... No Address\n"
        );
        Ok(())
    }

    #[test]
    fn unparseable_confidence_is_ignored() -> Result<()> {
        let input = table(&[&["1", "Odd Lane"], &["2", "Main"]]);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());
        let done = p.run(&input, &mut Vec::new())?;
        assert_eq!(done.summary.success_count, 2);
        assert!((done.summary.total_confidence - 0.8).abs() < 1e-9);
        assert!((done.summary.average_confidence().unwrap() - 0.4).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn narrow_header_aborts_before_any_lookup() {
        let mut input = table(&[&["1", "1 Main St"]]);
        input.headers.truncate(3);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());

        let err = p.run(&input, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::TooFewColumns { found: 3, required: 5, .. })
        ));
        assert!(p.geocoder.calls.borrow().is_empty());
    }

    #[test]
    fn empty_table_produces_empty_output() -> Result<()> {
        let input = table(&[]);
        let mut p = Pipeline::new(ScriptedGeocoder::default(), CountingThrottle::default(), cols());
        let mut out = Vec::new();
        let done = p.run(&input, &mut out)?;
        assert!(done.rows.is_empty());
        assert!(out.is_empty());
        assert_eq!(p.throttle.pauses, 0);
        assert_eq!(done.summary.average_confidence(), None);
        Ok(())
    }
}
