// src/pipeline/summary.rs
use std::fmt;

use crate::geocode::GeocodeResult;

/// Running totals for one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub total_confidence: f64,
}

impl RunSummary {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Default::default()
        }
    }

    /// Count the row. Unparseable confidence on a success is ignored.
    pub fn record(&mut self, result: &GeocodeResult) {
        if result.status.is_success() {
            self.success_count += 1;
            if let Ok(score) = result.confidence.trim().parse::<f64>() {
                self.total_confidence += score;
            }
        } else {
            self.error_count += 1;
        }
    }

    pub fn average_confidence(&self) -> Option<f64> {
        if self.success_count > 0 {
            Some(self.total_confidence / self.success_count as f64)
        } else {
            None
        }
    }
}

/// The console report block. The score is printed as returned by the service,
/// with a `%` suffix and no scaling.
impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total rows processed: {}", self.total_rows)?;
        writeln!(f, "Successfully geocoded: {}", self.success_count)?;
        writeln!(f, "Failed: {}", self.error_count)?;
        if let Some(avg) = self.average_confidence() {
            writeln!(f, "Average confidence: {:.1}%", avg)?;
        }
        Ok(())
    }
}
