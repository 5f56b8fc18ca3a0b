// src/geocode/mod.rs
use std::fmt;

pub mod azure;

pub use azure::AzureMapsClient;

/// Outcome of a single lookup. `Display` gives the text written to the
/// "Geocoding Status" column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeStatus {
    Success,
    NotFound,
    NoAddress,
    InvalidApiKey,
    Forbidden,
    RateLimit,
    Http(u16),
    Timeout,
    /// Transport failure; message already truncated.
    Transport(String),
}

impl GeocodeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, GeocodeStatus::Success)
    }

    /// Map a non-200 HTTP status code.
    pub fn from_http_status(code: u16) -> Self {
        match code {
            401 => GeocodeStatus::InvalidApiKey,
            403 => GeocodeStatus::Forbidden,
            429 => GeocodeStatus::RateLimit,
            other => GeocodeStatus::Http(other),
        }
    }
}

impl fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeStatus::Success => f.write_str("Success"),
            GeocodeStatus::NotFound => f.write_str("Not Found"),
            GeocodeStatus::NoAddress => f.write_str("No Address"),
            GeocodeStatus::InvalidApiKey => f.write_str("Error: Invalid API Key"),
            GeocodeStatus::Forbidden => f.write_str("Error: Forbidden"),
            GeocodeStatus::RateLimit => f.write_str("Error: Rate Limit"),
            GeocodeStatus::Http(code) => write!(f, "Error: HTTP {}", code),
            GeocodeStatus::Timeout => f.write_str("Error: Timeout"),
            GeocodeStatus::Transport(msg) => write!(f, "Error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeResult {
    pub latitude: String,
    pub longitude: String,
    pub confidence: String,
    pub status: GeocodeStatus,
}

impl GeocodeResult {
    /// Empty coordinates and confidence with the given status.
    pub fn failed(status: GeocodeStatus) -> Self {
        Self {
            latitude: String::new(),
            longitude: String::new(),
            confidence: String::new(),
            status,
        }
    }

    /// Latitude, longitude, confidence, status: the four appended columns.
    pub fn into_fields(self) -> [String; 4] {
        [
            self.latitude,
            self.longitude,
            self.confidence,
            self.status.to_string(),
        ]
    }
}

/// A single-address lookup. Implementations never fail: every problem is
/// folded into the returned status.
pub trait Geocoder {
    fn geocode(&self, address: Option<&str>) -> GeocodeResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_matches_output_column() {
        assert_eq!(GeocodeStatus::Success.to_string(), "Success");
        assert_eq!(GeocodeStatus::NotFound.to_string(), "Not Found");
        assert_eq!(GeocodeStatus::NoAddress.to_string(), "No Address");
        assert_eq!(GeocodeStatus::from_http_status(401).to_string(), "Error: Invalid API Key");
        assert_eq!(GeocodeStatus::from_http_status(403).to_string(), "Error: Forbidden");
        assert_eq!(GeocodeStatus::from_http_status(429).to_string(), "Error: Rate Limit");
        assert_eq!(GeocodeStatus::from_http_status(503).to_string(), "Error: HTTP 503");
        assert_eq!(GeocodeStatus::Timeout.to_string(), "Error: Timeout");
        assert_eq!(
            GeocodeStatus::Transport("connection refused".into()).to_string(),
            "Error: connection refused"
        );
    }

    #[test]
    fn fields_are_in_column_order() {
        let r = GeocodeResult {
            latitude: "1".into(),
            longitude: "2".into(),
            confidence: "3".into(),
            status: GeocodeStatus::Success,
        };
        assert_eq!(r.into_fields(), ["1", "2", "3", "Success"].map(String::from));
    }
}
