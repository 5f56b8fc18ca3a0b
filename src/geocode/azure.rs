// src/geocode/azure.rs
use anyhow::{Context, Result};
use reqwest::{blocking::Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::{error::Error as StdError, time::Duration, time::Instant};
use tracing::{debug, instrument};
use url::Url;

use super::{GeocodeResult, GeocodeStatus, Geocoder};
use crate::config::Config;

pub const USER_AGENT: &str = concat!("csvgeocoder/", env!("CARGO_PKG_VERSION"));
/// Transport error messages are cut to this many characters.
pub const MAX_ERROR_CHARS: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub score: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lon: Option<Value>,
}

/// JSON scalar as written by the service, e.g. `40.0` stays "40.0".
fn json_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl SearchResponse {
    /// Take the first result if it carries both coordinates.
    pub fn into_result(self) -> GeocodeResult {
        let first = match self.results.and_then(|r| r.into_iter().next()) {
            Some(r) => r,
            None => return GeocodeResult::failed(GeocodeStatus::NotFound),
        };
        let position = first.position.unwrap_or_default();
        let lat = position.lat.as_ref().and_then(json_text);
        let lon = position.lon.as_ref().and_then(json_text);

        match (lat, lon) {
            (Some(latitude), Some(longitude)) => GeocodeResult {
                latitude,
                longitude,
                confidence: first.score.as_ref().and_then(json_text).unwrap_or_default(),
                status: GeocodeStatus::Success,
            },
            _ => GeocodeResult::failed(GeocodeStatus::NotFound),
        }
    }
}

/// Render the error and its sources, without the request URL (it holds the key).
fn describe(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

pub fn classify_error(err: reqwest::Error) -> GeocodeStatus {
    if err.is_timeout() {
        return GeocodeStatus::Timeout;
    }
    GeocodeStatus::Transport(describe(err).chars().take(MAX_ERROR_CHARS).collect())
}

/// Azure Maps "Search Address" client. One blocking GET per call, no retries.
pub struct AzureMapsClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    api_version: String,
}

impl AzureMapsClient {
    pub fn new(endpoint: Url, api_key: String, api_version: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            api_version,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.api_version.clone(),
            config.timeout,
        )
    }

    fn search(&self, address: &str) -> Result<SearchResponse, GeocodeStatus> {
        let resp = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("api-version", self.api_version.as_str()),
                ("subscription-key", self.api_key.as_str()),
                ("query", address),
                ("limit", "1"),
            ])
            .send()
            .map_err(classify_error)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(GeocodeStatus::from_http_status(status.as_u16()));
        }
        resp.json::<SearchResponse>().map_err(classify_error)
    }
}

impl Geocoder for AzureMapsClient {
    #[instrument(level = "debug", skip(self))]
    fn geocode(&self, address: Option<&str>) -> GeocodeResult {
        let address = match address {
            Some(a) => a,
            None => return GeocodeResult::failed(GeocodeStatus::NoAddress),
        };

        let start = Instant::now();
        let result = match self.search(address) {
            Ok(body) => body.into_result(),
            Err(status) => GeocodeResult::failed(status),
        };

        debug!(status = %result.status, elapsed = ?start.elapsed(), "lookup finished");
        result
    }
}
