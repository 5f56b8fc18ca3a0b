// src/config.rs
use serde::Deserialize;
use std::{fs, path::Path, str::FromStr, time::Duration};
use thiserror::Error;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://atlas.microsoft.com/search/address/json";
pub const DEFAULT_API_VERSION: &str = "1.0";
pub const DEFAULT_DELAY_MS: u64 = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing Azure Maps subscription key (use --api-key or set AZURE_MAPS_KEY)")]
    MissingApiKey,

    #[error("invalid endpoint `{0}`: {1}")]
    InvalidEndpoint(String, url::ParseError),

    #[error("invalid column list `{0}`: expected four zero-based indices like 9,10,11,12")]
    InvalidColumns(String),

    #[error("address columns must be distinct, got {0:?}")]
    DuplicateColumns([usize; 4]),

    #[error(
        "input has {found} columns but the address mapping needs at least {required} \
         (street1={street1}, street2={street2}, city={city}, postal_code={postal_code})"
    )]
    TooFewColumns {
        found: usize,
        required: usize,
        street1: usize,
        street2: usize,
        city: usize,
        postal_code: usize,
    },

    #[error("reading config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Zero-based positions of the four address parts within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AddressColumns {
    pub street1: usize,
    pub street2: usize,
    pub city: usize,
    pub postal_code: usize,
}

impl Default for AddressColumns {
    /// Spreadsheet columns J, K, L and M.
    fn default() -> Self {
        Self {
            street1: 9,
            street2: 10,
            city: 11,
            postal_code: 12,
        }
    }
}

impl AddressColumns {
    pub fn as_array(&self) -> [usize; 4] {
        [self.street1, self.street2, self.city, self.postal_code]
    }

    /// Minimum row width that covers every mapped column.
    pub fn required_width(&self) -> usize {
        self.as_array().into_iter().max().unwrap_or(0) + 1
    }

    /// Fail fast when the header row cannot hold the mapping.
    pub fn validate_against(&self, headers: &[String]) -> Result<(), ConfigError> {
        let required = self.required_width();
        if headers.len() < required {
            return Err(ConfigError::TooFewColumns {
                found: headers.len(),
                required,
                street1: self.street1,
                street2: self.street2,
                city: self.city,
                postal_code: self.postal_code,
            });
        }
        Ok(())
    }

    fn check_distinct(&self) -> Result<(), ConfigError> {
        let cols = self.as_array();
        for (i, a) in cols.iter().enumerate() {
            if cols[i + 1..].contains(a) {
                return Err(ConfigError::DuplicateColumns(cols));
            }
        }
        Ok(())
    }
}

impl FromStr for AddressColumns {
    type Err = ConfigError;

    /// Parses `"9,10,11,12"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed: Vec<usize> = s
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|_| ConfigError::InvalidColumns(s.to_string()))?;
        match parsed.as_slice() {
            &[street1, street2, city, postal_code] => Ok(Self {
                street1,
                street2,
                city,
                postal_code,
            }),
            _ => Err(ConfigError::InvalidColumns(s.to_string())),
        }
    }
}

/// Optional YAML settings. The subscription key is deliberately absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub api_version: Option<String>,
    pub delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub columns: Option<AddressColumns>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Values supplied on the command line or via the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub columns: Option<AddressColumns>,
}

/// Fully resolved run settings.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub endpoint: Url,
    pub api_version: String,
    pub delay: Duration,
    pub timeout: Duration,
    pub columns: AddressColumns,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_version", &self.api_version)
            .field("delay", &self.delay)
            .field("timeout", &self.timeout)
            .field("columns", &self.columns)
            .finish()
    }
}

impl Config {
    /// Overrides win over the file, the file wins over built-in defaults.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self, ConfigError> {
        let api_key = overrides
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let endpoint_str = overrides
            .endpoint
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint_str)
            .map_err(|e| ConfigError::InvalidEndpoint(endpoint_str.clone(), e))?;

        let columns = overrides.columns.or(file.columns).unwrap_or_default();
        columns.check_distinct()?;

        Ok(Self {
            api_key,
            endpoint,
            api_version: file
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            delay: Duration::from_millis(
                overrides
                    .delay_ms
                    .or(file.delay_ms)
                    .unwrap_or(DEFAULT_DELAY_MS),
            ),
            timeout: Duration::from_secs(
                overrides
                    .timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            columns,
        })
    }
}
