//! # Runtime Configuration
//!
//! Process-level settings read from the environment (optionally seeded from a
//! `.env` file), plus the versioned site templates that carry the marker
//! strings used for pagination discovery and listing slicing.
//!
//! Configuration problems are fatal: they are reported before any pipeline
//! stage runs.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use thiserror::Error;

/// Default database location when `FUNDAI_DATABASE_URL` is unset
pub const DEFAULT_DATABASE_PATH: &str = "fundai.db";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default completion quota, matching the paid Gemini tier
pub const DEFAULT_COMPLETIONS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(2000) {
    Some(n) => n,
    None => panic!("quota must be non-zero"),
};

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Unknown site template name
    #[error("unknown site template '{0}' (expected one of: funda-2023, funda-2024)")]
    UnknownTemplate(String),
}

/// Where the listing store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// A local libsql/SQLite file
    Local { path: String },

    /// A remote libsql server
    Remote { url: String, auth_token: String },
}

/// Completion model settings
#[derive(Debug, Clone)]
pub struct ModelConfig {
    api_key: Option<String>,

    /// Model name passed to the provider
    pub model: String,

    /// Completion quota enforced by the rate limiter
    pub completions_per_minute: NonZeroU32,
}

impl ModelConfig {
    /// The provider API key. Only stages that talk to the model require it.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))
    }
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub fetch_concurrency: usize,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Values from `.env` are only seen once the caller has loaded it with
    /// `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database = match get("FUNDAI_DATABASE_URL") {
            Some(url) if is_remote(&url) => {
                let auth_token = get("FUNDAI_DATABASE_AUTH_TOKEN")
                    .ok_or(ConfigError::Missing("FUNDAI_DATABASE_AUTH_TOKEN"))?;
                DatabaseConfig::Remote { url, auth_token }
            }
            Some(path) => DatabaseConfig::Local { path },
            None => DatabaseConfig::Local {
                path: DEFAULT_DATABASE_PATH.to_string(),
            },
        };

        let completions_per_minute = match get("FUNDAI_COMPLETIONS_PER_MINUTE") {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroU32>()
                .map_err(|e| ConfigError::Invalid {
                    name: "FUNDAI_COMPLETIONS_PER_MINUTE",
                    reason: e.to_string(),
                })?,
            None => DEFAULT_COMPLETIONS_PER_MINUTE,
        };

        let fetch_concurrency = match get("FUNDAI_FETCH_CONCURRENCY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: "FUNDAI_FETCH_CONCURRENCY",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "FUNDAI_FETCH_CONCURRENCY",
                        reason: e.to_string(),
                    });
                }
            },
            None => 4,
        };

        Ok(Self {
            database,
            model: ModelConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("FUNDAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                completions_per_minute,
            },
            fetch_concurrency,
        })
    }
}

fn is_remote(url: &str) -> bool {
    ["libsql://", "https://", "http://", "wss://", "ws://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Markers delimiting the pagination control on a search results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationMarkers {
    /// Label of the "previous page" control
    pub previous: String,
    /// Label of the "next page" control
    pub next: String,
}

/// Markers delimiting the listing details on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceMarkers {
    /// Appears just before the listing details ("save" button)
    pub start: String,
    /// Appears after the core structured fields
    pub end: String,
}

/// A revision of the listing site's page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteTemplate {
    #[default]
    Funda2023,
    Funda2024,
}

impl SiteTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Funda2023 => "funda-2023",
            Self::Funda2024 => "funda-2024",
        }
    }

    pub fn pagination_markers(&self) -> PaginationMarkers {
        match self {
            Self::Funda2023 => PaginationMarkers {
                previous: "* Vorige".to_string(),
                next: "* Volgende".to_string(),
            },
            Self::Funda2024 => PaginationMarkers {
                previous: "Vorige".to_string(),
                next: "Volgende".to_string(),
            },
        }
    }

    pub fn slice_markers(&self) -> SliceMarkers {
        match self {
            Self::Funda2023 => SliceMarkers {
                start: "Bewaren".to_string(),
                end: "##  Populariteit".to_string(),
            },
            Self::Funda2024 => SliceMarkers {
                start: "Bewaren".to_string(),
                end: "## Locatie".to_string(),
            },
        }
    }
}

impl fmt::Display for SiteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SiteTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "funda-2023" => Ok(Self::Funda2023),
            "funda-2024" => Ok(Self::Funda2024),
            other => Err(ConfigError::UnknownTemplate(other.to_string())),
        }
    }
}
