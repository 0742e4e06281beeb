use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub twitter: TwitterConfig,
    pub relay: RelayConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Visualization assets, served under `/src`
    pub static_dir: String,
    /// Bird call and ambient audio, served under `/audio`
    pub audio_dir: String,
    /// Page served at `/`
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 3000,
            static_dir: "src".to_string(),
            audio_dir: "mp3".to_string(),
            index_file: "index.html".to_string(),
        }
    }
}

/// Upstream status stream credentials and filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
    pub stream_url: String,
    /// Account ids to follow (must not be empty)
    #[serde(deserialize_with = "list_or_csv")]
    pub follow: Vec<String>,
    /// Optional keywords tracked in addition to the follow list
    #[serde(deserialize_with = "list_or_csv")]
    pub track: Vec<String>,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token_key: String::new(),
            access_token_secret: String::new(),
            stream_url: "https://stream.twitter.com/1.1/statuses/filter.json".to_string(),
            follow: Vec::new(),
            track: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Frames buffered per viewer before further events are dropped for it
    pub session_buffer: usize,
    /// Maximum concurrent viewers (0 = unlimited)
    pub max_sessions: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session_buffer: 16,
            max_sessions: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub reconnect: ReconnectConfig,
}

/// What to do after the upstream stream fails
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ReconnectConfig {
    /// Leave the stream down until the process is restarted
    #[default]
    Never,
    /// Reopen with exponential backoff and jitter
    Exponential {
        #[serde(deserialize_with = "number_or_string")]
        min_delay_ms: u64,
        #[serde(deserialize_with = "number_or_string")]
        max_delay_ms: u64,
        /// 0 = retry forever
        #[serde(deserialize_with = "number_or_string")]
        max_attempts: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, Self::environment())
    }

    /// BIRDSONG_TWITTER__CONSUMER_KEY, BIRDSONG_TWITTER__FOLLOW=1,2,3, ...
    ///
    /// Values stay strings; list and numeric fields are parsed on deserialize
    /// so credentials that look like numbers are kept verbatim.
    fn environment() -> Environment {
        Environment::with_prefix("BIRDSONG")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with_env(config_file: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        builder.add_source(env).build()?.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Check everything the process needs before it opens the stream.
    ///
    /// Returns every problem found rather than stopping at the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let credentials = [
            ("twitter.consumer_key", &self.twitter.consumer_key),
            ("twitter.consumer_secret", &self.twitter.consumer_secret),
            ("twitter.access_token_key", &self.twitter.access_token_key),
            ("twitter.access_token_secret", &self.twitter.access_token_secret),
        ];
        for (name, value) in credentials {
            if value.trim().is_empty() {
                errors.push(format!("{name} is required"));
            }
        }

        if self.twitter.stream_url.trim().is_empty() {
            errors.push("twitter.stream_url is required".to_string());
        }

        if self.twitter.follow.iter().all(|id| id.trim().is_empty()) {
            errors.push("twitter.follow must list at least one account id".to_string());
        }

        if self.relay.session_buffer == 0 {
            errors.push("relay.session_buffer must be greater than 0".to_string());
        }

        if let ReconnectConfig::Exponential {
            min_delay_ms,
            max_delay_ms,
            ..
        } = self.ingest.reconnect
        {
            if min_delay_ms == 0 || min_delay_ms > max_delay_ms {
                errors.push(format!(
                    "ingest.reconnect delays are invalid (min {min_delay_ms}ms, max {max_delay_ms}ms)"
                ));
            }
        }

        if let Err(e) = crate::logging::parse_log_level(&self.logging.level) {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Accept either a list or a comma-separated string
fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(items) => items,
        Raw::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Accept a number or its string form; tagged enums do not coerce env strings
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
