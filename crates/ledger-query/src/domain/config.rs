//! Query configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use ledger_query::QueryConfigBuilder;
//!
//! let config = QueryConfigBuilder::new()
//!     .channel_capacity(4)
//!     .max_limit(1_000)
//!     .build()?;
//! ```

use std::env;
use std::str::FromStr;

use super::cursor::MAX_ENCODED_CURSOR_LEN;
use super::errors::ConfigError;

/// Limits and tuning for query execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    /// Rows buffered between producer and consumer (1 = hand-off).
    pub channel_capacity: usize,
    /// Largest accepted `Limit` (0 = no cap).
    pub max_limit: u64,
    /// Longest accepted continuation token, in characters.
    pub max_cursor_token_len: usize,
    /// Longest accepted `NotePrefix`, in bytes.
    pub max_note_prefix_len: usize,
    /// Longest accepted asset `Query`, `Name` or `Unit`, in bytes.
    pub max_text_query_len: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            max_limit: 0,
            max_cursor_token_len: 128,
            max_note_prefix_len: 1024,
            max_text_query_len: 128,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }

        // Every issued token must be accepted back.
        if self.max_cursor_token_len < MAX_ENCODED_CURSOR_LEN {
            return Err(ConfigError::CursorTokenLimitTooSmall {
                len: self.max_cursor_token_len,
                min: MAX_ENCODED_CURSOR_LEN,
            });
        }

        Ok(())
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LQ_CHANNEL_CAPACITY`: Producer/consumer buffer (default: 1)
    /// - `LQ_MAX_LIMIT`: Largest accepted Limit, 0 for none (default: 0)
    /// - `LQ_MAX_CURSOR_TOKEN_LEN`: Longest accepted token (default: 128)
    /// - `LQ_MAX_NOTE_PREFIX_LEN`: Longest NotePrefix (default: 1024)
    /// - `LQ_MAX_TEXT_QUERY_LEN`: Longest asset text filter (default: 128)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            channel_capacity: env_or("LQ_CHANNEL_CAPACITY", defaults.channel_capacity)?,
            max_limit: env_or("LQ_MAX_LIMIT", defaults.max_limit)?,
            max_cursor_token_len: env_or("LQ_MAX_CURSOR_TOKEN_LEN", defaults.max_cursor_token_len)?,
            max_note_prefix_len: env_or("LQ_MAX_NOTE_PREFIX_LEN", defaults.max_note_prefix_len)?,
            max_text_query_len: env_or("LQ_MAX_TEXT_QUERY_LEN", defaults.max_text_query_len)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(default),
    }
}

/// Builder for [`QueryConfig`] with validation.
#[derive(Default)]
pub struct QueryConfigBuilder {
    channel_capacity: Option<usize>,
    max_limit: Option<u64>,
    max_cursor_token_len: Option<usize>,
    max_note_prefix_len: Option<usize>,
    max_text_query_len: Option<usize>,
}

impl QueryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    pub fn max_limit(mut self, limit: u64) -> Self {
        self.max_limit = Some(limit);
        self
    }

    pub fn max_cursor_token_len(mut self, len: usize) -> Self {
        self.max_cursor_token_len = Some(len);
        self
    }

    pub fn max_note_prefix_len(mut self, len: usize) -> Self {
        self.max_note_prefix_len = Some(len);
        self
    }

    pub fn max_text_query_len(mut self, len: usize) -> Self {
        self.max_text_query_len = Some(len);
        self
    }

    /// Build the configuration, validating all parameters.
    pub fn build(self) -> Result<QueryConfig, ConfigError> {
        let defaults = QueryConfig::default();

        let config = QueryConfig {
            channel_capacity: self.channel_capacity.unwrap_or(defaults.channel_capacity),
            max_limit: self.max_limit.unwrap_or(defaults.max_limit),
            max_cursor_token_len: self
                .max_cursor_token_len
                .unwrap_or(defaults.max_cursor_token_len),
            max_note_prefix_len: self
                .max_note_prefix_len
                .unwrap_or(defaults.max_note_prefix_len),
            max_text_query_len: self.max_text_query_len.unwrap_or(defaults.max_text_query_len),
        };

        config.validate()?;
        Ok(config)
    }
}
