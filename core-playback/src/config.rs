//! # Session Configuration
//!
//! Per-session settings and the host-facing player options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Error code reported to the callback sink for engine failures.
pub const DEFAULT_ERROR_CODE: &str = "VideoError";

/// Session configuration.
///
/// Controls the driver's channel sizing, periodic buffering reports and the
/// error code handed to `on_error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacity of the driver's command channel.
    ///
    /// Default: 64.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Interval at which the driver reports the buffered position while an
    /// engine is live. `None` disables periodic reports.
    ///
    /// Default: `None`.
    #[serde(default)]
    pub buffering_update_interval: Option<Duration>,

    /// Code passed as the first argument of `on_error`.
    ///
    /// Default: `"VideoError"`.
    #[serde(default = "default_error_code")]
    pub error_code: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_buffer: default_command_buffer(),
            buffering_update_interval: None,
            error_code: default_error_code(),
        }
    }
}

impl SessionConfig {
    pub fn with_buffering_updates(mut self, interval: Duration) -> Self {
        self.buffering_update_interval = Some(interval);
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = code.into();
        self
    }

    pub fn with_command_buffer(mut self, capacity: usize) -> Self {
        self.command_buffer = capacity;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.command_buffer == 0 {
            return Err(PlaybackError::Config(
                "command_buffer must be > 0".to_string(),
            ));
        }

        if self.buffering_update_interval == Some(Duration::ZERO) {
            return Err(PlaybackError::Config(
                "buffering_update_interval must be non-zero".to_string(),
            ));
        }

        if self.error_code.is_empty() {
            return Err(PlaybackError::Config(
                "error_code cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_command_buffer() -> usize {
    64
}

fn default_error_code() -> String {
    DEFAULT_ERROR_CODE.to_string()
}

/// Player options fixed at `create` time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlayerOptions {
    /// Mix audio with other apps instead of taking audio focus.
    #[serde(default)]
    pub mix_with_others: bool,

    /// Language tag the engine should prefer when it picks an audio track.
    #[serde(default)]
    pub preferred_audio_track: Option<String>,
}

impl VideoPlayerOptions {
    pub fn mixing_with_others(mut self, mix: bool) -> Self {
        self.mix_with_others = mix;
        self
    }

    pub fn with_preferred_audio_track(mut self, language: impl Into<String>) -> Self {
        self.preferred_audio_track = Some(language.into());
        self
    }

    /// Whether the engine should request exclusive audio focus.
    pub fn handle_audio_focus(&self) -> bool {
        !self.mix_with_others
    }
}
