//! Media source descriptors.
//!
//! A [`MediaSource`] tells an engine factory *what* to play. It is fixed for
//! the lifetime of a playback session and handed to every engine the session
//! builds, including the ones rebuilt after a surface loss.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the media bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSourceKind {
    /// Remote HTTP(S) resource fetched by the engine.
    Network,
    /// Asset bundled with the host application.
    Asset,
    /// File on the local filesystem.
    File,
}

/// Container/streaming format hint for network sources.
///
/// Engines normally infer the format from the URI; the hint overrides that
/// inference when the URI carries no recognizable extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    /// MPEG-DASH manifest
    Dash,
    /// HTTP Live Streaming playlist
    Hls,
    /// Microsoft Smooth Streaming manifest
    #[serde(rename = "ss")]
    SmoothStreaming,
    /// Progressive or unknown container
    Other,
}

/// Immutable descriptor of the media a session plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    /// URI, asset key or filesystem path depending on `kind`.
    pub uri: String,
    /// Origin of the media.
    pub kind: MediaSourceKind,
    /// Optional format override.
    #[serde(default)]
    pub format_hint: Option<StreamFormat>,
    /// HTTP headers sent with every request for network sources.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl MediaSource {
    fn new(uri: impl Into<String>, kind: MediaSourceKind) -> Self {
        Self {
            uri: uri.into(),
            kind,
            format_hint: None,
            headers: HashMap::new(),
        }
    }

    /// Remote HTTP(S) media.
    pub fn network(url: impl Into<String>) -> Self {
        Self::new(url, MediaSourceKind::Network)
    }

    /// Media bundled with the host application.
    pub fn asset(key: impl Into<String>) -> Self {
        Self::new(key, MediaSourceKind::Asset)
    }

    /// Media stored on the local filesystem.
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, MediaSourceKind::File)
    }

    /// Attach an HTTP header (ignored by engines for non-network sources).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a format hint.
    pub fn with_format_hint(mut self, format: StreamFormat) -> Self {
        self.format_hint = Some(format);
        self
    }

    /// Returns `true` if playback needs network access.
    pub fn is_remote(&self) -> bool {
        self.kind == MediaSourceKind::Network
    }
}
