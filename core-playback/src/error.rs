//! # Playback Error Types
//!
//! Error types for the playback-session lifecycle.
//!
//! Most runtime failures never surface as values: engine failures are routed
//! to the callback sink, and controls on a session without a live engine are
//! silent no-ops. What remains here is lifecycle misuse and construction
//! failure.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur while driving a playback session.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The engine could not be built, loaded or prepared.
    #[error("Failed to create playback engine: {0}")]
    EngineCreation(String),

    /// The host surface could not be obtained or bound.
    #[error("Surface unavailable: {0}")]
    Surface(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// `create` was called on a session that already has media.
    #[error("Session already created")]
    AlreadyCreated,

    /// The session has been disposed.
    #[error("Session disposed")]
    Disposed,

    /// The session driver is gone; the handle can no longer reach it.
    #[error("Session closed")]
    SessionClosed,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Invalid session configuration: {0}")]
    Config(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if a later attempt may succeed without host changes.
    ///
    /// Surface loss is expected during backgrounding; the next surface
    /// notification retries the bind.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::Surface(_) | PlaybackError::Bridge(BridgeError::SurfaceUnavailable(_))
        )
    }

    /// Returns `true` if the error reflects calling an operation in the wrong
    /// session phase.
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::AlreadyCreated | PlaybackError::Disposed | PlaybackError::SessionClosed
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
