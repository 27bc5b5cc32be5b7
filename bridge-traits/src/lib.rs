//! # Host Bridge Traits
//!
//! Contracts between the playback-session core and the host platform.
//!
//! ## Overview
//!
//! The core owns the playback-session state machine; everything platform
//! specific lives behind the traits in this crate. Each host (Android, iOS,
//! desktop) ships concrete implementations and injects them at session
//! construction time.
//!
//! ## Traits
//!
//! ### Consumed by the core
//! - [`PlaybackEngine`](engine::PlaybackEngine) - Opaque engine instance (play/pause/seek/volume/rate/tracks)
//! - [`EngineFactory`](engine::EngineFactory) - Builds fresh, unprepared engines
//! - [`SurfaceProvider`](surface::SurfaceProvider) - Owner of the renderable surface
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ### Exposed by the core
//! - [`PlayerCallbacks`](callbacks::PlayerCallbacks) - Session events for the UI layer
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert native failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! Factories, providers and sinks are shared (`Send + Sync`); engine handles
//! are moved into the session's control context (`Send`) and driven from there
//! exclusively.

pub mod callbacks;
pub mod engine;
pub mod error;
pub mod logging;
pub mod media;
pub mod platform;
pub mod surface;
pub mod tracks;

pub use error::BridgeError;

// Re-export commonly used types
pub use callbacks::PlayerCallbacks;
pub use engine::{
    AudioAttributes, AudioContentType, EngineConfig, EngineEnvelope, EngineError,
    EngineErrorKind, EngineEvent, EngineEventSender, EngineFactory, PlaybackEngine,
    PlaybackState, RepeatMode, VideoSize,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{MediaSource, MediaSourceKind, StreamFormat};
pub use surface::{DetachAck, SurfaceHandle, SurfaceNotifier, SurfaceProvider, SurfaceSignal};
pub use tracks::{
    MappedRenderer, MappedTrack, MappedTrackGroup, MappedTrackInfo, TrackFormat,
    TrackSelectionOverride, TrackSelectionParameters, TrackSelectionParametersBuilder,
    TrackSupport, TrackType,
};
