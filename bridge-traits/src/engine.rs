//! Playback engine bridge.
//!
//! The core never decodes or renders anything itself. It drives an opaque
//! engine instance supplied by the host (ExoPlayer, AVPlayer, GStreamer, ...)
//! through [`PlaybackEngine`], and obtains fresh instances from an
//! [`EngineFactory`] every time it needs one: at session creation and after
//! every surface loss.
//!
//! ## Threading
//!
//! Control calls on an engine are made from the session's control context
//! only. Engines report asynchronous happenings (buffering, readiness, errors)
//! from their own threads through the [`EngineEventSender`] they were handed;
//! the sender never blocks and silently drops events once the owning session
//! is gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::{
    error::Result,
    media::MediaSource,
    platform::{PlatformSend, PlatformSendSync},
    surface::SurfaceHandle,
    tracks::{MappedTrackInfo, TrackSelectionParameters},
};

/// Looping behaviour of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop at the end of the media.
    #[default]
    Off,
    /// Restart from the beginning at the end of the media.
    All,
}

/// Audio content classification passed to the platform mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioContentType {
    #[default]
    Movie,
    Music,
    Speech,
}

/// Audio attributes applied to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioAttributes {
    pub content_type: AudioContentType,
}

impl AudioAttributes {
    pub fn movie() -> Self {
        Self {
            content_type: AudioContentType::Movie,
        }
    }
}

/// Decoded video dimensions as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation the frames must be displayed with.
    pub rotation_degrees: u32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32, rotation_degrees: u32) -> Self {
        Self {
            width,
            height,
            rotation_degrees,
        }
    }
}

/// Coarse engine playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No media prepared, or preparation failed.
    Idle,
    /// Waiting for data.
    Buffering,
    /// Able to play immediately from the current position.
    Ready,
    /// Reached the end of the media.
    Ended,
}

/// Category of an unrecoverable engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineErrorKind {
    /// The media could not be loaded (I/O, HTTP status, missing asset).
    Source,
    /// Decoder initialisation or decoding failed.
    Decoder,
    /// Audio or video renderer failed.
    Renderer,
    /// Anything the engine could not classify.
    Unexpected,
}

/// Unrecoverable failure reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Low-level event emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    PlaybackStateChanged(PlaybackState),
    IsPlayingChanged(bool),
    VideoSizeChanged(VideoSize),
    Error(EngineError),
}

/// Engine event tagged with the generation of the engine that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEnvelope {
    pub generation: u64,
    pub event: EngineEvent,
}

/// Cloneable, non-blocking handle engines use to publish events.
///
/// Each sender is bound to one engine generation so that events from a
/// released engine can be told apart from the live one.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<EngineEnvelope>,
}

impl EngineEventSender {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<EngineEnvelope>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Publish an event. Returns `false` once the receiving session is gone.
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx
            .send(EngineEnvelope {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// Returns `true` if the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Configuration handed to the factory for each engine it builds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Initial track-selection parameters (e.g. preferred audio language).
    pub track_selection: TrackSelectionParameters,
}

/// Opaque playback-engine instance.
///
/// Exactly one owner at a time; `release` must be called before the handle is
/// dropped. Positions and durations are milliseconds.
pub trait PlaybackEngine: PlatformSend {
    /// Load the media to play. Does not start preparation.
    fn set_media_source(&mut self, source: &MediaSource) -> Result<()>;

    /// Start asynchronous preparation. Completion is reported through events.
    fn prepare(&mut self) -> Result<()>;

    /// Bind (or, with `None`, unbind) the video output.
    fn set_video_surface(&mut self, surface: Option<SurfaceHandle>);

    /// Apply audio attributes; `handle_audio_focus == false` mixes with other apps.
    fn set_audio_attributes(&mut self, attributes: AudioAttributes, handle_audio_focus: bool);

    /// Register the event channel. Called once per engine.
    fn add_listener(&mut self, sender: EngineEventSender);

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn play_when_ready(&self) -> bool;

    fn seek_to(&mut self, position_ms: u64);

    fn current_position(&self) -> u64;

    fn buffered_position(&self) -> u64;

    /// Media duration, `None` until known.
    fn duration(&self) -> Option<u64>;

    fn video_size(&self) -> VideoSize;

    /// Volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    fn set_playback_speed(&mut self, speed: f32);

    fn playback_speed(&self) -> f32;

    fn set_repeat_mode(&mut self, mode: RepeatMode);

    fn repeat_mode(&self) -> RepeatMode;

    /// Current track mapping, `None` before the media is prepared.
    fn current_mapped_track_info(&self) -> Option<MappedTrackInfo>;

    fn track_selection_parameters(&self) -> TrackSelectionParameters;

    /// Replace the track-selection parameters as a whole.
    fn set_track_selection_parameters(&mut self, parameters: TrackSelectionParameters);

    /// Stop playback and drop buffered media, keeping the instance usable.
    fn stop(&mut self);

    /// Release every native resource. The handle is unusable afterwards.
    fn release(&mut self) -> Result<()>;
}

/// Builds fresh, unprepared engine instances.
pub trait EngineFactory: PlatformSendSync {
    fn create_engine(
        &self,
        source: &MediaSource,
        config: &EngineConfig,
    ) -> Result<Box<dyn PlaybackEngine>>;
}
