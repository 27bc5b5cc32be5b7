//! # Engine Event Adapter
//!
//! Turns low-level [`EngineEvent`]s into [`PlayerCallbacks`] calls.
//!
//! One listener is built per engine through a [`ListenerFactory`]; the session
//! feeds it every event of that engine once the event has been marshaled to
//! the control context. Hosts with platform-specific event shapes can supply
//! their own factory.

use bridge_traits::{
    platform::{PlatformSend, PlatformSendSync},
    EngineEvent, PlaybackEngine, PlaybackState, PlayerCallbacks, RepeatMode, VideoSize,
};
use tracing::{debug, warn};

/// Per-engine event translator.
pub trait EngineListener: PlatformSend {
    /// Handle one event from the engine this listener was built for.
    fn on_event(
        &mut self,
        event: &EngineEvent,
        engine: &dyn PlaybackEngine,
        callbacks: &dyn PlayerCallbacks,
    );

    /// Whether `on_initialized` has been delivered for this session.
    fn is_initialized(&self) -> bool;
}

/// Builds a listener for every engine the session creates.
pub trait ListenerFactory: PlatformSendSync {
    /// `already_initialized` is `true` when rebuilding after a surface loss;
    /// the new listener must not report `on_initialized` again.
    fn make_listener(&self, already_initialized: bool, error_code: &str)
        -> Box<dyn EngineListener>;
}

/// Default [`ListenerFactory`] producing [`EventListenerAdapter`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultListenerFactory;

impl ListenerFactory for DefaultListenerFactory {
    fn make_listener(
        &self,
        already_initialized: bool,
        error_code: &str,
    ) -> Box<dyn EngineListener> {
        Box::new(EventListenerAdapter::new(already_initialized, error_code))
    }
}

/// Standard engine-to-callback translation.
#[derive(Debug, Clone)]
pub struct EventListenerAdapter {
    initialized: bool,
    is_buffering: bool,
    error_code: String,
}

impl EventListenerAdapter {
    pub fn new(already_initialized: bool, error_code: impl Into<String>) -> Self {
        Self {
            initialized: already_initialized,
            is_buffering: false,
            error_code: error_code.into(),
        }
    }

    pub fn is_buffering(&self) -> bool {
        self.is_buffering
    }

    fn set_buffering(&mut self, buffering: bool, callbacks: &dyn PlayerCallbacks) {
        if self.is_buffering == buffering {
            return;
        }
        self.is_buffering = buffering;
        if buffering {
            callbacks.on_buffering_start();
        } else {
            callbacks.on_buffering_end();
        }
    }

    fn send_initialized(&mut self, engine: &dyn PlaybackEngine, callbacks: &dyn PlayerCallbacks) {
        if self.initialized {
            return;
        }

        // Wait for a later ready transition if the engine does not know the duration yet
        let Some(duration_ms) = engine.duration() else {
            debug!("Ready without duration; deferring initialization");
            return;
        };

        self.initialized = true;
        let (width, height, rotation_degrees) = display_dimensions(engine.video_size());
        debug!(duration_ms, width, height, rotation_degrees, "Media initialized");
        callbacks.on_initialized(duration_ms, width, height, rotation_degrees);
    }
}

/// Width and height as the frames are displayed.
///
/// Quarter-turn rotations swap the axes; the rotation itself is reported as is.
pub fn display_dimensions(size: VideoSize) -> (u32, u32, u32) {
    match size.rotation_degrees {
        90 | 270 => (size.height, size.width, size.rotation_degrees),
        _ => (size.width, size.height, size.rotation_degrees),
    }
}

impl EngineListener for EventListenerAdapter {
    fn on_event(
        &mut self,
        event: &EngineEvent,
        engine: &dyn PlaybackEngine,
        callbacks: &dyn PlayerCallbacks,
    ) {
        match event {
            EngineEvent::PlaybackStateChanged(PlaybackState::Buffering) => {
                self.set_buffering(true, callbacks);
                callbacks.on_buffering_update(engine.buffered_position());
            }
            EngineEvent::PlaybackStateChanged(PlaybackState::Ready) => {
                self.set_buffering(false, callbacks);
                self.send_initialized(engine, callbacks);
            }
            EngineEvent::PlaybackStateChanged(PlaybackState::Ended) => {
                self.set_buffering(false, callbacks);
                if engine.repeat_mode() == RepeatMode::Off {
                    callbacks.on_completed();
                }
            }
            EngineEvent::PlaybackStateChanged(PlaybackState::Idle) => {
                self.set_buffering(false, callbacks);
            }
            EngineEvent::IsPlayingChanged(is_playing) => {
                callbacks.on_is_playing_state_update(*is_playing);
            }
            EngineEvent::VideoSizeChanged(size) => {
                callbacks.on_video_size_changed(size.width, size.height, size.rotation_degrees);
            }
            EngineEvent::Error(error) => {
                self.set_buffering(false, callbacks);
                warn!(kind = ?error.kind, "Engine reported an error");
                callbacks.on_error(
                    &self.error_code,
                    &format!("Video player had error {}", error),
                );
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
