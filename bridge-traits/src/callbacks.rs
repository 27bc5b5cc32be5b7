//! Callback sink exposed to the host UI layer.

use crate::platform::PlatformSendSync;

/// Receives session-level playback events.
///
/// Calls are made from the session's control context, never from engine
/// threads, and never after the session has been disposed.
pub trait PlayerCallbacks: PlatformSendSync {
    /// The media is ready; reported once per session.
    fn on_initialized(&self, duration_ms: u64, width: u32, height: u32, rotation_degrees: u32);

    /// Playback reached the end (never reported while looping).
    fn on_completed(&self);

    fn on_buffering_update(&self, buffered_position_ms: u64);

    fn on_buffering_start(&self);

    fn on_buffering_end(&self);

    fn on_error(&self, code: &str, message: &str);

    fn on_is_playing_state_update(&self, is_playing: bool);

    fn on_video_size_changed(&self, _width: u32, _height: u32, _rotation_degrees: u32) {}
}
