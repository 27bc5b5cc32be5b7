//! # Playback Snapshot
//!
//! Everything needed to resume an engine exactly where another one stopped.
//!
//! A snapshot is taken from the live engine right before it is released on
//! surface loss, and consumed once when the next engine is built.

use bridge_traits::{PlaybackEngine, RepeatMode, TrackSelectionOverride};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::tracks;

/// Immutable capture of user-visible playback state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub position_ms: u64,
    pub play_when_ready: bool,
    /// Pinned audio track, if the host selected one.
    pub audio_track: Option<TrackSelectionOverride>,
    pub speed: f32,
    pub volume: f32,
    pub looping: bool,
}

impl PlaybackSnapshot {
    /// Read the snapshot from a live engine.
    ///
    /// Must run before the engine is stopped or released.
    pub fn capture(engine: &dyn PlaybackEngine) -> Self {
        let parameters = engine.track_selection_parameters();
        let info = engine.current_mapped_track_info();

        Self {
            position_ms: engine.current_position(),
            play_when_ready: engine.play_when_ready(),
            audio_track: tracks::audio_override(&parameters, info.as_ref()),
            speed: engine.playback_speed(),
            volume: engine.volume(),
            looping: engine.repeat_mode() == RepeatMode::All,
        }
    }

    /// Apply the snapshot to a freshly built engine.
    ///
    /// Track selection, loop mode, speed and volume go first, then the seek,
    /// and play intent last so a paused engine never runs at the wrong
    /// position.
    pub fn restore(&self, engine: &mut dyn PlaybackEngine) {
        if let Some(selection) = self.audio_track {
            let info = engine.current_mapped_track_info();
            let parameters = tracks::apply_override(
                &engine.track_selection_parameters(),
                info.as_ref(),
                selection,
            );
            engine.set_track_selection_parameters(parameters);
        }

        engine.set_repeat_mode(self.repeat_mode());
        engine.set_playback_speed(self.speed);
        engine.set_volume(self.volume);
        engine.seek_to(self.position_ms);
        engine.set_play_when_ready(self.play_when_ready);

        trace!(
            position_ms = self.position_ms,
            play_when_ready = self.play_when_ready,
            "Snapshot restored"
        );
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        if self.looping {
            RepeatMode::All
        } else {
            RepeatMode::Off
        }
    }
}
