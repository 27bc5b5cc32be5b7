//! Workspace facade crate.
//!
//! Re-exports the individual workspace crates (`bridge-traits`,
//! `core-runtime`, `core-playback`) so host applications can depend on
//! `video-session` alone and toggle the documented features (e.g. `driver`)
//! without wiring each crate individually.

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;

pub use core_playback::{
    AudioTrack, PlaybackError, PlaybackSession, PlaybackSessionBuilder, ProviderSurfaceBinder,
    SessionConfig, SessionPhase, VideoPlayerOptions,
};
#[cfg(feature = "driver")]
pub use core_playback::{spawn_session, SessionHandle};
