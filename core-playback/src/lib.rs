//! # Playback Session Core
//!
//! Binds a host playback engine to a host surface and keeps playback state
//! intact across surface loss.
//!
//! ## Overview
//!
//! This crate handles:
//! - The session lifecycle (`create`, surface destroyed/created, `dispose`)
//! - Snapshot and restore of position, play intent, audio track, speed,
//!   volume and loop mode when the engine has to be rebuilt
//! - Audio track enumeration and selection in a platform-neutral order
//! - Translation of engine events into host callbacks
//! - An optional tokio driver task acting as the session's control context
//!
//! ## Points of variation
//!
//! - [`SurfaceBinder`](binding::SurfaceBinder) decides how engines are bound
//!   to the host surface ([`ProviderSurfaceBinder`](binding::ProviderSurfaceBinder)
//!   covers the common case).
//! - [`ListenerFactory`](listener::ListenerFactory) builds the per-engine event
//!   translator ([`DefaultListenerFactory`](listener::DefaultListenerFactory)).

pub mod binding;
pub mod config;
#[cfg(feature = "driver")]
pub mod driver;
pub mod error;
pub mod listener;
pub mod session;
pub mod snapshot;
pub mod tracks;

pub use binding::{ProviderSurfaceBinder, SurfaceBinder};
pub use config::{SessionConfig, VideoPlayerOptions};
#[cfg(feature = "driver")]
pub use driver::{spawn_session, SessionCommand, SessionHandle};
pub use error::{PlaybackError, Result};
pub use listener::{DefaultListenerFactory, EngineListener, EventListenerAdapter, ListenerFactory};
pub use session::{PlaybackSession, PlaybackSessionBuilder, SessionPhase};
pub use snapshot::PlaybackSnapshot;
pub use tracks::{AudioTrack, UNDETERMINED_LANGUAGE};
