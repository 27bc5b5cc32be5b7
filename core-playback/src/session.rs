//! # Playback Session
//!
//! Lifecycle owner for one piece of media shown on one host surface.
//!
//! ## States
//!
//! ```text
//!                 create            surface destroyed
//! Uninitialized ─────────> Attached ─────────────────> Detached
//!                             ^                            │
//!                             └────────────────────────────┘
//!                                    surface created
//!
//! any ──dispose──> Disposed
//! ```
//!
//! While attached the session owns exactly one live engine. On surface loss it
//! captures a [`PlaybackSnapshot`], releases the engine and holds only the
//! snapshot; on surface recreation it builds a fresh engine, restores the
//! snapshot onto it and drops the snapshot.
//!
//! ## Threading
//!
//! A session is driven from a single control context. Engines report events
//! from their own threads into a channel; the control context drains it with
//! [`PlaybackSession::dispatch_pending_events`] (or runs the session inside
//! [`driver::spawn_session`](crate::driver::spawn_session), which does that
//! for it). Events are tagged with the generation of the engine that sent
//! them so anything from a released engine is discarded.
//!
//! ## Controls while detached
//!
//! Control calls only act on a live engine. While detached they are dropped,
//! not queued; the restored engine resumes from the snapshot taken at detach
//! time.

use std::mem;
use std::sync::Arc;

use bridge_traits::{
    AudioAttributes, EngineConfig, EngineEnvelope, EngineEventSender, EngineFactory, MediaSource,
    PlaybackEngine, PlayerCallbacks, RepeatMode, SurfaceNotifier, SurfaceSignal,
    TrackSelectionParameters,
};
use core_runtime::config::RuntimeConfig;
use core_runtime::logging::redact_uri;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::binding::SurfaceBinder;
use crate::config::{SessionConfig, VideoPlayerOptions};
use crate::error::{PlaybackError, Result};
use crate::listener::{DefaultListenerFactory, EngineListener, ListenerFactory};
use crate::snapshot::PlaybackSnapshot;
use crate::tracks::{self, AudioTrack};

/// Externally visible lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// `create` has not been called yet.
    Uninitialized,
    /// An engine is bound to the surface, or engine creation failed.
    Attached,
    /// The surface is gone; only a snapshot is held.
    Detached,
    /// Terminal.
    Disposed,
}

struct LiveEngine {
    engine: Box<dyn PlaybackEngine>,
    listener: Box<dyn EngineListener>,
    generation: u64,
}

enum SessionState {
    Uninitialized,
    Live(LiveEngine),
    /// Engine creation failed during `create`. Controls are no-ops.
    Faulted,
    Detached(PlaybackSnapshot),
    Disposed,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Uninitialized => SessionPhase::Uninitialized,
            SessionState::Live(_) | SessionState::Faulted => SessionPhase::Attached,
            SessionState::Detached(_) => SessionPhase::Detached,
            SessionState::Disposed => SessionPhase::Disposed,
        }
    }
}

/// Playback-session state machine.
///
/// # Example
///
/// ```ignore
/// use core_playback::{PlaybackSession, ProviderSurfaceBinder, VideoPlayerOptions};
/// use bridge_traits::MediaSource;
///
/// let mut session = PlaybackSession::builder()
///     .engine_factory(factory)
///     .surface_binder(ProviderSurfaceBinder::new(surface_provider))
///     .callbacks(callbacks)
///     .build()?;
///
/// session.create(
///     MediaSource::network("https://cdn.example.com/movie.m3u8"),
///     VideoPlayerOptions::default(),
/// )?;
/// session.play();
/// ```
pub struct PlaybackSession {
    factory: Arc<dyn EngineFactory>,
    binder: Box<dyn SurfaceBinder>,
    listener_factory: Arc<dyn ListenerFactory>,
    callbacks: Arc<dyn PlayerCallbacks>,
    config: SessionConfig,
    media: Option<(MediaSource, VideoPlayerOptions)>,
    state: SessionState,
    generation: u64,
    /// `on_initialized` was delivered by a previous engine of this session.
    initialized: bool,
    event_tx: mpsc::UnboundedSender<EngineEnvelope>,
    event_rx: Option<mpsc::UnboundedReceiver<EngineEnvelope>>,
    surface_rx: Option<mpsc::UnboundedReceiver<SurfaceSignal>>,
}

impl PlaybackSession {
    pub fn builder() -> PlaybackSessionBuilder {
        PlaybackSessionBuilder::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn media_source(&self) -> Option<&MediaSource> {
        self.media.as_ref().map(|(source, _)| source)
    }

    pub fn options(&self) -> Option<&VideoPlayerOptions> {
        self.media.as_ref().map(|(_, options)| options)
    }

    /// Snapshot held while detached.
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        match &self.state {
            SessionState::Detached(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Generation of the live engine, if any.
    pub fn engine_generation(&self) -> Option<u64> {
        match &self.state {
            SessionState::Live(live) => Some(live.generation),
            _ => None,
        }
    }

    /// Load `source` into a new engine bound to the surface and start preparing it.
    ///
    /// Preparation is asynchronous; `on_initialized` follows once the engine
    /// reports a duration. If the engine cannot be built the failure is also
    /// reported once through `on_error` and the session stays attached
    /// without an engine.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::AlreadyCreated`] if called twice
    /// - [`PlaybackError::Disposed`] after disposal
    /// - [`PlaybackError::EngineCreation`] / [`PlaybackError::Surface`] if the
    ///   engine could not be built or bound
    #[instrument(skip(self, source, options), fields(uri = %redact_uri(&source.uri), kind = ?source.kind))]
    pub fn create(&mut self, source: MediaSource, options: VideoPlayerOptions) -> Result<()> {
        match self.state {
            SessionState::Uninitialized => {}
            SessionState::Disposed => return Err(PlaybackError::Disposed),
            _ => return Err(PlaybackError::AlreadyCreated),
        }

        self.media = Some((source, options));

        match self.build_engine(None) {
            Ok(live) => {
                info!(generation = live.generation, "Session created");
                self.state = SessionState::Live(live);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Engine creation failed");
                self.report_error(&err);
                self.state = SessionState::Faulted;
                Err(err)
            }
        }
    }

    /// The host surface is going away: snapshot, stop and release the engine.
    #[instrument(skip(self))]
    pub fn on_surface_destroyed(&mut self) {
        let state = mem::replace(&mut self.state, SessionState::Uninitialized);

        self.state = match state {
            SessionState::Live(live) => {
                let snapshot = PlaybackSnapshot::capture(live.engine.as_ref());
                self.initialized |= live.listener.is_initialized();
                let generation = live.generation;
                self.teardown(live);
                info!(
                    generation,
                    position_ms = snapshot.position_ms,
                    play_when_ready = snapshot.play_when_ready,
                    "Surface detached"
                );
                SessionState::Detached(snapshot)
            }
            other => {
                debug!(phase = ?other.phase(), "Surface destroyed without live engine");
                other
            }
        };
    }

    /// A host surface is available again: rebuild the engine from the snapshot.
    ///
    /// No-op unless the session is detached. On failure `on_error` is
    /// reported and the snapshot is kept for the next attempt.
    #[instrument(skip(self))]
    pub fn on_surface_created(&mut self) {
        let snapshot = match &self.state {
            SessionState::Detached(snapshot) => snapshot.clone(),
            other => {
                debug!(phase = ?other.phase(), "Surface created without snapshot");
                return;
            }
        };

        match self.build_engine(Some(&snapshot)) {
            Ok(live) => {
                info!(
                    generation = live.generation,
                    position_ms = snapshot.position_ms,
                    "Surface reattached"
                );
                self.state = SessionState::Live(live);
            }
            Err(err) => {
                error!(error = %err, "Engine rebuild failed; keeping snapshot");
                self.report_error(&err);
            }
        }
    }

    pub fn play(&mut self) {
        if let Some(engine) = self.live_engine("play") {
            engine.set_play_when_ready(true);
        }
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.live_engine("pause") {
            engine.set_play_when_ready(false);
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        if let Some(engine) = self.live_engine("set_looping") {
            engine.set_repeat_mode(if looping {
                RepeatMode::All
            } else {
                RepeatMode::Off
            });
        }
    }

    /// Set the volume, clamped to `[0.0, 1.0]`.
    pub fn set_volume(&mut self, volume: f64) {
        let clamped = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        if let Some(engine) = self.live_engine("set_volume") {
            engine.set_volume(clamped as f32);
        }
    }

    /// Forwarded as is; pitch and silence skipping stay at engine defaults.
    pub fn set_playback_speed(&mut self, speed: f64) {
        if let Some(engine) = self.live_engine("set_playback_speed") {
            engine.set_playback_speed(speed as f32);
        }
    }

    /// Seek to `position_ms`. Bounds are left to the engine.
    pub fn seek_to(&mut self, position_ms: u64) {
        if let Some(engine) = self.live_engine("seek_to") {
            engine.seek_to(position_ms);
        }
    }

    /// Current position in milliseconds.
    ///
    /// While detached this is the position captured at detach time; without
    /// media it is 0.
    pub fn get_position(&self) -> u64 {
        match &self.state {
            SessionState::Live(live) => live.engine.current_position(),
            SessionState::Detached(snapshot) => snapshot.position_ms,
            _ => 0,
        }
    }

    /// Report the engine's buffered position through `on_buffering_update`.
    pub fn send_buffering_update(&mut self) {
        if let SessionState::Live(live) = &self.state {
            self.callbacks
                .on_buffering_update(live.engine.buffered_position());
        }
    }

    /// Supported audio tracks in canonical order. Empty without a live engine.
    pub fn list_audio_tracks(&self) -> Vec<AudioTrack> {
        match &self.state {
            SessionState::Live(live) => live
                .engine
                .current_mapped_track_info()
                .map(|info| tracks::list_audio_tracks(&info))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Canonical index of the pinned audio track, if any.
    pub fn active_audio_track_index(&self) -> Option<usize> {
        let SessionState::Live(live) = &self.state else {
            return None;
        };
        let info = live.engine.current_mapped_track_info()?;
        tracks::active_audio_track_index(&live.engine.track_selection_parameters(), &info)
    }

    /// Pin the first supported audio track tagged `language`. Unknown tags are ignored.
    pub fn set_active_audio_track(&mut self, language: &str) {
        self.select_audio_track("set_active_audio_track", |info| {
            tracks::find_by_language(info, language)
        });
    }

    /// Pin the audio track at canonical `index`. Out-of-range indices are ignored.
    pub fn set_active_audio_track_by_index(&mut self, index: usize) {
        self.select_audio_track("set_active_audio_track_by_index", |info| {
            tracks::find_by_index(info, index)
        });
    }

    fn select_audio_track<F>(&mut self, operation: &'static str, find: F)
    where
        F: FnOnce(&bridge_traits::MappedTrackInfo) -> Option<bridge_traits::TrackSelectionOverride>,
    {
        let Some(engine) = self.live_engine(operation) else {
            return;
        };
        let Some(info) = engine.current_mapped_track_info() else {
            debug!(operation, "No track mapping yet; selection ignored");
            return;
        };
        let Some(selection) = find(&info) else {
            debug!(operation, "No matching audio track; selection ignored");
            return;
        };

        let parameters =
            tracks::apply_override(&engine.track_selection_parameters(), Some(&info), selection);
        engine.set_track_selection_parameters(parameters);
        debug!(
            operation,
            renderer = selection.renderer_index,
            group = selection.group_index,
            track = selection.track_index,
            "Audio track selected"
        );
    }

    /// Deliver one marshaled engine event.
    ///
    /// Events from released engines and anything after disposal are dropped.
    pub fn handle_engine_event(&mut self, envelope: EngineEnvelope) {
        let SessionState::Live(live) = &mut self.state else {
            trace!(generation = envelope.generation, "Dropping engine event without live engine");
            return;
        };

        if envelope.generation != live.generation {
            trace!(
                generation = envelope.generation,
                live_generation = live.generation,
                "Dropping stale engine event"
            );
            return;
        }

        live.listener
            .on_event(&envelope.event, live.engine.as_ref(), self.callbacks.as_ref());
    }

    /// Handle one surface lifecycle notification.
    pub fn handle_surface_signal(&mut self, signal: SurfaceSignal) {
        match signal {
            SurfaceSignal::Created => self.on_surface_created(),
            SurfaceSignal::Destroyed(ack) => {
                self.on_surface_destroyed();
                // The provider may have stopped waiting
                let _ = ack.send(());
            }
        }
    }

    /// Drain queued engine events and surface notifications on the caller's
    /// context. Returns the number of items processed.
    ///
    /// Only meaningful while the session still owns its receivers, i.e. when
    /// it is not running inside the driver.
    pub fn dispatch_pending_events(&mut self) -> usize {
        let mut processed = 0;

        loop {
            let mut progressed = false;

            loop {
                let next = self.event_rx.as_mut().and_then(|rx| rx.try_recv().ok());
                let Some(envelope) = next else {
                    break;
                };
                self.handle_engine_event(envelope);
                processed += 1;
                progressed = true;
            }

            let next = self.surface_rx.as_mut().and_then(|rx| rx.try_recv().ok());
            if let Some(signal) = next {
                self.handle_surface_signal(signal);
                processed += 1;
                progressed = true;
            }

            if !progressed {
                return processed;
            }
        }
    }

    /// Take the engine event receiver, leaving the caller responsible for
    /// feeding [`handle_engine_event`](Self::handle_engine_event).
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEnvelope>> {
        self.event_rx.take()
    }

    /// Take the surface signal receiver, leaving the caller responsible for
    /// feeding [`handle_surface_signal`](Self::handle_surface_signal).
    pub fn take_surface_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<SurfaceSignal>> {
        self.surface_rx.take()
    }

    /// Release the engine and the surface. Idempotent.
    ///
    /// Nothing reaches the callback sink afterwards.
    #[instrument(skip(self))]
    pub fn dispose(&mut self) {
        let state = mem::replace(&mut self.state, SessionState::Disposed);
        if let SessionState::Disposed = state {
            return;
        }

        if let SessionState::Live(live) = state {
            self.teardown(live);
        }

        self.binder.register(None);
        self.binder.release();

        if let Some(mut rx) = self.event_rx.take() {
            rx.close();
        }
        if let Some(mut rx) = self.surface_rx.take() {
            rx.close();
        }

        info!("Session disposed");
    }

    fn live_engine(&mut self, operation: &'static str) -> Option<&mut dyn PlaybackEngine> {
        match &mut self.state {
            SessionState::Live(live) => Some(live.engine.as_mut()),
            other => {
                debug!(operation, phase = ?other.phase(), "Ignoring control without live engine");
                None
            }
        }
    }

    fn report_error(&self, err: &PlaybackError) {
        self.callbacks
            .on_error(&self.config.error_code, &err.to_string());
    }

    fn build_engine(&mut self, snapshot: Option<&PlaybackSnapshot>) -> Result<LiveEngine> {
        let (source, options) = self
            .media
            .clone()
            .ok_or_else(|| PlaybackError::Internal("no media source".to_string()))?;

        let engine_config = EngineConfig {
            track_selection: TrackSelectionParameters::builder()
                .preferred_audio_language(options.preferred_audio_track.clone())
                .build(),
        };

        let mut engine = self
            .factory
            .create_engine(&source, &engine_config)
            .map_err(|e| PlaybackError::EngineCreation(e.to_string()))?;

        self.generation += 1;
        let generation = self.generation;

        if let Err(err) =
            self.configure_engine(engine.as_mut(), &source, &options, generation, snapshot)
        {
            self.binder.detach(engine.as_mut());
            if let Err(release_err) = engine.release() {
                warn!(error = %release_err, "Failed to release engine after setup error");
            }
            return Err(err);
        }

        let listener = self
            .listener_factory
            .make_listener(self.initialized, &self.config.error_code);

        debug!(generation, restored = snapshot.is_some(), "Engine built");

        Ok(LiveEngine {
            engine,
            listener,
            generation,
        })
    }

    fn configure_engine(
        &mut self,
        engine: &mut dyn PlaybackEngine,
        source: &MediaSource,
        options: &VideoPlayerOptions,
        generation: u64,
        snapshot: Option<&PlaybackSnapshot>,
    ) -> Result<()> {
        engine
            .set_media_source(source)
            .map_err(|e| PlaybackError::EngineCreation(e.to_string()))?;

        self.binder.attach(engine)?;

        engine.set_audio_attributes(AudioAttributes::movie(), options.handle_audio_focus());
        engine.add_listener(EngineEventSender::new(generation, self.event_tx.clone()));

        if let Some(snapshot) = snapshot {
            snapshot.restore(engine);
        }

        engine
            .prepare()
            .map_err(|e| PlaybackError::EngineCreation(e.to_string()))
    }

    fn teardown(&mut self, mut live: LiveEngine) {
        live.engine.stop();
        self.binder.detach(live.engine.as_mut());
        if let Err(err) = live.engine.release() {
            warn!(generation = live.generation, error = %err, "Engine release failed");
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if self.phase() != SessionPhase::Disposed {
            debug!("Session dropped without dispose");
            self.dispose();
        }
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("phase", &self.phase())
            .field("generation", &self.generation)
            .field("initialized", &self.initialized)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`PlaybackSession`].
#[derive(Default)]
pub struct PlaybackSessionBuilder {
    factory: Option<Arc<dyn EngineFactory>>,
    binder: Option<Box<dyn SurfaceBinder>>,
    listener_factory: Option<Arc<dyn ListenerFactory>>,
    callbacks: Option<Arc<dyn PlayerCallbacks>>,
    config: Option<SessionConfig>,
}

impl PlaybackSessionBuilder {
    /// Take the engine factory from the host runtime configuration.
    pub fn runtime(mut self, runtime: &RuntimeConfig) -> Self {
        self.factory = Some(Arc::clone(&runtime.engine_factory));
        self
    }

    pub fn engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn surface_binder(mut self, binder: impl SurfaceBinder + 'static) -> Self {
        self.binder = Some(Box::new(binder));
        self
    }

    /// Replace the default [`EventListenerAdapter`](crate::listener::EventListenerAdapter) factory.
    pub fn listener_factory(mut self, factory: Arc<dyn ListenerFactory>) -> Self {
        self.listener_factory = Some(factory);
        self
    }

    pub fn callbacks(mut self, callbacks: Arc<dyn PlayerCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the session and register it as the surface listener.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Config`] if a required collaborator is missing or the
    /// session config is invalid.
    pub fn build(self) -> Result<PlaybackSession> {
        let factory = self.factory.ok_or_else(|| {
            PlaybackError::Config(
                "EngineFactory is required. Use .engine_factory() or .runtime() to set it."
                    .to_string(),
            )
        })?;
        let mut binder = self.binder.ok_or_else(|| {
            PlaybackError::Config(
                "SurfaceBinder is required. Use .surface_binder() to set it.".to_string(),
            )
        })?;
        let callbacks = self.callbacks.ok_or_else(|| {
            PlaybackError::Config("PlayerCallbacks are required. Use .callbacks() to set them.".to_string())
        })?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (surface_tx, surface_rx) = mpsc::unbounded_channel();
        binder.register(Some(SurfaceNotifier::new(surface_tx)));

        Ok(PlaybackSession {
            factory,
            binder,
            listener_factory: self
                .listener_factory
                .unwrap_or_else(|| Arc::new(DefaultListenerFactory)),
            callbacks,
            config,
            media: None,
            state: SessionState::Uninitialized,
            generation: 0,
            initialized: false,
            event_tx,
            event_rx: Some(event_rx),
            surface_rx: Some(surface_rx),
        })
    }
}
