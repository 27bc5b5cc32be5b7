//! Shared test doubles for core-playback integration tests.
//!
//! Engines keep their state behind `parking_lot::Mutex` so a test can keep
//! inspecting (and driving) an engine after the session took ownership of it.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioAttributes, BridgeError, EngineConfig, EngineEvent, EngineEventSender, EngineFactory,
    MappedRenderer, MappedTrack, MappedTrackGroup, MappedTrackInfo, MediaSource, PlaybackEngine,
    PlayerCallbacks, RepeatMode, SurfaceHandle, SurfaceNotifier, SurfaceProvider, TrackFormat,
    TrackSelectionParameters, TrackSupport, TrackType, VideoSize,
};
use core_playback::{PlaybackSession, ProviderSurfaceBinder, SessionConfig};
use mockall::mock;
use parking_lot::Mutex;

// ============================================================================
// Fake engine
// ============================================================================

#[derive(Debug, Clone)]
pub struct EngineState {
    pub media_source: Option<MediaSource>,
    pub config: EngineConfig,
    pub prepared: bool,
    pub surface: Option<SurfaceHandle>,
    pub audio_attributes: Option<(AudioAttributes, bool)>,
    pub sender: Option<EngineEventSender>,
    pub play_when_ready: bool,
    pub position_ms: u64,
    pub buffered_ms: u64,
    pub duration_ms: Option<u64>,
    pub video_size: VideoSize,
    pub volume: f32,
    pub speed: f32,
    pub repeat_mode: RepeatMode,
    pub track_info: Option<MappedTrackInfo>,
    pub parameters: TrackSelectionParameters,
    pub stopped: bool,
    pub released: bool,
    pub fail_prepare: bool,
    pub fail_release: bool,
    /// Names of mutating calls, in order.
    pub calls: Vec<&'static str>,
}

impl EngineState {
    fn new(template: &EngineTemplate, config: &EngineConfig) -> Self {
        Self {
            media_source: None,
            config: config.clone(),
            prepared: false,
            surface: None,
            audio_attributes: None,
            sender: None,
            play_when_ready: false,
            position_ms: 0,
            buffered_ms: template.buffered_ms,
            duration_ms: template.duration_ms,
            video_size: template.video_size,
            volume: 1.0,
            speed: 1.0,
            repeat_mode: RepeatMode::Off,
            track_info: template.track_info.clone(),
            parameters: config.track_selection.clone(),
            stopped: false,
            released: false,
            fail_prepare: template.fail_prepare,
            fail_release: template.fail_release,
            calls: Vec::new(),
        }
    }

    pub fn call_index(&self, name: &str) -> Option<usize> {
        self.calls.iter().position(|c| *c == name)
    }
}

/// Test-side view of an engine owned by the session.
#[derive(Debug, Clone)]
pub struct EngineProbe {
    state: Arc<Mutex<EngineState>>,
}

impl EngineProbe {
    pub fn state(&self) -> EngineState {
        self.state.lock().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut EngineState)) {
        f(&mut self.state.lock());
    }

    /// Publish an event the way an engine thread would.
    pub fn emit(&self, event: EngineEvent) -> bool {
        let sender = self.state.lock().sender.clone();
        sender.map(|s| s.send(event)).unwrap_or(false)
    }

    pub fn generation(&self) -> Option<u64> {
        self.state.lock().sender.as_ref().map(|s| s.generation())
    }
}

pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    fn record(&self, call: &'static str) -> parking_lot::MutexGuard<'_, EngineState> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state
    }
}

impl PlaybackEngine for FakeEngine {
    fn set_media_source(&mut self, source: &MediaSource) -> BridgeResult<()> {
        self.record("set_media_source").media_source = Some(source.clone());
        Ok(())
    }

    fn prepare(&mut self) -> BridgeResult<()> {
        let mut state = self.record("prepare");
        if state.fail_prepare {
            return Err(BridgeError::OperationFailed("prepare failed".to_string()));
        }
        state.prepared = true;
        Ok(())
    }

    fn set_video_surface(&mut self, surface: Option<SurfaceHandle>) {
        self.record("set_video_surface").surface = surface;
    }

    fn set_audio_attributes(&mut self, attributes: AudioAttributes, handle_audio_focus: bool) {
        self.record("set_audio_attributes").audio_attributes =
            Some((attributes, handle_audio_focus));
    }

    fn add_listener(&mut self, sender: EngineEventSender) {
        self.record("add_listener").sender = Some(sender);
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.record("set_play_when_ready").play_when_ready = play_when_ready;
    }

    fn play_when_ready(&self) -> bool {
        self.state.lock().play_when_ready
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.record("seek_to").position_ms = position_ms;
    }

    fn current_position(&self) -> u64 {
        self.state.lock().position_ms
    }

    fn buffered_position(&self) -> u64 {
        self.state.lock().buffered_ms
    }

    fn duration(&self) -> Option<u64> {
        self.state.lock().duration_ms
    }

    fn video_size(&self) -> VideoSize {
        self.state.lock().video_size
    }

    fn set_volume(&mut self, volume: f32) {
        self.record("set_volume").volume = volume;
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn set_playback_speed(&mut self, speed: f32) {
        self.record("set_playback_speed").speed = speed;
    }

    fn playback_speed(&self) -> f32 {
        self.state.lock().speed
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.record("set_repeat_mode").repeat_mode = mode;
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().repeat_mode
    }

    fn current_mapped_track_info(&self) -> Option<MappedTrackInfo> {
        let state = self.state.lock();
        if state.prepared {
            state.track_info.clone()
        } else {
            None
        }
    }

    fn track_selection_parameters(&self) -> TrackSelectionParameters {
        self.state.lock().parameters.clone()
    }

    fn set_track_selection_parameters(&mut self, parameters: TrackSelectionParameters) {
        self.record("set_track_selection_parameters").parameters = parameters;
    }

    fn stop(&mut self) {
        self.record("stop").stopped = true;
    }

    fn release(&mut self) -> BridgeResult<()> {
        let mut state = self.record("release");
        state.released = true;
        state.sender = None;
        if state.fail_release {
            return Err(BridgeError::EngineReleased);
        }
        Ok(())
    }
}

// ============================================================================
// Fake factory
// ============================================================================

/// What every engine built by [`FakeFactory`] starts with.
#[derive(Debug, Clone)]
pub struct EngineTemplate {
    pub track_info: Option<MappedTrackInfo>,
    pub duration_ms: Option<u64>,
    pub buffered_ms: u64,
    pub video_size: VideoSize,
    pub fail_prepare: bool,
    pub fail_release: bool,
}

impl Default for EngineTemplate {
    fn default() -> Self {
        Self {
            track_info: Some(en_und_tracks()),
            duration_ms: Some(120_000),
            buffered_ms: 0,
            video_size: VideoSize::new(1920, 1080, 0),
            fail_prepare: false,
            fail_release: false,
        }
    }
}

#[derive(Default)]
pub struct FakeFactory {
    pub template: Mutex<EngineTemplate>,
    engines: Mutex<Vec<EngineProbe>>,
    fail_creations: AtomicUsize,
}

impl FakeFactory {
    pub fn with_template(template: EngineTemplate) -> Self {
        Self {
            template: Mutex::new(template),
            ..Self::default()
        }
    }

    /// Fail the next `count` creations.
    pub fn fail_next(&self, count: usize) {
        self.fail_creations.store(count, Ordering::SeqCst);
    }

    pub fn engines(&self) -> Vec<EngineProbe> {
        self.engines.lock().clone()
    }

    pub fn created(&self) -> usize {
        self.engines.lock().len()
    }

    pub fn latest(&self) -> EngineProbe {
        self.engines
            .lock()
            .last()
            .cloned()
            .expect("no engine built yet")
    }
}

impl EngineFactory for FakeFactory {
    fn create_engine(
        &self,
        _source: &MediaSource,
        config: &EngineConfig,
    ) -> BridgeResult<Box<dyn PlaybackEngine>> {
        let remaining = self.fail_creations.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_creations.store(remaining - 1, Ordering::SeqCst);
            return Err(BridgeError::NotAvailable("no decoder for media".to_string()));
        }

        let state = Arc::new(Mutex::new(EngineState::new(&self.template.lock(), config)));
        self.engines.lock().push(EngineProbe {
            state: Arc::clone(&state),
        });
        Ok(Box::new(FakeEngine { state }))
    }
}

// ============================================================================
// Fake surface provider
// ============================================================================

#[derive(Default)]
pub struct FakeSurfaceProvider {
    next_id: AtomicU64,
    listener: Mutex<Option<SurfaceNotifier>>,
    released: AtomicBool,
    unavailable: AtomicBool,
}

impl FakeSurfaceProvider {
    pub fn notifier(&self) -> Option<SurfaceNotifier> {
        self.listener.lock().clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl SurfaceProvider for FakeSurfaceProvider {
    fn surface(&self) -> BridgeResult<SurfaceHandle> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BridgeError::SurfaceUnavailable("texture destroyed".to_string()));
        }
        Ok(SurfaceHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn set_listener(&self, notifier: Option<SurfaceNotifier>) {
        *self.listener.lock() = notifier;
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Callback sinks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Initialized(u64, u32, u32, u32),
    Completed,
    BufferingUpdate(u64),
    BufferingStart,
    BufferingEnd,
    Error(String, String),
    IsPlaying(bool),
    VideoSize(u32, u32, u32),
}

#[derive(Default)]
pub struct RecordingCallbacks {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingCallbacks {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Recorded) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().push(event);
    }
}

impl PlayerCallbacks for RecordingCallbacks {
    fn on_initialized(&self, duration_ms: u64, width: u32, height: u32, rotation_degrees: u32) {
        self.push(Recorded::Initialized(duration_ms, width, height, rotation_degrees));
    }

    fn on_completed(&self) {
        self.push(Recorded::Completed);
    }

    fn on_buffering_update(&self, buffered_position_ms: u64) {
        self.push(Recorded::BufferingUpdate(buffered_position_ms));
    }

    fn on_buffering_start(&self) {
        self.push(Recorded::BufferingStart);
    }

    fn on_buffering_end(&self) {
        self.push(Recorded::BufferingEnd);
    }

    fn on_error(&self, code: &str, message: &str) {
        self.push(Recorded::Error(code.to_string(), message.to_string()));
    }

    fn on_is_playing_state_update(&self, is_playing: bool) {
        self.push(Recorded::IsPlaying(is_playing));
    }

    fn on_video_size_changed(&self, width: u32, height: u32, rotation_degrees: u32) {
        self.push(Recorded::VideoSize(width, height, rotation_degrees));
    }
}

mock! {
    pub Callbacks {}
    impl PlayerCallbacks for Callbacks {
        fn on_initialized(&self, duration_ms: u64, width: u32, height: u32, rotation_degrees: u32);
        fn on_completed(&self);
        fn on_buffering_update(&self, buffered_position_ms: u64);
        fn on_buffering_start(&self);
        fn on_buffering_end(&self);
        fn on_error(&self, code: &str, message: &str);
        fn on_is_playing_state_update(&self, is_playing: bool);
        fn on_video_size_changed(&self, width: u32, height: u32, rotation_degrees: u32);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn audio_track(language: Option<&str>) -> MappedTrack {
    let format = match language {
        Some(tag) => TrackFormat::with_language(tag),
        None => TrackFormat::untagged(),
    };
    MappedTrack::new(format, TrackSupport::Handled)
}

/// Video renderer at index 0, then one audio group with an "en" and an
/// untagged track.
pub fn en_und_tracks() -> MappedTrackInfo {
    MappedTrackInfo::new(vec![
        MappedRenderer::new(
            TrackType::Video,
            vec![MappedTrackGroup::new(vec![MappedTrack::new(
                TrackFormat::untagged(),
                TrackSupport::Handled,
            )])],
        ),
        MappedRenderer::new(
            TrackType::Audio,
            vec![MappedTrackGroup::new(vec![
                audio_track(Some("en")),
                audio_track(None),
            ])],
        ),
    ])
}

/// Two audio renderers with one track each: "en" on renderer 0, "de" on
/// renderer 1.
pub fn split_audio_renderers() -> MappedTrackInfo {
    MappedTrackInfo::new(vec![
        MappedRenderer::new(
            TrackType::Audio,
            vec![MappedTrackGroup::new(vec![audio_track(Some("en"))])],
        ),
        MappedRenderer::new(
            TrackType::Audio,
            vec![MappedTrackGroup::new(vec![audio_track(Some("de"))])],
        ),
    ])
}

pub fn single_untagged_track() -> MappedTrackInfo {
    MappedTrackInfo::new(vec![MappedRenderer::new(
        TrackType::Audio,
        vec![MappedTrackGroup::new(vec![audio_track(None)])],
    )])
}

pub fn movie() -> MediaSource {
    MediaSource::network("https://cdn.example.com/movie/master.m3u8?token=secret")
}

pub struct Harness {
    pub session: PlaybackSession,
    pub factory: Arc<FakeFactory>,
    pub provider: Arc<FakeSurfaceProvider>,
    pub callbacks: Arc<RecordingCallbacks>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_template(EngineTemplate::default())
    }

    pub fn with_template(template: EngineTemplate) -> Self {
        Self::build(template, SessionConfig::default())
    }

    pub fn build(template: EngineTemplate, config: SessionConfig) -> Self {
        let factory = Arc::new(FakeFactory::with_template(template));
        let provider = Arc::new(FakeSurfaceProvider::default());
        let callbacks = Arc::new(RecordingCallbacks::default());

        let session = PlaybackSession::builder()
            .engine_factory(factory.clone())
            .surface_binder(ProviderSurfaceBinder::new(provider.clone()))
            .callbacks(callbacks.clone())
            .config(config)
            .build()
            .expect("session builds");

        Self {
            session,
            factory,
            provider,
            callbacks,
        }
    }

    /// `create` with default options, then report the engine ready.
    pub fn create_ready(&mut self) -> EngineProbe {
        self.session
            .create(movie(), Default::default())
            .expect("create succeeds");
        let engine = self.factory.latest();
        engine.emit(EngineEvent::PlaybackStateChanged(
            bridge_traits::PlaybackState::Ready,
        ));
        self.session.dispatch_pending_events();
        engine
    }
}
