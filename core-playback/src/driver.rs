//! # Session Driver
//!
//! Runs a [`PlaybackSession`] inside a tokio task that acts as its single
//! control context.
//!
//! The task multiplexes host commands, engine events, surface notifications
//! and an optional buffering-report tick. Hosts talk to it through a cloneable
//! [`SessionHandle`].
//!
//! ```text
//!  SessionHandle ──commands──┐
//!  engine threads ──events───┤
//!  SurfaceNotifier ─signals──┼──> select! loop ──> PlaybackSession ──> PlayerCallbacks
//!  interval ───────ticks─────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let handle = spawn_session(session);
//! handle.create(MediaSource::asset("intro.mp4"), VideoPlayerOptions::default()).await?;
//! handle.play().await?;
//!
//! // Surface provider teardown path
//! handle.surface_destroyed().await?;
//!
//! handle.dispose().await?;
//! ```

use std::future;
use std::time::Duration;

use bridge_traits::{EngineEnvelope, MediaSource, SurfaceSignal};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::VideoPlayerOptions;
use crate::error::{PlaybackError, Result};
use crate::session::{PlaybackSession, SessionPhase};
use crate::tracks::AudioTrack;

/// Message sent from a [`SessionHandle`] to the driver task.
#[derive(Debug)]
pub enum SessionCommand {
    Create {
        source: MediaSource,
        options: VideoPlayerOptions,
        reply: oneshot::Sender<Result<()>>,
    },
    Play,
    Pause,
    SetLooping(bool),
    SetVolume(f64),
    SetPlaybackSpeed(f64),
    SeekTo(u64),
    SetActiveAudioTrack(String),
    SetActiveAudioTrackByIndex(usize),
    SendBufferingUpdate,
    GetPosition(oneshot::Sender<u64>),
    ListAudioTracks(oneshot::Sender<Vec<AudioTrack>>),
    ActiveAudioTrackIndex(oneshot::Sender<Option<usize>>),
    Phase(oneshot::Sender<SessionPhase>),
    SurfaceCreated,
    SurfaceDestroyed(oneshot::Sender<()>),
    Dispose(oneshot::Sender<()>),
}

/// Cloneable handle to a session running in its driver task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(make(reply)).await?;
        response.await.map_err(|_| PlaybackError::SessionClosed)
    }

    /// Returns `true` once the driver task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub async fn create(&self, source: MediaSource, options: VideoPlayerOptions) -> Result<()> {
        self.request(|reply| SessionCommand::Create {
            source,
            options,
            reply,
        })
        .await?
    }

    pub async fn play(&self) -> Result<()> {
        self.send(SessionCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn set_looping(&self, looping: bool) -> Result<()> {
        self.send(SessionCommand::SetLooping(looping)).await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.send(SessionCommand::SetVolume(volume)).await
    }

    pub async fn set_playback_speed(&self, speed: f64) -> Result<()> {
        self.send(SessionCommand::SetPlaybackSpeed(speed)).await
    }

    pub async fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.send(SessionCommand::SeekTo(position_ms)).await
    }

    pub async fn set_active_audio_track(&self, language: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::SetActiveAudioTrack(language.into()))
            .await
    }

    pub async fn set_active_audio_track_by_index(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::SetActiveAudioTrackByIndex(index))
            .await
    }

    pub async fn send_buffering_update(&self) -> Result<()> {
        self.send(SessionCommand::SendBufferingUpdate).await
    }

    pub async fn get_position(&self) -> Result<u64> {
        self.request(SessionCommand::GetPosition).await
    }

    pub async fn list_audio_tracks(&self) -> Result<Vec<AudioTrack>> {
        self.request(SessionCommand::ListAudioTracks).await
    }

    pub async fn active_audio_track_index(&self) -> Result<Option<usize>> {
        self.request(SessionCommand::ActiveAudioTrackIndex).await
    }

    pub async fn phase(&self) -> Result<SessionPhase> {
        self.request(SessionCommand::Phase).await
    }

    pub async fn surface_created(&self) -> Result<()> {
        self.send(SessionCommand::SurfaceCreated).await
    }

    /// Resolves once the engine has been detached and released.
    pub async fn surface_destroyed(&self) -> Result<()> {
        self.request(SessionCommand::SurfaceDestroyed).await
    }

    /// Resolves once the session is disposed. Later calls on any clone of
    /// this handle return [`PlaybackError::SessionClosed`].
    pub async fn dispose(&self) -> Result<()> {
        self.request(SessionCommand::Dispose).await
    }
}

/// Move `session` into a new tokio task and return a handle to it.
///
/// The command buffer and buffering-update interval come from the session's
/// own [`SessionConfig`], which the builder already validated.
///
/// Must be called from within a tokio runtime. If every handle is dropped the
/// task disposes the session and exits.
pub fn spawn_session(mut session: PlaybackSession) -> SessionHandle {
    let config = session.config();
    let (commands, command_rx) = mpsc::channel(config.command_buffer);
    let ticker = config.buffering_update_interval.map(buffering_ticker);
    let events = session.take_event_receiver();
    let surfaces = session.take_surface_receiver();

    tokio::spawn(run_session(session, command_rx, events, surfaces, ticker));

    SessionHandle { commands }
}

fn buffering_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn recv_or_pending<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

async fn tick_or_pending(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => future::pending().await,
    }
}

async fn run_session(
    mut session: PlaybackSession,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut events: Option<mpsc::UnboundedReceiver<EngineEnvelope>>,
    mut surfaces: Option<mpsc::UnboundedReceiver<SurfaceSignal>>,
    mut ticker: Option<Interval>,
) {
    debug!("Session driver started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    info!("All session handles dropped; disposing");
                    session.dispose();
                    break;
                };

                if let SessionCommand::Dispose(reply) = command {
                    // Refuse further commands before acknowledging
                    commands.close();
                    session.dispose();
                    let _ = reply.send(());
                    break;
                }

                apply_command(&mut session, command);
            }
            envelope = recv_or_pending(&mut events) => {
                match envelope {
                    Some(envelope) => session.handle_engine_event(envelope),
                    None => events = None,
                }
            }
            signal = recv_or_pending(&mut surfaces) => {
                match signal {
                    Some(signal) => session.handle_surface_signal(signal),
                    None => {
                        debug!("Surface notifier dropped");
                        surfaces = None;
                    }
                }
            }
            _ = tick_or_pending(&mut ticker) => {
                session.send_buffering_update();
            }
        }
    }

    debug!("Session driver stopped");
}

fn apply_command(session: &mut PlaybackSession, command: SessionCommand) {
    match command {
        SessionCommand::Create {
            source,
            options,
            reply,
        } => {
            let _ = reply.send(session.create(source, options));
        }
        SessionCommand::Play => session.play(),
        SessionCommand::Pause => session.pause(),
        SessionCommand::SetLooping(looping) => session.set_looping(looping),
        SessionCommand::SetVolume(volume) => session.set_volume(volume),
        SessionCommand::SetPlaybackSpeed(speed) => session.set_playback_speed(speed),
        SessionCommand::SeekTo(position_ms) => session.seek_to(position_ms),
        SessionCommand::SetActiveAudioTrack(language) => session.set_active_audio_track(&language),
        SessionCommand::SetActiveAudioTrackByIndex(index) => {
            session.set_active_audio_track_by_index(index)
        }
        SessionCommand::SendBufferingUpdate => session.send_buffering_update(),
        SessionCommand::GetPosition(reply) => {
            let _ = reply.send(session.get_position());
        }
        SessionCommand::ListAudioTracks(reply) => {
            let _ = reply.send(session.list_audio_tracks());
        }
        SessionCommand::ActiveAudioTrackIndex(reply) => {
            let _ = reply.send(session.active_audio_track_index());
        }
        SessionCommand::Phase(reply) => {
            let _ = reply.send(session.phase());
        }
        SessionCommand::SurfaceCreated => session.on_surface_created(),
        SessionCommand::SurfaceDestroyed(ack) => {
            session.on_surface_destroyed();
            let _ = ack.send(());
        }
        SessionCommand::Dispose(reply) => {
            session.dispose();
            let _ = reply.send(());
        }
    }
}
