//! # Session Event Bus
//!
//! Fan-out of playback-session events using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! A session reports to exactly one [`PlayerCallbacks`] sink. Hosts that want
//! several independent observers (UI, analytics, logging) plug an
//! [`EventBusCallbacks`] in as that sink; it converts every callback into a
//! [`SessionEvent`] and publishes it on an [`EventBus`].
//!
//! ```text
//! ┌──────────┐ callbacks ┌──────────────────┐  emit  ┌──────────┐ subscribe ┌────────────┐
//! │ Session  ├──────────>│ EventBusCallbacks├───────>│ EventBus ├──────────>│ Subscriber │
//! └──────────┘           └──────────────────┘        └──────────┘           └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, EventBusCallbacks, PlayerEvent, SessionId};
//! use bridge_traits::PlayerCallbacks;
//!
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! let callbacks = EventBusCallbacks::new(SessionId::new(), bus.clone());
//! callbacks.on_buffering_start();
//!
//! let received = stream.try_recv().unwrap().unwrap();
//! assert_eq!(received.event, PlayerEvent::BufferingStart);
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal.
//! - **`RecvError::Closed`**: the bus was dropped. Treat as shutdown.

use bridge_traits::PlayerCallbacks;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Identifies one playback session on a shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A callback delivered by a session, in wire-friendly form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlayerEvent {
    #[serde(rename_all = "camelCase")]
    Initialized {
        duration_ms: u64,
        width: u32,
        height: u32,
        rotation_degrees: u32,
    },
    Completed,
    #[serde(rename_all = "camelCase")]
    BufferingUpdate { buffered_position_ms: u64 },
    BufferingStart,
    BufferingEnd,
    #[serde(rename_all = "camelCase")]
    IsPlayingStateUpdate { is_playing: bool },
    #[serde(rename_all = "camelCase")]
    VideoSizeChanged {
        width: u32,
        height: u32,
        rotation_degrees: u32,
    },
    Error { code: String, message: String },
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::Initialized { .. } => "Media initialized",
            PlayerEvent::Completed => "Playback completed",
            PlayerEvent::BufferingUpdate { .. } => "Buffered position updated",
            PlayerEvent::BufferingStart => "Buffering started",
            PlayerEvent::BufferingEnd => "Buffering ended",
            PlayerEvent::IsPlayingStateUpdate { .. } => "Playing state changed",
            PlayerEvent::VideoSizeChanged { .. } => "Video size changed",
            PlayerEvent::Error { .. } => "Playback error",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Error { .. } => EventSeverity::Error,
            PlayerEvent::Initialized { .. } | PlayerEvent::Completed => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// A [`PlayerEvent`] attributed to the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub event: PlayerEvent,
}

impl SessionEvent {
    pub fn new(session_id: SessionId, event: PlayerEvent) -> Self {
        Self { session_id, event }
    }
}

/// Central broadcast channel for session events.
///
/// Cloning the bus is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`RuntimeConfig`](crate::config::RuntimeConfig)
    /// validates the configured size before it reaches here.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if nobody is listening.
    pub fn emit(&self, event: SessionEvent) -> Result<usize, SendError<SessionEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&SessionEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventSeverity, SessionId};
///
/// let bus = EventBus::new(16);
/// let session = SessionId::new();
/// let errors_only = bus
///     .subscribe()
///     .filter(move |e| e.session_id == session && e.event.severity() == EventSeverity::Error);
/// ```
pub struct EventStream {
    receiver: Receiver<SessionEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<SessionEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SessionEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &SessionEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<SessionEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently queued.
    pub fn try_recv(&mut self) -> Option<Result<SessionEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

/// [`PlayerCallbacks`] sink that republishes every callback on an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventBusCallbacks {
    session_id: SessionId,
    bus: EventBus,
}

impl EventBusCallbacks {
    pub fn new(session_id: SessionId, bus: EventBus) -> Self {
        Self { session_id, bus }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn publish(&self, event: PlayerEvent) {
        let severity = event.severity();
        let description = event.description().to_string();
        if self.bus.emit(SessionEvent::new(self.session_id, event)).is_err() {
            // Nobody subscribed yet; events are not buffered for late subscribers.
            tracing::trace!(
                session_id = %self.session_id,
                ?severity,
                "{} dropped: no subscribers",
                description
            );
        }
    }
}

impl PlayerCallbacks for EventBusCallbacks {
    fn on_initialized(&self, duration_ms: u64, width: u32, height: u32, rotation_degrees: u32) {
        self.publish(PlayerEvent::Initialized {
            duration_ms,
            width,
            height,
            rotation_degrees,
        });
    }

    fn on_completed(&self) {
        self.publish(PlayerEvent::Completed);
    }

    fn on_buffering_update(&self, buffered_position_ms: u64) {
        self.publish(PlayerEvent::BufferingUpdate {
            buffered_position_ms,
        });
    }

    fn on_buffering_start(&self) {
        self.publish(PlayerEvent::BufferingStart);
    }

    fn on_buffering_end(&self) {
        self.publish(PlayerEvent::BufferingEnd);
    }

    fn on_error(&self, code: &str, message: &str) {
        self.publish(PlayerEvent::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    fn on_is_playing_state_update(&self, is_playing: bool) {
        self.publish(PlayerEvent::IsPlayingStateUpdate { is_playing });
    }

    fn on_video_size_changed(&self, width: u32, height: u32, rotation_degrees: u32) {
        self.publish(PlayerEvent::VideoSizeChanged {
            width,
            height,
            rotation_degrees,
        });
    }
}
