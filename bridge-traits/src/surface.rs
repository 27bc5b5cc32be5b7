//! Renderable surface bridge.
//!
//! Surfaces belong to the host's windowing/compositor layer. The core only
//! binds engine video output to them and must let go whenever the host tears
//! one down (app backgrounding, view recycling).
//!
//! Hosts announce surface lifecycle changes through a [`SurfaceNotifier`]. A
//! destroy notification hands back a [`DetachAck`] that resolves once the
//! session has finished detaching; providers should wait for it before
//! completing destruction.

use tokio::sync::{mpsc, oneshot};

use crate::{error::Result, platform::PlatformSendSync};

/// Opaque reference to a host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Surface lifecycle notification delivered to the session's control context.
#[derive(Debug)]
pub enum SurfaceSignal {
    Created,
    Destroyed(oneshot::Sender<()>),
}

/// Resolves when the session finished detaching from a destroyed surface.
pub type DetachAck = oneshot::Receiver<()>;

/// Channel a surface provider uses to notify its (single) session.
#[derive(Debug, Clone)]
pub struct SurfaceNotifier {
    tx: mpsc::UnboundedSender<SurfaceSignal>,
}

impl SurfaceNotifier {
    pub fn new(tx: mpsc::UnboundedSender<SurfaceSignal>) -> Self {
        Self { tx }
    }

    /// A new surface is available.
    pub fn surface_created(&self) -> bool {
        self.tx.send(SurfaceSignal::Created).is_ok()
    }

    /// The current surface is going away.
    ///
    /// Returns `None` if the session no longer listens, in which case there is
    /// nothing to wait for.
    pub fn surface_destroyed(&self) -> Option<DetachAck> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send(SurfaceSignal::Destroyed(ack_tx)).ok()?;
        Some(ack_rx)
    }
}

/// Host-side owner of the renderable surface.
pub trait SurfaceProvider: PlatformSendSync {
    /// The surface engines should render into right now.
    fn surface(&self) -> Result<SurfaceHandle>;

    /// Register the session as the sole lifecycle listener (`None` unregisters).
    fn set_listener(&self, notifier: Option<SurfaceNotifier>);

    /// Give the surface (texture entry) back to the host. Called once, on disposal.
    fn release(&self);
}
