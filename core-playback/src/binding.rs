//! Surface-binding strategy.
//!
//! The session does not own surfaces. It asks a [`SurfaceBinder`] to route an
//! engine's video output to whatever the host currently renders into, and to
//! let go again before the host tears the surface down.

use std::sync::Arc;

use bridge_traits::{platform::PlatformSend, PlaybackEngine, SurfaceNotifier, SurfaceProvider};
use tracing::debug;

use crate::error::{PlaybackError, Result};

/// Binds engines to the host surface.
pub trait SurfaceBinder: PlatformSend {
    /// Route `engine`'s video output to the current surface.
    fn attach(&mut self, engine: &mut dyn PlaybackEngine) -> Result<()>;

    /// Unbind `engine`'s video output. Must be safe to call on an engine that
    /// was never attached.
    fn detach(&mut self, engine: &mut dyn PlaybackEngine);

    /// Register (or with `None`, unregister) the session's surface notifier.
    fn register(&mut self, notifier: Option<SurfaceNotifier>);

    /// Hand the surface back to the host. Called once, on disposal.
    fn release(&mut self);
}

/// [`SurfaceBinder`] backed by a host [`SurfaceProvider`].
pub struct ProviderSurfaceBinder {
    provider: Arc<dyn SurfaceProvider>,
    released: bool,
}

impl ProviderSurfaceBinder {
    pub fn new(provider: Arc<dyn SurfaceProvider>) -> Self {
        Self {
            provider,
            released: false,
        }
    }
}

impl std::fmt::Debug for ProviderSurfaceBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSurfaceBinder")
            .field("provider", &"SurfaceProvider { ... }")
            .field("released", &self.released)
            .finish()
    }
}

impl SurfaceBinder for ProviderSurfaceBinder {
    fn attach(&mut self, engine: &mut dyn PlaybackEngine) -> Result<()> {
        if self.released {
            return Err(PlaybackError::Surface("surface already released".to_string()));
        }

        let surface = self.provider.surface()?;
        debug!(surface = surface.id(), "Binding video output");
        engine.set_video_surface(Some(surface));
        Ok(())
    }

    fn detach(&mut self, engine: &mut dyn PlaybackEngine) {
        engine.set_video_surface(None);
    }

    fn register(&mut self, notifier: Option<SurfaceNotifier>) {
        self.provider.set_listener(notifier);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.provider.release();
    }
}
