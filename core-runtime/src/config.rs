//! # Runtime Configuration
//!
//! Host-level configuration shared by every playback session.
//!
//! ## Overview
//!
//! [`RuntimeConfig`] carries the bridges and settings a host hands to the core
//! once at startup. It is assembled through [`RuntimeConfigBuilder`], which
//! validates eagerly: a missing engine factory or an out-of-range setting
//! fails at `build()` rather than at the first session.
//!
//! ## Required Dependencies
//!
//! - `EngineFactory` - builds the platform playback engines
//!
//! ## Optional Dependencies
//!
//! - `LoggerSink` - mirrors core logs into the host's logging pipeline
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::RuntimeConfig;
//! use std::sync::Arc;
//!
//! let config = RuntimeConfig::builder()
//!     .engine_factory(Arc::new(ExoPlayerFactory::new(context)))
//!     .event_buffer_size(256)
//!     .build()?;
//!
//! config.init_logging()?;
//! let bus = config.event_bus();
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::RuntimeConfig;
//!
//! // No engine factory: fails with Error::CapabilityMissing
//! let config = RuntimeConfig::builder()
//!     .build()
//!     .expect("Should fail - missing engine factory");
//! ```

use crate::error::{Error, Result};
use crate::events::{EventBus, DEFAULT_EVENT_BUFFER_SIZE};
use crate::logging::{init_logging, LoggingConfig};
use bridge_traits::{EngineFactory, LoggerSink};
use std::sync::Arc;

/// Upper bound for the event bus buffer.
pub const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Host-level configuration for the playback core.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Factory for platform playback engines (required)
    pub engine_factory: Arc<dyn EngineFactory>,

    /// Host logger sink (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    pub logging: LoggingConfig,

    /// Per-subscriber buffer of the session event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("engine_factory", &"EngineFactory { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("logging", &self.logging)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }

    /// Install the global tracing subscriber described by this config.
    ///
    /// The configured `LoggerSink` takes precedence over one set directly on
    /// [`LoggingConfig`].
    pub fn init_logging(&self) -> Result<()> {
        let mut logging = self.logging.clone();
        if let Some(sink) = &self.logger_sink {
            logging = logging.with_logger_sink(Arc::clone(sink));
        }
        init_logging(logging)
    }

    /// A fresh event bus sized per this config.
    pub fn event_bus(&self) -> EventBus {
        EventBus::new(self.event_buffer_size)
    }
}

fn engine_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "EngineFactory".to_string(),
        message: "EngineFactory implementation is required to build playback engines. \
                 Android: inject an ExoPlayer-backed factory. \
                 iOS: inject an AVPlayer-backed factory. \
                 Desktop: inject a GStreamer or mpv-backed factory."
            .to_string(),
    }
}

/// Builder for [`RuntimeConfig`].
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    engine_factory: Option<Arc<dyn EngineFactory>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    logging: Option<LoggingConfig>,
    event_buffer_size: Option<usize>,
}

impl RuntimeConfigBuilder {
    pub fn engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Sets the event bus buffer size (`1..=10_000`, default 100).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] if no engine factory was provided
    /// - [`Error::Config`] if a setting is out of range
    pub fn build(self) -> Result<RuntimeConfig> {
        let engine_factory = self
            .engine_factory
            .ok_or_else(engine_factory_missing_error)?;

        let config = RuntimeConfig {
            engine_factory,
            logger_sink: self.logger_sink,
            logging: self.logging.unwrap_or_default(),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
