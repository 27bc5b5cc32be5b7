//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the playback-session core:
//! - Logging and tracing infrastructure
//! - Runtime configuration with fail-fast capability checks
//! - Host event bus carrying session events to the UI layer
//!
//! ## Overview
//!
//! `core-playback` depends on this crate for its ambient concerns. Hosts
//! build a [`RuntimeConfig`](config::RuntimeConfig) once at startup, initialise
//! logging from it, and hand its engine factory to every session they create.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
