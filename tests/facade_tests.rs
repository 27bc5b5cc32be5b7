//! Facade re-export tests

use video_session::{PlaybackError, PlaybackSession, SessionConfig, SessionPhase};

#[test]
fn test_session_builder_through_facade() {
    let err = PlaybackSession::builder().build().unwrap_err();
    assert!(matches!(err, PlaybackError::Config(_)));
    assert_eq!(SessionConfig::default().command_buffer, 64);
    assert_ne!(SessionPhase::Attached, SessionPhase::Detached);
}

#[cfg(feature = "driver")]
#[test]
fn test_driver_follows_facade_feature() {
    assert!(cfg!(feature = "driver"));
    let _spawn: fn(PlaybackSession) -> video_session::SessionHandle = video_session::spawn_session;
}
