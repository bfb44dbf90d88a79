//! Unit tests for config.rs

use crate::config::{RenderCoreConfig, MAX_DENSE_STATE_IDS};
use crate::error::Error;
use crate::log::LogSeverity;

#[test]
fn test_default_config_is_valid() {
    let config = RenderCoreConfig::default();
    assert_eq!(config.max_state_ids, 1024);
    assert_eq!(config.max_in_flight_frames, 1);
    assert_eq!(config.frame_arena_capacity, 64 * 1024);
    assert_eq!(config.debug_checks, cfg!(debug_assertions));
    assert!(config.validate().is_ok());
}

#[test]
fn test_builders_chain() {
    let config = RenderCoreConfig::default()
        .with_max_state_ids(16)
        .with_debug_checks(false)
        .with_frame_arena_capacity(128)
        .with_max_in_flight_frames(3)
        .with_log_min_severity(LogSeverity::Warn);

    assert_eq!(config.max_state_ids, 16);
    assert!(!config.debug_checks);
    assert_eq!(config.frame_arena_capacity, 128);
    assert_eq!(config.max_in_flight_frames, 3);
    assert_eq!(config.log_min_severity, Some(LogSeverity::Warn));
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_state_ids_rejected() {
    let config = RenderCoreConfig::default().with_max_state_ids(0);
    assert!(matches!(config.validate(), Err(Error::InitializationFailed(_))));
}

#[test]
fn test_state_ids_above_ten_bits_rejected() {
    let config = RenderCoreConfig::default().with_max_state_ids(MAX_DENSE_STATE_IDS + 1);
    assert!(matches!(config.validate(), Err(Error::InitializationFailed(_))));
}

#[test]
fn test_zero_in_flight_frames_rejected() {
    let config = RenderCoreConfig::default().with_max_in_flight_frames(0);
    let err = config.validate().unwrap_err();
    assert!(format!("{}", err).contains("max_in_flight_frames"));
}
