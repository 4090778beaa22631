use tempfile::tempdir;

use super::*;

#[test]
fn load_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let config = DaemonConfig::load(&path).unwrap();

    assert_eq!(config.tuner_slots, vec![0, 1, 2, 3]);
    assert_eq!(config.lease_ttl_secs, 30);
}

#[test]
fn load_parses_partial_toml_over_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        tuner_slots = [0, 1]
        pipeline_binary = "ffmpeg"
        "#,
    )
    .unwrap();

    let config = DaemonConfig::load(&path).unwrap();

    assert_eq!(config.tuner_slots, vec![0, 1]);
    assert_eq!(config.pipeline_binary, "ffmpeg");
    // Untouched fields keep their defaults.
    assert_eq!(config.lease_ttl_secs, 30);
    assert_eq!(config.sweeper.interval_secs, 60);
}

#[test]
fn load_rejects_malformed_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "not valid toml {{{").unwrap();

    match DaemonConfig::load(&path) {
        Err(ConfigError::Parse { .. }) => {}
        other => panic!("expected Parse error, got {other:?}"),
    }
}

#[test]
#[serial_test::serial]
fn load_applies_hls_root_env_override() {
    std::env::remove_var("XG2G_HLS_ROOT");
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "hls_root = \"/from/toml\"\n").unwrap();

    std::env::set_var("XG2G_HLS_ROOT", "/from/env");
    let config = DaemonConfig::load(&path).unwrap();
    std::env::remove_var("XG2G_HLS_ROOT");

    assert_eq!(config.hls_root, Some(PathBuf::from("/from/env")));
}

#[test]
fn to_orchestrator_config_derives_heartbeat_and_owner() {
    let config = DaemonConfig::default();

    let orch = config.to_orchestrator_config("host-123");

    assert_eq!(orch.owner, "host-123");
    assert_eq!(orch.tuner_slots, config.tuner_slots);
    assert_eq!(orch.lease_ttl, Duration::from_secs(30));
    assert_eq!(orch.heartbeat_every, Duration::from_secs(15));
}

#[test]
fn to_orchestrator_config_carries_sweeper_settings() {
    let mut config = DaemonConfig::default();
    config.sweeper.idle_timeout_secs = None;
    config.sweeper.file_retention_secs = Some(120);

    let orch = config.to_orchestrator_config("host");

    assert_eq!(orch.sweeper.idle_timeout, None);
    assert_eq!(orch.sweeper.file_retention, Some(Duration::from_secs(120)));
    assert_eq!(orch.sweeper.interval, Duration::from_secs(60));
}
