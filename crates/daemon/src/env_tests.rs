use serial_test::serial;

use super::*;

fn clear_all() {
    std::env::remove_var("XG2G_STATE_DIR");
    std::env::remove_var("XDG_STATE_HOME");
    std::env::remove_var("XG2G_CONFIG");
    std::env::remove_var("XG2G_HLS_ROOT");
    std::env::remove_var("XG2G_LOG");
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    clear_all();
    std::env::set_var("XG2G_STATE_DIR", "/tmp/xg2g-explicit");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-should-be-ignored");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xg2g-explicit"));
    clear_all();
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg_state_home() {
    clear_all();
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xdg-state/xg2g"));
    clear_all();
}

#[test]
#[serial]
fn state_dir_falls_back_to_home() {
    clear_all();
    let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    std::env::set_var("HOME", &home);
    assert_eq!(
        state_dir().unwrap(),
        PathBuf::from(&home).join(".local/state/xg2g")
    );
    clear_all();
}

#[test]
#[serial]
fn state_dir_errs_without_any_signal() {
    clear_all();
    let saved_home = std::env::var("HOME").ok();
    std::env::remove_var("HOME");
    assert!(matches!(state_dir(), Err(LifecycleError::NoStateDir)));
    if let Some(home) = saved_home {
        std::env::set_var("HOME", home);
    }
}

#[test]
#[serial]
fn config_path_defaults_under_state_dir() {
    clear_all();
    let dir = PathBuf::from("/tmp/xg2g-state");
    assert_eq!(config_path(&dir), dir.join("config.toml"));
}

#[test]
#[serial]
fn config_path_honors_override() {
    clear_all();
    std::env::set_var("XG2G_CONFIG", "/tmp/custom-config.toml");
    let dir = PathBuf::from("/tmp/xg2g-state");
    assert_eq!(config_path(&dir), PathBuf::from("/tmp/custom-config.toml"));
    clear_all();
}

#[test]
#[serial]
fn hls_root_override_reads_env() {
    clear_all();
    assert_eq!(hls_root_override(), None);
    std::env::set_var("XG2G_HLS_ROOT", "/tmp/hls");
    assert_eq!(hls_root_override(), Some(PathBuf::from("/tmp/hls")));
    clear_all();
}

#[test]
#[serial]
fn log_filter_defaults_to_info() {
    clear_all();
    assert_eq!(log_filter(), "info");
    std::env::set_var("XG2G_LOG", "debug");
    assert_eq!(log_filter(), "debug");
    clear_all();
}
