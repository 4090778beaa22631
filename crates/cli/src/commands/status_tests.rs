use serial_test::serial;

use super::*;

#[test]
#[serial]
fn reports_not_running_with_empty_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("XG2G_STATE_DIR", dir.path());

    let result = run(StatusArgs, OutputFormat::Text);

    std::env::remove_var("XG2G_STATE_DIR");
    assert!(result.is_ok());
}

#[test]
#[serial]
fn json_output_is_well_formed() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("XG2G_STATE_DIR", dir.path());

    let result = run(StatusArgs, OutputFormat::Json);

    std::env::remove_var("XG2G_STATE_DIR");
    assert!(result.is_ok());
}
