use serial_test::serial;

use super::*;

#[test]
fn format_time_ago_zero_is_dash() {
    assert_eq!(format_time_ago(0), "-");
    assert_eq!(format_time_ago(-1), "-");
}

#[test]
fn format_time_ago_seconds() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let ago = format_time_ago(now_ms - 5_000);
    assert!(ago.ends_with('s'), "expected seconds suffix, got {ago}");
}

#[test]
fn format_time_ago_minutes() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let ago = format_time_ago(now_ms - 5 * 60_000);
    assert!(ago.ends_with('m'), "expected minutes suffix, got {ago}");
}

#[test]
fn format_time_ago_hours() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let ago = format_time_ago(now_ms - 5 * 3_600_000);
    assert!(ago.ends_with('h'), "expected hours suffix, got {ago}");
}

#[test]
fn format_time_ago_days() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let ago = format_time_ago(now_ms - 3 * 86_400_000);
    assert!(ago.ends_with('d'), "expected days suffix, got {ago}");
}

#[test]
#[serial]
fn should_use_color_delegates_to_color_module() {
    std::env::set_var("NO_COLOR", "1");
    assert!(!should_use_color());
    std::env::remove_var("NO_COLOR");
}
