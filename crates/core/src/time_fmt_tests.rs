use super::*;

#[yare::parameterized(
    zero = { 0, "0ms" },
    small = { 340, "340ms" },
    just_under_a_second = { 999, "999ms" },
    one_second = { 1_000, "1.000s" },
    fractional_seconds = { 1_250, "1.250s" },
    one_minute = { 60_000, "60.000s" },
)]
fn elapsed_ms(ms: i64, expected: &str) {
    assert_eq!(format_elapsed_ms(ms), expected);
}
