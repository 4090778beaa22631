use super::*;

crate::define_id! {
    /// Test id for exercising the macro in isolation
    pub struct TestId;
}

#[test]
fn new_and_as_str_round_trip() {
    let id = TestId::new("abc123");
    assert_eq!(id.as_str(), "abc123");
}

#[test]
fn short_truncates_when_longer() {
    let id = TestId::new("0123456789abcdef");
    assert_eq!(id.short(8), "01234567");
}

#[test]
fn short_is_noop_when_shorter() {
    let id = TestId::new("ab");
    assert_eq!(id.short(8), "ab");
}

#[test]
fn display_matches_inner_string() {
    let id = TestId::new("sess-1");
    assert_eq!(format!("{id}"), "sess-1");
}

#[test]
fn from_string_and_str() {
    let a: TestId = "x".into();
    let b: TestId = String::from("x").into();
    assert_eq!(a, b);
}

#[test]
fn partial_eq_str() {
    let id = TestId::new("y");
    assert_eq!(id, *"y");
    assert_eq!(id, "y");
}

#[test]
fn uuid_id_gen_produces_unique_values() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_id_gen_increments() {
    let gen = SequentialIdGen::new("sess");
    assert_eq!(gen.next(), "sess-1");
    assert_eq!(gen.next(), "sess-2");
}

#[test]
fn short_id_trait_on_str() {
    let s = "0123456789";
    assert_eq!(s.short(4), "0123");
}
