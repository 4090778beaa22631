use super::*;

#[test]
fn cancel_is_observed_by_the_registered_token() {
    let active = ActiveMap::new();
    let token = active.register("s1");
    assert!(!token.is_cancelled());

    assert!(active.cancel("s1"));
    assert!(token.is_cancelled());
}

#[test]
fn cancel_of_unregistered_session_is_a_noop() {
    let active = ActiveMap::new();
    assert!(!active.cancel("missing"));
}

#[test]
fn deregister_removes_the_entry() {
    let active = ActiveMap::new();
    active.register("s1");
    active.deregister("s1");
    assert!(!active.contains("s1"));
    assert!(!active.cancel("s1"));
}
