use std::time::Duration;

use xg2g_core::FakeClock;

use super::*;

fn manager(dir: &tempfile::TempDir) -> LeaseManager<FakeClock> {
    let store = Store::open(&dir.path().join("wal.jsonl"), &dir.path().join("snapshot.bin"))
        .expect("open store");
    LeaseManager::new(Arc::new(store), FakeClock::new(1_000))
}

#[test]
fn try_acquire_then_renew_extends_expiry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = manager(&dir);
    let key = LeaseKey::tuner(0);

    let outcome = manager.try_acquire(&key, "session-a", Duration::from_secs(30)).expect("acquire");
    assert!(outcome.acquired());

    let renewed = manager.renew(&key, "session-a", Duration::from_secs(30)).expect("renew");
    assert_eq!(renewed.owner, "session-a");
}

#[test]
fn renew_fails_closed_for_non_owner() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = manager(&dir);
    let key = LeaseKey::tuner(0);

    manager.try_acquire(&key, "session-a", Duration::from_secs(30)).expect("acquire");

    let err = manager.renew(&key, "session-b", Duration::from_secs(30)).unwrap_err();
    assert!(matches!(err, StoreError::LeaseNotOwned { .. }));
}

#[test]
fn release_only_deletes_matching_owner() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = manager(&dir);
    let key = LeaseKey::tuner(0);

    manager.try_acquire(&key, "session-a", Duration::from_secs(30)).expect("acquire");
    manager.release(&key, "session-b").expect("release no-op");
    assert!(manager.get(&key).is_some());

    manager.release(&key, "session-a").expect("release");
    assert!(manager.get(&key).is_none());
}

#[test]
fn delete_all_wipes_every_lease() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = manager(&dir);

    manager.try_acquire(&LeaseKey::tuner(0), "a", Duration::from_secs(30)).expect("acquire");
    manager.try_acquire(&LeaseKey::service("ref"), "a", Duration::from_secs(30)).expect("acquire");

    manager.delete_all().expect("delete all");

    assert!(manager.get(&LeaseKey::tuner(0)).is_none());
    assert!(manager.get(&LeaseKey::service("ref")).is_none());
}
