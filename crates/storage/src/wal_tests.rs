use super::*;

fn sample_event(n: u8) -> StoreEvent {
    StoreEvent::LeaseWritten {
        lease: xg2g_core::Lease::new(
            xg2g_core::LeaseKey::tuner(n),
            format!("owner-{n}"),
            1_000 + n as i64,
        ),
    }
}

#[test]
fn append_assigns_increasing_sequence_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    let seq1 = wal.append(&sample_event(1)).unwrap();
    let seq2 = wal.append(&sample_event(2)).unwrap();
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);
}

#[test]
fn entries_are_not_on_disk_until_flush() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&sample_event(1)).unwrap();
    assert!(!wal.needs_flush() || std::fs::read_to_string(&path).unwrap().is_empty());
    wal.flush().unwrap();
    assert!(!std::fs::read_to_string(&path).unwrap().is_empty());
}

#[test]
fn reopen_replays_flushed_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&sample_event(1)).unwrap();
        wal.append(&sample_event(2)).unwrap();
        wal.flush().unwrap();
    }

    let wal = Wal::open(&path, 0).unwrap();
    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[1].seq, 2);
}

#[test]
fn next_unprocessed_advances_and_drains() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&sample_event(1)).unwrap();
    wal.append(&sample_event(2)).unwrap();

    let first = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(first.seq, 1);
    wal.mark_processed(first.seq);

    let second = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(second.seq, 2);
    wal.mark_processed(second.seq);

    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn truncate_before_drops_old_entries_but_keeps_new() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&sample_event(1)).unwrap();
    wal.append(&sample_event(2)).unwrap();
    wal.append(&sample_event(3)).unwrap();
    wal.mark_processed(3);

    wal.truncate_before(3).unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 3);
}

#[test]
fn corrupt_trailing_line_is_skipped_on_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&sample_event(1)).unwrap();
        wal.flush().unwrap();
    }
    // Append a corrupt trailing line directly.
    use std::io::Write as _;
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "{{not valid json").unwrap();

    let wal = Wal::open(&path, 0).unwrap();
    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 1);
}
