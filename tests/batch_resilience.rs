//! One bad file must not stop the rest of a batch.

use img_relocate::{ItemOutcome, MemoryFs, Phase, StopFlag, UndoLedger, index, relocate_many};

#[test]
fn unreadable_third_file_is_skipped_and_counted() {
    let fs = MemoryFs::new();
    for n in 1..=5 {
        fs.write(&format!("src/{n}.png"), format!("img{n}").as_bytes());
    }
    fs.fail_reads("src/3.png");
    let dst = fs.create_dir("dst");
    let entries = index(&fs.dir("src").unwrap(), false, &|_| true).unwrap();
    assert_eq!(entries.len(), 5);

    let mut ledger = UndoLedger::new();
    let report = relocate_many(&entries, &dst, &mut ledger, &StopFlag::new());

    assert_eq!(report.moved_count(), 4);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(ledger.len(), 4);
    assert_eq!(fs.file_names("src"), ["3.png"]);
    assert_eq!(fs.file_names("dst"), ["1.png", "2.png", "4.png", "5.png"]);
    match &report.items[2].outcome {
        ItemOutcome::Failed(e) => assert_eq!(e.phase(), Some(Phase::Read)),
        other => panic!("expected failure for 3.png, got {other:?}"),
    }
}

#[test]
fn write_failures_leave_sources_and_no_partial_files() {
    let fs = MemoryFs::new();
    fs.write("src/a.png", b"A");
    fs.write("src/b.png", b"B");
    let dst = fs.create_dir("dst");
    fs.fail_writes_in("dst");
    let entries = index(&fs.dir("src").unwrap(), false, &|_| true).unwrap();

    let mut ledger = UndoLedger::new();
    let report = relocate_many(&entries, &dst, &mut ledger, &StopFlag::new());

    assert_eq!(report.moved_count(), 0);
    assert_eq!(report.failed_count(), 2);
    assert!(ledger.is_empty());
    assert!(fs.file_names("dst").is_empty());
    assert_eq!(fs.read("src/a.png").unwrap(), b"A");
}

#[test]
fn new_batch_replaces_previous_ledger() {
    let fs = MemoryFs::new();
    fs.write("src/a.png", b"A");
    fs.write("src/b.png", b"B");
    let dst = fs.create_dir("dst");
    let src = fs.dir("src").unwrap();
    let mut ledger = UndoLedger::new();

    let first = index(&src, false, &|n| n == "a.png").unwrap();
    relocate_many(&first, &dst, &mut ledger, &StopFlag::new());
    let second = index(&src, false, &|n| n == "b.png").unwrap();
    relocate_many(&second, &dst, &mut ledger, &StopFlag::new());

    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.records()[0].original_name, "b.png");
}
