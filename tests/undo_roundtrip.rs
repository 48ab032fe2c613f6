//! Moving a batch and undoing it restores the original layout.

use assert_fs::prelude::*;
use img_relocate::{LocalDir, RelocationSession};

fn session(tmp: &assert_fs::TempDir) -> RelocationSession {
    let mut s = RelocationSession::new();
    s.set_source(LocalDir::open(tmp.child("src").path()).unwrap());
    s.set_destination(LocalDir::open(tmp.child("dst").path()).unwrap());
    s
}

#[test]
fn undo_restores_every_file_with_its_bytes() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/a.png").write_str("A").unwrap();
    tmp.child("src/sub/b.jpg").write_str("B").unwrap();
    tmp.child("dst/a.png").write_str("already here").unwrap();
    let mut s = session(&tmp);

    let report = s.relocate_all().unwrap();
    assert_eq!(report.moved_count(), 2);
    tmp.child("dst/a_2.png").assert("A");
    assert!(!tmp.child("src/a.png").path().exists());

    let undo = s.undo_last_batch();
    assert_eq!(undo.restored_count(), 2);
    assert!(!s.can_undo());
    tmp.child("src/a.png").assert("A");
    tmp.child("src/sub/b.jpg").assert("B");
    tmp.child("dst/a.png").assert("already here");
    assert!(!tmp.child("dst/a_2.png").path().exists());
}

#[test]
fn reused_original_name_gets_restored_suffix() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/x.png").write_str("old").unwrap();
    tmp.child("dst").create_dir_all().unwrap();
    let mut s = session(&tmp);

    s.relocate_all().unwrap();
    tmp.child("src/x.png").write_str("newer").unwrap();

    let undo = s.undo_last_batch();
    assert_eq!(undo.restored_count(), 1);
    tmp.child("src/x.png").assert("newer");
    tmp.child("src/x_restored_1.png").assert("old");
}

#[test]
fn second_undo_is_a_no_op() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/x.png").write_str("x").unwrap();
    tmp.child("dst").create_dir_all().unwrap();
    let mut s = session(&tmp);

    s.relocate_all().unwrap();
    assert_eq!(s.undo_last_batch().restored_count(), 1);
    assert_eq!(s.undo_last_batch().restored_count(), 0);
    tmp.child("src/x.png").assert("x");
}
