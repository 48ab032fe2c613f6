use assert_fs::prelude::*;
use std::process::Command;

#[test]
fn binary_print_config_succeeds() {
    let me = assert_cmd::cargo::cargo_bin!("img_relocate");
    let out = Command::new(me)
        .arg("--print-config")
        .env("IMG_RELOCATE_CONFIG", "/nonexistent/img_relocate/config.xml")
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "binary should succeed with --print-config");
    assert!(String::from_utf8_lossy(&out.stdout).contains("IMG_RELOCATE_CONFIG"));
}

#[test]
fn binary_moves_images_and_leaves_other_files() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/a.png").write_str("A").unwrap();
    tmp.child("src/notes.txt").write_str("N").unwrap();
    let cfg = tmp.child("config.xml");
    cfg.write_str("<config><log_level>quiet</log_level></config>").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("img_relocate");
    let out = Command::new(me)
        .env("IMG_RELOCATE_CONFIG", cfg.path())
        .arg("--source")
        .arg(tmp.child("src").path())
        .arg("--dest")
        .arg(tmp.child("dst").path())
        .output()
        .expect("spawn binary");

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("a.png -> a.png"));
    tmp.child("dst/a.png").assert("A");
    tmp.child("src/notes.txt").assert("N");
    assert!(!tmp.child("src/a.png").path().exists());
}

#[test]
fn binary_dry_run_changes_nothing() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/a.png").write_str("A").unwrap();
    tmp.child("dst").create_dir_all().unwrap();
    let cfg = tmp.child("config.xml");
    cfg.write_str("<config><log_level>quiet</log_level></config>").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("img_relocate");
    let out = Command::new(me)
        .env("IMG_RELOCATE_CONFIG", cfg.path())
        .args(["--dry-run", "-s"])
        .arg(tmp.child("src").path())
        .arg("-d")
        .arg(tmp.child("dst").path())
        .output()
        .expect("spawn binary");

    assert!(out.status.success());
    tmp.child("src/a.png").assert("A");
    assert!(!tmp.child("dst/a.png").path().exists());
}

#[test]
fn binary_refuses_same_source_and_destination() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/a.png").write_str("A").unwrap();
    let cfg = tmp.child("config.xml");
    cfg.write_str("<config><log_level>quiet</log_level></config>").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("img_relocate");
    let out = Command::new(me)
        .env("IMG_RELOCATE_CONFIG", cfg.path())
        .arg("-s")
        .arg(tmp.child("src").path())
        .arg("-d")
        .arg(tmp.child("src").path())
        .output()
        .expect("spawn binary");

    assert!(!out.status.success());
    tmp.child("src/a.png").assert("A");
}

#[test]
fn binary_dry_run_refuses_picks_already_in_destination() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("dst/a.png").write_str("A").unwrap();
    let cfg = tmp.child("config.xml");
    cfg.write_str("<config><log_level>quiet</log_level></config>").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("img_relocate");
    let out = Command::new(me)
        .env("IMG_RELOCATE_CONFIG", cfg.path())
        .args(["--dry-run", "-d"])
        .arg(tmp.child("dst").path())
        .arg(tmp.child("dst/a.png").path())
        .output()
        .expect("spawn binary");

    assert!(!out.status.success(), "dry run must refuse what a real run refuses");
    assert!(!String::from_utf8_lossy(&out.stdout).contains("would be moved"));
    assert!(!tmp.child("dst/a_2.png").path().exists());
    tmp.child("dst/a.png").assert("A");
}

#[test]
fn binary_log_file_receives_batch_summary() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("src/a.png").write_str("A").unwrap();
    let log = tmp.child("run.log");
    let cfg = tmp.child("config.xml");
    cfg.write_str(&format!(
        "<config><log_level>info</log_level><log_file>{}</log_file></config>",
        log.path().display()
    ))
    .unwrap();

    let me = assert_cmd::cargo::cargo_bin!("img_relocate");
    let out = Command::new(me)
        .env("IMG_RELOCATE_CONFIG", cfg.path())
        .arg("-s")
        .arg(tmp.child("src").path())
        .arg("-d")
        .arg(tmp.child("dst").path())
        .output()
        .expect("spawn binary");

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = std::fs::read_to_string(log.path()).unwrap();
    assert!(text.contains("moved file"), "log was: {text}");
    assert!(text.contains("batch finished"), "log was: {text}");
}
