#![cfg(unix)]

use dupsweep::duplicates::{DuplicateFinder, FinderConfig, ScanMode};
use dupsweep::scanner::WalkerConfig;
use std::fs;
use std::os::unix::fs::symlink;
use tempfile::tempdir;

fn following() -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default()
            .with_walker_config(WalkerConfig::default().with_follow_symlinks(true)),
    )
}

#[test]
fn test_symlink_not_reported_as_duplicate_by_default() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, b"identical content").unwrap();
    symlink(&original, dir.path().join("link.txt")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_followed_symlink_to_file_reported_once() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, b"identical content").unwrap();
    symlink(&original, dir.path().join("link.txt")).unwrap();

    let (groups, summary) = following()
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_following_links_on_link_free_tree_scans_everything() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), b"hi").unwrap();
    fs::write(dir.path().join("b.txt"), b"hi").unwrap();
    fs::write(dir.path().join("sub").join("c.txt"), b"hi").unwrap();

    let (groups, summary) = following()
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
}

#[test]
fn test_symlink_cycle_terminates() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = a.join("b");
    fs::create_dir_all(&b).unwrap();
    fs::write(a.join("one.txt"), b"dup").unwrap();
    fs::write(b.join("two.txt"), b"dup").unwrap();

    // b/back -> a closes the loop a -> b -> back -> a
    symlink(&a, b.join("back")).unwrap();

    let (groups, summary) = following()
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_symlinked_directory_alias_reported_once() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    fs::write(real.join("x.bin"), b"same bytes").unwrap();
    fs::write(real.join("y.bin"), b"same bytes").unwrap();
    symlink(&real, dir.path().join("alias")).unwrap();

    let (groups, summary) = following()
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_dangling_symlink_ignored() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();
    symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}
