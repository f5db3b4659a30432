use dupsweep::duplicates::{DuplicateFinder, FinderConfig, GroupDigest, ScanMode};
use dupsweep::scanner::{HashAlgorithm, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(path: PathBuf, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn member_names(group: &dupsweep::duplicates::DuplicateGroup) -> Vec<String> {
    group.files.iter().map(|f| f.name.clone()).collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.txt"), b"content a");
    write(dir.path().join("b.txt"), b"content bb");
    write(dir.path().join("c.txt"), b"content ccc");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_size, 3);
    assert_eq!(summary.files_hashed, 0);
}

#[test]
fn test_hi_hi_bye_strict() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.txt"), b"hi");
    write(dir.path().join("b.txt"), b"hi");
    write(dir.path().join("c.txt"), b"bye");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2);
    assert_eq!(member_names(&groups[0]), vec!["a.txt", "b.txt"]);
    assert!(matches!(groups[0].digest, GroupDigest::Content(_)));
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 2);
}

#[test]
fn test_hi_hi_bye_size_only() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.txt"), b"hi");
    write(dir.path().join("b.txt"), b"hi");
    write(dir.path().join("c.txt"), b"bye");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates(dir.path(), ScanMode::SizeOnly)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].digest_key(), "size_2");
    assert_eq!(member_names(&groups[0]), vec!["a.txt", "b.txt"]);
    assert_eq!(summary.files_hashed, 0);
    assert_eq!(summary.bytes_hashed, 0);
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(dir.path().join("x.bin"), b"aaaa");
    write(dir.path().join("y.bin"), b"bbbb");

    let finder = DuplicateFinder::with_defaults();

    let (strict, _) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();
    assert!(strict.is_empty());

    let (loose, _) = finder
        .find_duplicates(dir.path(), ScanMode::SizeOnly)
        .unwrap();
    assert_eq!(loose.len(), 1);
    assert_eq!(loose[0].len(), 2);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir").join("deeper");
    fs::create_dir_all(&sub).unwrap();

    write(dir.path().join("a.txt"), b"nested duplicate");
    write(sub.join("b.txt"), b"nested duplicate");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].files.iter().all(|f| f.path.is_absolute()));
}

#[test]
fn test_scan_multiple_groups_ordered_by_size() {
    let dir = tempdir().unwrap();
    write(dir.path().join("small1"), b"abc");
    write(dir.path().join("small2"), b"abc");
    write(dir.path().join("big1"), b"0123456789");
    write(dir.path().join("big2"), b"0123456789");
    write(dir.path().join("big3"), b"0123456789");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].size, 10);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(groups[1].size, 3);
    assert_eq!(summary.duplicate_files, 3);
    assert_eq!(summary.reclaimable_space, 23);
}

#[test]
fn test_empty_files_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path().join("e1"), b"");
    write(dir.path().join("e2"), b"");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_skip_empty(true));
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_scan_size_filtering() {
    let dir = tempdir().unwrap();
    write(dir.path().join("s1"), b"12");
    write(dir.path().join("s2"), b"12");
    write(dir.path().join("l1"), &[7u8; 100]);
    write(dir.path().join("l2"), &[7u8; 100]);

    let walker_config = WalkerConfig {
        min_size: Some(10),
        ..Default::default()
    };
    let config = FinderConfig::default().with_walker_config(walker_config);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 100);
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_scan_ignore_patterns() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("build")).unwrap();
    write(dir.path().join("a.txt"), b"same");
    write(dir.path().join("b.tmp"), b"same");
    write(dir.path().join("build").join("c.txt"), b"same");

    let walker_config = WalkerConfig::default()
        .with_ignore_patterns(vec!["*.tmp".to_string(), "build/".to_string()]);
    let config = FinderConfig::default().with_walker_config(walker_config);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_algorithms_agree_on_membership() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a"), b"payload");
    write(dir.path().join("b"), b"payload");
    write(dir.path().join("c"), b"PAYLOAD");

    let sha = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashAlgorithm::Sha256))
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap()
        .0;
    let blake = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashAlgorithm::Blake3))
        .find_duplicates(dir.path(), ScanMode::Strict)
        .unwrap()
        .0;

    assert_eq!(sha.len(), 1);
    assert_eq!(sha[0].paths(), blake[0].paths());
    assert_ne!(sha[0].digest_key(), blake[0].digest_key());
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        write(dir.path().join(format!("f{i}")), format!("group {}", i % 3).as_bytes());
    }
    write(dir.path().join("solo"), b"one of a kind");

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(3));
    let (first, _) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();
    let (second, _) = finder.find_duplicates(dir.path(), ScanMode::Strict).unwrap();

    assert_eq!(first.len(), 3);
    let membership = |groups: &[dupsweep::duplicates::DuplicateGroup]| {
        groups.iter().map(|g| g.paths()).collect::<Vec<_>>()
    };
    assert_eq!(membership(&first), membership(&second));
}

#[test]
fn test_root_errors() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(file.clone(), b"x");

    let finder = DuplicateFinder::with_defaults();
    assert!(matches!(
        finder.find_duplicates(&dir.path().join("missing"), ScanMode::Strict),
        Err(dupsweep::duplicates::FinderError::PathNotFound(_))
    ));
    assert!(matches!(
        finder.find_duplicates(&file, ScanMode::Strict),
        Err(dupsweep::duplicates::FinderError::NotADirectory(_))
    ));
}
