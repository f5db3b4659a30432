use dupsweep::actions::{delete_paths, DeleteError, DirectoryTrash, Trash};
use dupsweep::duplicates::{prune_deleted, DuplicateFinder, ScanMode};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// A store that refuses everything.
struct LockedTrash;

impl Trash for LockedTrash {
    fn move_to_trash(&self, path: &Path) -> Result<(), DeleteError> {
        Err(DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: "store is read-only".to_string(),
        })
    }
}

#[test]
fn test_missing_paths_all_reported_as_failed() {
    let dir = tempdir().unwrap();
    let trash = DirectoryTrash::new(dir.path().join(".trash")).unwrap();

    let mut requested = Vec::new();
    let mut missing = Vec::new();
    for i in 0..7 {
        let path = dir.path().join(format!("file{i}.txt"));
        if i % 3 == 0 {
            missing.push(path.clone());
        } else {
            fs::write(&path, format!("{i}")).unwrap();
        }
        requested.push(path);
    }

    let outcome = delete_paths(&requested, &trash, None);

    assert_eq!(outcome.total_count(), requested.len());
    assert_eq!(outcome.deleted.len(), requested.len() - missing.len());
    let failed: Vec<PathBuf> = outcome.failed.iter().map(|f| f.path.clone()).collect();
    assert_eq!(failed, missing);
    assert!(outcome
        .failed
        .iter()
        .all(|f| f.error.contains("not found")));
    for path in &outcome.deleted {
        assert!(!path.exists());
    }
}

#[test]
fn test_deleted_files_are_recoverable() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".trash");
    let trash = DirectoryTrash::new(&store).unwrap();

    let a = dir.path().join("a").join("same.txt");
    let b = dir.path().join("b").join("same.txt");
    fs::create_dir_all(a.parent().unwrap()).unwrap();
    fs::create_dir_all(b.parent().unwrap()).unwrap();
    fs::write(&a, b"first").unwrap();
    fs::write(&b, b"second").unwrap();

    let outcome = delete_paths(&[a.clone(), b.clone()], &trash, None);
    assert!(outcome.all_succeeded());

    let mut contents: Vec<Vec<u8>> = fs::read_dir(&store)
        .unwrap()
        .map(|e| fs::read(e.unwrap().path()).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec![b"first".to_vec(), b"second".to_vec()]);
}

#[test]
fn test_store_failure_leaves_file_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.txt");
    fs::write(&path, b"keep").unwrap();

    let outcome = delete_paths(&[path.clone()], &LockedTrash, None);

    assert!(outcome.deleted.is_empty());
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].error.contains("read-only"));
    assert!(path.exists());
}

#[test]
fn test_directories_are_refused() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let trash = DirectoryTrash::new(dir.path().join(".trash")).unwrap();

    let outcome = delete_paths(&[sub.clone()], &trash, None);

    assert_eq!(outcome.failed.len(), 1);
    assert!(sub.exists());
}

#[test]
fn test_scan_delete_prune_flow() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), b"hi").unwrap();
    fs::write(root.join("b.txt"), b"hi").unwrap();
    fs::write(root.join("c.txt"), b"hi").unwrap();
    let trash = DirectoryTrash::new(dir.path().join(".trash")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(&root, ScanMode::Strict).unwrap();
    assert_eq!(groups[0].len(), 3);

    let victims: Vec<PathBuf> = groups[0].paths().into_iter().skip(1).collect();
    let outcome = delete_paths(&victims, &trash, None);
    assert_eq!(outcome.deleted.len(), 2);

    // A lone survivor is no longer a duplicate group
    let remaining = prune_deleted(groups, &outcome.deleted);
    assert!(remaining.is_empty());

    let (rescanned, summary) = finder.find_duplicates(&root, ScanMode::Strict).unwrap();
    assert!(rescanned.is_empty());
    assert_eq!(summary.total_files, 1);
}
