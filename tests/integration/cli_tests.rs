use clap::Parser;
use dupsweep::cli::Cli;
use dupsweep::error::ExitCode;
use dupsweep::service::{DeleteResult, DuplicateGroupInfo, FilePreview};
use std::fs;
use tempfile::tempdir;

fn run_captured(args: &[&str]) -> (anyhow::Result<ExitCode>, String) {
    let mut argv = vec!["dupsweep", "-q", "--no-color"];
    argv.extend_from_slice(args);
    let mut out = Vec::new();
    let result = dupsweep::run_app_with_output(Cli::try_parse_from(argv).unwrap(), &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    run_captured(args).0
}

fn empty_config(dir: &std::path::Path) -> String {
    let path = dir.join("config.toml");
    fs::write(&path, "").unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_scan_exit_codes() {
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("only.txt"), b"alone").unwrap();
    let root_arg = root.to_string_lossy().into_owned();

    let (code, out) = run_captured(&["--config", &config, "scan", &root_arg, "--output", "json"]);
    assert_eq!(code.unwrap(), ExitCode::NoDuplicates);
    let groups: Vec<DuplicateGroupInfo> = serde_json::from_str(&out).unwrap();
    assert!(groups.is_empty());

    fs::write(root.join("copy.txt"), b"alone").unwrap();
    let (code, out) = run_captured(&["--config", &config, "scan", &root_arg, "--output", "json"]);
    assert_eq!(code.unwrap(), ExitCode::Success);
    let groups: Vec<DuplicateGroupInfo> = serde_json::from_str(&out).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 5);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_scan_text_report_names_every_copy() {
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("first.txt"), b"twin").unwrap();
    fs::write(root.join("second.txt"), b"twin").unwrap();
    let root_arg = root.to_string_lossy().into_owned();

    let (code, out) = run_captured(&["--config", &config, "scan", &root_arg]);
    assert_eq!(code.unwrap(), ExitCode::Success);
    assert!(out.contains("first.txt"));
    assert!(out.contains("second.txt"));
}

#[test]
fn test_scan_missing_root_is_error() {
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let missing = dir.path().join("missing").to_string_lossy().into_owned();

    let err = run(&["--config", &config, "scan", &missing]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_missing_config_file_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml").to_string_lossy().into_owned();
    let root = dir.path().to_string_lossy().into_owned();

    assert!(run(&["--config", &missing, "scan", &root]).is_err());
}

#[test]
fn test_delete_reports_partial_success() {
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let present = dir.path().join("present.txt");
    fs::write(&present, b"x").unwrap();
    let trash_dir = dir.path().join("trash");

    let present_arg = present.to_string_lossy().into_owned();
    let missing_arg = dir.path().join("missing.txt").to_string_lossy().into_owned();
    let trash_arg = trash_dir.to_string_lossy().into_owned();

    let (code, out) = run_captured(&[
        "--config",
        &config,
        "delete",
        &present_arg,
        &missing_arg,
        "--trash-dir",
        &trash_arg,
    ]);

    assert_eq!(code.unwrap(), ExitCode::PartialSuccess);
    let result: DeleteResult = serde_json::from_str(&out).unwrap();
    assert_eq!(result.deleted, vec![present_arg.clone()]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].path, missing_arg);
    assert!(!present.exists());
    assert!(trash_dir.join("present.txt").exists());
}

#[test]
fn test_preview_succeeds_for_any_file() {
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let file = dir.path().join("note.txt");
    fs::write(&file, "hello").unwrap();

    let file_arg = file.to_string_lossy().into_owned();
    let (code, out) = run_captured(&["--config", &config, "preview", &file_arg]);
    assert_eq!(code.unwrap(), ExitCode::Success);

    let preview: FilePreview = serde_json::from_str(&out).unwrap();
    assert_eq!(preview.preview_type, "text");
    assert_eq!(preview.content, "hello");
}
