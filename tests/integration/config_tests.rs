use dupsweep::config::{ConfigError, Settings};
use dupsweep::duplicates::ScanMode;
use dupsweep::scanner::HashAlgorithm;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // No Env layer, so the test is independent of the process environment
    let config: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .extract()
        .unwrap();

    assert_eq!(config.scan.mode, ScanMode::Strict);
    assert_eq!(config.scan.algorithm, HashAlgorithm::Sha256);
    assert!(config.scan.io_threads >= 1);
    assert!(!config.scan.follow_symlinks);
    assert_eq!(config.preview.max_text_lines, 20);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[scan]
mode = "size-only"
io_threads = 8
follow_symlinks = true
min_size = 1024

[preview]
thumbnail_size = 128
"#,
    )
    .unwrap();

    let config: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.scan.mode, ScanMode::SizeOnly);
    assert_eq!(config.scan.io_threads, 8);
    assert!(config.scan.follow_symlinks);
    assert_eq!(config.scan.min_size, Some(1024));
    assert_eq!(config.preview.thumbnail_size, 128);
    assert_eq!(config.preview.max_text_lines, 20);
}

#[test]
fn test_env_overrides_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[scan]
algorithm = "sha256"
io_threads = 2
"#,
        )?;
        jail.set_env("DUPSWEEP_SCAN__ALGORITHM", "blake3");

        let path = jail.directory().join("config.toml");
        let config: Settings = Settings::figment(Some(&path)).extract()?;

        assert_eq!(config.scan.algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.scan.io_threads, 2);
        Ok(())
    });
}

#[test]
fn test_settings_feed_finder_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("dupsweep.toml");
    fs::write(
        &config_path,
        "[scan]\nskip_hidden = true\nmax_depth = 2\nignore_patterns = [\"*.bak\"]\n",
    )
    .unwrap();

    let settings = Settings::load(Some(&config_path)).unwrap();
    let finder_config = settings.scan.finder_config();

    assert!(finder_config.walker_config.skip_hidden);
    assert_eq!(finder_config.walker_config.max_depth, Some(2));
    assert_eq!(finder_config.walker_config.ignore_patterns, vec!["*.bak"]);
}

#[test]
fn test_malformed_toml_is_invalid() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[scan\nio_threads = ").unwrap();

    assert!(matches!(
        Settings::load(Some(&config_path)),
        Err(ConfigError::Invalid(_))
    ));
}
