//! Integration tests for loading settings from disk.

use std::io::Write;

use hapsolutely_core::{Error, Settings};

#[test]
fn load_settings_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "placeholder_label = \"(none)\"").unwrap();
    writeln!(file, "allele_tags = [\"1\", \"2\"]").unwrap();

    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.placeholder_label, "(none)");
    assert_eq!(settings.allele_slot("2"), Some(1));
    assert_eq!(settings.unknown_group, "unknown");
}

#[test]
fn missing_settings_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Settings::load(&path).unwrap_err();
    match err {
        Error::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn saved_settings_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hapsolutely.toml");

    let mut settings = Settings::default();
    settings.warning_preview = 7;
    std::fs::write(&path, settings.to_toml_string().unwrap()).unwrap();

    assert_eq!(Settings::load(&path).unwrap(), settings);
}
