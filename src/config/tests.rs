#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::PathBuf;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

// ── Overrides ─────────────────────────────────────────────────

#[test]
fn test_extract_flags_anywhere() {
    let (o, rest) = Overrides::extract(&args(&[
        "add", "--sheet", "abc", "12.50", "--local", "--config", "/tmp/c.toml", "Food",
    ]))
    .unwrap();
    assert_eq!(o.sheet_id.as_deref(), Some("abc"));
    assert!(o.local);
    assert_eq!(o.config_path, Some(PathBuf::from("/tmp/c.toml")));
    assert_eq!(rest, args(&["add", "12.50", "Food"]));
}

#[test]
fn test_extract_flag_missing_value() {
    assert!(Overrides::extract(&args(&["--sheet"])).is_err());
    assert!(Overrides::extract(&args(&["summary", "--config"])).is_err());
}

// ── Loading ───────────────────────────────────────────────────

#[test]
fn test_defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let cfg = AppConfig::load_with_env(&paths, &Overrides::default(), env(&[])).unwrap();
    assert_eq!(cfg.sheet_id, None);
    assert_eq!(cfg.backend, Backend::Google);
    assert_eq!(cfg.credentials_path, paths.config_dir.join("service_account.json"));
    assert_eq!(cfg.token_cache_path, paths.cache_dir.join("token.json"));
    assert_eq!(cfg.local_path, paths.data_dir.join("workbook.db"));
}

#[test]
fn test_file_then_env_then_flags() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    std::fs::create_dir_all(&paths.config_dir).unwrap();
    std::fs::write(
        paths.config_dir.join("config.toml"),
        "sheet_id = \"from-file\"\nbackend = \"local\"\nlocal_path = \"/srv/book.db\"\n",
    )
    .unwrap();

    let cfg = AppConfig::load_with_env(&paths, &Overrides::default(), env(&[])).unwrap();
    assert_eq!(cfg.sheet_id.as_deref(), Some("from-file"));
    assert_eq!(cfg.backend, Backend::Local);
    assert_eq!(cfg.local_path, PathBuf::from("/srv/book.db"));

    let cfg = AppConfig::load_with_env(
        &paths,
        &Overrides::default(),
        env(&[("STEWARD_SHEET_ID", "from-env"), ("STEWARD_BACKEND", "google")]),
    )
    .unwrap();
    assert_eq!(cfg.sheet_id.as_deref(), Some("from-env"));
    assert_eq!(cfg.backend, Backend::Google);

    let flags = Overrides {
        sheet_id: Some("from-flag".into()),
        local: true,
        ..Overrides::default()
    };
    let cfg =
        AppConfig::load_with_env(&paths, &flags, env(&[("STEWARD_SHEET_ID", "from-env")])).unwrap();
    assert_eq!(cfg.sheet_id.as_deref(), Some("from-flag"));
    assert_eq!(cfg.backend, Backend::Local);
}

#[test]
fn test_explicit_config_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let overrides = Overrides {
        config_path: Some(dir.path().join("missing.toml")),
        ..Overrides::default()
    };
    assert!(AppConfig::load_with_env(&paths, &overrides, env(&[])).is_err());
}

#[test]
fn test_unknown_backend_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let result = AppConfig::load_with_env(
        &paths,
        &Overrides::default(),
        env(&[("STEWARD_BACKEND", "excel")]),
    );
    assert!(result.is_err());
}

// ── Sheet ids ─────────────────────────────────────────────────

#[test]
fn test_normalize_sheet_id() {
    assert_eq!(normalize_sheet_id("  1AbC_def "), "1AbC_def");
    assert_eq!(
        normalize_sheet_id("https://docs.google.com/spreadsheets/d/1AbC_def/edit#gid=0"),
        "1AbC_def"
    );
    assert_eq!(
        normalize_sheet_id("https://docs.google.com/spreadsheets/d/1AbC_def?usp=sharing"),
        "1AbC_def"
    );
}

#[test]
fn test_blank_sheet_id_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let cfg = AppConfig::load_with_env(
        &paths,
        &Overrides::default(),
        env(&[("STEWARD_SHEET_ID", "  ")]),
    )
    .unwrap();
    assert_eq!(cfg.sheet_id, None);
}
