//! Persistence round-trip and edge case tests.
//!
//! Tests config file I/O: atomic writes, permissions and partial files.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Config;
use crate::persistence::{load_json, save_json};
use ridewatch_core::ExamType;

fn sample_config() -> Config {
    let mut config = Config {
        ssn: "199001011234".to_string(),
        exam_type: ExamType::Kunskapsprov,
        location_ids: vec![1000140, 1000071],
        location: Some("Farsta".to_string()),
        poll_interval_secs: 600,
        ..Config::default()
    };
    config
        .cookies
        .insert("LoginValid".to_string(), "2025-06-20 16:48".to_string());
    config
        .cookies
        .insert("ASP.NET_SessionId".to_string(), "abc".to_string());
    config
}

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_config_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    let config = sample_config();

    config.save_to(&path).await.unwrap();
    let loaded = Config::load_from(&path).await.unwrap();

    assert_eq!(loaded.ssn, config.ssn);
    assert_eq!(loaded.cookies, config.cookies);
    assert_eq!(loaded.exam_type, ExamType::Kunskapsprov);
    assert_eq!(loaded.location_ids, config.location_ids);
    assert_eq!(loaded.location, config.location);
    assert_eq!(loaded.poll_interval_secs, 600);
    assert_eq!(loaded.retry, config.retry);
}

#[tokio::test]
async fn test_missing_config_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&temp_dir.path().join("absent.json")).await.unwrap();

    assert!(config.ssn.is_empty());
    assert_eq!(config.poll_interval_secs, 1200);
}

#[tokio::test]
async fn test_malformed_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let err = Config::load_from(&path).await.unwrap_err();
    assert!(!err.is_unavailable());
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("deeply").join("nested").join("config.json");

    save_json(&nested, &serde_json::json!({"key": "value"})).await.unwrap();
    assert!(nested.exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let path = PathBuf::from("/nonexistent/path/config.json");
    let result: Result<Config, _> = load_json(&path).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("atomic.json");

    save_json(&path, &sample_config()).await.unwrap();

    assert!(!path.with_extension("json.tmp").exists());
    assert!(path.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_saved_config_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("secrets").join("config.json");
    sample_config().save_to(&path).await.unwrap();

    let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    let dir_mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
    assert_eq!(file_mode, 0o600);
    assert_eq!(dir_mode, 0o700);
}

// ============================================================================
// Edge Cases
// ============================================================================

#[tokio::test]
async fn test_load_json_with_unknown_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    tokio::fs::write(
        &path,
        r#"{"ssn": "199001011234", "location_ids": [1], "legacy_flag": true}"#,
    )
    .await
    .unwrap();

    let config = Config::load_from(&path).await.unwrap();
    assert_eq!(config.location_ids, vec![1]);
}

#[tokio::test]
async fn test_unicode_location_filter() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let config = Config {
        location: Some("Göteborg Högsbo".to_string()),
        ..sample_config()
    };
    config.save_to(&path).await.unwrap();

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.location.as_deref(), Some("Göteborg Högsbo"));
}
