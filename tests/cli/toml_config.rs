//! Configuration file handling through the public API

use caplist::app::cli::{Args, ConfigError};
use caplist::app::{load_settings, StartupError};
use std::io::Write;
use std::time::Duration;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_file_supplies_pipeline_settings() {
    let file = config_file(
        r#"
format = "events:{{user_id}}"
size = 3
redis-url = "redis://cache.internal:6380/4"
concurrency = 16
max-attempts = 10
requeue-delay-ms = 200
"#,
    );
    let args = Args {
        config_file: Some(file.path().to_path_buf()),
        ..Args::default()
    };

    let settings = load_settings(args).await.unwrap();

    assert_eq!(settings.list.format, "events:{{user_id}}");
    assert_eq!(settings.list.size, 3);
    assert_eq!(settings.redis_url, "redis://cache.internal:6380/4");
    assert_eq!(settings.consumer.concurrency, 16);
    assert_eq!(settings.consumer.requeue.max_attempts, 10);
    assert_eq!(settings.consumer.requeue.delay, Duration::from_millis(200));
}

#[tokio::test]
async fn test_file_cannot_set_zero_concurrency() {
    let file = config_file("format = \"k\"\nconcurrency = 0\n");
    let args = Args {
        config_file: Some(file.path().to_path_buf()),
        ..Args::default()
    };

    let err = load_settings(args).await.unwrap_err();
    assert!(matches!(
        err,
        StartupError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "concurrency"
    ));
}

#[tokio::test]
async fn test_empty_format_in_file_is_rejected() {
    let file = config_file("format = \"\"\n");
    let args = Args {
        config_file: Some(file.path().to_path_buf()),
        ..Args::default()
    };

    assert!(load_settings(args).await.is_err());
}
