//! Integration tests for configuration loading

use himama_bridge::infra::Config;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_config_from_file() {
    let temp_file = write_config(
        r#"
[himama]
email = "parent@example.com"
password = "secret"
child_id = "4242"
base_url = "http://localhost:8080/"
request_timeout_secs = 5

[poll]
interval_secs = 60

[mqtt]
host = "test-host"
port = 1884
username = "ha"
password = "ha-pass"
topic_prefix = "home/himama/"
"#,
    );

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.credentials().email, "parent@example.com");
    assert_eq!(config.credentials().child_id, "4242");
    assert_eq!(config.site().base_url, "http://localhost:8080");
    assert_eq!(config.site().request_timeout, Duration::from_secs(5));
    assert_eq!(config.poll_interval_secs(), 60);
    assert_eq!(config.mqtt_host(), "test-host");
    assert_eq!(config.mqtt_port(), 1884);
    assert_eq!(config.mqtt_username(), Some("ha"));
    assert_eq!(config.mqtt_password(), Some("ha-pass"));
    assert_eq!(config.mqtt_topic_prefix(), "home/himama");
    assert_eq!(config.mqtt_client_id(), "himama-bridge");
}

#[test]
fn test_optional_sections_default() {
    let temp_file = write_config(
        r#"
[himama]
email = "parent@example.com"
password = "secret"
child_id = "4242"
"#,
    );

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.site().base_url, "https://www.himama.com");
    assert_eq!(config.poll_interval_secs(), 900);
    assert_eq!(config.mqtt_host(), "localhost");
    assert_eq!(config.mqtt_port(), 1883);
    assert_eq!(config.mqtt_username(), None);
}

#[test]
fn test_empty_credential_rejected() {
    let temp_file = write_config(
        r#"
[himama]
email = "parent@example.com"
password = ""
child_id = "4242"
"#,
    );

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("himama.password must not be empty"));
}

#[test]
fn test_missing_himama_section_rejected() {
    let temp_file = write_config("[mqtt]\nhost = \"x\"\n");
    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_unreadable_file_reports_path() {
    let err = Config::from_file("/nonexistent/config.toml").unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to read config file /nonexistent/config.toml"));
    assert!(!message.contains("must not be empty"));
}

#[test]
fn test_typo_reports_parse_error_not_empty_field() {
    let temp_file = write_config(
        r#"
[himama]
email = "parent@example.com"
password = "secret"
child_id = "4242"

[poll]
interval_secs = "fifteen"
"#,
    );

    let message = format!("{:#}", Config::from_file(temp_file.path()).unwrap_err());
    assert!(message.contains("Failed to parse config file"));
    assert!(message.contains("interval_secs"));
    assert!(!message.contains("himama.email"));
}
