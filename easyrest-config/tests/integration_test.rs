//! Integration tests for easyrest-config

use easyrest_config::*;
use std::io::Write;

fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_settings_from_toml_file() {
    let file = write_file(
        ".toml",
        r#"
        address = "127.0.0.1:9100"
        json_indent = "    "
        check_method = false
        "#,
    );

    let settings = ServerSettings::from_file(file.path()).unwrap();
    assert_eq!(settings.address, "127.0.0.1:9100");
    assert_eq!(settings.json_indent, "    ");
    assert!(!settings.check_method);
    // Keys absent from the file keep their defaults.
    assert_eq!(settings.log_level, "info");
}

#[test]
fn test_settings_from_json_file() {
    let file = write_file(".json", r#"{"log_format": "compact", "access_log": true}"#);

    let settings = ServerSettings::from_file(file.path()).unwrap();
    assert_eq!(settings.log_format, "compact");
    assert!(settings.access_log);
    assert!(settings.dispatch_config().log_sink.is_some());
}

#[test]
fn test_settings_from_env_file() {
    let file = write_file(".env", "ADDRESS=0.0.0.0:8000\nCHECK_METHOD=0\nJSON_INDENT=\"  \"\n");

    let settings = ServerSettings::from_file(file.path()).unwrap();
    assert_eq!(settings.address, "0.0.0.0:8000");
    assert!(!settings.check_method);
    assert_eq!(settings.json_indent, "  ");
}

#[test]
fn test_environment_overrides_file() {
    let file = write_file(".toml", "address = \"127.0.0.1:9100\"\nlog_level = \"info\"\n");
    let mut settings = ServerSettings::from_file(file.path()).unwrap();

    let env = EnvLoader::from_vars(
        Some(DEFAULT_PREFIX.to_string()),
        [
            ("EASYREST_ADDRESS", "127.0.0.1:9200"),
            ("EASYREST_LOG_LEVEL", "error"),
        ],
    );
    settings.apply_env(&env.load().unwrap()).unwrap();

    assert_eq!(settings.address, "127.0.0.1:9200");
    assert_eq!(settings.log_level, "error");
    assert!(settings.validate().is_ok());
}

#[test]
fn test_unsupported_extension() {
    let file = write_file(".yaml", "address: here");
    let err = ServerSettings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
fn test_wrongly_typed_file_value() {
    let file = write_file(".json", r#"{"check_method": "sometimes"}"#);
    let err = ServerSettings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_loader_load_into() {
    #[derive(serde::Deserialize)]
    struct Partial {
        address: String,
    }

    let file = write_file(".json", r#"{"address": "10.0.0.1:80", "extra": 1}"#);
    let partial: Partial = ConfigLoader::auto(file.path())
        .unwrap()
        .load_into(file.path())
        .unwrap();
    assert_eq!(partial.address, "10.0.0.1:80");
}

#[test]
fn test_dotenv_file_feeds_env_loader() {
    let file = write_file(".env", "EASYREST_DOTENV_LOG_LEVEL=debug\n");

    let loader = EnvLoader::with_dotenv(Some("EASYREST_DOTENV".to_string()), Some(file.path()))
        .unwrap();
    let vars = loader.load().unwrap();
    assert_eq!(vars.get("log_level").map(String::as_str), Some("debug"));

    let mut settings = ServerSettings::default();
    settings.apply_env(&vars).unwrap();
    assert_eq!(settings.log_level, "debug");
}

#[test]
fn test_missing_dotenv_file_is_an_error() {
    let result = EnvLoader::with_dotenv(None, Some(std::path::Path::new("/nonexistent/.env")));
    assert!(matches!(result, Err(ConfigError::LoadError(_))));
}

fn browsing_defaults() -> ServerSettings {
    ServerSettings {
        json_indent: "  ".to_string(),
        check_method: false,
        access_log: true,
        ..Default::default()
    }
}

#[test]
fn test_file_overlays_custom_defaults() {
    let file = write_file(".toml", "address = \"127.0.0.1:9300\"\n");

    let settings = browsing_defaults().overlay_file(file.path()).unwrap();
    assert_eq!(settings.address, "127.0.0.1:9300");
    assert_eq!(settings.json_indent, "  ");
    assert!(!settings.check_method);
    assert!(settings.access_log);

    let file = write_file(".env", "CHECK_METHOD=1\n");
    let settings = browsing_defaults().overlay_file(file.path()).unwrap();
    assert!(settings.check_method);
    assert_eq!(settings.json_indent, "  ");
}

#[test]
fn test_load_over_keeps_base_without_file() {
    let settings = ServerSettings::load_over(browsing_defaults(), None).unwrap();
    let config = settings.dispatch_config();
    assert_eq!(config.json_indent, "  ");
    assert!(!config.check_method);
    assert!(config.log_sink.is_some());
}
