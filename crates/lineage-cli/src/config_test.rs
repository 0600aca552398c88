use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn global(config: Option<&str>, dialect: Option<&str>) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        config: config.map(String::from),
        dialect: dialect.map(String::from),
    }
}

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.dialect, Dialect::Ansi);
    assert!(config.mask_queries);
    assert_eq!(config.default_output, OutputFormat::Text);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
dialect: snowflake
mask_queries: false
default_output: json
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.dialect, Dialect::Snowflake);
    assert!(!config.mask_queries);
    assert_eq!(config.default_output, OutputFormat::Json);
}

#[test]
fn test_unknown_fields_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("dialect: ansi\nbogus: 1\n");
    assert!(result.is_err());
}

#[test]
fn test_load_from_file() {
    let file = write_config("dialect: tsql\n");
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.dialect, Dialect::Tsql);
}

#[test]
fn test_load_missing_file_has_context() {
    let err = Config::load(Path::new("/nonexistent/sqllineage.yml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_flags_override_config_file() {
    let file = write_config("dialect: snowflake\ndefault_output: json\n");
    let path = file.path().to_str().unwrap();

    let settings = Settings::resolve(&global(Some(path), None), None).unwrap();
    assert_eq!(settings.dialect, Dialect::Snowflake);
    assert_eq!(settings.output, OutputFormat::Json);

    let settings =
        Settings::resolve(&global(Some(path), Some("mysql")), Some(OutputFormat::Text)).unwrap();
    assert_eq!(settings.dialect, Dialect::MySql);
    assert_eq!(settings.output, OutputFormat::Text);
}

#[test]
fn test_defaults_without_config_file() {
    let settings = Settings::resolve(&global(None, Some("not-a-dialect")), None).unwrap();
    assert_eq!(settings.dialect, Dialect::Ansi);
    assert!(settings.mask_queries);
    assert_eq!(settings.output, OutputFormat::Text);
}
