use clap::Parser;
use dupfind::cli::Cli;
use dupfind::config::Config;
use dupfind::error::ConfigError;
use dupfind::output::OutputFormat;
use dupfind::scanner::DigestAlgorithm;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Figment without Env so other tests cannot interfere
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.algorithm, DigestAlgorithm::Sha1);
    assert_eq!(config.output, OutputFormat::Pairs);
    assert_eq!(config.database, PathBuf::from(".dupdb"));
    assert!(!config.strict);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("DUPFIND_STREAM_THRESHOLD", "4096");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("DUPFIND_"));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.stream_threshold, 4096);

    std::env::remove_var("DUPFIND_STREAM_THRESHOLD");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let toml_content = r#"
one_file_system = true
algorithm = "blake3"
output = "json"
database = "scans/home.dupdb"
initial_capacity = 1024
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(&config_path);

    assert!(config.one_file_system);
    assert_eq!(config.algorithm, DigestAlgorithm::Blake3);
    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.database, PathBuf::from("scans/home.dupdb"));
    assert_eq!(config.initial_capacity, 1024);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let config = Config::load_from_path(&temp_dir.path().join("absent.toml"));
    assert_eq!(config.algorithm, DigestAlgorithm::Sha1);
    assert_eq!(config.database, PathBuf::from(".dupdb"));
}

#[test]
fn test_unparseable_config_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algorithm = \"md5\"\n").unwrap();

    let config = Config::load_from_path(&config_path);
    assert_eq!(config.algorithm, DigestAlgorithm::Sha1);
}

#[test]
fn test_cli_flags_override_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algorithm = \"sha256\"\noutput = \"json\"\n").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let mut config: Config = figment.extract().unwrap();
    let cli = Cli::parse_from(["dupfind", "--algorithm", "blake3", "--strict", "-x", "/tmp"]);
    config.merge_cli(&cli);

    assert_eq!(config.algorithm, DigestAlgorithm::Blake3);
    assert_eq!(config.output, OutputFormat::Json);
    assert!(config.strict);
    assert!(config.one_file_system);
}

#[test]
fn test_cli_cannot_switch_file_setting_off() {
    let mut config = Config {
        strict: true,
        ..Config::default()
    };
    let cli = Cli::parse_from(["dupfind", "/tmp"]);
    config.merge_cli(&cli);
    assert!(config.strict);
}

#[test]
fn test_validate_rejects_zero_threshold() {
    let config = Config {
        stream_threshold: 0,
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "stream_threshold",
            ..
        })
    ));
}
