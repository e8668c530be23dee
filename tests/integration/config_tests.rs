use clap::Parser;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use itemdedup::cli::Cli;
use itemdedup::config::{ConfigError, Settings};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_settings_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
backup = false
format = false
log_file = "/tmp/itemdedup.log"
append_log = true
threads = 6
"#,
    )
    .unwrap();

    // isolated from ITEMDEDUP_* set by other tests
    figment::Jail::expect_with(|_| {
        let settings = Settings::load(Some(&config_path)).unwrap();
        assert!(!settings.backup);
        assert!(!settings.format);
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/itemdedup.log")));
        assert!(settings.append_log);
        assert_eq!(settings.threads, Some(6));
        Ok(())
    });
}

#[test]
fn test_settings_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = 2\nformat = true\n").unwrap();

    figment::Jail::expect_with(|jail| {
        jail.set_env("ITEMDEDUP_THREADS", "9");
        let settings = Settings::from_figment(Settings::figment(Some(&config_path))).unwrap();
        assert_eq!(settings.threads, Some(9));
        assert!(settings.format);
        Ok(())
    });
}

#[test]
fn test_cli_flags_override_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "backup = true\nthreads = 2\n").unwrap();

    let settings = Settings::from_figment(
        Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(&config_path)),
    )
    .unwrap();
    let cli = Cli::try_parse_from(["itemdedup", "--no-backup", "--threads", "4", "a.xml"]).unwrap();
    let settings = settings.with_cli(&cli);

    assert!(!settings.backup);
    assert_eq!(settings.threads, Some(4));
    let options = settings.batch_options(false);
    assert!(!options.backup);
    assert!(!options.dry_run);
    assert!(!options.no_format);
}

#[test]
fn test_unknown_config_path() {
    let temp_dir = tempdir().unwrap();
    let err = Settings::load(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
    assert!(err.to_string().contains("nope.toml"));
}
