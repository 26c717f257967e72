use lscan::config::ConfigManager;
use lscan::{AppConfig, AppOptions, Args, ExportFormat, ViewMode};
use std::fs;

fn manager() -> (tempfile::TempDir, ConfigManager) {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::with_dir(dir.path().join("lscan"));
    (dir, manager)
}

#[test]
fn test_missing_file_gives_defaults() {
    let (_dir, manager) = manager();
    let config = AppConfig::load_from(&manager).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_user_file_overrides_defaults() {
    let (_dir, manager) = manager();
    manager.ensure_config_dir().unwrap();
    fs::write(
        manager.config_path("config.toml"),
        r##"
[backend]
url = "http://numbers.local:9000"

[scan]
modulus = 7
view = "grid"

[export]
format = "svg"

[theme.colors]
border = "#336699"
"##,
    )
    .unwrap();

    let config = AppConfig::load_from(&manager).unwrap();
    assert_eq!(config.backend.url, "http://numbers.local:9000");
    assert_eq!(config.scan.modulus, 7);
    assert_eq!(config.view(), ViewMode::Grid);
    assert_eq!(config.export_format(), ExportFormat::Svg);
    assert_eq!(config.theme.colors.border, "#336699");
    // untouched keys keep their defaults
    assert_eq!(config.scan.end, 100.0);
    assert_eq!(config.clt.samples, 1000);
    assert_eq!(config.theme.colors.primary, "cyan");
}

#[test]
fn test_invalid_values_are_rejected() {
    let (_dir, manager) = manager();
    manager.ensure_config_dir().unwrap();
    let path = manager.config_path("config.toml");

    fs::write(&path, "[scan]\nview = \"spiral\"\n").unwrap();
    assert!(AppConfig::load_from(&manager).is_err());

    fs::write(&path, "[performance]\nevent_poll_interval_ms = 0\n").unwrap();
    assert!(AppConfig::load_from(&manager).is_err());

    fs::write(&path, "[clt]\nstart = 500.0\nend = 100.0\n").unwrap();
    assert!(AppConfig::load_from(&manager).is_err());

    // NO_COLOR turns every color into Reset, so names are not checked then
    if std::env::var_os("NO_COLOR").is_none() {
        fs::write(&path, "[theme.colors]\nerror = \"not-a-color\"\n").unwrap();
        assert!(AppConfig::load_from(&manager).is_err());
    }

    fs::write(&path, "this is not toml = = =").unwrap();
    assert!(AppConfig::load_from(&manager).is_err());
}

#[test]
fn test_generate_config_respects_force() {
    let (_dir, manager) = manager();
    let path = manager.write_default_config(false).unwrap();
    assert!(path.exists());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        manager.generate_default_config()
    );

    fs::write(&path, "# edited\n").unwrap();
    assert!(manager.write_default_config(false).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "# edited\n");

    manager.write_default_config(true).unwrap();
    assert_eq!(AppConfig::load_from(&manager).unwrap(), AppConfig::default());
}

#[test]
fn test_cli_overrides_config() {
    let mut config = AppConfig::default();
    config.scan.modulus = 7;
    config.scan.real_part = 0.75;
    config.export.format = "json".to_string();

    let args = Args {
        modulus: Some(11),
        clt_start: Some(10.0),
        ..Args::default()
    };
    let mut options = AppOptions::from_config(&config);
    options.apply_args(&args);

    assert_eq!(options.modulus, 11);
    assert_eq!(options.real_part, 0.75);
    assert_eq!(options.clt_start, 10.0);
    assert_eq!(options.export_format, ExportFormat::Json);
    assert!(!options.debug);
}
