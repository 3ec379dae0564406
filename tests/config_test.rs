use heatgrid::config::{AppConfig, ColorMode, ConfigManager};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    assert_eq!(config.display.float_precision, 4);
    assert!(config.display.grouping);

    assert_eq!(config.colormap.default, "RdBu");
    assert_eq!(config.colormap.samples, 256);
    assert_eq!(config.colormap.alpha, None);

    assert_eq!(config.theme.color_mode, "auto");
    assert_eq!(config.theme.colors.negative, "red");
    assert_eq!(config.theme.colors.row_header, "dark_gray");
    assert_eq!(config.theme.colors.overlay_base, "#000000");
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    assert!(template.contains("[display]"));
    assert!(template.contains("[colormap]"));
    assert!(template.contains("[theme]"));
    assert!(template.contains("[theme.colors]"));
    assert!(template.contains("version = \"0.1\""));
}

#[test]
fn test_default_template_parses_to_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config: AppConfig = toml::from_str(&config_manager.generate_default_config())
        .expect("Default template should parse");
    assert_eq!(config.version, "0.1");
    assert_eq!(config.colormap.samples, 256);
    assert!(config.validate().is_ok());
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());

    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[colormap]"));
    assert!(content.contains("version = \"0.1\""));
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager
        .write_default_config(false)
        .expect("First write should succeed");

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn test_write_config_with_force_overwrites() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let first_path = config_manager
        .write_default_config(false)
        .expect("First write should succeed");
    let second_path = config_manager
        .write_default_config(true)
        .expect("Second write with force should succeed");

    assert_eq!(first_path, second_path);
    assert!(first_path.exists());
}

#[test]
fn test_load_config_with_no_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config = AppConfig::load_with(&config_manager).expect("Missing file should load defaults");
    assert_eq!(config.version, "0.1");
    assert_eq!(config.colormap.default, "RdBu");
}

#[test]
fn test_load_user_config_over_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();

    fs::write(
        config_manager.config_path("config.toml"),
        r#"
version = "0.1"

[colormap]
default = "Spectral"
alpha = 128

[theme.colors]
negative = "bright_red"
"#,
    )
    .unwrap();

    let config = AppConfig::load_with(&config_manager).expect("Config should load");
    assert_eq!(config.colormap.default, "Spectral");
    assert_eq!(config.colormap.alpha, Some(128));
    assert_eq!(config.theme.colors.negative, "bright_red");

    // untouched values keep their defaults
    assert_eq!(config.colormap.samples, 256);
    assert_eq!(config.display.float_precision, 4);
    assert_eq!(config.theme.colors.header, "white");
}

#[test]
fn test_load_reports_parse_errors() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(config_manager.config_path("config.toml"), "[colormap\n").unwrap();

    let err = AppConfig::load_with(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_merge_configs() {
    let mut base = AppConfig::default();
    let mut other = AppConfig::default();
    other.display.grouping = false;
    other.colormap.samples = 64;
    other.theme.color_mode = "256".to_string();

    base.merge(other);

    assert!(!base.display.grouping);
    assert_eq!(base.colormap.samples, 64);
    assert_eq!(base.theme.color_mode, "256");
    assert_eq!(base.display.float_precision, 4);
    assert_eq!(base.colormap.default, "RdBu");
}

#[test]
fn test_merge_keeps_alpha_when_other_unset() {
    let mut base = AppConfig::default();
    base.colormap.alpha = Some(90);

    base.merge(AppConfig::default());

    assert_eq!(base.colormap.alpha, Some(90));
}

#[test]
fn test_validate_config_valid() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_validate_config_invalid_version() {
    let mut config = AppConfig::default();
    config.version = "2.0".to_string();

    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Unsupported config version"));
}

#[test]
fn test_validate_zero_samples() {
    let mut config = AppConfig::default();
    config.colormap.samples = 0;

    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("samples"));
}

#[test]
fn test_validate_unknown_default_colormap() {
    let mut config = AppConfig::default();
    config.colormap.default = "viridis_pro".to_string();

    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("Unknown default colormap"));
    assert!(err.contains("RdBu"));
}

#[test]
fn test_validate_reversed_default_colormap() {
    let mut config = AppConfig::default();
    config.colormap.default = "RdYlGn_r".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_precision_bound() {
    let mut config = AppConfig::default();
    config.display.float_precision = 40;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_color_mode() {
    let mut config = AppConfig::default();
    config.theme.color_mode = "dark".to_string();
    assert!(config.validate().is_err());

    for mode in ["auto", "truecolor", "256", "basic"] {
        assert!(ColorMode::parse(mode).is_ok(), "{mode} should be accepted");
    }
}

#[test]
fn test_validate_colors() {
    let mut config = AppConfig::default();
    config.theme.colors.header = "not_a_color".to_string();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("header"));

    let mut config = AppConfig::default();
    config.theme.colors.overlay_base = "black".to_string();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("overlay_base"));
}
