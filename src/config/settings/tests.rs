use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(
        config.weather.geocoding_url,
        "https://geocoding-api.open-meteo.com"
    );
    assert_eq!(config.weather.forecast_url, "https://api.open-meteo.com");
    assert_eq!(config.weather.units, "metric");
    assert_eq!(config.weather.timeout_seconds, 30);
    assert_eq!(config.weather.retry_attempts, 3);
    assert!(config.weather.user_agent.starts_with("toolkit-mcp/"));
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.weather.units = "kelvin".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.weather.timeout_seconds = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.weather.timeout_seconds = 301;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.weather.retry_attempts = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.weather.retry_attempts = 11;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.weather.user_agent = "   ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.weather.geocoding_url = "not-a-url".to_string();
    assert!(invalid_config.validate().is_err());
}

#[test]
fn url_generation() {
    let config = Config::default();

    let geocoding = config
        .geocoding_url()
        .expect("should generate geocoding url successfully");
    assert_eq!(geocoding.as_str(), "https://geocoding-api.open-meteo.com/");

    let forecast = config
        .forecast_url()
        .expect("should generate forecast url successfully");
    assert_eq!(forecast.as_str(), "https://api.open-meteo.com/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_falls_back_to_defaults() {
    let toml_str = r#"
[weather]
units = "imperial"
"#;

    let config: Config = toml::from_str(toml_str).expect("should parse toml correctly");
    assert_eq!(config.weather.units, "imperial");
    assert_eq!(config.weather.retry_attempts, 3);
    assert_eq!(config.weather.forecast_url, "https://api.open-meteo.com");
}

#[test]
fn setter_validation() {
    let mut config = WeatherConfig::default();

    assert!(
        config
            .set_geocoding_url("http://localhost:8080".to_string())
            .is_ok()
    );
    assert!(
        config
            .set_forecast_url("http://localhost:8081".to_string())
            .is_ok()
    );
    assert!(config.set_units("imperial".to_string()).is_ok());
    assert!(config.set_timeout_seconds(60).is_ok());
    assert!(config.set_retry_attempts(5).is_ok());

    assert!(config.set_geocoding_url("not-a-url".to_string()).is_err());
    assert!(config.set_units("kelvin".to_string()).is_err());
    assert!(config.set_timeout_seconds(0).is_err());
    assert!(config.set_timeout_seconds(301).is_err());
    assert!(config.set_retry_attempts(0).is_err());
    assert!(config.set_retry_attempts(11).is_err());
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.weather, WeatherConfig::default());
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load(temp_dir.path()).expect("should load defaults");
    config
        .weather
        .set_units("imperial".to_string())
        .expect("units are valid");
    config
        .weather
        .set_timeout_seconds(45)
        .expect("timeout is valid");
    config.save().expect("should save config");

    let loaded = Config::load(temp_dir.path()).expect("should load saved config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.weather.units, "imperial");
    assert_eq!(loaded.weather.timeout_seconds, 45);
}

#[test]
fn load_rejects_invalid_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[weather]\nunits = \"kelvin\"\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}
