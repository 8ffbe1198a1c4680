
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use url::Url;

use super::{Config, WeatherConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!(
        "{}",
        style("🔧 Toolkit MCP Configuration Setup").bold().cyan()
    );
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Weather Service Configuration").bold().yellow());
    eprintln!("Configure the Open-Meteo endpoints used by the weather tools.");
    eprintln!();

    configure_weather(&mut config.weather)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_weather_connection(&config.weather)? {
        eprintln!("{}", style("✓ Weather service reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the weather service").yellow()
        );
        eprintln!("You can continue, but lookups will fail until the service is reachable.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        let config_path = config
            .config_file_path()
            .context("Failed to get config file path")?;
        eprintln!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = Config::config_dir().context("Failed to determine config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Weather Settings:").bold().yellow());
    eprintln!(
        "  Geocoding URL: {}",
        style(&config.weather.geocoding_url).cyan()
    );
    eprintln!(
        "  Forecast URL: {}",
        style(&config.weather.forecast_url).cyan()
    );
    eprintln!("  Units: {}", style(&config.weather.units).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(config.weather.timeout_seconds).cyan()
    );
    eprintln!(
        "  Retry Attempts: {}",
        style(config.weather.retry_attempts).cyan()
    );
    eprintln!(
        "  User Agent: {}",
        style(&config.weather.user_agent).cyan()
    );

    let config_path = config
        .config_file_path()
        .context("Failed to get config file path")?;
    eprintln!();
    eprintln!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = Config::config_dir().context("Failed to determine config directory")?;

    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_weather(weather: &mut WeatherConfig) -> Result<()> {
    let units_options = &["metric", "imperial"];
    let default_index = units_options
        .iter()
        .position(|&u| u == weather.units)
        .unwrap_or(0);

    let units_index = Select::new()
        .with_prompt("Measurement units")
        .default(default_index)
        .items(units_options)
        .interact()?;

    let units = units_options[units_index].to_string();

    let geocoding_url: String = Input::new()
        .with_prompt("Geocoding service URL")
        .default(weather.geocoding_url.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if Url::parse(input).is_ok() {
                Ok(())
            } else {
                Err("Must be a valid URL")
            }
        })
        .interact_text()?;

    let forecast_url: String = Input::new()
        .with_prompt("Forecast service URL")
        .default(weather.forecast_url.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if Url::parse(input).is_ok() {
                Ok(())
            } else {
                Err("Must be a valid URL")
            }
        })
        .interact_text()?;

    let timeout_seconds: u64 = Input::new()
        .with_prompt("Request timeout in seconds")
        .default(weather.timeout_seconds)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if (1..=300).contains(input) {
                Ok(())
            } else {
                Err("Timeout must be between 1 and 300 seconds")
            }
        })
        .interact_text()?;

    let retry_attempts: u32 = Input::new()
        .with_prompt("Retry attempts for failed requests")
        .default(weather.retry_attempts)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (1..=10).contains(input) {
                Ok(())
            } else {
                Err("Retry attempts must be between 1 and 10")
            }
        })
        .interact_text()?;

    weather.set_units(units)?;
    weather.set_geocoding_url(geocoding_url)?;
    weather.set_forecast_url(forecast_url)?;
    weather.set_timeout_seconds(timeout_seconds)?;
    weather.set_retry_attempts(retry_attempts)?;

    Ok(())
}

fn test_weather_connection(weather: &WeatherConfig) -> Result<bool> {
    let url = format!(
        "{}/v1/search?name=Berlin&count=1",
        weather.geocoding_url.trim_end_matches('/')
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
