#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use itertools::{Itertools, izip};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
const PROBE_CITY: &str = "Berlin";

/// Client for the Open-Meteo geocoding and forecast services
#[derive(Debug, Clone)]
pub struct WeatherClient {
    geocoding_url: Url,
    forecast_url: Url,
    units: Units,
    user_agent: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

/// Measurement system used for temperatures and wind speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    /// Parse the configured units name
    #[inline]
    pub fn from_name(value: &str) -> Result<Self> {
        match value {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(anyhow!(
                "Unknown units '{}', expected 'metric' or 'imperial'",
                other
            )),
        }
    }

    /// Temperature unit label
    #[inline]
    pub fn temperature_unit(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    /// Wind speed unit label
    #[inline]
    pub fn windspeed_unit(self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<Place>>,
}

/// A resolved location from the geocoding service
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub admin1: Option<String>,
    pub timezone: Option<String>,
}

impl Place {
    /// Full display name including region and country when known
    #[inline]
    pub fn display_name(&self) -> String {
        [
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: u8,
    is_day: u8,
    time: String,
}

#[derive(Debug, Deserialize)]
struct DailyForecastResponse {
    daily: Option<DailySeries>,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weathercode: Vec<u8>,
    precipitation_sum: Vec<f64>,
}

/// Current conditions for a resolved location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub location: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub temperature_unit: String,
    pub windspeed: f64,
    pub windspeed_unit: String,
    pub wind_direction: String,
    pub conditions: String,
    pub is_day: bool,
    pub observed_at: String,
}

/// Multi-day forecast for a resolved location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub city: String,
    pub location: String,
    pub country: Option<String>,
    pub temperature_unit: String,
    pub days: Vec<ForecastDay>,
}

/// Single day within a forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub weekday: String,
    pub high: f64,
    pub low: f64,
    pub conditions: String,
    pub precipitation_mm: f64,
}

impl WeatherClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let geocoding_url = config
            .geocoding_url()
            .context("Failed to parse geocoding URL from config")?;
        let forecast_url = config
            .forecast_url()
            .context("Failed to parse forecast URL from config")?;
        let units = Units::from_name(&config.weather.units)
            .context("Failed to parse units from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.weather.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            geocoding_url,
            forecast_url,
            units,
            user_agent: config.weather.user_agent.clone(),
            agent,
            retry_attempts: config.weather.retry_attempts,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Measurement system this client reports in
    #[inline]
    pub fn units(&self) -> Units {
        self.units
    }

    /// Test connectivity to both Open-Meteo services
    ///
    /// Resolves a well-known city and fetches its current conditions, which
    /// exercises the geocoding and forecast hosts in one pass.
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!(
            "Performing health check against {} and {}",
            self.geocoding_url, self.forecast_url
        );

        let place = self.geocode(PROBE_CITY).context("Geocoding probe failed")?;
        self.fetch_current_weather(&place)
            .context("Forecast probe failed")?;

        info!(
            "Health check passed for Open-Meteo at {} and {}",
            self.geocoding_url, self.forecast_url
        );
        Ok(())
    }

    /// Resolve a city name to its best-matching location
    #[inline]
    pub fn geocode(&self, city: &str) -> Result<Place> {
        let mut url = self
            .geocoding_url
            .join("/v1/search")
            .context("Failed to build geocoding URL")?;
        url.query_pairs_mut()
            .append_pair("name", city)
            .append_pair("count", "1")
            .append_pair("language", "en")
            .append_pair("format", "json");

        debug!("Resolving city '{}'", city);

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .get(url.as_str())
                    .header("User-Agent", self.user_agent.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to query geocoding service")?;

        let response: GeocodingResponse =
            serde_json::from_str(&response_text).context("Failed to parse geocoding response")?;

        response
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No location found for '{}'", city))
    }

    /// Look up current conditions for a city
    #[inline]
    pub fn current_weather(&self, city: &str) -> Result<CurrentConditions> {
        debug!("Fetching current weather for '{}'", city);

        let place = self.geocode(city)?;
        let current = self.fetch_current_weather(&place)?;

        let observed_at = NaiveDateTime::parse_from_str(&current.time, "%Y-%m-%dT%H:%M")
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| current.time.clone());

        Ok(CurrentConditions {
            city: place.name.clone(),
            location: place.display_name(),
            country: place.country.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            temperature: current.temperature,
            temperature_unit: self.units.temperature_unit().to_string(),
            windspeed: current.windspeed,
            windspeed_unit: self.units.windspeed_unit().to_string(),
            wind_direction: compass_direction(current.winddirection).to_string(),
            conditions: describe_weather_code(current.weathercode).to_string(),
            is_day: current.is_day == 1,
            observed_at,
        })
    }

    /// Fetch a multi-day forecast for a city
    #[inline]
    pub fn forecast(&self, city: &str, days: u8) -> Result<Forecast> {
        debug!("Fetching {}-day forecast for '{}'", days, city);

        let place = self.geocode(city)?;
        let daily = self.fetch_daily_forecast(&place, days)?;

        let days = izip!(
            &daily.time,
            &daily.temperature_2m_max,
            &daily.temperature_2m_min,
            &daily.weathercode,
            &daily.precipitation_sum
        )
        .map(|(date, high, low, code, precipitation)| {
            let weekday = date
                .parse::<NaiveDate>()
                .map(|d| d.format("%A").to_string())
                .unwrap_or_default();

            ForecastDay {
                date: date.clone(),
                weekday,
                high: *high,
                low: *low,
                conditions: describe_weather_code(*code).to_string(),
                precipitation_mm: *precipitation,
            }
        })
        .collect();

        Ok(Forecast {
            city: place.name.clone(),
            location: place.display_name(),
            country: place.country.clone(),
            temperature_unit: self.units.temperature_unit().to_string(),
            days,
        })
    }

    fn fetch_current_weather(&self, place: &Place) -> Result<CurrentWeather> {
        let mut url = self
            .forecast_url
            .join("/v1/forecast")
            .context("Failed to build forecast URL")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("latitude", &place.latitude.to_string())
                .append_pair("longitude", &place.longitude.to_string())
                .append_pair("current_weather", "true");
            if self.units == Units::Imperial {
                pairs
                    .append_pair("temperature_unit", "fahrenheit")
                    .append_pair("windspeed_unit", "mph");
            }
        }

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .get(url.as_str())
                    .header("User-Agent", self.user_agent.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to query forecast service")?;

        let response: CurrentWeatherResponse =
            serde_json::from_str(&response_text).context("Failed to parse forecast response")?;

        response
            .current_weather
            .ok_or_else(|| anyhow!("Forecast response missing current weather block"))
    }

    fn fetch_daily_forecast(&self, place: &Place, days: u8) -> Result<DailySeries> {
        let mut url = self
            .forecast_url
            .join("/v1/forecast")
            .context("Failed to build forecast URL")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("latitude", &place.latitude.to_string())
                .append_pair("longitude", &place.longitude.to_string())
                .append_pair(
                    "daily",
                    "temperature_2m_max,temperature_2m_min,weathercode,precipitation_sum",
                )
                .append_pair("forecast_days", &days.to_string())
                .append_pair("timezone", "auto");
            if self.units == Units::Imperial {
                pairs
                    .append_pair("temperature_unit", "fahrenheit")
                    .append_pair("windspeed_unit", "mph");
            }
        }

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .get(url.as_str())
                    .header("User-Agent", self.user_agent.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to query forecast service")?;

        let response: DailyForecastResponse =
            serde_json::from_str(&response_text).context("Failed to parse forecast response")?;

        response
            .daily
            .ok_or_else(|| anyhow!("Forecast response missing daily block"))
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true // Retry server errors
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true // Retry transport errors
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false // Don't retry other errors
                        }
                    };

                    if !should_retry {
                        return Err(anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow!("Request error: {}", error));

                    // Wait before retry (exponential backoff)
                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for Open-Meteo request");

        Err(last_error.unwrap_or_else(|| anyhow!("Request failed after retries")))
    }
}

/// Human-readable description for a WMO weather interpretation code
#[inline]
pub fn describe_weather_code(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 => "Snowfall",
        77 => "Snow grains",
        80 | 81 | 82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown conditions",
    }
}

/// Compass point for a wind direction in degrees
#[inline]
pub fn compass_direction(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = degrees.rem_euclid(360.0);
    let index = ((normalized + 22.5) / 45.0) as usize % 8;
    POINTS[index]
}
