use super::*;
use crate::config::{Config, WeatherConfig};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(geocoding_url: &str, forecast_url: &str) -> Config {
    Config {
        weather: WeatherConfig {
            geocoding_url: geocoding_url.to_string(),
            forecast_url: forecast_url.to_string(),
            ..WeatherConfig::default()
        },
        ..Config::default()
    }
}

fn test_client(server_url: &str) -> WeatherClient {
    WeatherClient::new(&test_config(server_url, server_url))
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(1)
}

fn paris_geocoding_body() -> serde_json::Value {
    json!({
        "results": [{
            "id": 2_988_507,
            "name": "Paris",
            "latitude": 48.85341,
            "longitude": 2.3488,
            "country": "France",
            "admin1": "Île-de-France",
            "timezone": "Europe/Paris"
        }],
        "generationtime_ms": 0.7
    })
}

#[test]
fn client_configuration() {
    let config = test_config("http://geo.test:9200", "http://forecast.test:9300");
    let client = WeatherClient::new(&config).expect("Failed to create client");

    assert_eq!(client.geocoding_url.host_str(), Some("geo.test"));
    assert_eq!(client.geocoding_url.port(), Some(9200));
    assert_eq!(client.forecast_url.host_str(), Some("forecast.test"));
    assert_eq!(client.units, Units::Metric);
    assert_eq!(client.retry_attempts, 3);
}

#[test]
fn client_builder_methods() {
    let config = Config::default();
    let client = WeatherClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    // Note: timeout is part of the agent configuration
    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn units_parsing() {
    assert_eq!(
        Units::from_name("metric").expect("metric parses"),
        Units::Metric
    );
    assert_eq!(
        Units::from_name("imperial").expect("imperial parses"),
        Units::Imperial
    );
    assert!(Units::from_name("kelvin").is_err());

    assert_eq!(Units::Metric.temperature_unit(), "°C");
    assert_eq!(Units::Imperial.temperature_unit(), "°F");
    assert_eq!(Units::Metric.windspeed_unit(), "km/h");
    assert_eq!(Units::Imperial.windspeed_unit(), "mph");
}

#[test]
fn weather_code_descriptions() {
    assert_eq!(describe_weather_code(0), "Clear sky");
    assert_eq!(describe_weather_code(2), "Partly cloudy");
    assert_eq!(describe_weather_code(45), "Fog");
    assert_eq!(describe_weather_code(63), "Rain");
    assert_eq!(describe_weather_code(75), "Snowfall");
    assert_eq!(describe_weather_code(95), "Thunderstorm");
    assert_eq!(describe_weather_code(42), "Unknown conditions");
}

#[test]
fn compass_directions() {
    assert_eq!(compass_direction(0.0), "N");
    assert_eq!(compass_direction(90.0), "E");
    assert_eq!(compass_direction(180.0), "S");
    assert_eq!(compass_direction(270.0), "W");
    assert_eq!(compass_direction(265.0), "W");
    assert_eq!(compass_direction(359.0), "N");
    assert_eq!(compass_direction(-45.0), "NW");
}

#[test]
fn place_display_name() {
    let full = Place {
        name: "Paris".to_string(),
        latitude: 48.85341,
        longitude: 2.3488,
        country: Some("France".to_string()),
        admin1: Some("Île-de-France".to_string()),
        timezone: Some("Europe/Paris".to_string()),
    };
    assert_eq!(full.display_name(), "Paris, Île-de-France, France");

    let bare = Place {
        name: "Nowhere".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        country: None,
        admin1: None,
        timezone: None,
    };
    assert_eq!(bare.display_name(), "Nowhere");
}

#[tokio::test(flavor = "multi_thread")]
async fn geocode_resolves_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Paris"))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_geocoding_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let place = tokio::task::spawn_blocking(move || client.geocode("Paris"))
        .await
        .expect("task completes")
        .expect("geocode succeeds");

    assert_eq!(place.name, "Paris");
    assert_eq!(place.country.as_deref(), Some("France"));
    assert!((place.latitude - 48.85341).abs() < f64::EPSILON);
}

#[tokio::test(flavor = "multi_thread")]
async fn geocode_fails_when_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generationtime_ms": 0.3})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = tokio::task::spawn_blocking(move || client.geocode("Xyzzyville"))
        .await
        .expect("task completes");

    let error = result.expect_err("no match should fail");
    assert!(error.to_string().contains("No location found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn current_weather_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_geocoding_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 48.86,
            "longitude": 2.35,
            "current_weather": {
                "temperature": 18.5,
                "windspeed": 11.2,
                "winddirection": 265.0,
                "weathercode": 2,
                "is_day": 1,
                "time": "2026-08-25T14:00"
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let conditions = tokio::task::spawn_blocking(move || client.current_weather("Paris"))
        .await
        .expect("task completes")
        .expect("lookup succeeds");

    assert_eq!(conditions.city, "Paris");
    assert_eq!(conditions.location, "Paris, Île-de-France, France");
    assert!((conditions.temperature - 18.5).abs() < f64::EPSILON);
    assert_eq!(conditions.temperature_unit, "°C");
    assert_eq!(conditions.conditions, "Partly cloudy");
    assert_eq!(conditions.wind_direction, "W");
    assert!(conditions.is_day);
    assert_eq!(conditions.observed_at, "2026-08-25 14:00");
}

#[tokio::test(flavor = "multi_thread")]
async fn forecast_builds_daily_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_geocoding_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("forecast_days", "3"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {
                "time": ["2026-08-25", "2026-08-26", "2026-08-27"],
                "temperature_2m_max": [24.1, 22.7, 19.3],
                "temperature_2m_min": [14.8, 13.2, 12.1],
                "weathercode": [1, 61, 3],
                "precipitation_sum": [0.0, 4.2, 0.4]
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let forecast = tokio::task::spawn_blocking(move || client.forecast("Paris", 3))
        .await
        .expect("task completes")
        .expect("forecast succeeds");

    assert_eq!(forecast.city, "Paris");
    assert_eq!(forecast.days.len(), 3);
    assert_eq!(forecast.days[0].date, "2026-08-25");
    assert_eq!(forecast.days[0].weekday, "Tuesday");
    assert_eq!(forecast.days[0].conditions, "Mainly clear");
    assert_eq!(forecast.days[1].conditions, "Rain");
    assert!((forecast.days[1].precipitation_mm - 4.2).abs() < f64::EPSILON);
    assert!((forecast.days[2].low - 12.1).abs() < f64::EPSILON);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry_attempts(3);
    let result = tokio::task::spawn_blocking(move || client.geocode("Paris"))
        .await
        .expect("task completes");

    let error = result.expect_err("404 should fail");
    assert!(format!("{:#}", error).contains("HTTP 404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry_attempts(2);
    let result = tokio::task::spawn_blocking(move || client.geocode("Paris"))
        .await
        .expect("task completes");

    assert!(result.is_err());
}
