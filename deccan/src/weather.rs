//! Current weather for the selected place.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::DeccanError;
use crate::geo::GeoPoint;

/// Default endpoint of the OpenWeatherMap current-conditions API.
pub const OWM_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current conditions at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Temperature in degrees Celsius.
    pub temp_c: f64,
    /// Short condition name ("Clouds", "Rain", ...).
    pub condition: String,
    /// Provider icon code, if any.
    pub icon: Option<String>,
    /// Wind speed in m/s, if reported.
    pub wind_speed_ms: Option<f64>,
}

/// External weather service seam.
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Current conditions at the given position. Any failure resolves to
    /// [`DeccanError::WeatherUnavailable`].
    async fn current(&self, position: GeoPoint) -> Result<CurrentWeather, DeccanError>;
}

/// OpenWeatherMap-backed [`WeatherService`].
pub struct OpenWeather {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenWeather {
    /// Creates a client against the public OpenWeatherMap endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(reqwest::Client::new(), OWM_ENDPOINT, api_key)
    }

    /// Creates a client against a custom endpoint.
    pub fn with_endpoint(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct OwmResponse {
    cod: serde_json::Value,
    main: Option<OwmMain>,
    weather: Option<Vec<OwmCondition>>,
    wind: Option<OwmWind>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Deserialize)]
struct OwmCondition {
    main: String,
    icon: Option<String>,
}

#[derive(Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[async_trait]
impl WeatherService for OpenWeather {
    async fn current(&self, position: GeoPoint) -> Result<CurrentWeather, DeccanError> {
        let response: OwmResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", position.lat().to_string()),
                ("lon", position.lon().to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|_| DeccanError::WeatherUnavailable)?
            .json()
            .await
            .map_err(|_| DeccanError::WeatherUnavailable)?;

        parse_current(response)
    }
}

// The provider reports its status in-band: `cod` is 200 (number or string)
// on success.
fn parse_current(response: OwmResponse) -> Result<CurrentWeather, DeccanError> {
    let ok = match &response.cod {
        serde_json::Value::Number(code) => code.as_f64() == Some(200.0),
        serde_json::Value::String(code) => code == "200",
        _ => false,
    };
    if !ok {
        return Err(DeccanError::WeatherUnavailable);
    }

    let main = response.main.ok_or(DeccanError::WeatherUnavailable)?;
    let condition = response
        .weather
        .as_ref()
        .and_then(|conditions| conditions.first())
        .ok_or(DeccanError::WeatherUnavailable)?;

    Ok(CurrentWeather {
        temp_c: main.temp,
        condition: condition.main.clone(),
        icon: condition.icon.clone(),
        wind_speed_ms: response.wind.and_then(|wind| wind.speed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_a_successful_response() {
        let response: OwmResponse = serde_json::from_str(
            r#"{
                "cod": 200,
                "main": {"temp": 28.4},
                "weather": [{"main": "Clouds", "icon": "04d"}],
                "wind": {"speed": 3.2}
            }"#,
        )
        .expect("valid json");

        let weather = parse_current(response).expect("success response");
        assert_eq!(weather.temp_c, 28.4);
        assert_eq!(weather.condition, "Clouds");
        assert_eq!(weather.icon.as_deref(), Some("04d"));
        assert_eq!(weather.wind_speed_ms, Some(3.2));
    }

    #[test]
    fn error_status_is_unavailable() {
        let response: OwmResponse =
            serde_json::from_str(r#"{"cod": "404", "message": "city not found"}"#)
                .expect("valid json");
        assert_matches!(parse_current(response), Err(DeccanError::WeatherUnavailable));
    }
}
