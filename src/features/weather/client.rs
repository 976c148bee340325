use crate::app_lib::{ApiRequest, AppError, AuthGateway};
use crate::features::weather::types::WeatherReport;

pub const WEATHER_PATH: &str = "/weather/";

/// Fetches the current observation and recent history.
///
/// # Errors
/// Returns an `AppError` if the request fails or the body cannot be decoded.
pub async fn fetch_weather(gateway: &AuthGateway) -> Result<WeatherReport, AppError> {
    gateway.send_json(&ApiRequest::get(WEATHER_PATH)).await
}
