use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperature as reported by the server: usually preformatted text such as
/// `+12°C`, occasionally a bare number.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl fmt::Display for Reading {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(formatter, "{value}°C"),
            Self::Text(text) => formatter.write_str(text),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct WeatherObservation {
    pub temperature: Reading,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Latest observation plus the recent history, oldest first.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct WeatherReport {
    #[serde(default)]
    pub current: Option<WeatherObservation>,
    #[serde(default)]
    pub history: Vec<WeatherObservation>,
}
