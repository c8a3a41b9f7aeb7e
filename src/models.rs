use serde::{Deserialize, Serialize};

/// One weather observation, as carried on the queue and posted to the
/// ingestion API. Missing fields deserialize to their zero value so that
/// shape problems surface in validation rather than in the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherRecord {
    pub timestamp: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub weather_code: i64,
    pub condition: String,
}

impl WeatherRecord {
    /// A record is forwardable when both location and timestamp are set.
    pub fn is_valid(&self) -> bool {
        !self.location.is_empty() && !self.timestamp.is_empty()
    }
}
