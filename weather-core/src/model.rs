use serde::{Deserialize, Serialize};

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// First match of a geocoding lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    /// ISO 3166-1 alpha-2 code. Some places (oceans, disputed areas) have none.
    pub country_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Daily series; all vectors are positionally aligned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    pub dates: Vec<String>,
    pub temp_max: Vec<f64>,
    pub temp_min: Vec<f64>,
    pub weather_code: Vec<i32>,
}

impl DailyForecast {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        let n = self.dates.len();
        self.temp_max.len() == n && self.temp_min.len() == n && self.weather_code.len() == n
    }

    pub fn days(&self) -> impl Iterator<Item = DayEntry<'_>> {
        self.dates
            .iter()
            .zip(&self.temp_max)
            .zip(&self.temp_min)
            .zip(&self.weather_code)
            .map(|(((date, &max), &min), &code)| DayEntry { date, max, min, code })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayEntry<'a> {
    pub date: &'a str,
    pub max: f64,
    pub min: f64,
    pub code: i32,
}

/// Hourly series; all vectors are positionally aligned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub times: Vec<String>,
    pub temperature: Vec<f64>,
    pub weather_code: Vec<i32>,
}

impl HourlyForecast {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        let n = self.times.len();
        self.temperature.len() == n && self.weather_code.len() == n
    }

    pub fn hours(&self) -> impl Iterator<Item = HourEntry<'_>> {
        self.times
            .iter()
            .zip(&self.temperature)
            .zip(&self.weather_code)
            .map(|((time, &temperature), &code)| HourEntry { time, temperature, code })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourEntry<'a> {
    pub time: &'a str,
    pub temperature: f64,
    pub code: i32,
}

/// Raw forecast payload; either group may be missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastResponse {
    pub daily: Option<DailyForecast>,
    pub hourly: Option<HourlyForecast>,
}

/// Current conditions at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub weather_description: String,
    pub icon_id: String,
    pub temperature_celsius: f64,
    pub humidity: u8,
    /// Meters per second.
    pub wind_speed: f64,
}

/// Last successful current-conditions fetch and its capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub location: CurrentConditions,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
        }
    }

    /// Express a Celsius reading in this unit.
    pub fn convert_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => crate::format::celsius_to_fahrenheit(celsius),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily() -> DailyForecast {
        DailyForecast {
            dates: vec!["2024-01-15".into(), "2024-01-16".into()],
            temp_max: vec![8.0, 6.0],
            temp_min: vec![2.0, 1.0],
            weather_code: vec![3, 61],
        }
    }

    #[test]
    fn daily_days_zip_by_index() {
        let d = daily();
        let days: Vec<_> = d.days().collect();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date, "2024-01-16");
        assert_eq!(days[1].max, 6.0);
        assert_eq!(days[1].min, 1.0);
        assert_eq!(days[1].code, 61);
    }

    #[test]
    fn misaligned_daily_is_detected() {
        let mut d = daily();
        assert!(d.is_aligned());
        d.temp_min.pop();
        assert!(!d.is_aligned());
    }

    #[test]
    fn misaligned_hourly_is_detected() {
        let h = HourlyForecast {
            times: vec!["2024-01-15T00:00".into()],
            temperature: vec![],
            weather_code: vec![0],
        };
        assert!(!h.is_aligned());
    }

    #[test]
    fn unit_toggle_flips_back_and_forth() {
        let unit = TemperatureUnit::default();
        assert_eq!(unit, TemperatureUnit::Celsius);
        assert_eq!(unit.toggled(), TemperatureUnit::Fahrenheit);
        assert_eq!(unit.toggled().toggled(), TemperatureUnit::Celsius);
    }

    #[test]
    fn convert_celsius_follows_unit() {
        assert_eq!(TemperatureUnit::Celsius.convert_celsius(25.0), 25.0);
        assert_eq!(TemperatureUnit::Fahrenheit.convert_celsius(25.0), 77.0);
    }

    #[test]
    fn snapshot_serializes_with_location_and_timestamp_keys() {
        let snapshot = CachedSnapshot {
            location: CurrentConditions {
                name: "Lisbon".into(),
                weather_description: "clear sky".into(),
                icon_id: "01d".into(),
                temperature_celsius: 21.5,
                humidity: 40,
                wind_speed: 3.1,
            },
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["location"]["name"], "Lisbon");
    }
}
