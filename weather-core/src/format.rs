//! Pure presentation helpers: flags, icons, labels, unit conversion.

use chrono::NaiveDate;

use crate::model::DailyForecast;

/// Offset from an uppercase ASCII letter to its regional indicator symbol.
const REGIONAL_INDICATOR_OFFSET: u32 = 127_397;

/// Glyph used when a WMO code has no entry in [`WEATHER_ICONS`].
pub const UNKNOWN_ICON: &str = "❔";

/// Ordered (codes, glyph) table. Lookup returns the first row containing the code.
pub const WEATHER_ICONS: &[(&[i32], &str)] = &[
    (&[0], "☀️"),
    (&[1], "🌤"),
    (&[2], "⛅️"),
    (&[3], "☁️"),
    (&[45, 48], "🌫"),
    (&[51, 56, 61, 66, 80], "🌦"),
    (&[53, 55, 63, 65, 57, 67, 81, 82], "🌧"),
    (&[71, 73, 75, 77, 85, 86], "🌨"),
    (&[95], "🌩"),
    (&[96, 99], "⛈"),
];

/// Map an ISO country code to its flag emoji.
///
/// Each ASCII letter is uppercased and shifted into the regional indicator
/// block. Non-letters are dropped.
pub fn flag_from_country_code(country_code: &str) -> String {
    country_code
        .chars()
        .filter(char::is_ascii_alphabetic)
        .filter_map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + REGIONAL_INDICATOR_OFFSET))
        .collect()
}

pub fn weather_icon(code: i32) -> &'static str {
    WEATHER_ICONS
        .iter()
        .find(|(codes, _)| codes.contains(&code))
        .map(|(_, glyph)| *glyph)
        .unwrap_or(UNKNOWN_ICON)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// "Today" for the first entry, short weekday otherwise.
///
/// Unparseable dates are shown as-is.
pub fn day_label(index: usize, date: &str) -> String {
    if index == 0 {
        return "Today".to_string();
    }

    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%a").to_string(),
        Err(_) => date.to_string(),
    }
}

pub fn openweather_icon_url(icon_id: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon_id}.png")
}

/// One rendered row of the daily list.
#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub label: String,
    pub icon: &'static str,
    pub low: i64,
    pub high: i64,
}

impl std::fmt::Display for DayView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:<5} {}° — {}°", self.icon, self.label, self.low, self.high)
    }
}

/// Build the daily rows: low is floored, high is ceiled.
pub fn day_views(daily: &DailyForecast, unit: crate::TemperatureUnit) -> Vec<DayView> {
    daily
        .days()
        .enumerate()
        .map(|(i, day)| DayView {
            label: day_label(i, day.date),
            icon: weather_icon(day.code),
            low: unit.convert_celsius(day.min).floor() as i64,
            high: unit.convert_celsius(day.max).ceil() as i64,
        })
        .collect()
}
