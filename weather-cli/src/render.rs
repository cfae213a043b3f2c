//! Plain-text rendering. Loading, error and success are exclusive branches.

use chrono::{DateTime, Utc};
use weather_core::{
    CurrentLocationState, HourlyCarousel, SearchState, TemperatureUnit,
    carousel::HourSlide,
    format::{day_views, openweather_icon_url},
    location::ConditionsSource,
};

const LOADING: &str = "Loading...";

pub fn search(state: &SearchState, unit: TemperatureUnit, hours: usize) -> String {
    match state {
        SearchState::Idle => String::new(),
        SearchState::Loading { .. } => LOADING.to_string(),
        SearchState::Failed(err) => err.user_message(),
        SearchState::Loaded(outcome) => {
            let mut lines = vec![format!("Weather {}", outcome.display_location())];
            lines.extend(day_views(&outcome.daily, unit).iter().map(|day| format!("  {day}")));

            let carousel = HourlyCarousel::new(&outcome.hourly);
            if hours > 0 && !carousel.is_empty() {
                lines.push(String::new());
                lines.push("Next hours:".to_string());
                lines.extend(carousel.window(hours).map(|s| format!("  {}", slide(s, unit))));
            }

            lines.join("\n")
        }
    }
}

pub fn slide(slide: &HourSlide, unit: TemperatureUnit) -> String {
    format!("{}  {:.1}°  {}", slide.time, unit.convert_celsius(slide.temperature), slide.icon)
}

/// Whole minutes between `captured_at` and `now`, never negative.
fn minutes_ago(captured_at: i64, now: DateTime<Utc>) -> i64 {
    now.timestamp_millis().saturating_sub(captured_at).max(0) / 60_000
}

pub fn current_location(
    state: &CurrentLocationState,
    unit: TemperatureUnit,
    now: DateTime<Utc>,
) -> String {
    if state.is_loading() {
        return LOADING.to_string();
    }

    match state {
        CurrentLocationState::Terminal { error, notice } => match notice {
            Some(n) => format!("{n}\n{}", error.user_message()),
            None => error.user_message().to_string(),
        },
        CurrentLocationState::Resolved { conditions: resolved, notice } => {
            let c = &resolved.conditions;
            let mut lines = Vec::new();

            if let Some(n) = notice {
                lines.push(n.clone());
            }
            if let ConditionsSource::Cache { captured_at } = resolved.source {
                lines.push(format!(
                    "Showing cached data from {} minutes ago.",
                    minutes_ago(captured_at, now)
                ));
            }

            lines.push(format!("Your Current Location: {}", c.name));
            lines.push("Today's Weather".to_string());
            if !c.icon_id.is_empty() {
                lines.push(format!("  Icon: {}", openweather_icon_url(&c.icon_id)));
            }
            lines.push(format!("  Location: {}", c.name));
            lines.push(format!(
                "  Temperature: {:.1}°{}",
                resolved.display_temperature(unit),
                unit.symbol()
            ));
            lines.push(format!("  Weather: {}", c.weather_description));
            lines.push(format!("  Humidity: {}%", c.humidity));
            lines.push(format!("  Wind Speed: {} m/s", c.wind_speed));
            lines.join("\n")
        }
        _ => String::new(),
    }
}
