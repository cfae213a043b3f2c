use crate::{format::weather_icon, model::HourlyForecast};

#[derive(Debug, Clone, PartialEq)]
pub struct HourSlide {
    pub time: String,
    pub temperature: f64,
    pub icon: &'static str,
}

/// Hourly entries with a wrapping cursor.
#[derive(Debug, Clone, Default)]
pub struct HourlyCarousel {
    slides: Vec<HourSlide>,
    index: usize,
}

impl HourlyCarousel {
    pub fn new(hourly: &HourlyForecast) -> Self {
        let slides = hourly
            .hours()
            .map(|h| HourSlide {
                time: h.time.to_string(),
                temperature: h.temperature,
                icon: weather_icon(h.code),
            })
            .collect();

        Self { slides, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&HourSlide> {
        self.slides.get(self.index)
    }

    pub fn next(&mut self) -> Option<&HourSlide> {
        if !self.slides.is_empty() {
            self.index = if self.index + 1 == self.slides.len() { 0 } else { self.index + 1 };
        }
        self.current()
    }

    pub fn previous(&mut self) -> Option<&HourSlide> {
        if !self.slides.is_empty() {
            self.index = if self.index == 0 { self.slides.len() - 1 } else { self.index - 1 };
        }
        self.current()
    }

    /// Up to `n` slides starting at the cursor, without moving it.
    pub fn window(&self, n: usize) -> impl Iterator<Item = &HourSlide> {
        self.slides.iter().skip(self.index).take(n)
    }
}
