use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RaceError, Result};

pub const MIN_TEMPERATURE_C: f64 = -20.0;
pub const MAX_TEMPERATURE_C: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Dry,
    Mixed,
    Wet,
    Rain,
}

impl WeatherCondition {
    /// Lap-time multiplier. Mixed conditions are timed like a damp track.
    pub fn lap_time_factor(self) -> f64 {
        match self {
            WeatherCondition::Dry => 1.00,
            WeatherCondition::Mixed | WeatherCondition::Wet => 1.10,
            WeatherCondition::Rain => 1.15,
        }
    }

    pub fn is_wet(self) -> bool {
        matches!(self, WeatherCondition::Wet | WeatherCondition::Rain)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::Dry => "dry",
            WeatherCondition::Mixed => "mixed",
            WeatherCondition::Wet => "wet",
            WeatherCondition::Rain => "rain",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherCondition {
    type Err = RaceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry" => Ok(WeatherCondition::Dry),
            "mixed" => Ok(WeatherCondition::Mixed),
            "wet" => Ok(WeatherCondition::Wet),
            "rain" => Ok(WeatherCondition::Rain),
            other => Err(RaceError::UnknownWeather(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Normal,
    Low,
}

/// Weather state. Fields are only reachable through validated constructors,
/// so temperature and humidity are always in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    condition: WeatherCondition,
    temperature_c: f64,
    humidity: f64,
}

impl Weather {
    pub fn new(condition: WeatherCondition, temperature_c: f64, humidity: f64) -> Result<Self> {
        RaceError::check_range("temperature_c", temperature_c, MIN_TEMPERATURE_C, MAX_TEMPERATURE_C)?;
        RaceError::check_range("humidity", humidity, 0.0, 100.0)?;
        Ok(Self { condition, temperature_c, humidity })
    }

    pub fn dry() -> Self {
        Self { condition: WeatherCondition::Dry, temperature_c: 25.0, humidity: 50.0 }
    }

    pub fn condition(&self) -> WeatherCondition {
        self.condition
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn visibility(&self) -> Visibility {
        if self.condition == WeatherCondition::Rain {
            Visibility::Low
        } else {
            Visibility::Normal
        }
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self::dry()
    }
}

/// What a driver reacts to when adapting style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrivingConditions {
    pub weather: WeatherCondition,
    #[serde(default)]
    pub track_wet: bool,
}

impl DrivingConditions {
    pub fn new(weather: WeatherCondition) -> Self {
        Self { weather, track_wet: false }
    }

    pub fn with_wet_track(mut self) -> Self {
        self.track_wet = true;
        self
    }

    pub fn is_wet(&self) -> bool {
        self.weather.is_wet() || self.track_wet
    }
}

impl From<&Weather> for DrivingConditions {
    fn from(weather: &Weather) -> Self {
        Self::new(weather.condition())
    }
}
