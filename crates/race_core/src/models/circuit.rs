//! Circuit model
//!
//! Static track facts (length, corners, DRS zones) plus the two pieces of
//! mutable session state: current weather and the lap record.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::car::Car;
use super::weather::{Visibility, Weather, WeatherCondition};
use crate::engine::fleet;
use crate::error::{RaceError, Result};

/// Track length the planning formulas are normalised against.
pub const REFERENCE_LENGTH_KM: f64 = 5.0;

const CHALLENGING_MIN_CORNERS: usize = 10;
const CHALLENGING_MIN_DRS_ZONES: usize = 2;
const CHALLENGING_MIN_LENGTH_KM: f64 = 5.0;
const HIGH_DIFFICULTY_SCORE: f64 = 2.5;
const MEDIUM_DIFFICULTY_SCORE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerDifficulty {
    Low,
    Medium,
    High,
}

impl CornerDifficulty {
    pub fn score(self) -> f64 {
        match self {
            CornerDifficulty::Low => 1.0,
            CornerDifficulty::Medium => 2.0,
            CornerDifficulty::High => 3.0,
        }
    }

    fn from_score(score: f64) -> Self {
        if score >= HIGH_DIFFICULTY_SCORE {
            CornerDifficulty::High
        } else if score >= MEDIUM_DIFFICULTY_SCORE {
            CornerDifficulty::Medium
        } else {
            CornerDifficulty::Low
        }
    }
}

impl fmt::Display for CornerDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CornerDifficulty::Low => "low",
            CornerDifficulty::Medium => "medium",
            CornerDifficulty::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for CornerDifficulty {
    type Err = RaceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CornerDifficulty::Low),
            "medium" => Ok(CornerDifficulty::Medium),
            "high" => Ok(CornerDifficulty::High),
            other => Err(RaceError::UnknownDifficulty(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub name: String,
    pub max_speed_kph: f64,
    pub difficulty: CornerDifficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrsZone {
    pub name: String,
    pub length_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub time_s: f64,
    pub driver_name: String,
    pub date: NaiveDate,
}

/// How hard a venue is on tires. Only feeds lap-count planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationProfile {
    High,
    Normal,
    Low,
}

impl DegradationProfile {
    pub fn multiplier(self) -> f64 {
        match self {
            DegradationProfile::High => 1.2,
            DegradationProfile::Normal => 1.0,
            DegradationProfile::Low => 0.8,
        }
    }

    /// Known venues; everything else is treated as normal.
    pub fn for_venue(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "monaco" => DegradationProfile::High,
            "barcelona" => DegradationProfile::Low,
            _ => DegradationProfile::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerAdded {
    pub corner: Corner,
    pub number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrsZoneAdded {
    pub zone: DrsZone,
    pub number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub weather: Weather,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecordUpdate {
    pub time_s: f64,
    pub driver_name: String,
    pub is_new_record: bool,
}

/// Read-only summary for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitStatistics {
    pub name: String,
    pub corners: usize,
    pub drs_zones: usize,
    pub length_km: f64,
    pub lap_record: Option<LapRecord>,
    pub weather: Weather,
    pub difficulty_level: CornerDifficulty,
    pub challenging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    location: String,
    length_km: f64,
    corners: Vec<Corner>,
    drs_zones: Vec<DrsZone>,
    weather: Weather,
    lap_record: Option<LapRecord>,
    degradation: DegradationProfile,
}

impl Circuit {
    pub fn new(name: impl Into<String>, location: impl Into<String>, length_km: f64) -> Result<Self> {
        if !(length_km.is_finite() && length_km > 0.0) {
            return Err(RaceError::InvalidLength { what: "circuit", value: length_km });
        }
        let name = name.into();
        let degradation = DegradationProfile::for_venue(&name);
        Ok(Self {
            name,
            location: location.into(),
            length_km,
            corners: Vec::new(),
            drs_zones: Vec::new(),
            weather: Weather::default(),
            lap_record: None,
            degradation,
        })
    }

    pub fn with_degradation(mut self, profile: DegradationProfile) -> Self {
        self.degradation = profile;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn length_km(&self) -> f64 {
        self.length_km
    }

    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    pub fn drs_zones(&self) -> &[DrsZone] {
        &self.drs_zones
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    pub fn lap_record(&self) -> Option<&LapRecord> {
        self.lap_record.as_ref()
    }

    pub fn degradation(&self) -> DegradationProfile {
        self.degradation
    }

    pub fn add_corner(
        &mut self,
        name: impl Into<String>,
        max_speed_kph: f64,
        difficulty: CornerDifficulty,
    ) -> CornerAdded {
        let corner = Corner { name: name.into(), max_speed_kph, difficulty };
        self.corners.push(corner.clone());
        CornerAdded { corner, number: self.corners.len() }
    }

    pub fn add_drs_zone(&mut self, name: impl Into<String>, length_km: f64) -> Result<DrsZoneAdded> {
        if !(length_km.is_finite() && length_km > 0.0) {
            return Err(RaceError::InvalidLength { what: "DRS zone", value: length_km });
        }
        let zone = DrsZone { name: name.into(), length_km };
        self.drs_zones.push(zone.clone());
        Ok(DrsZoneAdded { zone, number: self.drs_zones.len() })
    }

    /// Replaces the weather. Out-of-range values leave the current weather untouched.
    pub fn set_weather(
        &mut self,
        condition: WeatherCondition,
        temperature_c: f64,
        humidity: f64,
    ) -> Result<WeatherReport> {
        let weather = Weather::new(condition, temperature_c, humidity)?;
        Ok(self.apply_weather(weather))
    }

    pub(crate) fn apply_weather(&mut self, weather: Weather) -> WeatherReport {
        debug!(circuit = %self.name, condition = %weather.condition(), "weather updated");
        self.weather = weather;
        WeatherReport { weather, visibility: weather.visibility() }
    }

    /// Track length relative to the 5 km reference.
    pub fn length_factor(&self) -> f64 {
        self.length_km / REFERENCE_LENGTH_KM
    }

    /// Mean corner score; 0 for a track without corners.
    pub fn difficulty_factor(&self) -> f64 {
        if self.corners.is_empty() {
            return 0.0;
        }
        let total: f64 = self.corners.iter().map(|c| c.difficulty.score()).sum();
        total / self.corners.len() as f64
    }

    pub fn is_challenging(&self) -> bool {
        self.corners.len() > CHALLENGING_MIN_CORNERS
            && self.drs_zones.len() >= CHALLENGING_MIN_DRS_ZONES
            && self.length_km > CHALLENGING_MIN_LENGTH_KM
            && self.difficulty_factor() >= HIGH_DIFFICULTY_SCORE
    }

    pub fn weather_factor(&self) -> f64 {
        self.weather.condition().lap_time_factor()
    }

    /// Venue multiplier applied to the fleet's average wear factor.
    pub fn degradation_factor<'a>(&self, cars: impl IntoIterator<Item = &'a Car>) -> Result<f64> {
        Ok(fleet::average_wear_factor(cars)? * self.degradation.multiplier())
    }

    /// Stores `time_s` as the new record when there is none or it is strictly faster.
    pub fn record_lap(&mut self, time_s: f64, driver_name: &str, date: NaiveDate) -> LapRecordUpdate {
        let is_new_record = self.lap_record.as_ref().map_or(true, |record| time_s < record.time_s);

        if is_new_record {
            info!(circuit = %self.name, driver = driver_name, time_s, "new lap record");
            self.lap_record =
                Some(LapRecord { time_s, driver_name: driver_name.to_string(), date });
        }

        LapRecordUpdate { time_s, driver_name: driver_name.to_string(), is_new_record }
    }

    pub fn statistics(&self) -> CircuitStatistics {
        CircuitStatistics {
            name: self.name.clone(),
            corners: self.corners.len(),
            drs_zones: self.drs_zones.len(),
            length_km: self.length_km,
            lap_record: self.lap_record.clone(),
            weather: self.weather,
            difficulty_level: CornerDifficulty::from_score(self.difficulty_factor()),
            challenging: self.is_challenging(),
        }
    }
}
