//! Lap Planning Configuration

use serde::{Deserialize, Serialize};

use crate::error::{RaceError, Result};
use crate::models::circuit::REFERENCE_LENGTH_KM;

/// Inputs to the three total-lap limits (duration, fuel, tires).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapPlanningConfig {
    // === Duration limit ===
    /// Target race length in minutes (default: 90)
    pub target_duration_min: f64,
    /// Share of the fleet's average top speed held over a lap (default: 0.8)
    pub race_speed_ratio: f64,

    // === Fuel limit ===
    /// Fuel available for the race (default: 110)
    pub fuel_allowance: f64,
    /// Consumption per lap on a reference-length track (default: 2.5)
    pub base_fuel_per_lap: f64,
    /// Track length consumption and tire life are normalised against (default: 5 km)
    pub reference_length_km: f64,

    // === Tire limit ===
    /// Laps a set lasts on a reference track at unit degradation (default: 40)
    pub tire_life_laps: f64,
}

impl Default for LapPlanningConfig {
    fn default() -> Self {
        Self {
            target_duration_min: 90.0,
            race_speed_ratio: 0.8,
            fuel_allowance: 110.0,
            base_fuel_per_lap: 2.5,
            reference_length_km: REFERENCE_LENGTH_KM,
            tire_life_laps: 40.0,
        }
    }
}

impl LapPlanningConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("target_duration_min", self.target_duration_min),
            ("fuel_allowance", self.fuel_allowance),
            ("base_fuel_per_lap", self.base_fuel_per_lap),
            ("reference_length_km", self.reference_length_km),
            ("tire_life_laps", self.tire_life_laps),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RaceError::Config(format!("{} must be positive, got {}", field, value)));
            }
        }
        RaceError::check_range("race_speed_ratio", self.race_speed_ratio, f64::MIN_POSITIVE, 1.0)
            .map_err(|e| RaceError::Config(e.to_string()))
    }
}
