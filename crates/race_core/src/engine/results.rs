//! Records returned by the race orchestrator.

use serde::{Deserialize, Serialize};

use super::lap_planner::LapPlan;
use super::race::RaceStatus;
use crate::error::Result;
use crate::models::car::{CarNumber, CarState, LapWear, PitStopReport};
use crate::models::circuit::{LapRecord, LapRecordUpdate, WeatherReport};
use crate::models::driver::{DriverId, PointsAward};
use crate::models::strategy::{StopRecord, StrategyViolation};
use crate::models::weather::Weather;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceStart {
    pub total_laps: u32,
    pub entrants: usize,
    pub weather: Weather,
    pub plan: LapPlan,
}

/// A stop executed because the car's strategy called for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStop {
    pub pit: PitStopReport,
    pub stop: StopRecord,
}

/// A due strategy stop the car could not take this lap. The plan is kept
/// and the stop is attempted again on the next lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStop {
    pub stop_number: u32,
    pub planned_lap: u32,
    pub car_state: CarState,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarLap {
    pub car: CarNumber,
    pub driver: String,
    pub lap_time_s: f64,
    pub total_time_s: f64,
    pub wear: LapWear,
    pub strategy_stop: Option<StrategyStop>,
    pub skipped_stop: Option<SkippedStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastestLap {
    pub driver_id: DriverId,
    pub driver: String,
    pub car: CarNumber,
    pub lap: u32,
    pub time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    pub lap: u32,
    pub total_laps: u32,
    pub cars: Vec<CarLap>,
    pub lap_record: LapRecordUpdate,
    pub fastest_lap: FastestLap,
    pub status: RaceStatus,
    /// Set on the final lap, when the fastest-lap point is credited.
    pub fastest_lap_award: Option<PointsAward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPitStop {
    pub pit: PitStopReport,
    /// `None` when the car has no strategy or its plan is exhausted.
    pub stop: Option<StopRecord>,
    pub total_time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAssigned {
    pub car: CarNumber,
    pub stops: u32,
    pub within_durability: bool,
    pub aggressiveness_consistent: bool,
    /// Distance check against the planned race; only known once started.
    pub total_laps: Option<u32>,
    pub violation: Option<StrategyViolation>,
}

/// Fleet-average reference lap and the factors behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapEstimate {
    pub base_lap_s: f64,
    pub skill_factor: f64,
    pub tire_factor: f64,
    pub wear_factor: f64,
    pub weather_factor: f64,
    pub lap_time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub position: u32,
    pub driver: String,
    pub car: CarNumber,
    pub lap_time_s: f64,
    pub gap_s: f64,
    pub total_time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodiumFinish {
    pub position: u32,
    pub driver: String,
    pub car: CarNumber,
    pub award: PointsAward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceClassification {
    pub race: String,
    pub results: Vec<RaceResult>,
    pub podium: Vec<PodiumFinish>,
    pub lap_record: Option<LapRecord>,
    pub fastest_lap: Option<FastestLap>,
}

impl RaceClassification {
    pub fn winner(&self) -> Option<&RaceResult> {
        self.results.first()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningPosition {
    pub position: u32,
    pub driver: Option<String>,
    pub car: CarNumber,
    pub laps: u32,
    pub last_lap_s: Option<f64>,
    pub total_time_s: f64,
    pub gap_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub race: String,
    pub status: RaceStatus,
    pub laps_completed: u32,
    pub laps_remaining: u32,
    pub running_order: Vec<RunningPosition>,
}

/// Weather change applied to the race (and its circuit when one is set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherUpdate {
    pub report: WeatherReport,
    pub applied_to_circuit: bool,
}
