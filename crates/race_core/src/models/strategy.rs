//! Pit strategy validation and stop bookkeeping.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::tire::{durability, Aggressiveness, TireCompound};
use crate::error::{RaceError, Result};

/// A plan only counts as optimal with strictly more stops than this.
pub const MIN_STOPS_EXCLUSIVE: u32 = 3;

const CONSISTENCY_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stint {
    pub compound: TireCompound,
    pub laps: u32,
}

impl Stint {
    pub fn new(compound: TireCompound, laps: u32) -> Self {
        Self { compound, laps }
    }
}

/// Why a plan is not optimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyViolation {
    StopCountMismatch { declared: u32, stints: usize },
    TooFewStops { declared: u32, required_more_than: u32 },
    StintTooLong { stint: usize, compound: TireCompound, laps: u32, max_laps: u32 },
    FinalStintTooLong { compound: TireCompound, laps: u32, max_laps: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopCounters {
    pub planned: u32,
    pub completed: u32,
    pub total_pit_time_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub stop_number: u32,
    pub time_s: f64,
    pub planned_lap: Option<u32>,
    pub next_compound: Option<TireCompound>,
    pub total_pit_time_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStop {
    pub stop_number: u32,
    pub lap: u32,
    pub compound: TireCompound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    stints: Vec<Stint>,
    number_of_stops: u32,
    aggressiveness: Aggressiveness,
    stops_completed: u32,
    total_pit_time_s: f64,
}

impl Strategy {
    pub fn new(number_of_stops: u32, stints: Vec<Stint>, aggressiveness: Aggressiveness) -> Self {
        Self { stints, number_of_stops, aggressiveness, stops_completed: 0, total_pit_time_s: 0.0 }
    }

    pub fn stints(&self) -> &[Stint] {
        &self.stints
    }

    pub fn number_of_stops(&self) -> u32 {
        self.number_of_stops
    }

    pub fn aggressiveness(&self) -> Aggressiveness {
        self.aggressiveness
    }

    pub fn counters(&self) -> StopCounters {
        StopCounters {
            planned: self.number_of_stops,
            completed: self.stops_completed,
            total_pit_time_s: self.total_pit_time_s,
        }
    }

    fn check_structure(&self) -> std::result::Result<(), StrategyViolation> {
        if self.stints.is_empty() || self.number_of_stops as usize != self.stints.len() - 1 {
            return Err(StrategyViolation::StopCountMismatch {
                declared: self.number_of_stops,
                stints: self.stints.len(),
            });
        }
        Ok(())
    }

    fn check_stint_durability(&self) -> std::result::Result<(), StrategyViolation> {
        for (idx, stint) in self.stints.iter().enumerate() {
            let max_laps = durability(self.aggressiveness, stint.compound);
            if stint.laps > max_laps {
                return Err(StrategyViolation::StintTooLong {
                    stint: idx,
                    compound: stint.compound,
                    laps: stint.laps,
                    max_laps,
                });
            }
        }
        Ok(())
    }

    /// Full optimality check against a race of `total_laps`.
    pub fn check_optimal(&self, total_laps: u32) -> std::result::Result<(), StrategyViolation> {
        self.check_structure()?;
        if self.number_of_stops <= MIN_STOPS_EXCLUSIVE {
            return Err(StrategyViolation::TooFewStops {
                declared: self.number_of_stops,
                required_more_than: MIN_STOPS_EXCLUSIVE,
            });
        }
        self.check_stint_durability()?;

        let (last, prior) = self.stints.split_last().ok_or(StrategyViolation::StopCountMismatch {
            declared: self.number_of_stops,
            stints: 0,
        })?;
        let prior_laps: u32 = prior.iter().map(|s| s.laps).sum();
        let final_laps = total_laps.saturating_sub(prior_laps);
        let max_laps = durability(self.aggressiveness, last.compound);
        if final_laps > max_laps {
            return Err(StrategyViolation::FinalStintTooLong {
                compound: last.compound,
                laps: final_laps,
                max_laps,
            });
        }
        Ok(())
    }

    pub fn is_optimal(&self, total_laps: u32) -> bool {
        match self.check_optimal(total_laps) {
            Ok(()) => true,
            Err(violation) => {
                debug!(?violation, "strategy not optimal");
                false
            }
        }
    }

    /// Structure plus per-stint durability, without the stop floor or race distance.
    pub fn stints_within_durability(&self) -> bool {
        self.check_structure().and_then(|_| self.check_stint_durability()).is_ok()
    }

    pub fn aggressiveness_consistent(&self) -> bool {
        if self.stints.is_empty() {
            return false;
        }
        let total: f64 = self.stints.iter().map(|s| s.compound.aggression_score()).sum();
        let average = total / self.stints.len() as f64;
        (average - self.aggressiveness.score()).abs() <= CONSISTENCY_TOLERANCE
    }

    /// Lap on which stop `stop_number` (1-based) is planned.
    fn planned_lap(&self, stop_number: u32) -> Option<u32> {
        let n = stop_number as usize;
        if n == 0 || n > self.stints.len() {
            return None;
        }
        Some(self.stints[..n].iter().map(|s| s.laps).sum())
    }

    pub fn next_stop(&self) -> Option<PlannedStop> {
        if self.stops_completed >= self.number_of_stops {
            return None;
        }
        let stop_number = self.stops_completed + 1;
        Some(PlannedStop {
            stop_number,
            lap: self.planned_lap(stop_number)?,
            compound: self.stints.get(stop_number as usize)?.compound,
        })
    }

    pub fn record_stop(&mut self, time_s: f64) -> Result<StopRecord> {
        if self.stops_completed >= self.number_of_stops {
            warn!(planned = self.number_of_stops, "stop recorded beyond plan");
            return Err(RaceError::NoStopsRemaining { counters: self.counters() });
        }

        self.stops_completed += 1;
        self.total_pit_time_s += time_s;
        Ok(StopRecord {
            stop_number: self.stops_completed,
            time_s,
            planned_lap: self.planned_lap(self.stops_completed),
            next_compound: self.stints.get(self.stops_completed as usize).map(|s| s.compound),
            total_pit_time_s: self.total_pit_time_s,
        })
    }
}
