use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::car::CarState;
use crate::models::driver::DriverSnapshot;
use crate::models::strategy::StopCounters;

/// Requirement that keeps a race from leaving `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartBlocker {
    NotEnoughEntrants { required: usize, found: usize },
    MissingCircuit,
    MissingWeather,
    MissingDate,
}

impl std::fmt::Display for StartBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartBlocker::NotEnoughEntrants { required, found } => {
                write!(f, "need at least {} cars, found {}", required, found)
            }
            StartBlocker::MissingCircuit => write!(f, "no circuit set"),
            StartBlocker::MissingWeather => write!(f, "no weather set"),
            StartBlocker::MissingDate => write!(f, "no date set"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaceError {
    // Preconditions
    #[error("Car #{car} has no driver assigned")]
    NoDriverAssigned { car: u32 },

    #[error("No circuit attached to race")]
    MissingCircuit,

    #[error("Unknown tire compound: {0}")]
    UnknownCompound(String),

    #[error("Unknown corner difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("Unknown weather condition: {0}")]
    UnknownWeather(String),

    #[error("Position {position} is not a podium position")]
    InvalidPodiumPosition { position: u32, snapshot: Box<DriverSnapshot> },

    #[error("All {} planned stops already recorded", .counters.planned)]
    NoStopsRemaining { counters: StopCounters },

    #[error("Cannot {action} while race is {status}")]
    InvalidTransition { action: &'static str, status: &'static str },

    #[error("Car #{car} is {state:?}, not racing")]
    NotRacing { car: u32, state: CarState },

    #[error("Unknown car #{0}")]
    UnknownCar(u32),

    #[error("Unknown driver id {0}")]
    UnknownDriver(usize),

    #[error("Car #{0} already registered")]
    DuplicateCar(u32),

    #[error("{0} is already linked")]
    AlreadyAssigned(String),

    #[error("{driver} is not eligible to drive car #{car}")]
    NotEligible { driver: String, car: u32 },

    #[error("Race already finalized")]
    AlreadyFinalized,

    #[error("Fleet is empty")]
    EmptyFleet,

    // Validation
    #[error("Race cannot start: {}", format_blockers(.0))]
    CannotStart(Vec<StartBlocker>),

    // Ranges
    #[error("{field} = {value} outside [{min}, {max}]")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },

    #[error("{what} length must be positive, got {value}")]
    InvalidLength { what: &'static str, value: f64 },

    // Configuration / export
    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn format_blockers(blockers: &[StartBlocker]) -> String {
    blockers.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl RaceError {
    /// Whether the caller can fix the underlying condition and retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RaceError::CannotStart(_) => true,
            RaceError::NoDriverAssigned { .. } => true,
            RaceError::MissingCircuit => true,
            RaceError::OutOfRange { .. } => true,
            RaceError::NotRacing { .. } => true,
            RaceError::AlreadyFinalized => false,
            RaceError::NoStopsRemaining { .. } => false,
            RaceError::InvalidTransition { .. } => false,
            _ => false,
        }
    }

    pub(crate) fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
        if !value.is_finite() || value < min || value > max {
            return Err(RaceError::OutOfRange { field, value, min, max });
        }
        Ok(())
    }
}

impl From<serde_yaml::Error> for RaceError {
    fn from(err: serde_yaml::Error) -> Self {
        RaceError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RaceError {
    fn from(err: serde_json::Error) -> Self {
        RaceError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cannot_start_lists_every_blocker() {
        let err = RaceError::CannotStart(vec![
            StartBlocker::NotEnoughEntrants { required: 10, found: 9 },
            StartBlocker::MissingWeather,
        ]);
        let msg = err.to_string();
        assert!(msg.contains("need at least 10 cars, found 9"));
        assert!(msg.contains("no weather set"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_check_range_rejects_nan_and_bounds() {
        assert!(RaceError::check_range("fuel", 50.0, 0.0, 100.0).is_ok());
        assert!(RaceError::check_range("fuel", 100.0, 0.0, 100.0).is_ok());
        assert!(RaceError::check_range("fuel", 100.1, 0.0, 100.0).is_err());
        assert!(RaceError::check_range("fuel", -0.1, 0.0, 100.0).is_err());
        assert!(RaceError::check_range("fuel", f64::NAN, 0.0, 100.0).is_err());
    }
}
