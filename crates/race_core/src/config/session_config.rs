//! Session and pit-lane configuration

use serde::{Deserialize, Serialize};

use crate::error::{RaceError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cars required before a race may leave `pending` (default: 10)
    pub min_entrants: usize,
    /// Drivers that advance from Q1 (default: 15)
    pub q2_size: usize,
    /// Drivers that advance from Q2 (default: 10)
    pub q3_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { min_entrants: 10, q2_size: 15, q3_size: 10 }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.q3_size > self.q2_size {
            return Err(RaceError::Config(format!(
                "q3_size ({}) cannot exceed q2_size ({})",
                self.q3_size, self.q2_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitConfig {
    /// Fuel level a strategy stop tops the tank up to (default: 100)
    pub refuel_to: f64,
}

impl Default for PitConfig {
    fn default() -> Self {
        Self { refuel_to: 100.0 }
    }
}

impl PitConfig {
    pub fn validate(&self) -> Result<()> {
        RaceError::check_range("refuel_to", self.refuel_to, 0.0, 100.0)
            .map_err(|e| RaceError::Config(e.to_string()))
    }
}
