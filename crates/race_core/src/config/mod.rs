//! # Engine Configuration
//!
//! Every tunable the race orchestrator uses lives here instead of being a
//! magic number at the call site.
//!
//! ## Usage
//! ```rust
//! use race_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! let sprint = EngineConfig::sprint();
//! assert!(sprint.lap_planning.target_duration_min < config.lap_planning.target_duration_min);
//! ```
//!
//! ## Environment Variables
//!
//! - `RACE_CONFIG_PROFILE`: Select preset (realistic, sprint)

mod lap_planning_config;
mod session_config;

pub use lap_planning_config::LapPlanningConfig;
pub use session_config::{PitConfig, SessionConfig};

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RaceError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Total-lap planning inputs
    pub lap_planning: LapPlanningConfig,
    /// Entrant minimum and qualifying cuts
    pub session: SessionConfig,
    /// Strategy-driven stop behaviour
    pub pit: PitConfig,
}

impl EngineConfig {
    /// Full-length Grand Prix (default).
    pub fn realistic() -> Self {
        Self::default()
    }

    /// Short race: a third of the target duration.
    pub fn sprint() -> Self {
        let mut cfg = Self::default();
        cfg.lap_planning.target_duration_min = 30.0;
        cfg
    }

    pub fn from_env_or_default() -> Self {
        match env::var("RACE_CONFIG_PROFILE").unwrap_or_default().to_lowercase().as_str() {
            "sprint" => Self::sprint(),
            _ => Self::realistic(),
        }
    }

    /// Parses YAML; missing fields fall back to defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RaceError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        self.lap_planning.validate()?;
        self.session.validate()?;
        self.pit.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.lap_planning.target_duration_min, 90.0);
        assert_eq!(cfg.lap_planning.fuel_allowance, 110.0);
        assert_eq!(cfg.session.min_entrants, 10);
        assert_eq!(cfg.session.q2_size, 15);
        assert_eq!(cfg.session.q3_size, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = EngineConfig::from_yaml_str(
            "lap_planning:\n  target_duration_min: 45\nsession:\n  q2_size: 12\n",
        )
        .unwrap();
        assert_eq!(cfg.lap_planning.target_duration_min, 45.0);
        assert_eq!(cfg.lap_planning.tire_life_laps, 40.0);
        assert_eq!(cfg.session.q2_size, 12);
        assert_eq!(cfg.session.q3_size, 10);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        assert!(matches!(
            EngineConfig::from_yaml_str("lap_planning: [1, 2]"),
            Err(RaceError::Config(_))
        ));
        // q3 larger than q2 breaks the nested cuts
        assert!(EngineConfig::from_yaml_str("session:\n  q2_size: 8\n  q3_size: 10\n").is_err());
    }

    #[test]
    fn test_profile_from_env() {
        std::env::set_var("RACE_CONFIG_PROFILE", "Sprint");
        assert_eq!(EngineConfig::from_env_or_default(), EngineConfig::sprint());

        std::env::set_var("RACE_CONFIG_PROFILE", "unknown");
        assert_eq!(EngineConfig::from_env_or_default(), EngineConfig::realistic());

        std::env::remove_var("RACE_CONFIG_PROFILE");
        assert_eq!(EngineConfig::from_env_or_default(), EngineConfig::default());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pit:\n  refuel_to: 80").unwrap();
        let cfg = EngineConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(cfg.pit.refuel_to, 80.0);

        assert!(EngineConfig::from_yaml_file("/definitely/not/here.yaml").is_err());
    }
}
