//! Tire taxonomy and the static durability table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RaceError;

/// Fixed compound set. Anything else is rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
}

impl TireCompound {
    pub const ALL: [TireCompound; 3] = [TireCompound::Soft, TireCompound::Medium, TireCompound::Hard];

    /// Lap-time multiplier.
    pub fn lap_time_factor(self) -> f64 {
        match self {
            TireCompound::Soft => 0.95,
            TireCompound::Medium => 1.00,
            TireCompound::Hard => 1.05,
        }
    }

    /// Hardness score used for strategy consistency (softer scores higher).
    pub fn aggression_score(self) -> f64 {
        match self {
            TireCompound::Soft => 3.0,
            TireCompound::Medium => 2.0,
            TireCompound::Hard => 1.0,
        }
    }

    fn index(self) -> usize {
        match self {
            TireCompound::Soft => 0,
            TireCompound::Medium => 1,
            TireCompound::Hard => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TireCompound::Soft => "soft",
            TireCompound::Medium => "medium",
            TireCompound::Hard => "hard",
        }
    }
}

impl fmt::Display for TireCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TireCompound {
    type Err = RaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(TireCompound::Soft),
            "medium" => Ok(TireCompound::Medium),
            "hard" => Ok(TireCompound::Hard),
            other => Err(RaceError::UnknownCompound(other.to_string())),
        }
    }
}

/// How hard a strategy pushes its tires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    Chill,
    Medium,
    Aggressive,
}

impl Aggressiveness {
    pub fn score(self) -> f64 {
        match self {
            Aggressiveness::Chill => 1.0,
            Aggressiveness::Medium => 2.0,
            Aggressiveness::Aggressive => 3.0,
        }
    }

    fn index(self) -> usize {
        match self {
            Aggressiveness::Chill => 0,
            Aggressiveness::Medium => 1,
            Aggressiveness::Aggressive => 2,
        }
    }
}

/// Max laps per stint, rows by aggressiveness, columns by compound.
const DURABILITY_LAPS: [[u32; 3]; 3] = [
    // soft, medium, hard
    [20, 35, 45], // chill
    [15, 27, 37], // medium
    [10, 20, 30], // aggressive
];

/// Maximum laps a compound survives when driven at the given aggressiveness.
pub fn durability(aggressiveness: Aggressiveness, compound: TireCompound) -> u32 {
    DURABILITY_LAPS[aggressiveness.index()][compound.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durability_table() {
        assert_eq!(durability(Aggressiveness::Chill, TireCompound::Soft), 20);
        assert_eq!(durability(Aggressiveness::Chill, TireCompound::Hard), 45);
        assert_eq!(durability(Aggressiveness::Medium, TireCompound::Medium), 27);
        assert_eq!(durability(Aggressiveness::Aggressive, TireCompound::Soft), 10);
        assert_eq!(durability(Aggressiveness::Aggressive, TireCompound::Hard), 30);
    }

    #[test]
    fn test_durability_shrinks_with_aggressiveness() {
        for compound in TireCompound::ALL {
            assert!(
                durability(Aggressiveness::Chill, compound)
                    > durability(Aggressiveness::Medium, compound)
            );
            assert!(
                durability(Aggressiveness::Medium, compound)
                    > durability(Aggressiveness::Aggressive, compound)
            );
        }
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!("soft".parse::<TireCompound>().unwrap(), TireCompound::Soft);
        assert_eq!(" Hard ".parse::<TireCompound>().unwrap(), TireCompound::Hard);
        assert!(matches!(
            "ultrasoft".parse::<TireCompound>(),
            Err(RaceError::UnknownCompound(_))
        ));
    }

    #[test]
    fn test_lap_time_factors() {
        assert_eq!(TireCompound::Soft.lap_time_factor(), 0.95);
        assert_eq!(TireCompound::Medium.lap_time_factor(), 1.00);
        assert_eq!(TireCompound::Hard.lap_time_factor(), 1.05);
    }
}
