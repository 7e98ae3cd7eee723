//! Driver performance model
//!
//! Skill-derived lap-time multiplier, weather style adaptation and
//! championship bookkeeping.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::car::{Car, CarNumber, CarState};
use super::weather::DrivingConditions;
use crate::error::{RaceError, Result};

pub const WIN_POINTS: u32 = 25;
pub const SECOND_PLACE_POINTS: u32 = 18;
pub const THIRD_PLACE_POINTS: u32 = 15;
pub const FASTEST_LAP_POINTS: u32 = 1;

const SKILL_MAX: u8 = 100;
const AGGRESSIVE_STYLE_THRESHOLD: u8 = 70;
const WET_AGGRESSION_DELTA: i16 = -15;
const WET_CONSISTENCY_DELTA: i16 = 10;

// Eligibility thresholds for taking over a car.
const DEVELOPMENT_MIN_CONSISTENCY: u8 = 80;
const RACE_CAR_MIN_SPEED: u8 = 70;
const RACE_CAR_MIN_CONSISTENCY: u8 = 70;

/// Index of a driver inside a [`Paddock`](super::paddock::Paddock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub(crate) usize);

impl DriverId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingStyle {
    Aggressive,
    Conservative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Skills {
    pub speed: u8,
    pub consistency: u8,
    pub aggression: u8,
}

impl Skills {
    pub fn new(speed: u8, consistency: u8, aggression: u8) -> Result<Self> {
        let skills = Self { speed, consistency, aggression };
        skills.validate()?;
        Ok(skills)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("speed", self.speed),
            ("consistency", self.consistency),
            ("aggression", self.aggression),
        ] {
            RaceError::check_range(field, value as f64, 0.0, SKILL_MAX as f64)?;
        }
        Ok(())
    }

    pub fn overall(&self) -> f64 {
        (self.speed as f64 + self.consistency as f64 + self.aggression as f64) / 3.0
    }
}

fn adjust_skill(value: u8, delta: i16) -> u8 {
    (value as i16 + delta).clamp(0, SKILL_MAX as i16) as u8
}

/// Cached counters, recomputed from the driver's source fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverStats {
    pub wins: u32,
    pub podiums: u32,
    pub fastest_laps: u32,
    pub retirements: u32,
    pub overall_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    pub name: String,
    pub championship_points: u32,
    pub skills: Skills,
    pub style: DrivingStyle,
    pub stats: DriverStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillAdjustment {
    pub aggression: i16,
    pub consistency: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleAdaptation {
    pub previous: DrivingStyle,
    pub new: DrivingStyle,
    pub adjustments: SkillAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillsUpdate {
    pub skills: Skills,
    pub overall: f64,
}

/// Effective skills under given conditions; never written back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub speed: u8,
    pub consistency: u8,
    pub aggression: u8,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsAward {
    pub points: u32,
    pub championship_points: u32,
    pub stats: DriverStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    name: String,
    nationality: String,
    championship_points: u32,
    skills: Skills,
    style: DrivingStyle,
    wins: u32,
    podiums: u32,
    fastest_laps: u32,
    retirements: u32,
    stats: DriverStats,
    car: Option<CarNumber>,
    cars_driven: Vec<String>,
}

impl Driver {
    pub fn new(name: impl Into<String>, nationality: impl Into<String>) -> Self {
        let mut driver = Self {
            name: name.into(),
            nationality: nationality.into(),
            championship_points: 0,
            skills: Skills::default(),
            style: DrivingStyle::Aggressive,
            wins: 0,
            podiums: 0,
            fastest_laps: 0,
            retirements: 0,
            stats: DriverStats::default(),
            car: None,
            cars_driven: Vec::new(),
        };
        driver.refresh_stats();
        driver
    }

    pub fn with_skills(mut self, skills: Skills) -> Result<Self> {
        self.set_skills(skills)?;
        Ok(self)
    }

    /// Carries points over from earlier rounds.
    pub fn with_points(mut self, points: u32) -> Self {
        self.championship_points = points;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nationality(&self) -> &str {
        &self.nationality
    }

    pub fn championship_points(&self) -> u32 {
        self.championship_points
    }

    pub fn skills(&self) -> Skills {
        self.skills
    }

    pub fn style(&self) -> DrivingStyle {
        self.style
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn car(&self) -> Option<CarNumber> {
        self.car
    }

    pub fn cars_driven(&self) -> &[String] {
        &self.cars_driven
    }

    pub fn snapshot(&self) -> DriverSnapshot {
        DriverSnapshot {
            name: self.name.clone(),
            championship_points: self.championship_points,
            skills: self.skills,
            style: self.style,
            stats: self.stats,
        }
    }

    /// Explicit skill configuration. Out-of-range values are rejected, not clamped.
    pub fn set_skills(&mut self, skills: Skills) -> Result<SkillsUpdate> {
        skills.validate()?;
        self.skills = skills;
        self.refresh_stats();
        Ok(SkillsUpdate { skills, overall: skills.overall() })
    }

    /// Lap-time multiplier: 1.0 for a zero-skill driver, 0.9 at maximum skill.
    pub fn skill_factor(&self) -> f64 {
        let level = (self.skills.speed as f64 + self.skills.consistency as f64) / 200.0;
        1.0 - level * 0.1
    }

    pub fn performance_in(&self, conditions: &DrivingConditions) -> Performance {
        let skills = if conditions.is_wet() {
            Skills {
                speed: adjust_skill(self.skills.speed, -10),
                consistency: adjust_skill(self.skills.consistency, -5),
                aggression: adjust_skill(self.skills.aggression, -15),
            }
        } else {
            self.skills
        };
        Performance {
            speed: skills.speed,
            consistency: skills.consistency,
            aggression: skills.aggression,
            total: skills.overall(),
        }
    }

    pub fn adapt_style(&mut self, conditions: &DrivingConditions) -> StyleAdaptation {
        let previous = self.style;
        let mut adjustments = SkillAdjustment::default();

        if conditions.is_wet() {
            self.style = DrivingStyle::Conservative;
            adjustments.aggression = WET_AGGRESSION_DELTA;
            adjustments.consistency = WET_CONSISTENCY_DELTA;
        } else if self.skills.aggression > AGGRESSIVE_STYLE_THRESHOLD {
            self.style = DrivingStyle::Aggressive;
        } else {
            self.style = DrivingStyle::Neutral;
        }

        self.skills.aggression = adjust_skill(self.skills.aggression, adjustments.aggression);
        self.skills.consistency = adjust_skill(self.skills.consistency, adjustments.consistency);
        self.refresh_stats();

        debug!(driver = %self.name, ?previous, new = ?self.style, "style adapted");
        StyleAdaptation { previous, new: self.style, adjustments }
    }

    /// Podium award. Positions outside 1..=3 leave the driver untouched.
    pub fn award_result(&mut self, position: u32) -> Result<PointsAward> {
        let points = match position {
            1 => WIN_POINTS,
            2 => SECOND_PLACE_POINTS,
            3 => THIRD_PLACE_POINTS,
            _ => {
                warn!(driver = %self.name, position, "not a podium position");
                return Err(RaceError::InvalidPodiumPosition {
                    position,
                    snapshot: Box::new(self.snapshot()),
                });
            }
        };

        if position == 1 {
            self.wins += 1;
        }
        self.podiums += 1;
        Ok(self.add_points(points))
    }

    pub fn award_fastest_lap(&mut self) -> PointsAward {
        self.fastest_laps += 1;
        self.add_points(FASTEST_LAP_POINTS)
    }

    pub fn record_retirement(&mut self) -> DriverStats {
        self.retirements += 1;
        self.refresh_stats();
        self.stats
    }

    fn add_points(&mut self, points: u32) -> PointsAward {
        self.championship_points += points;
        self.refresh_stats();
        PointsAward { points, championship_points: self.championship_points, stats: self.stats }
    }

    pub fn refresh_stats(&mut self) {
        self.stats = DriverStats {
            wins: self.wins,
            podiums: self.podiums,
            fastest_laps: self.fastest_laps,
            retirements: self.retirements,
            overall_rating: self.skills.overall(),
        };
    }

    /// Whether this driver may take over `car` right now.
    pub fn can_drive(&self, car: &Car) -> bool {
        if car.driver().is_some() {
            return false;
        }
        match car.state() {
            CarState::Reserve => true,
            CarState::Development => self.skills.consistency >= DEVELOPMENT_MIN_CONSISTENCY,
            CarState::InPits => {
                self.skills.speed >= RACE_CAR_MIN_SPEED
                    && self.skills.consistency >= RACE_CAR_MIN_CONSISTENCY
            }
            CarState::Racing => false,
        }
    }

    pub(crate) fn link_car(&mut self, car: &Car) {
        self.car = Some(car.number());
        if !self.cars_driven.iter().any(|m| m == car.model()) {
            self.cars_driven.push(car.model().to_string());
        }
    }

    pub(crate) fn unlink_car(&mut self) {
        self.car = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::car::{Part, PartKind};
    use crate::models::tire::TireCompound;
    use crate::models::weather::WeatherCondition;

    fn driver(speed: u8, consistency: u8, aggression: u8) -> Driver {
        Driver::new("Lewis Hamilton", "British")
            .with_skills(Skills::new(speed, consistency, aggression).unwrap())
            .unwrap()
    }

    #[test]
    fn test_skill_factor_bounds() {
        assert_eq!(driver(0, 0, 0).skill_factor(), 1.0);
        assert!((driver(100, 100, 0).skill_factor() - 0.9).abs() < 1e-12);
        assert!((driver(95, 90, 85).skill_factor() - (1.0 - 0.925 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_skill_factor_strictly_decreasing() {
        let mut last = f64::INFINITY;
        for total in 0..=100u8 {
            let factor = driver(total, total, 50).skill_factor();
            assert!(factor < last);
            assert!(factor >= 0.9 && factor <= 1.0);
            last = factor;
        }
    }

    #[test]
    fn test_set_skills_rejects_out_of_range() {
        let mut d = driver(50, 50, 50);
        let err = d.set_skills(Skills { speed: 101, consistency: 10, aggression: 10 }).unwrap_err();
        assert!(matches!(err, RaceError::OutOfRange { field: "speed", .. }));
        assert_eq!(d.skills(), Skills { speed: 50, consistency: 50, aggression: 50 });

        let update = d.set_skills(Skills::new(95, 90, 85).unwrap()).unwrap();
        assert_eq!(update.overall, 90.0);
    }

    #[test]
    fn test_adapt_style_in_rain() {
        let mut d = driver(80, 95, 10);
        let result = d.adapt_style(&DrivingConditions::new(WeatherCondition::Rain));
        assert_eq!(result.previous, DrivingStyle::Aggressive);
        assert_eq!(result.new, DrivingStyle::Conservative);
        assert_eq!(result.adjustments, SkillAdjustment { aggression: -15, consistency: 10 });
        // clamped at both ends
        assert_eq!(d.skills().aggression, 0);
        assert_eq!(d.skills().consistency, 100);
        assert!((d.stats().overall_rating - d.skills().overall()).abs() < 1e-12);
    }

    #[test]
    fn test_adapt_style_wet_track_in_dry_weather() {
        let mut d = driver(80, 60, 90);
        let conditions = DrivingConditions::new(WeatherCondition::Dry).with_wet_track();
        assert_eq!(d.adapt_style(&conditions).new, DrivingStyle::Conservative);
        assert_eq!(d.skills().aggression, 75);
        assert_eq!(d.skills().consistency, 70);
    }

    #[test]
    fn test_adapt_style_dry() {
        let mut d = driver(80, 60, 71);
        let result = d.adapt_style(&DrivingConditions::new(WeatherCondition::Dry));
        assert_eq!(result.new, DrivingStyle::Aggressive);
        assert_eq!(result.adjustments, SkillAdjustment::default());

        let mut calm = driver(80, 60, 70);
        assert_eq!(calm.adapt_style(&DrivingConditions::new(WeatherCondition::Dry)).new, DrivingStyle::Neutral);
        assert_eq!(calm.skills(), Skills { speed: 80, consistency: 60, aggression: 70 });
    }

    #[test]
    fn test_adapt_style_refresh_is_idempotent() {
        let mut d = driver(50, 50, 50);
        d.award_result(1).unwrap();
        let conditions = DrivingConditions::new(WeatherCondition::Mixed);
        d.adapt_style(&conditions);
        let first = d.stats();
        d.adapt_style(&conditions);
        assert_eq!(d.stats(), first);
        assert_eq!(first.wins, 1);
    }

    #[test]
    fn test_award_result_points() {
        let mut d = driver(50, 50, 50);
        let win = d.award_result(1).unwrap();
        assert_eq!(win.points, 25);
        assert_eq!(win.championship_points, 25);
        assert_eq!(win.stats.wins, 1);
        assert_eq!(win.stats.podiums, 1);

        assert_eq!(d.award_result(2).unwrap().points, 18);
        assert_eq!(d.award_result(3).unwrap().points, 15);
        assert_eq!(d.championship_points(), 58);
        assert_eq!(d.stats().wins, 1);
        assert_eq!(d.stats().podiums, 3);
    }

    #[test]
    fn test_award_result_rejects_non_podium() {
        let mut d = driver(50, 50, 50).with_points(40);
        for position in [0, 4, 20] {
            match d.award_result(position) {
                Err(RaceError::InvalidPodiumPosition { position: p, snapshot }) => {
                    assert_eq!(p, position);
                    assert_eq!(snapshot.championship_points, 40);
                }
                other => panic!("expected rejection, got {:?}", other),
            }
        }
        assert_eq!(d.championship_points(), 40);
        assert_eq!(d.stats().podiums, 0);
    }

    #[test]
    fn test_fastest_lap_is_one_point() {
        let mut d = driver(50, 50, 50);
        let award = d.award_fastest_lap();
        assert_eq!(award.points, 1);
        assert_eq!(award.stats.fastest_laps, 1);
        assert_eq!(d.championship_points(), 1);
    }

    #[test]
    fn test_record_retirement_counts_without_points() {
        let mut d = driver(60, 60, 40);
        d.record_retirement();
        let stats = d.record_retirement();
        assert_eq!(stats.retirements, 2);
        assert_eq!(d.stats().retirements, 2);
        assert_eq!(d.championship_points(), 0);
        assert_eq!(stats.wins, 0);
    }

    #[test]
    fn test_performance_in_rain_does_not_mutate() {
        let d = driver(80, 70, 10);
        let perf = d.performance_in(&DrivingConditions::new(WeatherCondition::Rain));
        assert_eq!((perf.speed, perf.consistency, perf.aggression), (70, 65, 0));
        assert_eq!(d.skills(), Skills { speed: 80, consistency: 70, aggression: 10 });
    }

    #[test]
    fn test_can_drive_rules() {
        let rookie = driver(10, 10, 10);
        let veteran = driver(85, 85, 50);
        let reserve = Car::new(3, "Ferrari", "SF-24", TireCompound::Medium, 335.0).unwrap();
        assert!(rookie.can_drive(&reserve));

        let mut dev = reserve.clone();
        dev.install_part(Part { kind: PartKind::Aerodynamics, specification: "floor v2".into() });
        assert!(!rookie.can_drive(&dev));
        assert!(veteran.can_drive(&dev));
    }
}
