//! Car performance model
//!
//! Lap-time multipliers, per-lap wear/fuel integration and the pit stop.
//!
//! ## State machine
//! ```text
//! reserve ──assign──► racing ──pit_stop──► in_pits ──► racing
//!    ▲                   │
//!    └──────release──────┤
//!                        └──install_part──► development ──assign──► racing
//! ```
//! `in_pits` is only observable inside [`Car::pit_stop`]; while in it, lap
//! wear is frozen.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::circuit::Circuit;
use super::driver::{Driver, DriverId};
use super::tire::TireCompound;
use crate::error::{RaceError, Result};

pub type CarNumber = u32;

/// Seconds reported for every pit stop.
pub const ESTIMATED_PIT_STOP_S: f64 = 3.5;

const TIRE_WEAR_PER_LAP: f64 = 0.5;
const ENGINE_WEAR_PER_LAP: f64 = 0.2;
const FUEL_PER_LAP: f64 = 0.3;
const WEAR_TIME_PENALTY: f64 = 0.001;

const READY_MAX_TIRE_WEAR: f64 = 30.0;
const READY_MIN_FUEL: f64 = 20.0;
const READY_MAX_ENGINE_WEAR: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarState {
    Racing,
    InPits,
    Reserve,
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Engine,
    Aerodynamics,
    Tires,
    Suspension,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub kind: PartKind,
    pub specification: String,
}

/// Explicit starting wear. Every field must be within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialWear {
    pub tire_wear: f64,
    pub engine_wear: f64,
    pub fuel: f64,
}

/// Per-lap deltas, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LapWear {
    pub tire_wear: f64,
    pub engine_wear: f64,
    pub fuel_used: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WearSnapshot {
    pub tire_wear: f64,
    pub fuel: f64,
    pub engine_wear: f64,
    pub state: CarState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitStopReport {
    pub car: CarNumber,
    pub final_state: CarState,
    pub compound: Change<TireCompound>,
    pub fuel: Change<f64>,
    pub estimated_duration_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInstalled {
    pub part: Part,
    pub previous_state: CarState,
    pub state: CarState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    number: CarNumber,
    manufacturer: String,
    model: String,
    compound: TireCompound,
    max_speed_kph: f64,
    fuel: f64,
    tire_wear: f64,
    engine_wear: f64,
    distance_km: f64,
    state: CarState,
    driver: Option<DriverId>,
    parts: Vec<Part>,
}

impl Car {
    /// Builds a fresh car in `reserve` with a full tank and no wear.
    pub fn new(
        number: CarNumber,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        compound: TireCompound,
        max_speed_kph: f64,
    ) -> Result<Self> {
        if !(max_speed_kph.is_finite() && max_speed_kph > 0.0) {
            return Err(RaceError::OutOfRange {
                field: "max_speed_kph",
                value: max_speed_kph,
                min: f64::MIN_POSITIVE,
                max: f64::INFINITY,
            });
        }
        Ok(Self {
            number,
            manufacturer: manufacturer.into(),
            model: model.into(),
            compound,
            max_speed_kph,
            fuel: 100.0,
            tire_wear: 0.0,
            engine_wear: 0.0,
            distance_km: 0.0,
            state: CarState::Reserve,
            driver: None,
            parts: Vec::new(),
        })
    }

    pub fn number(&self) -> CarNumber {
        self.number
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn compound(&self) -> TireCompound {
        self.compound
    }

    pub fn max_speed_kph(&self) -> f64 {
        self.max_speed_kph
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn tire_wear(&self) -> f64 {
        self.tire_wear
    }

    pub fn engine_wear(&self) -> f64 {
        self.engine_wear
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn state(&self) -> CarState {
        self.state
    }

    pub fn driver(&self) -> Option<DriverId> {
        self.driver
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn wear_snapshot(&self) -> WearSnapshot {
        WearSnapshot {
            tire_wear: self.tire_wear,
            fuel: self.fuel,
            engine_wear: self.engine_wear,
            state: self.state,
        }
    }

    /// Sets starting wear/fuel. Rejects the whole call if any value is out of range.
    pub fn configure_initial_wear(&mut self, initial: InitialWear) -> Result<WearSnapshot> {
        RaceError::check_range("tire_wear", initial.tire_wear, 0.0, 100.0)?;
        RaceError::check_range("engine_wear", initial.engine_wear, 0.0, 100.0)?;
        RaceError::check_range("fuel", initial.fuel, 0.0, 100.0)?;

        self.tire_wear = initial.tire_wear;
        self.engine_wear = initial.engine_wear;
        self.fuel = initial.fuel;
        Ok(self.wear_snapshot())
    }

    pub fn tire_factor(&self) -> f64 {
        self.compound.lap_time_factor()
    }

    pub fn wear_factor(&self) -> f64 {
        1.0 + self.tire_wear * WEAR_TIME_PENALTY
    }

    /// Flat-out lap at top speed, in seconds.
    pub fn base_lap_time(&self, circuit: &Circuit) -> f64 {
        (circuit.length_km() / self.max_speed_kph) * 3600.0
    }

    /// Lap time in seconds for the assigned `driver` on `circuit`.
    pub fn lap_time(&self, driver: &Driver, circuit: &Circuit) -> Result<f64> {
        if self.driver.is_none() || driver.car() != Some(self.number) {
            return Err(RaceError::NoDriverAssigned { car: self.number });
        }

        Ok(self.base_lap_time(circuit)
            * driver.skill_factor()
            * self.wear_factor()
            * circuit.weather_factor()
            * self.tire_factor())
    }

    /// Integrates one lap of wear and fuel burn at `avg_speed_kph`.
    pub fn apply_lap_wear(&mut self, avg_speed_kph: f64, circuit: &Circuit) -> LapWear {
        if self.state == CarState::InPits {
            return LapWear::default();
        }

        let avg_speed = if avg_speed_kph.is_finite() { avg_speed_kph.max(0.0) } else { 0.0 };
        let speed_factor = avg_speed / self.max_speed_kph;

        let wear = LapWear {
            tire_wear: TIRE_WEAR_PER_LAP * speed_factor * self.tire_factor(),
            engine_wear: ENGINE_WEAR_PER_LAP * speed_factor,
            fuel_used: FUEL_PER_LAP * speed_factor,
        };

        self.tire_wear = (self.tire_wear + wear.tire_wear).min(100.0);
        self.engine_wear = (self.engine_wear + wear.engine_wear).min(100.0);
        self.fuel = (self.fuel - wear.fuel_used).max(0.0);
        self.distance_km += circuit.length_km();

        wear
    }

    pub fn is_race_ready(&self) -> bool {
        self.tire_wear < READY_MAX_TIRE_WEAR
            && self.fuel > READY_MIN_FUEL
            && self.engine_wear < READY_MAX_ENGINE_WEAR
            && (self.state != CarState::Racing || self.driver.is_some())
    }

    /// Tire change plus refuel as one step. The car must be racing.
    pub fn pit_stop(&mut self, compound: TireCompound, fuel_amount: f64) -> Result<PitStopReport> {
        if self.state != CarState::Racing {
            warn!(car = self.number, state = ?self.state, "pit stop rejected");
            return Err(RaceError::NotRacing { car: self.number, state: self.state });
        }
        if !(fuel_amount.is_finite() && fuel_amount >= 0.0) {
            return Err(RaceError::OutOfRange {
                field: "fuel_amount",
                value: fuel_amount,
                min: 0.0,
                max: f64::INFINITY,
            });
        }

        let compound_before = self.compound;
        let fuel_before = self.fuel;

        self.state = CarState::InPits;
        self.compound = compound;
        self.tire_wear = 0.0;
        self.fuel = (self.fuel + fuel_amount).min(100.0);
        self.state = CarState::Racing;

        debug!(
            car = self.number,
            from = %compound_before,
            to = %compound,
            fuel = self.fuel,
            "pit stop complete"
        );

        Ok(PitStopReport {
            car: self.number,
            final_state: self.state,
            compound: Change { before: compound_before, after: self.compound },
            fuel: Change { before: fuel_before, after: self.fuel },
            estimated_duration_s: ESTIMATED_PIT_STOP_S,
        })
    }

    /// Fits a new part; the car moves to `development` until reassigned.
    pub fn install_part(&mut self, part: Part) -> PartInstalled {
        let previous_state = self.state;
        self.parts.push(part.clone());
        self.state = CarState::Development;
        debug!(car = self.number, kind = ?part.kind, "part installed");
        PartInstalled { part, previous_state, state: self.state }
    }

    pub(crate) fn link_driver(&mut self, driver: DriverId) {
        self.driver = Some(driver);
        self.state = CarState::Racing;
    }

    pub(crate) fn unlink_driver(&mut self) {
        self.driver = None;
        self.state = CarState::Reserve;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paddock::Paddock;
    use crate::models::weather::WeatherCondition;
    use proptest::prelude::*;

    fn circuit() -> Circuit {
        Circuit::new("Test Ring", "Nowhere", 5.0).unwrap()
    }

    fn car(compound: TireCompound) -> Car {
        Car::new(44, "Mercedes", "W13", compound, 340.0).unwrap()
    }

    fn paddock_with(car: Car, driver: Driver) -> Paddock {
        let mut paddock = Paddock::new();
        let number = car.number();
        paddock.add_car(car).unwrap();
        let id = paddock.add_driver(driver);
        paddock.assign(id, number).unwrap();
        paddock
    }

    #[test]
    fn test_new_car_starts_in_reserve() {
        let car = car(TireCompound::Soft);
        assert_eq!(car.state(), CarState::Reserve);
        assert_eq!(car.fuel(), 100.0);
        assert!(car.driver().is_none());
        assert!(Car::new(1, "X", "Y", TireCompound::Soft, 0.0).is_err());
    }

    #[test]
    fn test_lap_time_zero_skill_driver_on_softs() {
        let paddock = paddock_with(car(TireCompound::Soft), Driver::new("Rookie", "Nowhere"));
        let car = paddock.car(44).unwrap();
        let driver = paddock.driver_of(44).unwrap();
        assert_eq!(driver.skill_factor(), 1.0);

        let time = car.lap_time(driver, &circuit()).unwrap();
        let expected = (5.0 / 340.0 * 3600.0) * 0.95;
        assert!((time - expected).abs() < 1e-9);
        assert!((time - 50.29).abs() < 0.01, "got {time}");
    }

    #[test]
    fn test_lap_time_applies_weather_and_wear() {
        let mut paddock = paddock_with(car(TireCompound::Hard), Driver::new("Rookie", "Nowhere"));
        let mut wet = circuit();
        wet.set_weather(WeatherCondition::Wet, 15.0, 90.0).unwrap();

        paddock
            .car_mut(44)
            .unwrap()
            .configure_initial_wear(InitialWear { tire_wear: 50.0, engine_wear: 0.0, fuel: 80.0 })
            .unwrap();

        let car = paddock.car(44).unwrap();
        let time = car.lap_time(paddock.driver_of(44).unwrap(), &wet).unwrap();
        let expected = (5.0 / 340.0 * 3600.0) * 1.05 * 1.10 * 1.05;
        assert!((time - expected).abs() < 1e-9);
    }

    #[test]
    fn test_lap_time_requires_assigned_driver() {
        let car = car(TireCompound::Soft);
        let stranger = Driver::new("Stranger", "Nowhere");
        assert_eq!(
            car.lap_time(&stranger, &circuit()),
            Err(RaceError::NoDriverAssigned { car: 44 })
        );
    }

    #[test]
    fn test_apply_lap_wear_deltas() {
        let mut car = car(TireCompound::Soft);
        let wear = car.apply_lap_wear(170.0, &circuit());
        assert!((wear.tire_wear - 0.5 * 0.5 * 0.95).abs() < 1e-12);
        assert!((wear.engine_wear - 0.1).abs() < 1e-12);
        assert!((wear.fuel_used - 0.15).abs() < 1e-12);
        assert!((car.fuel() - 99.85).abs() < 1e-12);
        assert_eq!(car.distance_km(), 5.0);
    }

    #[test]
    fn test_is_race_ready_thresholds() {
        let mut car = car(TireCompound::Medium);
        assert!(car.is_race_ready());

        car.configure_initial_wear(InitialWear { tire_wear: 30.0, engine_wear: 0.0, fuel: 100.0 })
            .unwrap();
        assert!(!car.is_race_ready());

        car.configure_initial_wear(InitialWear { tire_wear: 0.0, engine_wear: 0.0, fuel: 20.0 })
            .unwrap();
        assert!(!car.is_race_ready());

        car.configure_initial_wear(InitialWear { tire_wear: 0.0, engine_wear: 40.0, fuel: 50.0 })
            .unwrap();
        assert!(!car.is_race_ready());
    }

    #[test]
    fn test_configure_initial_wear_rejects_out_of_range() {
        let mut car = car(TireCompound::Medium);
        let err = car
            .configure_initial_wear(InitialWear { tire_wear: 10.0, engine_wear: 101.0, fuel: 50.0 })
            .unwrap_err();
        assert!(matches!(err, RaceError::OutOfRange { field: "engine_wear", .. }));
        assert_eq!(car.tire_wear(), 0.0);
        assert_eq!(car.fuel(), 100.0);
    }

    #[test]
    fn test_pit_stop_changes_compound_and_refuels() {
        let mut paddock = paddock_with(car(TireCompound::Soft), Driver::new("Hamilton", "GB"));
        let car = paddock.car_mut(44).unwrap();
        car.configure_initial_wear(InitialWear { tire_wear: 45.0, engine_wear: 10.0, fuel: 50.0 })
            .unwrap();

        let report = car.pit_stop(TireCompound::Hard, 30.0).unwrap();
        assert_eq!(report.final_state, CarState::Racing);
        assert_eq!(report.compound, Change { before: TireCompound::Soft, after: TireCompound::Hard });
        assert_eq!(report.fuel, Change { before: 50.0, after: 80.0 });
        assert_eq!(report.estimated_duration_s, 3.5);
        assert_eq!(car.tire_wear(), 0.0);
        assert_eq!(car.engine_wear(), 10.0);

        let report = car.pit_stop(TireCompound::Medium, 50.0).unwrap();
        assert_eq!(report.fuel.after, 100.0);
    }

    #[test]
    fn test_pit_stop_rejected_when_not_racing() {
        let mut car = car(TireCompound::Soft);
        let err = car.pit_stop(TireCompound::Hard, 10.0).unwrap_err();
        assert!(matches!(err, RaceError::NotRacing { car: 44, state: CarState::Reserve }));
        assert_eq!(car.compound(), TireCompound::Soft);
    }

    #[test]
    fn test_pit_stop_rejects_negative_fuel() {
        let mut paddock = paddock_with(car(TireCompound::Soft), Driver::new("Hamilton", "GB"));
        let car = paddock.car_mut(44).unwrap();
        assert!(car.pit_stop(TireCompound::Hard, -5.0).is_err());
        assert_eq!(car.compound(), TireCompound::Soft);
        assert_eq!(car.state(), CarState::Racing);
    }

    #[test]
    fn test_install_part_enters_development() {
        let mut car = car(TireCompound::Soft);
        let installed = car.install_part(Part {
            kind: PartKind::Engine,
            specification: "spec 3".into(),
        });
        assert_eq!(installed.previous_state, CarState::Reserve);
        assert_eq!(car.state(), CarState::Development);
        assert_eq!(car.parts().len(), 1);
    }

    #[test]
    fn test_wear_frozen_in_pits() {
        let mut car = car(TireCompound::Soft);
        car.state = CarState::InPits;
        let wear = car.apply_lap_wear(300.0, &circuit());
        assert_eq!(wear, LapWear::default());
        assert_eq!(car.tire_wear(), 0.0);
        assert_eq!(car.distance_km(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_wear_and_fuel_stay_clamped(
            speeds in proptest::collection::vec(-1_000.0f64..100_000.0, 1..200)
        ) {
            let mut car = car(TireCompound::Soft);
            let circuit = circuit();
            let mut last_distance = 0.0;
            for speed in speeds {
                car.apply_lap_wear(speed, &circuit);
                prop_assert!((0.0..=100.0).contains(&car.tire_wear()));
                prop_assert!((0.0..=100.0).contains(&car.engine_wear()));
                prop_assert!((0.0..=100.0).contains(&car.fuel()));
                prop_assert!(car.distance_km() >= last_distance);
                last_distance = car.distance_km();
            }
        }

        #[test]
        fn prop_pit_stop_round_trip(
            start_fuel in 0.0f64..=100.0,
            added in 0.0f64..250.0,
            compound_idx in 0usize..3
        ) {
            let mut paddock = paddock_with(car(TireCompound::Soft), Driver::new("Hamilton", "GB"));
            let car = paddock.car_mut(44).unwrap();
            car.configure_initial_wear(InitialWear { tire_wear: 20.0, engine_wear: 0.0, fuel: start_fuel }).unwrap();

            let compound = TireCompound::ALL[compound_idx];
            car.pit_stop(compound, added).unwrap();
            prop_assert_eq!(car.compound(), compound);
            prop_assert_eq!(car.fuel(), (start_fuel + added).min(100.0));
        }
    }
}
