//! Race orchestrator
//!
//! Owns the circuit and the paddock for one Grand Prix and drives it
//! through its lifecycle:
//!
//! ```text
//! pending ──validate──► validated ──start──► in_progress ──run_lap × N──► completed ──finalize
//!    └──────run_qualifying (validates first)──────┘
//! ```
//!
//! Every call either applies completely or returns an error with the race
//! unchanged. Lap times for the whole field are computed before anything
//! is mutated, so a car without a driver aborts the lap cleanly.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::fleet;
use super::lap_planner;
use super::qualifying::{self, GridSlot, QualifyingEntry, QualifyingResult};
use super::results::{
    CarLap, FastestLap, LapEstimate, LapSummary, ManualPitStop, PodiumFinish, RaceClassification,
    RaceResult, RaceStart, RunningPosition, SkippedStop, Standings, StrategyAssigned,
    StrategyStop, WeatherUpdate,
};
use crate::config::EngineConfig;
use crate::error::{RaceError, Result, StartBlocker};
use crate::models::car::{Car, CarNumber};
use crate::models::circuit::{Circuit, WeatherReport};
use crate::models::driver::{Driver, DriverId};
use crate::models::paddock::{Assignment, Paddock};
use crate::models::strategy::Strategy;
use crate::models::tire::TireCompound;
use crate::models::weather::Weather;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Pending,
    Validated,
    InProgress,
    Completed,
}

impl RaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RaceStatus::Pending => "pending",
            RaceStatus::Validated => "validated",
            RaceStatus::InProgress => "in_progress",
            RaceStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running totals for one entrant.
#[derive(Debug, Clone, Default)]
struct CarTiming {
    driver: Option<DriverId>,
    laps: u32,
    last_lap_s: Option<f64>,
    total_time_s: f64,
}

const BEFORE_START: &[RaceStatus] = &[RaceStatus::Pending, RaceStatus::Validated];

#[derive(Debug, Clone)]
pub struct Race {
    name: String,
    config: EngineConfig,
    circuit: Option<Circuit>,
    date: Option<NaiveDate>,
    weather: Option<Weather>,
    paddock: Paddock,
    entrants: Vec<CarNumber>,
    timing: HashMap<CarNumber, CarTiming>,
    strategies: HashMap<CarNumber, Strategy>,
    status: RaceStatus,
    total_laps: u32,
    current_lap: u32,
    qualifying: Option<QualifyingResult>,
    results: Vec<RaceResult>,
    fastest_lap: Option<FastestLap>,
    finalized: bool,
}

impl Race {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            name: name.into(),
            config,
            circuit: None,
            date: None,
            weather: None,
            paddock: Paddock::new(),
            entrants: Vec::new(),
            timing: HashMap::new(),
            strategies: HashMap::new(),
            status: RaceStatus::Pending,
            total_laps: 0,
            current_lap: 0,
            qualifying: None,
            results: Vec::new(),
            fastest_lap: None,
            finalized: false,
        }
    }

    // ========== Accessors ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn circuit(&self) -> Option<&Circuit> {
        self.circuit.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn weather(&self) -> Option<Weather> {
        self.weather
    }

    pub fn paddock(&self) -> &Paddock {
        &self.paddock
    }

    /// Direct paddock access for assignment changes between laps.
    pub fn paddock_mut(&mut self) -> &mut Paddock {
        &mut self.paddock
    }

    pub fn entrants(&self) -> &[CarNumber] {
        &self.entrants
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    pub fn qualifying(&self) -> Option<&QualifyingResult> {
        self.qualifying.as_ref()
    }

    pub fn results(&self) -> &[RaceResult] {
        &self.results
    }

    pub fn fastest_lap(&self) -> Option<&FastestLap> {
        self.fastest_lap.as_ref()
    }

    pub fn strategy(&self, car: CarNumber) -> Option<&Strategy> {
        self.strategies.get(&car)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Hands the owned entities back once the weekend is over.
    pub fn into_parts(self) -> (Option<Circuit>, Paddock) {
        (self.circuit, self.paddock)
    }

    fn ensure_status(&self, action: &'static str, allowed: &[RaceStatus]) -> Result<()> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        warn!(race = %self.name, action, status = %self.status, "rejected transition");
        Err(RaceError::InvalidTransition { action, status: self.status.as_str() })
    }

    fn ensure_entrant(&self, car: CarNumber) -> Result<()> {
        if self.entrants.contains(&car) {
            Ok(())
        } else {
            Err(RaceError::UnknownCar(car))
        }
    }

    fn entrant_cars(&self) -> Result<Vec<&Car>> {
        self.entrants
            .iter()
            .map(|&number| self.paddock.car(number).ok_or(RaceError::UnknownCar(number)))
            .collect()
    }

    /// Car, its driver id and the driver, for an entrant that must have one.
    fn entrant_with_driver(&self, number: CarNumber) -> Result<(&Car, DriverId, &Driver)> {
        let car = self.paddock.car(number).ok_or(RaceError::UnknownCar(number))?;
        let driver_id = car.driver().ok_or(RaceError::NoDriverAssigned { car: number })?;
        let driver =
            self.paddock.driver(driver_id).ok_or(RaceError::UnknownDriver(driver_id.index()))?;
        Ok((car, driver_id, driver))
    }

    // ========== Setup ==========

    pub fn set_circuit(&mut self, mut circuit: Circuit) -> Result<()> {
        self.ensure_status("set the circuit", BEFORE_START)?;
        if let Some(weather) = self.weather {
            circuit.apply_weather(weather);
        }
        info!(race = %self.name, circuit = %circuit.name(), "circuit set");
        self.circuit = Some(circuit);
        Ok(())
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        self.ensure_status("set the date", BEFORE_START)?;
        self.date = Some(date);
        Ok(())
    }

    /// Weather can change at any point; it takes effect from the next lap.
    pub fn set_weather(&mut self, weather: Weather) -> WeatherUpdate {
        self.weather = Some(weather);
        info!(race = %self.name, condition = %weather.condition(), "weather set");
        match self.circuit.as_mut() {
            Some(circuit) => {
                WeatherUpdate { report: circuit.apply_weather(weather), applied_to_circuit: true }
            }
            None => WeatherUpdate {
                report: WeatherReport { weather, visibility: weather.visibility() },
                applied_to_circuit: false,
            },
        }
    }

    /// Registers a car in the paddock and enters it in the race.
    pub fn enter_car(&mut self, car: Car) -> Result<CarNumber> {
        self.ensure_status("enter a car", BEFORE_START)?;
        let number = self.paddock.add_car(car)?;
        self.entrants.push(number);
        debug!(race = %self.name, car = number, entrants = self.entrants.len(), "car entered");
        Ok(number)
    }

    pub fn enter_driver(&mut self, driver: Driver) -> DriverId {
        self.paddock.add_driver(driver)
    }

    pub fn assign_driver(&mut self, driver: DriverId, car: CarNumber) -> Result<Assignment> {
        self.paddock.assign(driver, car)
    }

    pub fn assign_strategy(&mut self, car: CarNumber, strategy: Strategy) -> Result<StrategyAssigned> {
        self.ensure_status(
            "assign a strategy",
            &[RaceStatus::Pending, RaceStatus::Validated, RaceStatus::InProgress],
        )?;
        self.ensure_entrant(car)?;

        let total_laps = (self.status == RaceStatus::InProgress).then_some(self.total_laps);
        let report = StrategyAssigned {
            car,
            stops: strategy.number_of_stops(),
            within_durability: strategy.stints_within_durability(),
            aggressiveness_consistent: strategy.aggressiveness_consistent(),
            total_laps,
            violation: total_laps.and_then(|laps| strategy.check_optimal(laps).err()),
        };
        if let Some(violation) = &report.violation {
            warn!(car, ?violation, "strategy is not optimal for this race");
        }

        self.strategies.insert(car, strategy);
        Ok(report)
    }

    // ========== Validation & start ==========

    pub fn blockers(&self) -> Vec<StartBlocker> {
        let mut blockers = Vec::new();
        let required = self.config.session.min_entrants;
        if self.entrants.len() < required {
            blockers.push(StartBlocker::NotEnoughEntrants { required, found: self.entrants.len() });
        }
        if self.circuit.is_none() {
            blockers.push(StartBlocker::MissingCircuit);
        }
        if self.weather.is_none() {
            blockers.push(StartBlocker::MissingWeather);
        }
        if self.date.is_none() {
            blockers.push(StartBlocker::MissingDate);
        }
        blockers
    }

    pub fn is_valid(&self) -> bool {
        self.blockers().is_empty()
    }

    /// `pending → validated`. Already validated races pass through.
    pub fn validate(&mut self) -> Result<RaceStatus> {
        self.ensure_status("validate", BEFORE_START)?;
        if self.status == RaceStatus::Validated {
            return Ok(self.status);
        }

        let blockers = self.blockers();
        if !blockers.is_empty() {
            warn!(race = %self.name, ?blockers, "race cannot start");
            return Err(RaceError::CannotStart(blockers));
        }

        self.status = RaceStatus::Validated;
        info!(race = %self.name, entrants = self.entrants.len(), "race validated");
        Ok(self.status)
    }

    pub fn calculate_total_laps(&self) -> Result<u32> {
        let circuit = self.circuit.as_ref().ok_or(RaceError::MissingCircuit)?;
        let cars = self.entrant_cars()?;
        lap_planner::calculate_total_laps(circuit, cars.iter().copied(), &self.config.lap_planning)
    }

    pub fn start(&mut self) -> Result<RaceStart> {
        self.ensure_status("start", BEFORE_START)?;
        self.validate()?;

        let circuit = self.circuit.as_ref().ok_or(RaceError::MissingCircuit)?;
        let cars = self.entrant_cars()?;
        let plan = lap_planner::plan_laps(circuit, cars.iter().copied(), &self.config.lap_planning)?;
        let weather = self.weather.unwrap_or_default();

        self.total_laps = plan.total_laps;
        self.current_lap = 0;
        self.timing = self.entrants.iter().map(|&n| (n, CarTiming::default())).collect();
        self.fastest_lap = None;
        self.status = RaceStatus::InProgress;

        info!(
            race = %self.name,
            total_laps = self.total_laps,
            entrants = self.entrants.len(),
            condition = %weather.condition(),
            "race started"
        );

        Ok(RaceStart { total_laps: self.total_laps, entrants: self.entrants.len(), weather, plan })
    }

    // ========== Qualifying ==========

    pub fn run_qualifying(&mut self) -> Result<QualifyingResult> {
        self.ensure_status("run qualifying", BEFORE_START)?;
        self.validate()?;

        let circuit = self.circuit.as_ref().ok_or(RaceError::MissingCircuit)?;
        let entries = self
            .entrants
            .iter()
            .map(|&number| {
                let (car, driver_id, driver) = self.entrant_with_driver(number)?;
                Ok(QualifyingEntry {
                    driver_id,
                    driver: driver.name().to_string(),
                    car: number,
                    lap_time_s: car.lap_time(driver, circuit)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let result = qualifying::run_sessions(entries, &self.config.session);
        self.qualifying = Some(result.clone());
        Ok(result)
    }

    /// Grid derived from the last qualifying session; empty without one.
    pub fn starting_grid(&self) -> Vec<GridSlot> {
        self.qualifying.as_ref().map(QualifyingResult::starting_grid).unwrap_or_default()
    }

    // ========== Lap loop ==========

    /// Advances the whole field by one lap.
    ///
    /// The running fastest lap is tracked every lap, but the driver's
    /// fastest-lap stat and point are credited once, on the lap that
    /// completes the race, to whoever holds it then. An entrant whose car
    /// has left `racing` with its driver still aboard keeps lapping; any
    /// strategy stop it cannot take comes back as [`CarLap::skipped_stop`].
    pub fn run_lap(&mut self) -> Result<LapSummary> {
        self.ensure_status("run a lap", &[RaceStatus::InProgress])?;
        let date = self.date.ok_or(RaceError::CannotStart(vec![StartBlocker::MissingDate]))?;
        let circuit = self.circuit.as_ref().ok_or(RaceError::MissingCircuit)?;

        // Whole field first; nothing below may fail.
        let mut timed = Vec::with_capacity(self.entrants.len());
        for &number in &self.entrants {
            let (car, driver_id, driver) = self.entrant_with_driver(number)?;
            let lap_time_s = car.lap_time(driver, circuit)?;
            timed.push((number, driver_id, driver.name().to_string(), lap_time_s));
        }
        let (best_car, best_driver_id, best_driver, best_time) = timed
            .iter()
            .min_by(|a, b| a.3.total_cmp(&b.3))
            .cloned()
            .ok_or(RaceError::EmptyFleet)?;

        self.current_lap += 1;
        let lap = self.current_lap;
        let length_km = circuit.length_km();
        let refuel_to = self.config.pit.refuel_to;

        let mut cars = Vec::with_capacity(timed.len());
        for (number, driver_id, driver, lap_time_s) in timed {
            let Some(car) = self.paddock.car_mut(number) else { continue };
            let avg_speed_kph = length_km / (lap_time_s / 3600.0);
            let wear = car.apply_lap_wear(avg_speed_kph, circuit);
            let (strategy_stop, skipped_stop) =
                match execute_planned_stop(car, self.strategies.get_mut(&number), lap, refuel_to) {
                    Some(Ok(stop)) => (Some(stop), None),
                    Some(Err(skipped)) => (None, Some(skipped)),
                    None => (None, None),
                };

            let timing = self.timing.entry(number).or_default();
            timing.driver = Some(driver_id);
            timing.laps += 1;
            timing.last_lap_s = Some(lap_time_s);
            timing.total_time_s +=
                lap_time_s + strategy_stop.as_ref().map_or(0.0, |s| s.pit.estimated_duration_s);

            debug!(lap, car = number, lap_time_s, tire_wear = car.tire_wear(), fuel = car.fuel(), "lap");
            cars.push(CarLap {
                car: number,
                driver,
                lap_time_s,
                total_time_s: timing.total_time_s,
                wear,
                strategy_stop,
                skipped_stop,
            });
        }

        let lap_record = match self.circuit.as_mut() {
            Some(circuit) => circuit.record_lap(best_time, &best_driver, date),
            None => return Err(RaceError::MissingCircuit),
        };

        let fastest_lap = match self.fastest_lap.take() {
            Some(current) if current.time_s <= best_time => current,
            _ => FastestLap {
                driver_id: best_driver_id,
                driver: best_driver,
                car: best_car,
                lap,
                time_s: best_time,
            },
        };
        self.fastest_lap = Some(fastest_lap.clone());

        let mut fastest_lap_award = None;
        if lap >= self.total_laps {
            self.status = RaceStatus::Completed;
            fastest_lap_award =
                self.paddock.driver_mut(fastest_lap.driver_id).map(Driver::award_fastest_lap);
            info!(
                race = %self.name,
                laps = lap,
                fastest = %fastest_lap.driver,
                fastest_time_s = fastest_lap.time_s,
                "race completed"
            );
        }

        Ok(LapSummary {
            lap,
            total_laps: self.total_laps,
            cars,
            lap_record,
            fastest_lap,
            status: self.status,
            fastest_lap_award,
        })
    }

    pub fn run_to_completion(&mut self) -> Result<Vec<LapSummary>> {
        self.ensure_status("run to completion", &[RaceStatus::InProgress])?;
        let mut laps = Vec::with_capacity(self.total_laps.saturating_sub(self.current_lap) as usize);
        while self.status == RaceStatus::InProgress {
            laps.push(self.run_lap()?);
        }
        Ok(laps)
    }

    /// Unscheduled stop. Counts against the car's strategy when it has one.
    pub fn pit_stop(
        &mut self,
        car: CarNumber,
        compound: TireCompound,
        fuel_amount: f64,
    ) -> Result<ManualPitStop> {
        self.ensure_status("pit", &[RaceStatus::InProgress])?;
        self.ensure_entrant(car)?;

        let pit = self
            .paddock
            .car_mut(car)
            .ok_or(RaceError::UnknownCar(car))?
            .pit_stop(compound, fuel_amount)?;
        let stop = self
            .strategies
            .get_mut(&car)
            .and_then(|strategy| strategy.record_stop(pit.estimated_duration_s).ok());

        let timing = self.timing.entry(car).or_default();
        timing.total_time_s += pit.estimated_duration_s;

        info!(car, compound = %compound, "manual pit stop");
        Ok(ManualPitStop { pit, stop, total_time_s: timing.total_time_s })
    }

    // ========== Classification ==========

    pub fn finalize(&mut self) -> Result<RaceClassification> {
        if self.finalized {
            return Err(RaceError::AlreadyFinalized);
        }
        self.ensure_status("finalize", &[RaceStatus::Completed])?;

        let mut order: Vec<(CarNumber, CarTiming)> = self
            .entrants
            .iter()
            .filter_map(|n| self.timing.get(n).map(|t| (*n, t.clone())))
            .collect();
        order.sort_by(|a, b| {
            let a = a.1.last_lap_s.unwrap_or(f64::INFINITY);
            let b = b.1.last_lap_s.unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        });

        let leader_time = order.first().and_then(|(_, t)| t.last_lap_s).unwrap_or(0.0);
        let results: Vec<RaceResult> = order
            .iter()
            .enumerate()
            .map(|(idx, (car, timing))| {
                let lap_time_s = timing.last_lap_s.unwrap_or(f64::INFINITY);
                RaceResult {
                    position: idx as u32 + 1,
                    driver: timing
                        .driver
                        .and_then(|id| self.paddock.driver(id))
                        .map(|d| d.name().to_string())
                        .unwrap_or_default(),
                    car: *car,
                    lap_time_s,
                    gap_s: lap_time_s - leader_time,
                    total_time_s: timing.total_time_s,
                }
            })
            .collect();

        // resolve every podium driver before awarding anything
        let podium_drivers: Vec<(u32, CarNumber, DriverId)> = order
            .iter()
            .take(3)
            .enumerate()
            .map(|(idx, (car, timing))| {
                timing
                    .driver
                    .filter(|id| self.paddock.driver(*id).is_some())
                    .map(|id| (idx as u32 + 1, *car, id))
                    .ok_or(RaceError::NoDriverAssigned { car: *car })
            })
            .collect::<Result<_>>()?;

        let mut podium = Vec::with_capacity(podium_drivers.len());
        for (position, car, id) in podium_drivers {
            let driver = self.paddock.driver_mut(id).ok_or(RaceError::UnknownDriver(id.index()))?;
            let award = driver.award_result(position)?;
            podium.push(PodiumFinish { position, driver: driver.name().to_string(), car, award });
        }

        self.results = results.clone();
        self.finalized = true;

        if let Some(winner) = results.first() {
            info!(race = %self.name, winner = %winner.driver, car = winner.car, "race finalized");
        }

        Ok(RaceClassification {
            race: self.name.clone(),
            results,
            podium,
            lap_record: self.circuit.as_ref().and_then(Circuit::lap_record).cloned(),
            fastest_lap: self.fastest_lap.clone(),
        })
    }

    /// Live running order by laps completed, then cumulative time.
    pub fn standings(&self) -> Standings {
        let mut order: Vec<(CarNumber, CarTiming)> = self
            .entrants
            .iter()
            .map(|n| (*n, self.timing.get(n).cloned().unwrap_or_default()))
            .collect();
        order.sort_by(|a, b| b.1.laps.cmp(&a.1.laps).then(a.1.total_time_s.total_cmp(&b.1.total_time_s)));

        let leader_time = order.first().map_or(0.0, |(_, t)| t.total_time_s);
        let running_order = order
            .into_iter()
            .enumerate()
            .map(|(idx, (car, timing))| RunningPosition {
                position: idx as u32 + 1,
                driver: self.paddock.driver_of(car).map(|d| d.name().to_string()),
                car,
                laps: timing.laps,
                last_lap_s: timing.last_lap_s,
                total_time_s: timing.total_time_s,
                gap_s: timing.total_time_s - leader_time,
            })
            .collect();

        Standings {
            race: self.name.clone(),
            status: self.status,
            laps_completed: self.current_lap,
            laps_remaining: self.total_laps.saturating_sub(self.current_lap),
            running_order,
        }
    }

    /// Reference lap for the field as a whole, from fleet averages.
    pub fn estimated_lap_time(&self) -> Result<LapEstimate> {
        let circuit = self.circuit.as_ref().ok_or(RaceError::MissingCircuit)?;
        let cars = self.entrant_cars()?;

        let base_lap_s = circuit.length_km() / fleet::average_max_speed(cars.iter().copied())? * 3600.0;
        let skill_factor = fleet::average_skill_factor(cars.iter().copied(), &self.paddock)?;
        let tire_factor = fleet::average_tire_factor(cars.iter().copied())?;
        let wear_factor = fleet::average_wear_factor(cars.iter().copied())?;
        let weather_factor = circuit.weather_factor();

        Ok(LapEstimate {
            base_lap_s,
            skill_factor,
            tire_factor,
            wear_factor,
            weather_factor,
            lap_time_s: base_lap_s * skill_factor * tire_factor * wear_factor * weather_factor,
        })
    }
}

/// Runs the strategy's next stop if it is due by `lap`. A car that cannot
/// pit keeps its plan; the skipped stop is reported and retried next lap.
fn execute_planned_stop(
    car: &mut Car,
    strategy: Option<&mut Strategy>,
    lap: u32,
    refuel_to: f64,
) -> Option<std::result::Result<StrategyStop, SkippedStop>> {
    let strategy = strategy?;
    let planned = strategy.next_stop()?;
    if planned.lap > lap {
        return None;
    }

    let fuel_amount = (refuel_to - car.fuel()).max(0.0);
    let skipped = |err: RaceError, car: &Car| SkippedStop {
        stop_number: planned.stop_number,
        planned_lap: planned.lap,
        car_state: car.state(),
        reason: err.to_string(),
    };
    let pit = match car.pit_stop(planned.compound, fuel_amount) {
        Ok(pit) => pit,
        Err(err) => {
            warn!(car = car.number(), lap, stop = planned.stop_number, %err, "planned stop skipped");
            return Some(Err(skipped(err, &*car)));
        }
    };
    match strategy.record_stop(pit.estimated_duration_s) {
        Ok(stop) => {
            debug!(car = car.number(), stop = stop.stop_number, lap, "planned stop");
            Some(Ok(StrategyStop { pit, stop }))
        }
        Err(err) => Some(Err(skipped(err, &*car))),
    }
}
