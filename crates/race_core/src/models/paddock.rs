//! Paddock: owner of every car and driver of a team weekend
//!
//! The driver ↔ car link is a single source of truth kept here. Cars and
//! drivers expose read-only back-references; only [`Paddock::assign`] and
//! [`Paddock::release`] change them, and always on both sides at once.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::car::{Car, CarNumber, CarState};
use super::driver::{Driver, DriverId};
use crate::error::{RaceError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub driver: String,
    pub car: CarNumber,
    pub vehicle: String,
    pub state: CarState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paddock {
    cars: Vec<Car>,
    drivers: Vec<Driver>,
}

impl Paddock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a car. Numbers are unique; a car arriving with a driver
    /// link is rejected.
    pub fn add_car(&mut self, car: Car) -> Result<CarNumber> {
        let number = car.number();
        if self.cars.iter().any(|c| c.number() == number) {
            return Err(RaceError::DuplicateCar(number));
        }
        if car.driver().is_some() {
            return Err(RaceError::AlreadyAssigned(format!("car #{}", number)));
        }
        self.cars.push(car);
        Ok(number)
    }

    /// Registers a driver. Any car link the value carries is dropped.
    pub fn add_driver(&mut self, mut driver: Driver) -> DriverId {
        driver.unlink_car();
        self.drivers.push(driver);
        DriverId(self.drivers.len() - 1)
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn car(&self, number: CarNumber) -> Option<&Car> {
        self.cars.iter().find(|c| c.number() == number)
    }

    pub fn car_mut(&mut self, number: CarNumber) -> Option<&mut Car> {
        self.cars.iter_mut().find(|c| c.number() == number)
    }

    pub fn driver(&self, id: DriverId) -> Option<&Driver> {
        self.drivers.get(id.0)
    }

    pub fn driver_mut(&mut self, id: DriverId) -> Option<&mut Driver> {
        self.drivers.get_mut(id.0)
    }

    pub fn find_driver(&self, name: &str) -> Option<DriverId> {
        self.drivers.iter().position(|d| d.name() == name).map(DriverId)
    }

    /// Driver currently linked to `car`.
    pub fn driver_of(&self, car: CarNumber) -> Option<&Driver> {
        let id = self.car(car)?.driver()?;
        self.driver(id)
    }

    /// Links `driver_id` and `car` on both sides. The car starts racing.
    pub fn assign(&mut self, driver_id: DriverId, car: CarNumber) -> Result<Assignment> {
        let car_idx = self
            .cars
            .iter()
            .position(|c| c.number() == car)
            .ok_or(RaceError::UnknownCar(car))?;
        let driver = self.drivers.get(driver_id.0).ok_or(RaceError::UnknownDriver(driver_id.0))?;

        if let Some(current) = driver.car() {
            return Err(RaceError::AlreadyAssigned(format!(
                "{} (car #{})",
                driver.name(),
                current
            )));
        }
        if self.cars[car_idx].driver().is_some() {
            return Err(RaceError::AlreadyAssigned(format!("car #{}", car)));
        }
        if !driver.can_drive(&self.cars[car_idx]) {
            warn!(driver = %driver.name(), car, "assignment refused");
            return Err(RaceError::NotEligible { driver: driver.name().to_string(), car });
        }

        let car_ref = &mut self.cars[car_idx];
        car_ref.link_driver(driver_id);
        let driver = &mut self.drivers[driver_id.0];
        driver.link_car(car_ref);

        info!(driver = %driver.name(), car, "driver assigned");
        Ok(Assignment {
            driver: driver.name().to_string(),
            car,
            vehicle: format!("{} {}", car_ref.manufacturer(), car_ref.model()),
            state: car_ref.state(),
        })
    }

    /// Unlinks `car` from its driver; the car returns to reserve.
    pub fn release(&mut self, car: CarNumber) -> Result<Option<DriverId>> {
        let car_ref = self
            .cars
            .iter_mut()
            .find(|c| c.number() == car)
            .ok_or(RaceError::UnknownCar(car))?;

        let previous = car_ref.driver();
        car_ref.unlink_driver();
        if let Some(id) = previous {
            if let Some(driver) = self.drivers.get_mut(id.0) {
                driver.unlink_car();
            }
        }
        Ok(previous)
    }
}
