//! Fleet-wide averages used by lap planning and reference lap times.

use crate::error::{RaceError, Result};
use crate::models::car::Car;
use crate::models::paddock::Paddock;

fn mean<'a>(cars: impl IntoIterator<Item = &'a Car>, f: impl Fn(&Car) -> f64) -> Result<f64> {
    let (sum, count) = cars.into_iter().fold((0.0, 0usize), |(sum, n), car| (sum + f(car), n + 1));
    if count == 0 {
        return Err(RaceError::EmptyFleet);
    }
    Ok(sum / count as f64)
}

pub fn average_max_speed<'a>(cars: impl IntoIterator<Item = &'a Car>) -> Result<f64> {
    mean(cars, Car::max_speed_kph)
}

pub fn average_wear_factor<'a>(cars: impl IntoIterator<Item = &'a Car>) -> Result<f64> {
    mean(cars, Car::wear_factor)
}

pub fn average_tire_factor<'a>(cars: impl IntoIterator<Item = &'a Car>) -> Result<f64> {
    mean(cars, Car::tire_factor)
}

/// Mean driver skill factor over `cars`. A car without a driver counts as 1.0.
pub fn average_skill_factor<'a>(
    cars: impl IntoIterator<Item = &'a Car>,
    paddock: &Paddock,
) -> Result<f64> {
    mean(cars, |car| {
        car.driver()
            .and_then(|id| paddock.driver(id))
            .map_or(1.0, |driver| driver.skill_factor())
    })
}
