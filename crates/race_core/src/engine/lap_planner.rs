//! Race distance planning
//!
//! The race is as long as the tightest of three limits allows:
//!
//! | limit    | laps                                                       |
//! |----------|------------------------------------------------------------|
//! | duration | target time / lap time at `race_speed_ratio` of avg top speed |
//! | fuel     | allowance / (base consumption × length factor)             |
//! | tires    | tire life / (length factor × degradation factor)           |
//!
//! The minimum is floored and never drops below one lap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fleet;
use crate::config::LapPlanningConfig;
use crate::error::Result;
use crate::models::car::Car;
use crate::models::circuit::Circuit;

/// Every intermediate limit, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapPlan {
    pub duration_laps: f64,
    pub fuel_laps: f64,
    pub tire_laps: f64,
    pub total_laps: u32,
}

pub fn plan_laps<'a, I>(circuit: &Circuit, cars: I, config: &LapPlanningConfig) -> Result<LapPlan>
where
    I: IntoIterator<Item = &'a Car> + Clone,
{
    let length_factor = circuit.length_km() / config.reference_length_km;

    let race_speed = fleet::average_max_speed(cars.clone())? * config.race_speed_ratio;
    let lap_time_s = circuit.length_km() / race_speed * 3600.0;
    let duration_laps = config.target_duration_min * 60.0 / lap_time_s;

    let fuel_laps = config.fuel_allowance / (config.base_fuel_per_lap * length_factor);

    let degradation = circuit.degradation_factor(cars)?;
    let tire_laps = config.tire_life_laps / (length_factor * degradation);

    let limit = duration_laps.min(fuel_laps).min(tire_laps);
    let total_laps = if limit.is_finite() { (limit.floor() as u32).max(1) } else { 1 };

    debug!(
        circuit = %circuit.name(),
        duration_laps,
        fuel_laps,
        tire_laps,
        total_laps,
        "race distance planned"
    );

    Ok(LapPlan { duration_laps, fuel_laps, tire_laps, total_laps })
}

pub fn calculate_total_laps<'a, I>(circuit: &Circuit, cars: I, config: &LapPlanningConfig) -> Result<u32>
where
    I: IntoIterator<Item = &'a Car> + Clone,
{
    Ok(plan_laps(circuit, cars, config)?.total_laps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaceError;
    use crate::models::circuit::DegradationProfile;
    use crate::models::tire::TireCompound;

    fn fleet(speed: f64) -> Vec<Car> {
        (1..=10).map(|n| Car::new(n, "Team", "Car", TireCompound::Medium, speed).unwrap()).collect()
    }

    #[test]
    fn test_tire_limit_on_reference_track() {
        let circuit = Circuit::new("Reference", "Nowhere", 5.0).unwrap();
        let plan = plan_laps(&circuit, &fleet(340.0), &LapPlanningConfig::default()).unwrap();

        // 1.5 h × 272 km/h / 5 km
        assert!((plan.duration_laps - 81.6).abs() < 1e-9);
        assert!((plan.fuel_laps - 44.0).abs() < 1e-9);
        assert!((plan.tire_laps - 40.0).abs() < 1e-9);
        assert_eq!(plan.total_laps, 40);
    }

    #[test]
    fn test_high_degradation_venue() {
        let circuit = Circuit::new("Monaco", "Monte Carlo", 3.337).unwrap();
        assert_eq!(circuit.degradation(), DegradationProfile::High);

        let laps =
            calculate_total_laps(&circuit, &fleet(340.0), &LapPlanningConfig::default()).unwrap();
        // 40 / (0.6674 × 1.2) ≈ 49.9
        assert_eq!(laps, 49);
    }

    #[test]
    fn test_duration_limit_for_short_race() {
        let circuit = Circuit::new("Reference", "Nowhere", 5.0).unwrap();
        let config = LapPlanningConfig { target_duration_min: 10.0, ..Default::default() };
        // 10 min at 272 km/h covers 45.3 km
        assert_eq!(calculate_total_laps(&circuit, &fleet(340.0), &config).unwrap(), 9);
    }

    #[test]
    fn test_never_below_one_lap() {
        let circuit = Circuit::new("Endless", "Nowhere", 500.0).unwrap();
        assert_eq!(
            calculate_total_laps(&circuit, &fleet(100.0), &LapPlanningConfig::default()).unwrap(),
            1
        );
    }

    #[test]
    fn test_empty_fleet() {
        let circuit = Circuit::new("Reference", "Nowhere", 5.0).unwrap();
        assert_eq!(
            calculate_total_laps(&circuit, &Vec::<Car>::new(), &LapPlanningConfig::default()),
            Err(RaceError::EmptyFleet)
        );
    }
}
