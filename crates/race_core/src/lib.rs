//! # race_core - Deterministic Race Weekend Simulation Engine
//!
//! Turns per-entity attributes (driver skill, tire compound, circuit
//! layout, weather, fuel and wear) into lap times, qualifying order,
//! resource depletion and championship results.
//!
//! ## Features
//! - Same inputs, same race: no randomness or wall clock inside the engine
//! - Typed result records for every operation (serde-ready)
//! - Tunables in [`config::EngineConfig`], loadable from YAML
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use race_core::{Car, Circuit, Driver, Race, TireCompound, Weather};
//!
//! let mut race = Race::new("British Grand Prix");
//! race.set_circuit(Circuit::new("Silverstone", "Towcester", 5.891).unwrap()).unwrap();
//! race.set_weather(Weather::dry());
//! race.set_date(NaiveDate::from_ymd_opt(2024, 7, 7).unwrap()).unwrap();
//!
//! for number in 1..=10 {
//!     race.enter_car(Car::new(number, "Team", "Car", TireCompound::Medium, 340.0).unwrap()).unwrap();
//!     let driver = race.enter_driver(Driver::new(format!("Driver {number}"), "GB"));
//!     race.assign_driver(driver, number).unwrap();
//! }
//!
//! race.start().unwrap();
//! race.run_to_completion().unwrap();
//! let classification = race.finalize().unwrap();
//! assert_eq!(classification.podium.len(), 3);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod models;

pub use config::EngineConfig;
pub use engine::{Race, RaceClassification, RaceStatus};
pub use error::{RaceError, Result, StartBlocker};
pub use models::{
    Aggressiveness, Car, CarState, Circuit, CornerDifficulty, Driver, DriverId, Paddock, Skills,
    Stint, Strategy, TireCompound, Weather, WeatherCondition,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
