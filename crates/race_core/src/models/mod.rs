pub mod car;
pub mod circuit;
pub mod driver;
pub mod paddock;
pub mod strategy;
pub mod tire;
pub mod weather;

pub use car::{
    Car, CarNumber, CarState, Change, InitialWear, LapWear, Part, PartInstalled, PartKind,
    PitStopReport, WearSnapshot,
};
pub use circuit::{
    Circuit, CircuitStatistics, Corner, CornerAdded, CornerDifficulty, DegradationProfile,
    DrsZone, DrsZoneAdded, LapRecord, LapRecordUpdate, WeatherReport,
};
pub use driver::{
    Driver, DriverId, DriverSnapshot, DriverStats, DrivingStyle, Performance, PointsAward,
    SkillAdjustment, Skills, SkillsUpdate, StyleAdaptation,
};
pub use paddock::{Assignment, Paddock};
pub use strategy::{PlannedStop, Stint, StopCounters, StopRecord, Strategy, StrategyViolation};
pub use tire::{durability, Aggressiveness, TireCompound};
pub use weather::{DrivingConditions, Visibility, Weather, WeatherCondition};
