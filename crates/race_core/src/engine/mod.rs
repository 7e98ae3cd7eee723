pub mod fleet;
pub mod lap_planner;
pub mod qualifying;
pub mod race;
pub mod results;

pub use lap_planner::{calculate_total_laps, plan_laps, LapPlan};
pub use qualifying::{GridSlot, QualifyingEntry, QualifyingResult};
pub use race::{Race, RaceStatus};
pub use results::{
    CarLap, FastestLap, LapEstimate, LapSummary, ManualPitStop, PodiumFinish, RaceClassification,
    RaceResult, RaceStart, RunningPosition, SkippedStop, Standings, StrategyAssigned, StrategyStop,
    WeatherUpdate,
};
