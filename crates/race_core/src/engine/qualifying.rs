//! Qualifying: three knockout rounds over one timed lap per entrant.
//!
//! Q1 ranks every entrant. Q2 keeps the best `q2_size` of Q1 and Q3 the
//! best `q3_size` of Q2, so each bucket is a prefix of the one before.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SessionConfig;
use crate::models::car::CarNumber;
use crate::models::driver::DriverId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingEntry {
    pub driver_id: DriverId,
    pub driver: String,
    pub car: CarNumber,
    pub lap_time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSlot {
    pub position: u32,
    pub driver: String,
    pub car: CarNumber,
    pub lap_time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub q1: Vec<QualifyingEntry>,
    pub q2: Vec<QualifyingEntry>,
    pub q3: Vec<QualifyingEntry>,
}

fn by_lap_time(a: &QualifyingEntry, b: &QualifyingEntry) -> Ordering {
    a.lap_time_s.total_cmp(&b.lap_time_s)
}

/// Ranks `entries` and applies the knockout cuts. Ties keep entry order.
pub fn run_sessions(mut entries: Vec<QualifyingEntry>, session: &SessionConfig) -> QualifyingResult {
    entries.sort_by(by_lap_time);

    let q2: Vec<_> = entries.iter().take(session.q2_size).cloned().collect();
    let q3: Vec<_> = q2.iter().take(session.q3_size).cloned().collect();

    if let Some(pole) = q3.first().or(entries.first()) {
        info!(driver = %pole.driver, car = pole.car, time_s = pole.lap_time_s, "pole position");
    }

    QualifyingResult { q1: entries, q2, q3 }
}

impl QualifyingResult {
    pub fn pole(&self) -> Option<&QualifyingEntry> {
        self.q3.first().or_else(|| self.q2.first()).or_else(|| self.q1.first())
    }

    /// Q3 order, then drivers knocked out in Q2, then those knocked out in Q1.
    pub fn starting_grid(&self) -> Vec<GridSlot> {
        let q2_eliminated = self.q2.iter().skip(self.q3.len());
        let q1_eliminated = self.q1.iter().skip(self.q2.len());

        self.q3
            .iter()
            .chain(q2_eliminated)
            .chain(q1_eliminated)
            .enumerate()
            .map(|(idx, entry)| GridSlot {
                position: idx as u32 + 1,
                driver: entry.driver.clone(),
                car: entry.car,
                lap_time_s: entry.lap_time_s,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(times: &[f64]) -> Vec<QualifyingEntry> {
        times
            .iter()
            .enumerate()
            .map(|(idx, &lap_time_s)| QualifyingEntry {
                driver_id: DriverId(idx),
                driver: format!("Driver {}", idx + 1),
                car: idx as CarNumber + 1,
                lap_time_s,
            })
            .collect()
    }

    #[test]
    fn test_twenty_entrants_nested_cuts() {
        // reverse order so sorting actually matters
        let times: Vec<f64> = (0..20).map(|i| 90.0 - i as f64 * 0.1).collect();
        let result = run_sessions(entries(&times), &SessionConfig::default());

        assert_eq!(result.q1.len(), 20);
        assert_eq!(result.q2.len(), 15);
        assert_eq!(result.q3.len(), 10);
        assert!(result.q1.windows(2).all(|w| w[0].lap_time_s <= w[1].lap_time_s));
        assert_eq!(result.q2[..], result.q1[..15]);
        assert_eq!(result.q3[..], result.q2[..10]);
        assert_eq!(result.pole().unwrap().car, 20);
    }

    #[test]
    fn test_small_field_keeps_everyone() {
        let result = run_sessions(entries(&[80.2, 80.1, 80.3]), &SessionConfig::default());
        assert_eq!(result.q2.len(), 3);
        assert_eq!(result.q3.len(), 3);
        assert_eq!(result.q3[0].car, 2);
    }

    #[test]
    fn test_ties_keep_entry_order() {
        let result = run_sessions(entries(&[81.0, 80.0, 80.0]), &SessionConfig::default());
        let cars: Vec<_> = result.q1.iter().map(|e| e.car).collect();
        assert_eq!(cars, vec![2, 3, 1]);
    }

    #[test]
    fn test_starting_grid_follows_knockout_order() {
        let times: Vec<f64> = (0..20).map(|i| 80.0 + i as f64).collect();
        let result = run_sessions(entries(&times), &SessionConfig::default());
        let grid = result.starting_grid();

        assert_eq!(grid.len(), 20);
        assert_eq!(grid[0].position, 1);
        assert_eq!(grid[0].car, 1);
        assert_eq!(grid[10].car, 11);
        assert_eq!(grid[19].position, 20);
        assert!(QualifyingResult::default().starting_grid().is_empty());
    }
}
