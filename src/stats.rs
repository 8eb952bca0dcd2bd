//! Best results per track.
//!
//! Lower values are better (times in seconds). Each category keeps at most
//! `RECORD_COUNT` results, and the storage hook is only called when a new
//! result made it into a ranking.

use crate::config::RECORD_COUNT;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    Lap,
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackResult {
    pub vehicle: String,
    pub value: f32,
}

impl TrackResult {
    pub fn new(vehicle: impl Into<String>, value: f32) -> Self {
        TrackResult {
            vehicle: vehicle.into(),
            value,
        }
    }
}

impl fmt::Display for TrackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}s", self.vehicle, self.value)
    }
}

/// Persistence hook, shared by the stats of every track
pub trait StatsIo {
    fn save(&self, stats: &TrackStats);
}

/// Writes the rankings to the log instead of a file
#[derive(Debug, Default)]
pub struct LogStatsIo;

impl StatsIo for LogStatsIo {
    fn save(&self, stats: &TrackStats) {
        for result_type in [ResultType::Lap, ResultType::Total] {
            let ranking: Vec<String> = stats.get(result_type).iter().map(ToString::to_string).collect();
            crate::debug_stats!("{:?} records: [{}]", result_type, ranking.join(", "));
        }
    }
}

pub struct TrackStats {
    io: Rc<dyn StatsIo>,
    lap_records: Vec<TrackResult>,
    total_records: Vec<TrackResult>,
}

impl TrackStats {
    pub fn new(io: Rc<dyn StatsIo>) -> Self {
        TrackStats {
            io,
            lap_records: Vec::new(),
            total_records: Vec::new(),
        }
    }

    /// Ranking for `result_type`, best first
    pub fn get(&self, result_type: ResultType) -> &[TrackResult] {
        match result_type {
            ResultType::Lap => &self.lap_records,
            ResultType::Total => &self.total_records,
        }
    }

    /// Returns the rank the result got, or `None` if it did not make it
    pub fn add_result(&mut self, result_type: ResultType, result: TrackResult) -> Option<usize> {
        let records = match result_type {
            ResultType::Lap => &mut self.lap_records,
            ResultType::Total => &mut self.total_records,
        };
        let rank = insert_result(records, result);
        if let Some(rank) = rank {
            crate::debug_stats!("New {:?} record at rank {}", result_type, rank);
            self.io.save(self);
        }
        rank
    }
}

fn insert_result(records: &mut Vec<TrackResult>, result: TrackResult) -> Option<usize> {
    if let Some(index) = records.iter().position(|record| result.value < record.value) {
        records.insert(index, result);
        records.truncate(RECORD_COUNT);
        return Some(index);
    }
    // Not better than any record, but there is room at the end
    if records.len() < RECORD_COUNT {
        records.push(result);
        return Some(records.len() - 1);
    }
    None
}
