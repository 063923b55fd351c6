//! Append-only outcome persistence
//!
//! One `OutcomeRecord` per completed trial. Records are never updated or
//! deleted; sinks only append.

pub mod csv;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conditions::Condition;

pub use self::csv::CsvRecorder;

/// Column order of every persisted row
pub const COLUMNS: [&str; 7] = [
    "participantId",
    "trialIndex",
    "conditionName",
    "jumpPower",
    "pipeDistance",
    "holeSize",
    "survivalTimeMs",
];

/// Result of one completed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub participant_id: String,
    pub trial_index: u32,
    pub condition_name: String,
    pub jump_power: f32,
    pub pipe_distance: i32,
    pub hole_size: i32,
    pub survival_time_ms: u64,
}

impl OutcomeRecord {
    pub fn new(
        participant_id: &str,
        trial_index: u32,
        condition: &Condition,
        survival_time_ms: u64,
    ) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            trial_index,
            condition_name: condition.name.clone(),
            jump_power: condition.jump_power,
            pipe_distance: condition.pipe_distance,
            hole_size: condition.hole_size,
            survival_time_ms,
        }
    }
}

/// Outcome persistence error
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("i/o error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for outcome records
pub trait OutcomeSink {
    fn append(&mut self, record: &OutcomeRecord) -> Result<(), RecorderError>;
}

/// Keeps records in memory (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    pub records: Vec<OutcomeRecord>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutcomeSink for MemoryRecorder {
    fn append(&mut self, record: &OutcomeRecord) -> Result<(), RecorderError> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::conditions;

    #[test]
    fn test_record_copies_condition_parameters() {
        let condition = &conditions()[5];
        let record = OutcomeRecord::new("P01", 6, condition, 4_321);
        assert_eq!(record.participant_id, "P01");
        assert_eq!(record.trial_index, 6);
        assert_eq!(record.condition_name, "j1_g0_h1");
        assert_eq!(record.jump_power, 10.0);
        assert_eq!(record.pipe_distance, 220);
        assert_eq!(record.hole_size, 200);
        assert_eq!(record.survival_time_ms, 4_321);
    }

    #[test]
    fn test_memory_recorder_appends_in_order() {
        let condition = &conditions()[0];
        let mut sink = MemoryRecorder::new();
        sink.append(&OutcomeRecord::new("A", 1, condition, 10)).unwrap();
        sink.append(&OutcomeRecord::new("A", 2, condition, 20)).unwrap();
        let indices: Vec<_> = sink.records.iter().map(|r| r.trial_index).collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
