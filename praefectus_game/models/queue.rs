use serde::{Deserialize, Serialize};

use praefectus_types::buildings::BuildingName;

/// Seconds added to the observation time when the server doesn't report
/// when a queued build completes.
pub const ESTIMATED_FINISH_SECS: i64 = 3600;

/// When a queued build completes, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishTime {
    /// Reported by the server.
    Exact(i64),
    /// Placeholder, only a lower bound.
    Estimated(i64),
}

impl FinishTime {
    pub fn estimated_from(observed_at: i64) -> Self {
        FinishTime::Estimated(observed_at + ESTIMATED_FINISH_SECS)
    }

    pub fn epoch(&self) -> i64 {
        match self {
            FinishTime::Exact(t) | FinishTime::Estimated(t) => *t,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, FinishTime::Exact(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub building: BuildingName,
    pub level: u8,
    pub finish: FinishTime,
}

/// Live construction queue of a village, in server order.
///
/// Rows the bot can't attribute to a known building at a known level are
/// only counted. They still occupy a server queue slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildQueue {
    entries: Vec<QueueEntry>,
    #[serde(default)]
    untracked: usize,
}

impl BuildQueue {
    pub fn new(entries: Vec<QueueEntry>) -> Self {
        Self {
            entries,
            untracked: 0,
        }
    }

    pub fn with_untracked(mut self, rows: usize) -> Self {
        self.untracked = rows;
        self
    }

    /// Number of occupied queue slots, untracked rows included.
    pub fn len(&self) -> usize {
        self.entries.len() + self.untracked
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn untracked(&self) -> usize {
        self.untracked
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Highest level queued for `building`, if any.
    pub fn highest_level(&self, building: BuildingName) -> Option<u8> {
        self.entries
            .iter()
            .filter(|e| e.building == building)
            .map(|e| e.level)
            .max()
    }
}
