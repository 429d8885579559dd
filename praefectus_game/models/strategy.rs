use serde::{Deserialize, Serialize};
use std::str::FromStr;

use praefectus_types::{buildings::BuildingName, errors::GameError};

/// One `building:level` goal of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub building: BuildingName,
    pub target_level: u8,
}

impl PlanEntry {
    pub const fn new(building: BuildingName, target_level: u8) -> Self {
        Self {
            building,
            target_level,
        }
    }
}

impl FromStr for PlanEntry {
    type Err = GameError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| GameError::InvalidStrategyLine {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (building, level) = line
            .split_once(':')
            .ok_or_else(|| invalid("expected building:level"))?;
        let building = BuildingName::from_str(building.trim())?;
        let target_level = level
            .trim()
            .parse::<u8>()
            .map_err(|_| invalid("level must be a number between 0 and 255"))?;

        Ok(PlanEntry::new(building, target_level))
    }
}

/// Ordered building goals for a village. Entries are priorities, evaluated
/// top to bottom on every cycle, and describe a target state rather than a
/// list of one-shot tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPlan {
    pub name: String,
    entries: Vec<PlanEntry>,
}

impl StrategyPlan {
    pub fn new(name: impl Into<String>, entries: Vec<PlanEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Parses one entry per line. Blank lines and `#` comments are skipped.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, GameError> {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(PlanEntry::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(name, entries))
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
