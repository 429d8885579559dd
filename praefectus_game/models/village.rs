use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use praefectus_types::{buildings::BuildingName, errors::GameError};

/// Level of every building kind in a village.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingLevels {
    levels: [u8; BuildingName::COUNT],
}

impl BuildingLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `building` set to `level`.
    pub fn with_level(mut self, building: BuildingName, level: u8) -> Self {
        self.levels[building.index()] = level;
        self
    }

    pub fn get(&self, building: BuildingName) -> u8 {
        self.levels[building.index()]
    }

    /// Lookup by server key, failing with `GameError::UnknownBuilding` for
    /// names outside the known set.
    pub fn level_of(&self, name: &str) -> Result<u8, GameError> {
        let building = BuildingName::from_str(name)?;
        Ok(self.get(building))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingName, u8)> + '_ {
        BuildingName::ALL.into_iter().map(|b| (b, self.get(b)))
    }
}

impl FromIterator<(BuildingName, u8)> for BuildingLevels {
    fn from_iter<I: IntoIterator<Item = (BuildingName, u8)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BuildingLevels::new(), |acc, (b, level)| acc.with_level(b, level))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.x, self.y)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once('|')
            .ok_or_else(|| format!("invalid coordinate {s:?}"))?;
        let x = x.trim().parse().map_err(|_| format!("invalid x in {s:?}"))?;
        let y = y.trim().parse().map_err(|_| format!("invalid y in {s:?}"))?;
        Ok(Coordinate { x, y })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub wood: u32,
    pub stone: u32,
    pub iron: u32,
}

/// Hourly production rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub wood: f64,
    pub stone: f64,
    pub iron: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub current: u32,
    pub max: u32,
}

impl Population {
    pub fn free(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }
}

/// State of one village as reported by a single server response.
///
/// A snapshot is built once per successful parse and replaced wholesale by
/// the next one; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillageSnapshot {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub coordinate: Coordinate,
    pub player_id: u32,
    pub points: u32,
    pub resources: Resources,
    pub production: Production,
    pub population: Population,
    pub storage_max: u32,
    pub trader_away: u32,
    pub buildings: BuildingLevels,
    pub is_farm_upgradable: bool,
}

impl VillageSnapshot {
    pub fn building_level(&self, building: BuildingName) -> u8 {
        self.buildings.get(building)
    }
}
