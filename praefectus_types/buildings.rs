use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::GameError;

/// The closed set of buildings a village can hold.
///
/// Variants are declared in the order the game server lists them, which is
/// also the index order used by `BuildingLevels`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingName {
    Main,
    Barracks,
    Stable,
    Garage,
    Watchtower,
    Snob,
    Smith,
    Place,
    Statue,
    Market,
    Wood,
    Stone,
    Iron,
    Farm,
    Storage,
    Wall,
}

impl BuildingName {
    pub const COUNT: usize = 16;

    pub const ALL: [BuildingName; Self::COUNT] = [
        BuildingName::Main,
        BuildingName::Barracks,
        BuildingName::Stable,
        BuildingName::Garage,
        BuildingName::Watchtower,
        BuildingName::Snob,
        BuildingName::Smith,
        BuildingName::Place,
        BuildingName::Statue,
        BuildingName::Market,
        BuildingName::Wood,
        BuildingName::Stone,
        BuildingName::Iron,
        BuildingName::Farm,
        BuildingName::Storage,
        BuildingName::Wall,
    ];

    /// Identifier used by the game server (JSON keys, icons, ajax parameters).
    pub const fn key(&self) -> &'static str {
        match self {
            BuildingName::Main => "main",
            BuildingName::Barracks => "barracks",
            BuildingName::Stable => "stable",
            BuildingName::Garage => "garage",
            BuildingName::Watchtower => "watchtower",
            BuildingName::Snob => "snob",
            BuildingName::Smith => "smith",
            BuildingName::Place => "place",
            BuildingName::Statue => "statue",
            BuildingName::Market => "market",
            BuildingName::Wood => "wood",
            BuildingName::Stone => "stone",
            BuildingName::Iron => "iron",
            BuildingName::Farm => "farm",
            BuildingName::Storage => "storage",
            BuildingName::Wall => "wall",
        }
    }

    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for BuildingName {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildingName::ALL
            .into_iter()
            .find(|b| b.key() == s)
            .ok_or_else(|| GameError::UnknownBuilding(s.to_string()))
    }
}

impl fmt::Display for BuildingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildingName::Main => "Headquarters",
            BuildingName::Barracks => "Barracks",
            BuildingName::Stable => "Stable",
            BuildingName::Garage => "Workshop",
            BuildingName::Watchtower => "Watchtower",
            BuildingName::Snob => "Academy",
            BuildingName::Smith => "Smithy",
            BuildingName::Place => "Rally Point",
            BuildingName::Statue => "Statue",
            BuildingName::Market => "Market",
            BuildingName::Wood => "Timber Camp",
            BuildingName::Stone => "Clay Pit",
            BuildingName::Iron => "Iron Mine",
            BuildingName::Farm => "Farm",
            BuildingName::Storage => "Warehouse",
            BuildingName::Wall => "Wall",
        };

        f.write_str(name)
    }
}
