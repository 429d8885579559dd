use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use praefectus_types::buildings::BuildingName;

use super::village::VillageSnapshot;

/// Price of the next level of a building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCost {
    pub wood: u32,
    pub stone: u32,
    pub iron: u32,
    pub pop: u32,
}

impl BuildingCost {
    pub const fn new(wood: u32, stone: u32, iron: u32, pop: u32) -> Self {
        Self {
            wood,
            stone,
            iron,
            pop,
        }
    }

    /// Resources must be in stock and the extra population must fit within
    /// the free farm space.
    pub fn affordable_by(&self, village: &VillageSnapshot) -> bool {
        self.pop <= village.population.free()
            && self.wood <= village.resources.wood
            && self.stone <= village.resources.stone
            && self.iron <= village.resources.iron
    }
}

/// Next-level costs per building. A missing entry means the upgrade is not
/// available right now (requirements, max level, ...), not that it's free.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostTable {
    costs: HashMap<BuildingName, BuildingCost>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost(mut self, building: BuildingName, cost: BuildingCost) -> Self {
        self.costs.insert(building, cost);
        self
    }

    pub fn get(&self, building: BuildingName) -> Option<&BuildingCost> {
        self.costs.get(&building)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn is_affordable(&self, building: BuildingName, village: &VillageSnapshot) -> bool {
        self.get(building)
            .is_some_and(|cost| cost.affordable_by(village))
    }
}

impl FromIterator<(BuildingName, BuildingCost)> for CostTable {
    fn from_iter<I: IntoIterator<Item = (BuildingName, BuildingCost)>>(iter: I) -> Self {
        Self {
            costs: iter.into_iter().collect(),
        }
    }
}
