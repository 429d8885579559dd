use crate::models::{
    costs::CostTable,
    poll::{EarlyFinish, VillagePoll},
    queue::{BuildQueue, QueueEntry},
    village::{BuildingLevels, Coordinate, Population, Production, Resources, VillageSnapshot},
};

#[derive(Default, Clone)]
pub struct SnapshotFactoryOptions {
    pub id: Option<u32>,
    pub name: Option<String>,
    /// (wood, stone, iron)
    pub resources: Option<(u32, u32, u32)>,
    /// (current, max)
    pub population: Option<(u32, u32)>,
    pub storage_max: Option<u32>,
    pub buildings: Option<BuildingLevels>,
}

#[derive(Default, Clone)]
pub struct PollFactoryOptions {
    pub snapshot: Option<VillageSnapshot>,
    pub queue: Option<Vec<QueueEntry>>,
    /// Queue rows that aren't tied to a known building.
    pub untracked: Option<usize>,
    pub costs: Option<CostTable>,
    pub early_finish: Option<EarlyFinish>,
    pub observed_at: Option<i64>,
}

pub fn snapshot_factory(options: SnapshotFactoryOptions) -> VillageSnapshot {
    let id = options.id.unwrap_or(1001);
    let name = options.name.unwrap_or_else(|| format!("Village {id}"));
    let (wood, stone, iron) = options.resources.unwrap_or((1000, 1000, 1000));
    let (current, max) = options.population.unwrap_or((100, 1000));

    VillageSnapshot {
        id,
        display_name: format!("{name} (500|500) K55"),
        name,
        coordinate: Coordinate { x: 500, y: 500 },
        player_id: 7,
        points: 26,
        resources: Resources { wood, stone, iron },
        production: Production {
            wood: 30.0,
            stone: 30.0,
            iron: 30.0,
        },
        population: Population { current, max },
        storage_max: options.storage_max.unwrap_or(1000),
        trader_away: 0,
        buildings: options.buildings.unwrap_or_default(),
        is_farm_upgradable: true,
    }
}

pub fn poll_factory(options: PollFactoryOptions) -> VillagePoll {
    VillagePoll {
        snapshot: options
            .snapshot
            .unwrap_or_else(|| snapshot_factory(Default::default())),
        queue: BuildQueue::new(options.queue.unwrap_or_default())
            .with_untracked(options.untracked.unwrap_or_default()),
        costs: options.costs.unwrap_or_default(),
        early_finish: options.early_finish,
        observed_at: options.observed_at.unwrap_or(1_700_000_000),
    }
}
