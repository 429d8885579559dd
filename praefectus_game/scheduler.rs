//! Decides which building a village should upgrade next.
//!
//! The search is greedy and priority ordered: plan entries are walked top to
//! bottom and the first affordable upgrade wins. Unaffordable entries are
//! skipped up to a lookahead budget, so the work per cycle is bounded and the
//! outcome is deterministic for identical inputs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use praefectus_types::buildings::BuildingName;

use crate::models::{
    poll::{EarlyFinish, VillagePoll},
    strategy::StrategyPlan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Maximum number of builds the server queue may hold.
    pub queue_capacity: usize,
    /// How many unaffordable plan entries may be skipped before giving up.
    pub lookahead: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOrder {
    pub building: BuildingName,
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeDecision {
    /// The queue is at capacity, nothing can be added.
    QueueFull { queued: usize, capacity: usize },
    Upgrade { order: UpgradeOrder, skips: u32 },
    /// Too many unaffordable entries, evaluation stopped early.
    LookaheadExhausted { skips: u32 },
    /// Every entry was met, queued or skipped.
    PlanComplete { skips: u32 },
}

impl UpgradeDecision {
    pub fn order(&self) -> Option<UpgradeOrder> {
        match self {
            UpgradeDecision::Upgrade { order, .. } => Some(*order),
            _ => None,
        }
    }
}

/// Returns the early finish offered by `poll` if it can be claimed at `now`.
pub fn due_early_finish(poll: &VillagePoll, now: i64) -> Option<EarlyFinish> {
    poll.early_finish.filter(|candidate| candidate.is_due(now))
}

pub fn next_upgrade(poll: &VillagePoll, plan: &StrategyPlan, limits: &PlanLimits) -> UpgradeDecision {
    let queued = poll.queue.len();
    if queued >= limits.queue_capacity {
        return UpgradeDecision::QueueFull {
            queued,
            capacity: limits.queue_capacity,
        };
    }

    let village = &poll.snapshot;
    let mut skips = 0;

    for entry in plan.entries() {
        let building = entry.building;
        let built = village.building_level(building);
        let in_flight = poll.queue.highest_level(building);
        let current = built.max(in_flight.unwrap_or(0));

        if current >= entry.target_level {
            debug!(
                %building,
                target = entry.target_level,
                current,
                "Goal already met or queued"
            );
            continue;
        }

        // Levels advance one at a time and the server only prices the next
        // one, so a higher level is never reachable before this one.
        let level = current + 1;
        if poll.costs.is_affordable(building, village) {
            return UpgradeDecision::Upgrade {
                order: UpgradeOrder { building, level },
                skips,
            };
        }

        skips += 1;
        debug!(%building, level, skips, "Can't afford upgrade or it's not available");

        if skips > limits.lookahead {
            return UpgradeDecision::LookaheadExhausted { skips };
        }
    }

    UpgradeDecision::PlanComplete { skips }
}
