use serde::{Deserialize, Serialize};

use super::{costs::CostTable, queue::BuildQueue, village::VillageSnapshot};

/// A village as listed in the account overview.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VillageListing {
    pub id: u32,
    pub name: String,
}

/// A queued build that the server allows to complete instantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyFinish {
    /// Id of the queue order, as expected by the `build_order_reduce` action.
    pub order_id: u64,
    /// Epoch seconds from which the instant finish is allowed.
    pub available_from: i64,
}

impl EarlyFinish {
    pub fn is_due(&self, now: i64) -> bool {
        now > self.available_from
    }
}

/// Everything extracted from one server response for a village.
///
/// Snapshot, queue and costs always come from the same response, so a
/// scheduling decision never mixes data from different polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillagePoll {
    pub snapshot: VillageSnapshot,
    pub queue: BuildQueue,
    pub costs: CostTable,
    pub early_finish: Option<EarlyFinish>,
    /// Epoch seconds.
    pub observed_at: i64,
}

impl VillagePoll {
    pub fn village_id(&self) -> u32 {
        self.snapshot.id
    }
}
