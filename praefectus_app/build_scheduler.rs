use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use praefectus_game::{
    models::{
        poll::{EarlyFinish, VillagePoll},
        strategy::StrategyPlan,
    },
    scheduler::{UpgradeDecision, UpgradeOrder, due_early_finish, next_upgrade},
};
use praefectus_types::Result;

use crate::{
    config::{BuildingManagerConfig, VillageConfig},
    events::{EventChannel, GameEvent},
    gateway::GameGateway,
    repository::StrategyRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// No poll received yet for this village.
    NoData,
    UpgradesDisabled,
    QueueFull,
    Queued(UpgradeOrder),
    /// The server refused the order. Not retried until the next cycle.
    Rejected(UpgradeOrder),
    /// Nothing affordable within the lookahead budget, or every goal reached.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub early_finished: Option<u64>,
    pub outcome: BuildOutcome,
}

/// Keeps one village's build queue busy according to its strategy.
///
/// The scheduler learns about new polls through the `EventChannel` and acts
/// on the most recent one when `run` is called.
pub struct BuildScheduler {
    village_id: u32,
    village_name: String,
    strategy: String,
    settings: BuildingManagerConfig,
    strategies: Arc<dyn StrategyRepository>,
    channel: Arc<EventChannel>,
    latest: Arc<Mutex<Option<Arc<VillagePoll>>>>,
}

impl BuildScheduler {
    pub fn new(
        village: &VillageConfig,
        settings: BuildingManagerConfig,
        strategies: Arc<dyn StrategyRepository>,
        channel: Arc<EventChannel>,
    ) -> Self {
        let latest = Arc::new(Mutex::new(None));

        let slot = latest.clone();
        let village_id = village.id;
        channel.subscribe(move |event| match event {
            GameEvent::VillageSnapshotUpdated(poll) => {
                if poll.village_id() != village_id {
                    return;
                }
                debug!(village_id, "Village data updated");
                *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
                    Some(poll.clone());
            }
        });

        Self {
            village_id: village.id,
            village_name: village.name.clone(),
            strategy: village.strategy.building.clone(),
            settings,
            strategies,
            channel,
            latest,
        }
    }

    pub fn village_id(&self) -> u32 {
        self.village_id
    }

    pub fn village_name(&self) -> &str {
        &self.village_name
    }

    /// Most recent poll delivered for this village.
    pub fn latest(&self) -> Option<Arc<VillagePoll>> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub async fn run(&self, gateway: &mut dyn GameGateway) -> Result<CycleReport> {
        self.run_at(gateway, Utc::now().timestamp()).await
    }

    /// One scheduling cycle with `now` as the current epoch second.
    ///
    /// A due early finish is claimed first; the village is then re-polled and
    /// the upgrade decision runs on the fresh data. That re-entry happens at
    /// most once per cycle.
    pub async fn run_at(&self, gateway: &mut dyn GameGateway, now: i64) -> Result<CycleReport> {
        let Some(mut poll) = self.latest() else {
            warn!(village = %self.village_name, "Village data is not available");
            return Ok(CycleReport {
                early_finished: None,
                outcome: BuildOutcome::NoData,
            });
        };

        let mut early_finished = None;
        if self.settings.finish_enabled {
            if let Some(candidate) = due_early_finish(&poll, now) {
                if self.finish_early(gateway, candidate).await? {
                    early_finished = Some(candidate.order_id);

                    match self.refresh(gateway).await? {
                        Some(fresh) => poll = fresh,
                        None => {
                            warn!(village = %self.village_name, "No village data after early finish");
                            return Ok(CycleReport {
                                early_finished,
                                outcome: BuildOutcome::NoData,
                            });
                        }
                    }
                }
            }
        }

        if !self.settings.upgrade_enabled {
            return Ok(CycleReport {
                early_finished,
                outcome: BuildOutcome::UpgradesDisabled,
            });
        }

        let plan = self.strategies.building_plan(&self.strategy).await?;
        let outcome = self.queue_next_upgrade(gateway, &poll, &plan).await?;

        Ok(CycleReport {
            early_finished,
            outcome,
        })
    }

    async fn queue_next_upgrade(
        &self,
        gateway: &mut dyn GameGateway,
        poll: &VillagePoll,
        plan: &StrategyPlan,
    ) -> Result<BuildOutcome> {
        match next_upgrade(poll, plan, &self.settings.plan_limits()) {
            UpgradeDecision::QueueFull { capacity, .. } => {
                info!(village = %self.village_name, capacity, "Building queue is full");
                Ok(BuildOutcome::QueueFull)
            }
            UpgradeDecision::Upgrade { order, .. } => {
                if gateway
                    .upgrade_building(self.village_id, order.building)
                    .await?
                {
                    info!(
                        village = %self.village_name,
                        building = %order.building,
                        level = order.level,
                        "Queued upgrade"
                    );
                    Ok(BuildOutcome::Queued(order))
                } else {
                    error!(
                        village = %self.village_name,
                        building = %order.building,
                        level = order.level,
                        "Failed to queue upgrade"
                    );
                    Ok(BuildOutcome::Rejected(order))
                }
            }
            UpgradeDecision::LookaheadExhausted { skips } | UpgradeDecision::PlanComplete { skips } => {
                info!(village = %self.village_name, skips, "No upgrades to do at the moment");
                Ok(BuildOutcome::Idle)
            }
        }
    }

    async fn finish_early(
        &self,
        gateway: &mut dyn GameGateway,
        candidate: EarlyFinish,
    ) -> Result<bool> {
        let finished = gateway
            .finish_early(self.village_id, candidate.order_id)
            .await?;

        if finished {
            info!(village = %self.village_name, order_id = candidate.order_id, "Finished upgrade early");
        } else {
            error!(village = %self.village_name, order_id = candidate.order_id, "Failed to finish upgrade early");
        }
        Ok(finished)
    }

    /// Re-polls the village and publishes the result, so every subscriber
    /// sees the same data this scheduler is about to act on.
    async fn refresh(&self, gateway: &mut dyn GameGateway) -> Result<Option<Arc<VillagePoll>>> {
        let Some(fresh) = gateway.poll_village(self.village_id).await? else {
            return Ok(None);
        };

        let fresh = Arc::new(fresh);
        self.channel
            .publish(&GameEvent::VillageSnapshotUpdated(fresh.clone()));
        Ok(Some(fresh))
    }
}
