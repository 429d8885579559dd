use std::sync::Arc;
use tracing::{error, info, warn};

use praefectus_types::Result;

use crate::{
    build_scheduler::{BuildScheduler, CycleReport},
    config::{Config, DelayConfig},
    countdown::countdown,
    events::{EventChannel, GameEvent},
    gateway::GameGateway,
    repository::StrategyRepository,
};

/// Drives every managed village, one at a time: poll, publish, schedule.
pub struct VillagePoller {
    gateway: Box<dyn GameGateway>,
    channel: Arc<EventChannel>,
    schedulers: Vec<BuildScheduler>,
    delays: DelayConfig,
}

impl VillagePoller {
    pub fn new(gateway: Box<dyn GameGateway>, channel: Arc<EventChannel>, delays: DelayConfig) -> Self {
        Self {
            gateway,
            channel,
            schedulers: vec![],
            delays,
        }
    }

    /// Builds a poller with one scheduler per managed village of `config`.
    pub fn from_config(
        gateway: Box<dyn GameGateway>,
        config: &Config,
        strategies: Arc<dyn StrategyRepository>,
    ) -> Self {
        let channel = Arc::new(EventChannel::new());
        let mut poller = Self::new(gateway, channel.clone(), config.bot.delays.clone());

        for village in config.managed_villages() {
            poller.add_scheduler(BuildScheduler::new(
                village,
                config.building_manager,
                strategies.clone(),
                channel.clone(),
            ));
        }
        poller
    }

    pub fn add_scheduler(&mut self, scheduler: BuildScheduler) {
        self.schedulers.push(scheduler);
    }

    pub fn channel(&self) -> Arc<EventChannel> {
        self.channel.clone()
    }

    pub fn village_ids(&self) -> Vec<u32> {
        self.schedulers.iter().map(|s| s.village_id()).collect()
    }

    /// Polls forever, until the process is stopped.
    #[cfg(not(tarpaulin_include))]
    pub async fn run(&mut self) {
        info!(villages = self.schedulers.len(), "Bot started");

        loop {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Polling cycle aborted");
            }

            let seconds = self.delays.between_runs;
            info!(seconds, "Sleeping until next run");
            countdown(seconds).await;
        }
    }

    /// One pass over all villages.
    ///
    /// Failures of a single village are logged and the pass moves on; an error
    /// that leaves the session unusable ends the pass early.
    pub async fn run_cycle(&mut self) -> Result<Vec<(u32, CycleReport)>> {
        let Self {
            gateway,
            channel,
            schedulers,
            delays,
        } = self;
        let mut reports = Vec::with_capacity(schedulers.len());

        for scheduler in schedulers.iter() {
            let village_id = scheduler.village_id();
            let village = scheduler.village_name();

            match Self::process(gateway.as_mut(), channel, scheduler).await {
                Ok(Some(report)) => reports.push((village_id, report)),
                Ok(None) => warn!(village_id, %village, "No village data this cycle"),
                Err(e) if e.is_terminal() => {
                    error!(village_id, %village, error = %e, "Session is unusable, ending cycle");
                    return Err(e);
                }
                Err(e) => error!(village_id, %village, error = %e, "Village cycle failed"),
            }

            info!(seconds = delays.between_villages, "Sleeping before next village");
            countdown(delays.between_villages).await;
        }

        Ok(reports)
    }

    async fn process(
        gateway: &mut dyn GameGateway,
        channel: &EventChannel,
        scheduler: &BuildScheduler,
    ) -> Result<Option<CycleReport>> {
        info!(village_id = scheduler.village_id(), village = %scheduler.village_name(), "Polling village");

        let Some(poll) = gateway.poll_village(scheduler.village_id()).await? else {
            return Ok(None);
        };
        channel.publish(&GameEvent::VillageSnapshotUpdated(Arc::new(poll)));

        scheduler.run(gateway).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use praefectus_game::{
        models::{
            costs::{BuildingCost, CostTable},
            strategy::{PlanEntry, StrategyPlan},
        },
        scheduler::UpgradeOrder,
        test_utils::{PollFactoryOptions, SnapshotFactoryOptions, poll_factory, snapshot_factory},
    };
    use praefectus_types::{buildings::BuildingName, errors::SessionError};

    use super::*;
    use crate::{
        build_scheduler::BuildOutcome,
        config::{DelayConfig, RequestDelay, StrategyConfig, VillageConfig},
        test_utils::tests::{GatewayCall, InMemoryStrategyRepository, MockGateway},
    };

    fn config_with(villages: &[(u32, bool)]) -> Config {
        Config {
            bot: crate::config::BotConfig {
                delays: DelayConfig {
                    between_villages: 0,
                    between_runs: 0,
                    request: RequestDelay { min: 0.0, max: 0.0 },
                },
                ..Default::default()
            },
            villages: villages
                .iter()
                .map(|(id, manage)| VillageConfig {
                    id: *id,
                    name: format!("Village {id}"),
                    manage: *manage,
                    strategy: StrategyConfig {
                        building: "opening".to_string(),
                    },
                })
                .collect(),
            ..Default::default()
        }
    }

    fn strategies() -> Arc<InMemoryStrategyRepository> {
        Arc::new(InMemoryStrategyRepository::new().with_plan(StrategyPlan::new(
            "opening",
            vec![PlanEntry::new(BuildingName::Wood, 1)],
        )))
    }

    fn poll_for(village_id: u32) -> praefectus_game::models::poll::VillagePoll {
        poll_factory(PollFactoryOptions {
            snapshot: Some(snapshot_factory(SnapshotFactoryOptions {
                id: Some(village_id),
                ..Default::default()
            })),
            costs: Some(CostTable::new().with_cost(BuildingName::Wood, BuildingCost::new(50, 60, 40, 5))),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_only_managed_villages_are_scheduled() {
        let config = config_with(&[(1, true), (2, false), (3, true)]);
        let poller = VillagePoller::from_config(Box::new(MockGateway::new()), &config, strategies());

        assert_eq!(poller.village_ids(), vec![1, 3]);
        assert_eq!(poller.channel().subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_cycle_polls_and_schedules_each_village_in_order() -> Result<()> {
        let config = config_with(&[(1, true), (2, true)]);
        let gateway = MockGateway::new().with_polls(vec![poll_for(1), poll_for(2)]);
        let mut poller = VillagePoller::from_config(Box::new(gateway.clone()), &config, strategies());

        let reports = poller.run_cycle().await?;

        let order = UpgradeOrder {
            building: BuildingName::Wood,
            level: 1,
        };
        assert_eq!(
            reports
                .iter()
                .map(|(id, r)| (*id, r.outcome))
                .collect::<Vec<_>>(),
            vec![(1, BuildOutcome::Queued(order)), (2, BuildOutcome::Queued(order))]
        );
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Poll(1),
                GatewayCall::Upgrade(1, BuildingName::Wood),
                GatewayCall::Poll(2),
                GatewayCall::Upgrade(2, BuildingName::Wood),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_village_without_data_is_skipped() -> Result<()> {
        let config = config_with(&[(1, true), (2, true)]);
        // Only one poll scripted: village 1 gets it, village 2 gets nothing.
        let gateway = MockGateway::new().with_polls(vec![poll_for(1)]);
        let mut poller = VillagePoller::from_config(Box::new(gateway.clone()), &config, strategies());

        let reports = poller.run_cycle().await?;

        assert_eq!(reports.len(), 1);
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Poll(1),
                GatewayCall::Upgrade(1, BuildingName::Wood),
                GatewayCall::Poll(2),
            ]
        );
        Ok(())
    }

    struct ExpiredGateway;

    #[async_trait::async_trait]
    impl GameGateway for ExpiredGateway {
        async fn list_villages(
            &mut self,
        ) -> Result<Vec<praefectus_game::models::poll::VillageListing>> {
            Ok(vec![])
        }

        async fn poll_village(
            &mut self,
            _village_id: u32,
        ) -> Result<Option<praefectus_game::models::poll::VillagePoll>> {
            Err(SessionError::SessionExpired.into())
        }

        async fn upgrade_building(&mut self, _village_id: u32, _building: BuildingName) -> Result<bool> {
            Ok(false)
        }

        async fn finish_early(&mut self, _village_id: u32, _order_id: u64) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_terminal_session_error_ends_cycle() {
        let config = config_with(&[(1, true), (2, true)]);
        let mut poller = VillagePoller::from_config(Box::new(ExpiredGateway), &config, strategies());

        let result = poller.run_cycle().await;

        assert!(matches!(result, Err(e) if e.is_terminal()));
    }
}
