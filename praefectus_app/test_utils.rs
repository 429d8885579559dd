#[cfg(any(test, feature = "test-utils"))]
#[cfg(not(tarpaulin_include))]
pub mod tests {
    use async_trait::async_trait;
    use std::{
        collections::{HashMap, VecDeque},
        sync::{Arc, Mutex},
    };

    use praefectus_game::models::{
        poll::{VillageListing, VillagePoll},
        strategy::StrategyPlan,
    };
    use praefectus_types::{
        Result,
        buildings::BuildingName,
        errors::{AppError, ApplicationError},
    };

    use crate::{
        config::Config,
        gateway::GameGateway,
        operator::Operator,
        repository::{ConfigStore, CookieMap, CookieStore, StrategyRepository},
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum GatewayCall {
        ListVillages,
        Poll(u32),
        Upgrade(u32, BuildingName),
        FinishEarly(u32, u64),
    }

    /// Scripted game server. Polls are served from a queue; once it's empty,
    /// `poll_village` answers `Ok(None)`.
    #[derive(Default, Clone)]
    pub struct MockGateway {
        villages: Vec<VillageListing>,
        polls: Arc<Mutex<VecDeque<VillagePoll>>>,
        calls: Arc<Mutex<Vec<GatewayCall>>>,
        reject_upgrades: bool,
        reject_early_finish: bool,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_villages(mut self, villages: Vec<VillageListing>) -> Self {
            self.villages = villages;
            self
        }

        pub fn with_polls(self, polls: Vec<VillagePoll>) -> Self {
            self.polls.lock().unwrap().extend(polls);
            self
        }

        pub fn rejecting_upgrades(mut self) -> Self {
            self.reject_upgrades = true;
            self
        }

        pub fn rejecting_early_finish(mut self) -> Self {
            self.reject_early_finish = true;
            self
        }

        pub fn calls(&self) -> Vec<GatewayCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: GatewayCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl GameGateway for MockGateway {
        async fn list_villages(&mut self) -> Result<Vec<VillageListing>> {
            self.record(GatewayCall::ListVillages);
            Ok(self.villages.clone())
        }

        async fn poll_village(&mut self, village_id: u32) -> Result<Option<VillagePoll>> {
            self.record(GatewayCall::Poll(village_id));
            Ok(self.polls.lock().unwrap().pop_front())
        }

        async fn upgrade_building(
            &mut self,
            village_id: u32,
            building: BuildingName,
        ) -> Result<bool> {
            self.record(GatewayCall::Upgrade(village_id, building));
            Ok(!self.reject_upgrades)
        }

        async fn finish_early(&mut self, village_id: u32, order_id: u64) -> Result<bool> {
            self.record(GatewayCall::FinishEarly(village_id, order_id));
            Ok(!self.reject_early_finish)
        }
    }

    /// Operator answering from a script. `ask_string` pops answers in order
    /// (an empty answer picks the default), `ask_bool` pops from its own list.
    #[derive(Default, Clone)]
    pub struct MockOperator {
        answers: Arc<Mutex<VecDeque<String>>>,
        confirmations: Arc<Mutex<VecDeque<bool>>>,
        questions: Arc<Mutex<Vec<String>>>,
        acknowledgements: Arc<Mutex<usize>>,
    }

    impl MockOperator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_answers(self, answers: &[&str]) -> Self {
            self.answers
                .lock()
                .unwrap()
                .extend(answers.iter().map(|a| a.to_string()));
            self
        }

        pub fn with_confirmations(self, confirmations: &[bool]) -> Self {
            self.confirmations
                .lock()
                .unwrap()
                .extend(confirmations.iter().copied());
            self
        }

        pub fn questions(&self) -> Vec<String> {
            self.questions.lock().unwrap().clone()
        }

        pub fn acknowledgements(&self) -> usize {
            *self.acknowledgements.lock().unwrap()
        }
    }

    #[async_trait]
    impl Operator for MockOperator {
        async fn ask_string(
            &self,
            question: &str,
            default: Option<&str>,
            _example: Option<&str>,
        ) -> Result<String> {
            self.questions.lock().unwrap().push(question.to_string());
            let answer = self.answers.lock().unwrap().pop_front().ok_or_else(|| {
                ApplicationError::Unknown(format!("no scripted answer for {question:?}"))
            })?;

            match (answer.is_empty(), default) {
                (true, Some(default)) => Ok(default.to_string()),
                _ => Ok(answer),
            }
        }

        async fn ask_bool(&self, question: &str, default: bool) -> Result<bool> {
            self.questions.lock().unwrap().push(question.to_string());
            Ok(self
                .confirmations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(default))
        }

        async fn wait_for_enter(&self, _message: &str) -> Result<()> {
            *self.acknowledgements.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct InMemoryCookieStore {
        cookies: Arc<Mutex<Option<CookieMap>>>,
        saves: Arc<Mutex<Vec<CookieMap>>>,
    }

    impl InMemoryCookieStore {
        pub fn new(cookies: Option<CookieMap>) -> Self {
            Self {
                cookies: Arc::new(Mutex::new(cookies)),
                saves: Default::default(),
            }
        }

        pub fn saved(&self) -> Vec<CookieMap> {
            self.saves.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CookieStore for InMemoryCookieStore {
        async fn load(&self) -> Result<Option<CookieMap>> {
            Ok(self.cookies.lock().unwrap().clone())
        }

        async fn save(&self, cookies: &CookieMap) -> Result<()> {
            *self.cookies.lock().unwrap() = Some(cookies.clone());
            self.saves.lock().unwrap().push(cookies.clone());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct InMemoryConfigStore {
        config: Arc<Mutex<Option<Config>>>,
        saves: Arc<Mutex<Vec<Config>>>,
    }

    impl InMemoryConfigStore {
        pub fn new(config: Option<Config>) -> Self {
            Self {
                config: Arc::new(Mutex::new(config)),
                saves: Default::default(),
            }
        }

        pub fn saved(&self) -> Vec<Config> {
            self.saves.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConfigStore for InMemoryConfigStore {
        async fn load(&self) -> Result<Option<Config>> {
            Ok(self.config.lock().unwrap().clone())
        }

        async fn save(&self, config: &Config) -> Result<()> {
            *self.config.lock().unwrap() = Some(config.clone());
            self.saves.lock().unwrap().push(config.clone());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct InMemoryStrategyRepository {
        plans: HashMap<String, StrategyPlan>,
    }

    impl InMemoryStrategyRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_plan(mut self, plan: StrategyPlan) -> Self {
            self.plans.insert(plan.name.clone(), plan);
            self
        }
    }

    #[async_trait]
    impl StrategyRepository for InMemoryStrategyRepository {
        async fn building_plan(&self, name: &str) -> Result<StrategyPlan> {
            self.plans
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::StrategyNotFound(name.to_string()).into())
        }
    }
}
